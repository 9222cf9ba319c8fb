//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use render_lab::core::config::{Config, RenderMode};
use render_lab::core::errors::LabError;
use render_lab::dataset::generator::{generate_timed, generate_with};
use render_lab::dataset::mutation::mutate_random_row;
use render_lab::tui::table::{CommitInputs, DataTable};
use render_lab::tui::window::Viewport;
use render_lab::tui::{RunOptions, run_lab};

/// Render Lab: optimized vs unoptimized rendering of a large table, measured
/// live in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "rlab",
    author,
    version,
    about = "Render Lab - optimized vs unoptimized rendering playground",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Start the interactive lab.
    Run(RunArgs),
    /// Print a generated dataset.
    Generate(GenerateArgs),
    /// Time headless data-table commits.
    Bench(BenchArgs),
    /// Inspect configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

fn parse_mode(raw: &str) -> Result<RenderMode, String> {
    raw.parse().map_err(|e: LabError| e.to_string())
}

#[derive(Debug, Clone, Args, Default)]
struct RunArgs {
    /// Initial render mode (optimized|unoptimized).
    #[arg(long, value_parser = parse_mode, value_name = "MODE")]
    mode: Option<RenderMode>,
    /// Initial dataset size (1000..=100000, step 1000).
    #[arg(long, value_name = "N")]
    rows: Option<usize>,
    /// Start with heavy computation on.
    #[arg(long)]
    heavy: bool,
    /// Background update interval in ms (0 disables).
    #[arg(long, value_name = "MILLISECONDS")]
    update_ms: Option<u64>,
    /// Frame interval in ms.
    #[arg(long, value_name = "MILLISECONDS")]
    frame_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
struct GenerateArgs {
    /// Number of rows to generate.
    #[arg(long, default_value_t = 10, value_name = "N")]
    count: usize,
}

#[derive(Debug, Clone, Args)]
struct BenchArgs {
    /// Dataset size.
    #[arg(long, default_value_t = 10_000, value_name = "N")]
    rows: usize,
    /// Commits to time per mode.
    #[arg(long, default_value_t = 50, value_name = "K")]
    commits: usize,
    /// Only bench this mode (both when omitted).
    #[arg(long, value_parser = parse_mode, value_name = "MODE")]
    mode: Option<RenderMode>,
    /// Run the expensive computation in unoptimized commits.
    #[arg(long)]
    heavy: bool,
    /// Viewport height in lines.
    #[arg(long, default_value_t = 40, value_name = "LINES")]
    viewport: u16,
    /// RNG seed for generation and mutation.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print config file path.
    Path,
    /// Print effective configuration.
    Show,
    /// Validate configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<LabError> for CliError {
    fn from(err: LabError) -> Self {
        match err {
            LabError::InvalidConfig { .. }
            | LabError::MissingConfig { .. }
            | LabError::ConfigParse { .. } => Self::User(err.to_string()),
            LabError::Serialization { .. } => Self::Internal(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_interactive(cli, args),
        Command::Generate(args) => run_generate(cli, args),
        Command::Bench(args) => run_bench(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── run ────────────────────

fn apply_run_overrides(config: &mut Config, args: &RunArgs) -> Result<(), CliError> {
    if let Some(mode) = args.mode {
        config.lab.mode = mode;
    }
    if let Some(rows) = args.rows {
        config.lab.dataset_size = rows;
    }
    if args.heavy {
        config.lab.heavy_computation = true;
    }
    if let Some(ms) = args.update_ms {
        config.lab.update_interval_ms = ms;
    }
    if let Some(ms) = args.frame_ms {
        config.metrics.frame_interval_ms = ms;
    }
    config.validate()?;
    Ok(())
}

fn run_interactive(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_run_overrides(&mut config, args)?;
    if !io::stdout().is_terminal() {
        return Err(CliError::User(
            "rlab run needs an interactive terminal".to_string(),
        ));
    }
    if cli.verbose {
        eprintln!(
            "[RLAB-CONFIG] mode={} rows={} heavy={} update_ms={} hash={}",
            config.lab.mode,
            config.lab.dataset_size,
            config.lab.heavy_computation,
            config.lab.update_interval_ms,
            config.stable_hash()?,
        );
    }

    let summary = run_lab(
        config,
        RunOptions {
            no_color: cli.no_color,
        },
    )?;

    if cli.quiet {
        return Ok(());
    }
    match output_mode(cli) {
        OutputMode::Human => {
            println!(
                "Session ended after {:.1}s: {} frames, {} data-view commits.",
                summary.uptime.as_secs_f64(),
                summary.frames,
                summary.render_count,
            );
            if summary.boundary_tripped {
                println!("{}", "The view failed during this session.".red());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "run",
                "uptime_secs": summary.uptime.as_secs_f64(),
                "frames": summary.frames,
                "render_count": summary.render_count,
                "boundary_tripped": summary.boundary_tripped,
                "dropped_events": summary.dropped_events,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── generate ────────────────────

fn run_generate(cli: &Cli, args: &GenerateArgs) -> Result<(), CliError> {
    let generated = generate_timed(args.count);
    let mut stdout = io::stdout().lock();

    match output_mode(cli) {
        OutputMode::Human => {
            for record in generated.dataset.iter() {
                writeln!(
                    stdout,
                    "{:<28} {:<12} {:>5}  {:<9} {:<50} {}",
                    record.id,
                    record.label,
                    record.value,
                    record.status.as_str(),
                    record.description,
                    record.last_updated,
                )?;
            }
            if !cli.quiet {
                writeln!(
                    stdout,
                    "{} rows generated in {:.2}ms",
                    generated.dataset.len().to_string().bold(),
                    generated.elapsed.as_secs_f64() * 1_000.0,
                )?;
            }
        }
        OutputMode::Json => {
            for record in generated.dataset.iter() {
                serde_json::to_writer(&mut stdout, &**record)?;
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

// ──────────────────── bench ────────────────────

/// Timings for one mode.
#[derive(Debug, Clone, Serialize)]
struct BenchReport {
    mode: RenderMode,
    rows: usize,
    commits: usize,
    rendered: usize,
    skipped: usize,
    /// Rows formatted from scratch across all commits.
    formatted_rows: usize,
    min_ms: f64,
    mean_ms: f64,
    max_ms: f64,
    checksum: Option<f64>,
}

/// One background mutation between commits, as the lab does with updates on.
fn bench_mode(args: &BenchArgs, config: &Config, mode: RenderMode) -> BenchReport {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut dataset = generate_with(args.rows, &mut rng);
    let mut table = DataTable::new(config.view.row_height, config.view.overscan);
    let viewport = Viewport::new(args.viewport, 0);

    let mut timings = Vec::with_capacity(args.commits);
    let mut skipped = 0;
    let mut formatted_rows = 0;
    let mut checksum = None;

    for round in 0..args.commits {
        if round > 0
            && let Some(mutation) = mutate_random_row(&dataset, &mut rng)
        {
            dataset = mutation.dataset;
        }
        let started = Instant::now();
        let commit = table.commit(CommitInputs {
            dataset: &dataset,
            mode,
            heavy_computation: args.heavy,
            viewport,
        });
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        if commit.rendered() {
            timings.push(elapsed_ms);
            formatted_rows += commit.frame().formatted;
            checksum = commit.frame().checksum.or(checksum);
        } else {
            skipped += 1;
        }
    }

    let (min_ms, max_ms, sum) = timings.iter().fold(
        (f64::INFINITY, 0.0_f64, 0.0_f64),
        |(min, max, sum), &ms| (min.min(ms), max.max(ms), sum + ms),
    );
    #[allow(clippy::cast_precision_loss)]
    let mean_ms = if timings.is_empty() {
        0.0
    } else {
        sum / timings.len() as f64
    };

    BenchReport {
        mode,
        rows: args.rows,
        commits: args.commits,
        rendered: timings.len(),
        skipped,
        formatted_rows,
        min_ms: if timings.is_empty() { 0.0 } else { min_ms },
        mean_ms,
        max_ms,
        checksum,
    }
}

fn run_bench(cli: &Cli, args: &BenchArgs) -> Result<(), CliError> {
    if args.commits == 0 {
        return Err(CliError::User("--commits must be at least 1".to_string()));
    }
    let config = Config::load(cli.config.as_deref())?;
    let modes = args.mode.map_or_else(
        || vec![RenderMode::Unoptimized, RenderMode::Optimized],
        |mode| vec![mode],
    );
    let reports: Vec<BenchReport> = modes
        .into_iter()
        .map(|mode| bench_mode(args, &config, mode))
        .collect();

    match output_mode(cli) {
        OutputMode::Human => {
            for report in &reports {
                let label = match report.mode {
                    RenderMode::Optimized => report.mode.as_str().green(),
                    RenderMode::Unoptimized => report.mode.as_str().red(),
                };
                println!(
                    "{label:<12} rows={} commits={} rendered={} skipped={} formatted={}",
                    report.rows, report.commits, report.rendered, report.skipped, report.formatted_rows,
                );
                println!(
                    "             commit ms  min {:.3}  mean {:.3}  max {:.3}",
                    report.min_ms, report.mean_ms, report.max_ms
                );
                if let Some(checksum) = report.checksum {
                    println!("             checksum   {checksum:.3}");
                }
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "bench",
                "heavy_computation": args.heavy,
                "viewport": args.viewport,
                "results": serde_json::to_value(&reports)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => println!("{}", config.to_toml()?),
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("{} {e}", "Configuration is INVALID:".red());
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("RLAB_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn parses_global_flags_before_and_after_subcommand() {
        let before = Cli::try_parse_from([
            "rlab",
            "--config",
            "/tmp/rlab.toml",
            "--json",
            "--no-color",
            "-v",
            "generate",
        ]);
        assert!(before.is_ok());

        let after = Cli::try_parse_from(["rlab", "generate", "--json", "--no-color", "-q"]);
        assert!(after.is_ok());
    }

    #[test]
    fn parses_every_subcommand() {
        let cases = [
            vec!["rlab", "run", "--mode", "optimized", "--rows", "2000", "--heavy"],
            vec!["rlab", "run", "--update-ms", "300", "--frame-ms", "33"],
            vec!["rlab", "generate", "--count", "0"],
            vec!["rlab", "bench", "--rows", "500", "--commits", "3", "--mode", "unopt"],
            vec!["rlab", "config", "path"],
            vec!["rlab", "config", "show"],
            vec!["rlab", "config", "validate"],
            vec!["rlab", "completions", "zsh"],
        ];

        for case in cases {
            let parsed = Cli::try_parse_from(case.clone());
            assert!(parsed.is_ok(), "failed to parse case: {case:?}");
        }
    }

    #[test]
    fn rejects_unknown_mode_and_conflicting_verbosity() {
        assert!(Cli::try_parse_from(["rlab", "run", "--mode", "turbo"]).is_err());
        assert!(Cli::try_parse_from(["rlab", "-v", "-q", "generate"]).is_err());
    }

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(
            resolve_output_mode(true, Some("human"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, Some("json"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode(false, Some("human"), false),
            OutputMode::Human
        );
        assert_eq!(resolve_output_mode(false, None, true), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None, false), OutputMode::Json);
    }

    #[test]
    fn lab_errors_map_to_exit_codes() {
        let user: CliError = LabError::InvalidConfig {
            details: "x".to_string(),
        }
        .into();
        assert_eq!(user.exit_code(), 1);
        let missing: CliError = LabError::MissingConfig {
            path: PathBuf::from("/nope.toml"),
        }
        .into();
        assert_eq!(missing.exit_code(), 1);
        let runtime: CliError = LabError::Runtime {
            details: "x".to_string(),
        }
        .into();
        assert_eq!(runtime.exit_code(), 2);
    }

    #[test]
    fn run_overrides_are_validated() {
        let mut config = Config::default();
        let args = RunArgs {
            mode: Some(RenderMode::Optimized),
            rows: Some(2_000),
            heavy: true,
            update_ms: Some(300),
            frame_ms: None,
        };
        apply_run_overrides(&mut config, &args).unwrap();
        assert_eq!(config.lab.mode, RenderMode::Optimized);
        assert_eq!(config.lab.dataset_size, 2_000);
        assert!(config.lab.heavy_computation);

        let bad = RunArgs {
            rows: Some(1_500),
            ..RunArgs::default()
        };
        let err = apply_run_overrides(&mut config, &bad).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    fn bench_args(mode: RenderMode) -> BenchArgs {
        BenchArgs {
            rows: 300,
            commits: 4,
            mode: Some(mode),
            heavy: true,
            viewport: 20,
            seed: 7,
        }
    }

    #[test]
    fn unoptimized_bench_formats_everything_each_commit() {
        let report = bench_mode(
            &bench_args(RenderMode::Unoptimized),
            &Config::default(),
            RenderMode::Unoptimized,
        );
        assert_eq!(report.rendered, 4);
        assert_eq!(report.formatted_rows, 4 * 300);
        assert!(report.checksum.is_some());
        assert!(report.min_ms <= report.mean_ms && report.mean_ms <= report.max_ms);
    }

    #[test]
    fn optimized_bench_formats_only_the_window() {
        let report = bench_mode(
            &bench_args(RenderMode::Optimized),
            &Config::default(),
            RenderMode::Optimized,
        );
        assert_eq!(report.commits, 4);
        assert!(report.formatted_rows < 4 * 300);
        assert!(report.checksum.is_none());
    }
}
