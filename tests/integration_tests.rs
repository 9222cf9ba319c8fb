//! Integration tests: CLI smoke tests and end-to-end command scenarios.

mod common;

use std::collections::HashSet;
use std::fs;

use serde_json::Value;

fn json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: rlab [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("rlab"),
        "missing version output; log: {}",
        result.log_path.display()
    );
}

#[test]
fn subcommand_help_flags_work() {
    for sub in ["run", "generate", "bench", "config", "completions"] {
        let result = common::run_cli_case(&format!("subcommand_help_{sub}"), &[sub, "--help"]);
        assert!(
            result.status.success(),
            "{sub} --help failed; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn generate_json_emits_valid_distinct_rows() {
    let result = common::run_cli_case(
        "generate_json_emits_valid_distinct_rows",
        &["generate", "--count", "25", "--json"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let rows = json_lines(&result.stdout);
    assert_eq!(rows.len(), 25, "log: {}", result.log_path.display());

    let mut ids = HashSet::new();
    for (index, row) in rows.iter().enumerate() {
        let id = row["id"].as_str().expect("id");
        assert!(ids.insert(id.to_string()), "duplicate id {id}");
        assert_eq!(row["label"], format!("Item {index}"));
        assert!(row["value"].as_u64().expect("value") < 10_000);
        let status = row["status"].as_str().expect("status");
        assert!(["Active", "Pending", "Archived", "Critical"].contains(&status));
        let description = row["description"].as_str().expect("description");
        assert!((20..50).contains(&description.len()));
        assert!(description.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(row["lastUpdated"].as_str().expect("lastUpdated").ends_with('Z'));
    }
}

#[test]
fn generate_zero_rows_prints_nothing() {
    let result = common::run_cli_case(
        "generate_zero_rows_prints_nothing",
        &["generate", "--count", "0", "--json"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.trim().is_empty());
}

#[test]
fn human_generate_reports_row_count() {
    let result = common::run_cli_case_with_env(
        "human_generate_reports_row_count",
        &["--no-color", "generate", "--count", "3"],
        &[("RLAB_OUTPUT_FORMAT", "human")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Item 2"));
    assert!(result.stdout.contains("3 rows generated"));
}

#[test]
fn bench_compares_both_modes() {
    let result = common::run_cli_case(
        "bench_compares_both_modes",
        &[
            "bench", "--rows", "400", "--commits", "5", "--heavy", "--json",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let payload = &json_lines(&result.stdout)[0];
    assert_eq!(payload["command"], "bench");
    let results = payload["results"].as_array().expect("results");
    assert_eq!(results.len(), 2);

    let unopt = &results[0];
    let opt = &results[1];
    assert_eq!(unopt["mode"], "unoptimized");
    assert_eq!(opt["mode"], "optimized");
    assert_eq!(unopt["formatted_rows"], 5 * 400);
    assert!(unopt["checksum"].is_number());
    assert!(opt["checksum"].is_null());
    assert!(
        opt["formatted_rows"].as_u64().expect("formatted") < 5 * 400,
        "optimized commits should reuse rows; log: {}",
        result.log_path.display()
    );
}

#[test]
fn bench_rejects_zero_commits() {
    let result = common::run_cli_case(
        "bench_rejects_zero_commits",
        &["bench", "--commits", "0"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn config_path_reports_missing_default_file() {
    let result = common::run_cli_case(
        "config_path_reports_missing_default_file",
        &["config", "path", "--json"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = &json_lines(&result.stdout)[0];
    assert_eq!(payload["exists"], false);
    assert!(
        payload["path"]
            .as_str()
            .expect("path")
            .ends_with(".config/rlab/config.toml")
    );
}

#[test]
fn config_show_and_validate_read_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rlab.toml");
    fs::write(
        &path,
        "[lab]\nmode = \"optimized\"\ndataset_size = 5000\nupdate_interval_ms = 200\n",
    )
    .expect("write config");
    let path_str = path.to_string_lossy().to_string();

    let show = common::run_cli_case(
        "config_show_reads_file",
        &["--config", &path_str, "config", "show", "--json"],
    );
    assert!(show.status.success(), "log: {}", show.log_path.display());
    let payload = &json_lines(&show.stdout)[0];
    assert_eq!(payload["config"]["lab"]["mode"], "optimized");
    assert_eq!(payload["config"]["lab"]["dataset_size"], 5000);
    assert_eq!(payload["config"]["metrics"]["render_poll_ms"], 500);

    let validate = common::run_cli_case(
        "config_validate_reads_file",
        &["--config", &path_str, "config", "validate", "--json"],
    );
    assert!(validate.status.success(), "log: {}", validate.log_path.display());
    let payload = &json_lines(&validate.stdout)[0];
    assert_eq!(payload["valid"], true);
    assert_eq!(payload["hash"].as_str().map(str::len), Some(16));
}

#[test]
fn invalid_config_exits_with_user_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[lab]\ndataset_size = 1500\n").expect("write config");
    let path_str = path.to_string_lossy().to_string();

    let result = common::run_cli_case(
        "invalid_config_exits_with_user_error",
        &["--config", &path_str, "config", "validate", "--json"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    let payload = &json_lines(&result.stdout)[0];
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["code"], "LAB-1001");
}

#[test]
fn missing_explicit_config_is_a_user_error() {
    let result = common::run_cli_case(
        "missing_explicit_config_is_a_user_error",
        &["--config", "/nonexistent/rlab.toml", "config", "show"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("LAB-1002"));
}

#[test]
fn env_override_is_validated() {
    let result = common::run_cli_case_with_env(
        "env_override_is_validated",
        &["config", "validate", "--json"],
        &[("RLAB_LAB_UPDATE_INTERVAL_MS", "150")],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn run_requires_a_terminal() {
    let result = common::run_cli_case("run_requires_a_terminal", &["run"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("interactive terminal"));
}

#[test]
fn completions_mention_binary_name() {
    let result = common::run_cli_case("completions_mention_binary_name", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("rlab"));
}
