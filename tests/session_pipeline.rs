//! End-to-end session scenarios without a terminal: store notifications,
//! table commits, the error boundary and the activity log working together.

use std::fs;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;

use render_lab::core::config::{Config, LoggingConfig, RenderMode};
use render_lab::dataset::store::StoreEvent;
use render_lab::logger::activity::{ActivityLogger, ActivityLoggerHandle};
use render_lab::metrics::memory::FixedMemory;
use render_lab::session::lab::{LabSession, RowAction, RowActionOutcome};
use render_lab::tui::boundary::{BoundaryState, ErrorBoundary, install_panic_capture};
use render_lab::tui::table::{CommitInputs, DataTable};
use render_lab::tui::window::Viewport;

const MS: Duration = Duration::from_millis(1);

fn config(update_interval_ms: u64) -> Config {
    let mut config = Config::default();
    config.lab.dataset_size = 2_000;
    config.lab.update_interval_ms = update_interval_ms;
    config.view.interaction_lag_ms = 2;
    config
}

fn session(config: Config, logger: ActivityLoggerHandle) -> LabSession {
    LabSession::with_rng(
        config,
        logger,
        Box::new(FixedMemory(64 * 1024 * 1024)),
        StdRng::seed_from_u64(9),
    )
}

#[test]
fn background_updates_reach_subscribers_and_optimized_table() {
    let t0 = Instant::now();
    let mut lab = session(config(100), ActivityLoggerHandle::disabled());
    let events = lab.subscribe();
    lab.start(t0);
    lab.set_mode(RenderMode::Optimized);

    let viewport = Viewport::new(30, 0);
    let mut table = DataTable::new(1, 2);
    let first = table.commit(CommitInputs {
        dataset: &lab.dataset(),
        mode: lab.state().mode,
        heavy_computation: false,
        viewport,
    });
    assert!(first.rendered());
    assert_eq!(first.frame().formatted, 32);

    let tick = lab.on_tick(t0 + 100 * MS);
    let index = tick.mutated.expect("mutation fired");
    let seen: Vec<StoreEvent> = events.try_iter().collect();
    assert!(seen.contains(&StoreEvent::RowMutated { index }));

    let second = table.commit(CommitInputs {
        dataset: &lab.dataset(),
        mode: lab.state().mode,
        heavy_computation: false,
        viewport,
    });
    assert!(second.rendered());
    let expected = usize::from(second.frame().range.contains(&index));
    assert_eq!(second.frame().formatted, expected);

    let third = table.commit(CommitInputs {
        dataset: &lab.dataset(),
        mode: lab.state().mode,
        heavy_computation: false,
        viewport,
    });
    assert!(!third.rendered(), "unchanged inputs skip the commit");
}

#[test]
fn unoptimized_heavy_commit_touches_every_row() {
    let mut lab = session(config(0), ActivityLoggerHandle::disabled());
    lab.start(Instant::now());
    lab.set_heavy_computation(true);

    let mut table = DataTable::new(1, 2);
    let dataset = lab.dataset();
    let inputs = CommitInputs {
        dataset: &dataset,
        mode: RenderMode::Unoptimized,
        heavy_computation: lab.state().heavy_computation,
        viewport: Viewport::new(30, 0),
    };
    let a = table.commit(inputs);
    let b = table.commit(inputs);
    assert!(a.rendered() && b.rendered());
    assert_eq!(b.frame().formatted, 2_000);
    assert_eq!(a.frame().checksum, b.frame().checksum);
}

#[test]
fn boundary_latches_after_a_faulting_commit() {
    install_panic_capture();
    let mut boundary = ErrorBoundary::new();
    let lab = session(config(0), ActivityLoggerHandle::disabled());

    let out: Option<usize> = boundary.guard(|| {
        let rows = lab.dataset().len();
        assert!(rows > 0, "data view exploded on an empty dataset");
        rows
    });
    assert!(out.is_none());
    let BoundaryState::Failed(report) = boundary.state() else {
        panic!("expected failed boundary");
    };
    assert!(report.message.contains("data view exploded"));
    assert!(boundary.guard(|| 1).is_none());
}

#[test]
fn activity_log_records_the_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity.jsonl");
    let logger = ActivityLogger::start(&LoggingConfig {
        enabled: true,
        jsonl_path: path.clone(),
        max_size_bytes: 1024 * 1024,
        max_rotated_files: 1,
    })
    .expect("logger starts");

    let t0 = Instant::now();
    let mut lab = session(config(0), logger.handle());
    lab.start(t0);
    lab.toggle_mode();
    let victim = lab.dataset().get(0).expect("row").id.clone();
    let outcome = lab.row_action(RowAction::Delete, &victim);
    assert!(matches!(outcome, RowActionOutcome::Deleted { remaining: 1_999, .. }));
    lab.shutdown("test", t0 + 10 * MS);
    logger.shutdown();

    let raw = fs::read_to_string(&path).expect("log written");
    let events: Vec<String> = raw
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).expect("JSON line"))
        .map(|v| v["event"].as_str().unwrap_or_default().to_string())
        .collect();
    for expected in [
        "dataset_generated",
        "session_start",
        "mode_changed",
        "row_deleted",
        "session_stop",
    ] {
        assert!(
            events.iter().any(|e| e == expected),
            "missing {expected} in {events:?}"
        );
    }
}
