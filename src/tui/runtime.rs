//! Interactive lab runtime: the cooperative event loop.
//!
//! One thread drives everything. Each iteration waits for input until the
//! next frame or timer deadline, fires due timers, folds store events into the
//! model, commits the data table, draws, and feeds the frame to the metrics
//! sampler. Every step that touches the view runs inside the error boundary.

#![allow(missing_docs)]

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use crossterm::event::{self, Event};

use super::boundary::{BoundaryState, ErrorBoundary, install_panic_capture};
use super::input::{InputAction, resolve_key_event};
use super::model::{LabCmd, LabModel, LabMsg};
use super::render::draw;
use super::table::{CommitInputs, DataTable};
use super::terminal_guard::TerminalGuard;
use super::theme::{AccessibilityProfile, Theme};
use super::update::update;
use crate::core::config::Config;
use crate::core::errors::{LabError, Result};
use crate::dataset::store::StoreEvent;
use crate::logger::activity::{ActivityEvent, ActivityLogger};
use crate::metrics::memory::ProcessMemory;
use crate::session::lab::LabSession;
use crate::tui::window::Viewport;

/// Options that do not live in the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub no_color: bool,
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub uptime: Duration,
    pub frames: u64,
    pub render_count: u64,
    pub boundary_tripped: bool,
    pub dropped_events: u64,
}

/// Pending notification expiries.
#[derive(Debug, Default)]
struct Expiries {
    pending: Vec<(Instant, u64)>,
}

impl Expiries {
    fn schedule(&mut self, at: Instant, id: u64) {
        self.pending.push((at, id));
    }

    fn take_due(&mut self, now: Instant) -> Vec<u64> {
        let mut due = Vec::new();
        self.pending.retain(|&(at, id)| {
            if at <= now {
                due.push(id);
                false
            } else {
                true
            }
        });
        due
    }

    fn next(&self) -> Option<Instant> {
        self.pending.iter().map(|&(at, _)| at).min()
    }
}

/// Run the interactive lab until the user quits.
pub fn run_lab(config: Config, options: RunOptions) -> Result<RunSummary> {
    let logger = ActivityLogger::start(&config.logging)?;
    let mut session = LabSession::new(config.clone(), logger.handle(), Box::new(ProcessMemory));
    let events = session.subscribe();
    let started = Instant::now();
    session.start(started);

    let guard = TerminalGuard::new().map_err(|source| LabError::Terminal { source })?;
    // Layered over the guard's hook so crashes outside the boundary still
    // restore the terminal.
    install_panic_capture();

    let result = event_loop(&mut session, &events, &config, options);

    drop(guard);
    let now = Instant::now();
    let reason = if result.is_ok() { "user quit" } else { "error" };
    session.shutdown(reason, now);
    let dropped_events = session.logger().dropped_events();
    logger.shutdown();
    if dropped_events > 0 {
        eprintln!("[RLAB-SHUTDOWN] {dropped_events} activity events were dropped");
    }

    let (frames, boundary_tripped) = result?;
    Ok(RunSummary {
        uptime: now.saturating_duration_since(started),
        frames,
        render_count: session.profiler().render_count(),
        boundary_tripped,
        dropped_events,
    })
}

fn event_loop(
    session: &mut LabSession,
    events: &Receiver<StoreEvent>,
    config: &Config,
    options: RunOptions,
) -> Result<(u64, bool)> {
    let theme = Theme::new(AccessibilityProfile::from_environment(options.no_color));
    let frame_interval = config.metrics.frame_interval();
    let mut model = LabModel::new(config, session.state().clone(), TerminalGuard::terminal_size());
    let mut table = DataTable::new(config.view.row_height, config.view.overscan);
    let mut boundary = ErrorBoundary::new();
    let mut expiries = Expiries::default();
    let mut stdout = io::stdout();

    let mut frames: u64 = 0;
    let mut table_dirty = true;
    let mut committed_viewport: Option<Viewport> = None;
    let mut next_frame = Instant::now();
    let mut buffer: Vec<u8> = Vec::new();

    while !model.quit {
        let now = Instant::now();
        let wake = [Some(next_frame), session.next_deadline(), expiries.next()]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(next_frame);
        let wait = wake.saturating_duration_since(now);

        if event::poll(wait).map_err(|source| LabError::Terminal { source })? {
            let msg = match event::read().map_err(|source| LabError::Terminal { source })? {
                Event::Key(key) => Some(LabMsg::Key(key)),
                Event::Resize(cols, rows) => Some(LabMsg::Resize { cols, rows }),
                _ => None,
            };
            if let Some(msg) = msg {
                if boundary.is_failed() {
                    handle_after_fault(&mut model, &msg);
                } else {
                    guarded(&mut boundary, session, &mut model, |session, model| {
                        let cmd = update(model, msg);
                        execute(cmd, session, model, &mut expiries);
                    });
                }
            }
        }

        let now = Instant::now();
        let tick = session.on_tick(now);

        let mut state_changed = false;
        for event in events.try_iter() {
            state_changed = true;
            table_dirty |= event.affects_table();
        }
        let expired = expiries.take_due(now);
        guarded(&mut boundary, session, &mut model, |session, model| {
            if state_changed {
                update(model, LabMsg::StateChanged(session.state().clone()));
            }
            if tick.stats_published {
                update(model, LabMsg::MetricsUpdated(session.metrics()));
            }
            for id in expired {
                update(model, LabMsg::NotificationExpired(id));
            }
        });

        if now < next_frame {
            continue;
        }
        next_frame = now + frame_interval;

        let recommit = table_dirty || committed_viewport != Some(model.viewport);
        table_dirty = false;
        committed_viewport = Some(model.viewport);
        render_frame(
            &mut buffer,
            session,
            &mut model,
            &mut table,
            &mut boundary,
            &theme,
            recommit,
        )
        .map_err(|source| LabError::Terminal { source })?;
        stdout
            .write_all(&buffer)
            .and_then(|()| stdout.flush())
            .map_err(|source| LabError::Terminal { source })?;

        frames += 1;
        if session.on_frame(Instant::now()).is_some() {
            guarded(&mut boundary, session, &mut model, |session, model| {
                update(model, LabMsg::MetricsUpdated(session.metrics()));
            });
        }
    }

    Ok((frames, boundary.is_failed()))
}

/// Run one step of the view inside the boundary. The first fault is logged
/// and latches the model into the fault screen; later calls do nothing.
fn guarded<T>(
    boundary: &mut ErrorBoundary,
    session: &mut LabSession,
    model: &mut LabModel,
    step: impl FnOnce(&mut LabSession, &mut LabModel) -> T,
) -> Option<T> {
    if boundary.is_failed() {
        return None;
    }
    let out = boundary.guard(|| step(&mut *session, &mut *model));
    if out.is_none()
        && let BoundaryState::Failed(report) = boundary.state()
    {
        session.logger().send(ActivityEvent::BoundaryTripped {
            message: report.message.clone(),
            location: report.location.clone(),
        });
        update(model, LabMsg::BoundaryTripped(report.clone()));
    }
    out
}

/// After a fault only quitting and resizing are honored.
fn handle_after_fault(model: &mut LabModel, msg: &LabMsg) {
    match msg {
        LabMsg::Key(key) => {
            if resolve_key_event(key, false).action == Some(InputAction::Quit) {
                model.quit = true;
            }
        }
        LabMsg::Resize { cols, rows } => model.terminal_size = (*cols, *rows),
        _ => {}
    }
}

/// Commit the table when needed and draw the frame into `buffer`, all inside
/// the boundary. If anything faults, `buffer` holds the fault screen instead.
fn render_frame(
    buffer: &mut Vec<u8>,
    session: &mut LabSession,
    model: &mut LabModel,
    table: &mut DataTable,
    boundary: &mut ErrorBoundary,
    theme: &Theme,
    recommit: bool,
) -> io::Result<()> {
    buffer.clear();
    let drawn = guarded(boundary, session, model, |session, model| {
        if recommit {
            commit_table(session, model, table);
        }
        draw(&mut *buffer, model, theme)
    });
    match drawn {
        Some(result) => result,
        None => {
            buffer.clear();
            draw(buffer, model, theme)
        }
    }
}

/// Commit the data table and record the duration of rendered commits.
fn commit_table(session: &LabSession, model: &mut LabModel, table: &mut DataTable) {
    let state = session.state();
    let inputs = CommitInputs {
        dataset: &state.dataset,
        mode: state.mode,
        heavy_computation: state.heavy_computation,
        viewport: model.viewport,
    };
    let started = Instant::now();
    let commit = table.commit(inputs);
    let elapsed = started.elapsed();
    if commit.rendered() {
        session.record_commit(elapsed);
        update(model, LabMsg::FrameCommitted(Arc::clone(commit.frame())));
    }
}

/// Execute a command against the session, feeding results back through
/// `update`.
fn execute(cmd: LabCmd, session: &mut LabSession, model: &mut LabModel, expiries: &mut Expiries) {
    let follow_up = match cmd {
        LabCmd::None | LabCmd::Quit => return,
        LabCmd::Batch(cmds) => {
            for cmd in cmds {
                execute(cmd, session, model, expiries);
            }
            return;
        }
        LabCmd::ToggleMode => {
            session.toggle_mode();
            return;
        }
        LabCmd::SetMode(mode) => {
            session.set_mode(mode);
            return;
        }
        LabCmd::Regenerate => {
            session.regenerate();
            return;
        }
        LabCmd::ToggleHeavy => {
            session.toggle_heavy_computation();
            return;
        }
        LabCmd::StepDatasetSize { increase } => match session.step_dataset_size(increase) {
            Ok(_) => return,
            Err(err) => update(model, LabMsg::ControlRejected(err.to_string())),
        },
        LabCmd::StepUpdateInterval { increase } => {
            match session.step_update_interval(increase, Instant::now()) {
                Ok(_) => return,
                Err(err) => update(model, LabMsg::ControlRejected(err.to_string())),
            }
        }
        LabCmd::RowAction { action, id } => {
            let outcome = session.row_action(action, &id);
            update(model, LabMsg::RowActionDone(outcome))
        }
        LabCmd::ScheduleNotificationExpiry { id, after } => {
            expiries.schedule(Instant::now() + after, id);
            return;
        }
    };
    execute(follow_up, session, model, expiries);
}
