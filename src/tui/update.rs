//! Pure update function for the lab screen.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side effects the runtime should execute.
//! This module performs no I/O.

use super::input::{InputAction, resolve_key_event};
use super::model::{LabCmd, LabModel, LabMsg, NotificationLevel, edit_notice};
use crate::session::lab::{RowAction, RowActionOutcome};
use crate::tui::boundary::BoundaryState;

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut LabModel, msg: LabMsg) -> LabCmd {
    match msg {
        LabMsg::Key(key) => {
            let resolution = resolve_key_event(&key, model.help_open);
            resolution
                .action
                .map_or(LabCmd::None, |action| apply_input_action(model, action))
        }

        LabMsg::Resize { cols, rows } => {
            model.terminal_size = (cols, rows);
            model.sync_viewport();
            LabCmd::None
        }

        LabMsg::StateChanged(state) => {
            model.state = state;
            // Rows may have been deleted under the cursor.
            model.select(model.selected);
            LabCmd::None
        }

        LabMsg::MetricsUpdated(metrics) => {
            model.metrics = metrics;
            LabCmd::None
        }

        LabMsg::FrameCommitted(frame) => {
            model.frame = Some(frame);
            LabCmd::None
        }

        LabMsg::RowActionDone(outcome) => {
            let (level, message) = match outcome {
                RowActionOutcome::Edited { id, .. } => (NotificationLevel::Info, edit_notice(&id)),
                RowActionOutcome::Deleted { id, remaining, .. } => (
                    NotificationLevel::Info,
                    format!("Deleted {id}, {remaining} rows left"),
                ),
                RowActionOutcome::Missing { id } => (
                    NotificationLevel::Warning,
                    format!("Row {id} no longer exists"),
                ),
            };
            notify(model, level, message)
        }

        LabMsg::ControlRejected(reason) => notify(model, NotificationLevel::Warning, reason),

        LabMsg::NotificationExpired(id) => {
            if model.notification.as_ref().is_some_and(|n| n.id == id) {
                model.notification = None;
            }
            LabCmd::None
        }

        LabMsg::BoundaryTripped(report) => {
            model.boundary = BoundaryState::Failed(report);
            LabCmd::None
        }
    }
}

fn notify(model: &mut LabModel, level: NotificationLevel, message: String) -> LabCmd {
    let id = model.push_notification(level, message);
    LabCmd::ScheduleNotificationExpiry {
        id,
        after: model.notification_ttl,
    }
}

fn apply_input_action(model: &mut LabModel, action: InputAction) -> LabCmd {
    match action {
        InputAction::Quit => {
            model.quit = true;
            LabCmd::Quit
        }
        InputAction::ToggleMode => LabCmd::ToggleMode,
        InputAction::SetMode(mode) => {
            if mode == model.mode() {
                LabCmd::None
            } else {
                LabCmd::SetMode(mode)
            }
        }
        InputAction::GrowDataset => LabCmd::StepDatasetSize { increase: true },
        InputAction::ShrinkDataset => LabCmd::StepDatasetSize { increase: false },
        InputAction::Regenerate => LabCmd::Regenerate,
        InputAction::ToggleHeavy => LabCmd::ToggleHeavy,
        InputAction::SlowerUpdates => LabCmd::StepUpdateInterval { increase: true },
        InputAction::FasterUpdates => LabCmd::StepUpdateInterval { increase: false },
        InputAction::CursorUp => move_selection(model, -1),
        InputAction::CursorDown => move_selection(model, 1),
        InputAction::PageUp => {
            let page = isize::try_from(model.page_rows()).unwrap_or(isize::MAX);
            move_selection(model, -page)
        }
        InputAction::PageDown => {
            let page = isize::try_from(model.page_rows()).unwrap_or(isize::MAX);
            move_selection(model, page)
        }
        InputAction::Home => {
            model.select(0);
            LabCmd::None
        }
        InputAction::End => {
            model.select(usize::MAX);
            LabCmd::None
        }
        InputAction::EditRow => row_action(model, RowAction::Edit),
        InputAction::DeleteRow => row_action(model, RowAction::Delete),
        InputAction::ToggleHelp => {
            model.help_open = !model.help_open;
            LabCmd::None
        }
        InputAction::CloseHelp => {
            model.help_open = false;
            LabCmd::None
        }
    }
}

fn move_selection(model: &mut LabModel, delta: isize) -> LabCmd {
    model.select_by(delta);
    LabCmd::None
}

fn row_action(model: &LabModel, action: RowAction) -> LabCmd {
    model
        .selected_id()
        .map_or(LabCmd::None, |id| LabCmd::RowAction {
            action,
            id: id.to_string(),
        })
}
