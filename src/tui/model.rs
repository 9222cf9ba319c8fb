//! Elm-style state model for the lab screen.
//!
//! All display state lives in [`LabModel`]. Input and session events arrive
//! as [`LabMsg`] values; side effects are described by [`LabCmd`] values that
//! the runtime executes against the session. No I/O happens here.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::core::config::{Config, RenderMode};
use crate::dataset::store::LabState;
use crate::metrics::snapshot::MetricsSnapshot;
use crate::session::lab::{RowAction, RowActionOutcome};
use crate::tui::boundary::{BoundaryState, FaultReport};
use crate::tui::layout::build_layout;
use crate::tui::table::TableFrame;
use crate::tui::window::Viewport;

/// Text shown after an edit action.
#[must_use]
pub fn edit_notice(id: &str) -> String {
    format!("Edit {id} clicked. In Unoptimized mode, did you feel the lag?")
}

// ──────────────────── notifications ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// Transient toast shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic id used to match expiry.
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

// ──────────────────── model ────────────────────

#[derive(Debug, Clone)]
pub struct LabModel {
    /// Latest store snapshot.
    pub state: LabState,
    pub metrics: MetricsSnapshot,
    /// Latest committed table frame.
    pub frame: Option<Arc<TableFrame>>,
    /// Selected row index.
    pub selected: usize,
    pub viewport: Viewport,
    pub row_height: u16,
    pub terminal_size: (u16, u16),
    pub help_open: bool,
    pub notification: Option<Notification>,
    next_notification_id: u64,
    pub notification_ttl: Duration,
    pub boundary: BoundaryState,
    pub quit: bool,
}

impl LabModel {
    #[must_use]
    pub fn new(config: &Config, state: LabState, terminal_size: (u16, u16)) -> Self {
        let mut model = Self {
            state,
            metrics: MetricsSnapshot::default(),
            frame: None,
            selected: 0,
            viewport: Viewport::default(),
            row_height: config.view.row_height.max(1),
            terminal_size,
            help_open: false,
            notification: None,
            next_notification_id: 0,
            notification_ttl: config.view.notification_ttl(),
            boundary: BoundaryState::Healthy,
            quit: false,
        };
        model.sync_viewport();
        model
    }

    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.state.mode
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.state.dataset.len()
    }

    /// Id of the selected row, if the dataset is non-empty.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.state.dataset.get(self.selected).map(|r| r.id.as_str())
    }

    /// Rows moved by one page.
    #[must_use]
    pub fn page_rows(&self) -> usize {
        self.viewport.rows_fitting(self.row_height).max(1)
    }

    /// Push a notification, replacing the current one. Returns its id.
    pub fn push_notification(&mut self, level: NotificationLevel, message: String) -> u64 {
        self.next_notification_id += 1;
        let id = self.next_notification_id;
        self.notification = Some(Notification { id, level, message });
        id
    }

    /// Move the selection, clamped to the dataset.
    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.row_count().saturating_sub(1));
        self.sync_viewport();
    }

    pub fn select_by(&mut self, delta: isize) {
        self.select(self.selected.saturating_add_signed(delta));
    }

    /// Recompute the viewport for the terminal size and keep the selection
    /// on screen.
    pub fn sync_viewport(&mut self) {
        let (cols, rows) = self.terminal_size;
        let height = build_layout(cols, rows).table_height;
        let max_offset = (self.row_count() * usize::from(self.row_height))
            .saturating_sub(usize::from(height));
        let current = Viewport::new(height, self.viewport.scroll_offset.min(max_offset));
        self.viewport = current.scrolled_to(self.selected, self.row_height);
    }
}

// ──────────────────── messages ────────────────────

#[derive(Debug, Clone)]
pub enum LabMsg {
    Key(KeyEvent),
    Resize { cols: u16, rows: u16 },
    /// The store changed; carries the new snapshot.
    StateChanged(LabState),
    MetricsUpdated(MetricsSnapshot),
    FrameCommitted(Arc<TableFrame>),
    RowActionDone(RowActionOutcome),
    /// A control change was refused (e.g. out of range).
    ControlRejected(String),
    NotificationExpired(u64),
    BoundaryTripped(FaultReport),
}

// ──────────────────── commands ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabCmd {
    None,
    Quit,
    Batch(Vec<Self>),
    ToggleMode,
    SetMode(RenderMode),
    StepDatasetSize { increase: bool },
    Regenerate,
    ToggleHeavy,
    StepUpdateInterval { increase: bool },
    RowAction { action: RowAction, id: String },
    ScheduleNotificationExpiry { id: u64, after: Duration },
}
