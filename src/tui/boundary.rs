//! Error boundary around the whole view.
//!
//! A panic inside [`ErrorBoundary::guard`] is caught, described by a
//! [`FaultReport`], and latches the boundary into its failed state for the
//! rest of the process. Once failed, guarded code never runs again.
//!
//! [`install_panic_capture`] layers a hook over whatever panic hook is
//! current. Inside a guard it records the panic location and a backtrace
//! instead of printing; outside a guard it defers to the previous hook, so
//! the terminal guard still restores the screen for real crashes.

#![allow(missing_docs)]

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

// Panic hooks run on the panicking thread, so per-thread state suffices.
thread_local! {
    static IN_BOUNDARY: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<PanicCapture>> = const { RefCell::new(None) };
}

#[derive(Debug)]
struct PanicCapture {
    location: Option<String>,
    backtrace: String,
}

static INSTALL: Once = Once::new();

/// What the failed boundary shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReport {
    pub message: String,
    /// `file:line:column` of the panic, when captured.
    pub location: Option<String>,
    /// Captured backtrace; empty when the capture hook is not installed.
    pub backtrace: String,
}

impl FaultReport {
    /// Backtrace lines worth showing, capped at `max`.
    #[must_use]
    pub fn trace_lines(&self, max: usize) -> Vec<&str> {
        self.backtrace
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .take(max)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoundaryState {
    #[default]
    Healthy,
    Failed(FaultReport),
}

#[derive(Debug, Default)]
pub struct ErrorBoundary {
    state: BoundaryState,
}

impl ErrorBoundary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// Run `f` unless the boundary already failed. A panic in `f` trips the
    /// boundary and yields `None`.
    pub fn guard<T>(&mut self, f: impl FnOnce() -> T) -> Option<T> {
        if self.is_failed() {
            return None;
        }
        CAPTURED.with(|slot| slot.borrow_mut().take());
        IN_BOUNDARY.with(|flag| flag.set(true));
        let result = panic::catch_unwind(AssertUnwindSafe(f));
        IN_BOUNDARY.with(|flag| flag.set(false));

        match result {
            Ok(value) => Some(value),
            Err(payload) => {
                let capture = CAPTURED.with(|slot| slot.borrow_mut().take());
                self.state = BoundaryState::Failed(FaultReport {
                    message: panic_message(payload.as_ref()),
                    location: capture.as_ref().and_then(|c| c.location.clone()),
                    backtrace: capture.map(|c| c.backtrace).unwrap_or_default(),
                });
                None
            }
        }
    }
}

/// Install the capturing panic hook once per process.
pub fn install_panic_capture() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_BOUNDARY.with(Cell::get) {
                let capture = PanicCapture {
                    location: info
                        .location()
                        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column())),
                    backtrace: Backtrace::force_capture().to_string(),
                };
                CAPTURED.with(|slot| *slot.borrow_mut() = Some(capture));
            } else {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
