//! Background activity logger.
//!
//! A dedicated thread owns the [`JsonlWriter`]. Everything else holds an
//! [`ActivityLoggerHandle`] and sends [`ActivityEvent`]s over a bounded
//! crossbeam channel with `try_send`, so the lab loop never waits on disk.
//! Events that do not fit are counted and reported by the logger thread on
//! its next write.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::config::{LoggingConfig, RenderMode};
use crate::core::errors::{LabError, Result};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

const CHANNEL_CAPACITY: usize = 1024;

// ──────────────────── public event type ────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    SessionStarted {
        version: String,
        config_hash: String,
        mode: RenderMode,
        rows: usize,
    },
    SessionStopped {
        reason: String,
        uptime: Duration,
        render_count: u64,
    },
    DatasetGenerated {
        rows: usize,
        elapsed: Duration,
    },
    RowDeleted {
        id: String,
        remaining: usize,
        mode: RenderMode,
    },
    RowEdited {
        id: String,
        mode: RenderMode,
        lag: Duration,
    },
    ModeChanged {
        from: RenderMode,
        to: RenderMode,
    },
    ConfigChanged {
        setting: &'static str,
        value: String,
    },
    MetricsPublished {
        fps: u32,
        commit_ms: f64,
        render_count: u64,
        memory_mb: Option<u64>,
    },
    BoundaryTripped {
        message: String,
        location: Option<String>,
    },
    /// Sentinel asking the logger thread to flush and exit.
    Shutdown,
}

// ──────────────────── public handle ────────────────────

/// Cheaply cloneable, non-blocking sender for activity events.
///
/// A disabled handle accepts every event and drops it.
#[derive(Debug, Clone)]
pub struct ActivityLoggerHandle {
    tx: Option<Sender<ActivityEvent>>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Handle that discards everything; used when logging is off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an event. Never blocks; a full channel bumps the drop counter.
    pub fn send(&self, event: ActivityEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(TrySendError::Full(_)) = tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
        // Disconnected only happens during shutdown.
    }

    /// Events dropped since the logger last reported them.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Ask the logger thread to flush and exit.
    pub fn shutdown(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(ActivityEvent::Shutdown);
        }
    }
}

// ──────────────────── spawn ────────────────────

/// Running logger: the handle plus the thread to join on shutdown.
#[derive(Debug)]
pub struct ActivityLogger {
    handle: ActivityLoggerHandle,
    join: Option<thread::JoinHandle<()>>,
}

impl ActivityLogger {
    /// Start logging per `config`; a disabled config yields a no-op logger.
    pub fn start(config: &LoggingConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self {
                handle: ActivityLoggerHandle::disabled(),
                join: None,
            });
        }
        let (handle, join) = spawn_logger(JsonlConfig::from(config), CHANNEL_CAPACITY)?;
        Ok(Self {
            handle,
            join: Some(join),
        })
    }

    #[must_use]
    pub fn handle(&self) -> ActivityLoggerHandle {
        self.handle.clone()
    }

    /// Send the shutdown sentinel and wait for pending events to be written.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.shutdown();
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            eprintln!("[RLAB-SHUTDOWN] activity logger thread panicked");
        }
    }
}

impl Drop for ActivityLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the logger thread over a channel of `capacity` events.
pub fn spawn_logger(
    config: JsonlConfig,
    capacity: usize,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx: Some(tx),
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("rlab-logger".to_string())
        .spawn(move || logger_thread_main(&rx, config, &dropped_clone))
        .map_err(|e| LabError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

// ──────────────────── logger thread ────────────────────

fn logger_thread_main(rx: &Receiver<ActivityEvent>, config: JsonlConfig, dropped: &AtomicU64) {
    let mut jsonl = JsonlWriter::open(config);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogEntry::new(EventType::EventsDropped, Severity::Warning);
            warn.details = Some(format!("{d} activity events dropped due to back-pressure"));
            jsonl.write_entry(&warn);
        }

        if event == ActivityEvent::Shutdown {
            break;
        }
        jsonl.write_entry(&to_log_entry(&event));

        if rx.is_empty() {
            jsonl.flush();
        }
    }

    jsonl.flush();
}

// ──────────────────── event conversion ────────────────────

fn to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::SessionStarted {
            version,
            config_hash,
            mode,
            rows,
        } => {
            let mut e = LogEntry::new(EventType::SessionStart, Severity::Info);
            e.mode = Some(mode.to_string());
            e.rows = Some(*rows as u64);
            e.details = Some(format!("version={version} config_hash={config_hash}"));
            e
        }
        ActivityEvent::SessionStopped {
            reason,
            uptime,
            render_count,
        } => {
            let mut e = LogEntry::new(EventType::SessionStop, Severity::Info);
            e.render_count = Some(*render_count);
            e.details = Some(format!("reason={reason} uptime={}s", uptime.as_secs()));
            e
        }
        ActivityEvent::DatasetGenerated { rows, elapsed } => {
            let mut e = LogEntry::new(EventType::DatasetGenerated, Severity::Info);
            e.rows = Some(*rows as u64);
            e.duration_ms = Some(millis(*elapsed));
            e
        }
        ActivityEvent::RowDeleted {
            id,
            remaining,
            mode,
        } => {
            let mut e = LogEntry::new(EventType::RowDeleted, Severity::Info);
            e.row_id = Some(id.clone());
            e.rows = Some(*remaining as u64);
            e.mode = Some(mode.to_string());
            e
        }
        ActivityEvent::RowEdited { id, mode, lag } => {
            let mut e = LogEntry::new(EventType::RowEdited, Severity::Info);
            e.row_id = Some(id.clone());
            e.mode = Some(mode.to_string());
            e.duration_ms = Some(millis(*lag));
            e
        }
        ActivityEvent::ModeChanged { from, to } => {
            let mut e = LogEntry::new(EventType::ModeChanged, Severity::Info);
            e.mode = Some(to.to_string());
            e.details = Some(format!("{from}->{to}"));
            e
        }
        ActivityEvent::ConfigChanged { setting, value } => {
            let mut e = LogEntry::new(EventType::ConfigChanged, Severity::Info);
            e.setting = Some((*setting).to_string());
            e.value = Some(value.clone());
            e
        }
        ActivityEvent::MetricsPublished {
            fps,
            commit_ms,
            render_count,
            memory_mb,
        } => {
            let mut e = LogEntry::new(EventType::MetricsPublished, Severity::Info);
            e.fps = Some(*fps);
            e.commit_ms = Some(*commit_ms);
            e.render_count = Some(*render_count);
            e.memory_mb = *memory_mb;
            e
        }
        ActivityEvent::BoundaryTripped { message, location } => {
            let mut e = LogEntry::new(EventType::BoundaryTripped, Severity::Critical);
            e.details = Some(match location {
                Some(loc) => format!("{message} at {loc}"),
                None => message.clone(),
            });
            e
        }
        ActivityEvent::Shutdown => LogEntry::new(EventType::SessionStop, Severity::Info),
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
