//! Activity log as JSON lines.
//!
//! One self-contained JSON object per line, assembled in memory and handed to
//! `write_all` in one piece so a concurrent `tail -f` never sees half a line.
//!
//! When the log file cannot be written the writer degrades instead of failing:
//! log file, then stderr with an `[RLAB-JSONL]` prefix, then silent discard.
//! The lab must never stop because its activity log broke.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{LabError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Kinds of activity recorded by the lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    SessionStop,
    DatasetGenerated,
    RowDeleted,
    RowEdited,
    ModeChanged,
    ConfigChanged,
    MetricsPublished,
    BoundaryTripped,
    /// Back-pressure dropped some events before they reached the writer.
    EventsDropped,
}

/// One log line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp, millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Render mode in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Row count involved (dataset size, rows remaining).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    /// Which setting changed, for `config_changed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Entry stamped with the current UTC time and no optional fields.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            mode: None,
            rows: None,
            row_id: None,
            duration_ms: None,
            fps: None,
            commit_ms: None,
            render_count: None,
            memory_mb: None,
            setting: None,
            value: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    File,
    Stderr,
    Discard,
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Rotate once the file would exceed this many bytes.
    pub max_size_bytes: u64,
    /// Rotated generations kept next to the live file.
    pub max_rotated_files: u32,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            path: config.jsonl_path.clone(),
            max_size_bytes: config.max_size_bytes,
            max_rotated_files: config.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with size-based rotation.
#[derive(Debug)]
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, degrading to stderr if that fails.
    #[must_use]
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::File;
                w.bytes_written = size;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "[RLAB-JSONL] {e}; logging to stderr");
                w.state = WriterState::Stderr;
            }
        }
        w
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[RLAB-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut()
            && w.flush().is_err()
        {
            self.degrade();
        }
    }

    /// Current degradation state.
    #[must_use]
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::File => "file",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.state == WriterState::File
            && self.bytes_written > 0
            && self.bytes_written + len > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::File => {
                let Some(w) = self.writer.as_mut() else {
                    self.degrade();
                    self.write_line(line);
                    return;
                };
                if w.write_all(line.as_bytes()).is_err() {
                    self.degrade();
                    self.write_line(line);
                    return;
                }
                self.bytes_written += len;
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[RLAB-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::File => {
                let _ = writeln!(
                    io::stderr(),
                    "[RLAB-JSONL] write to {} failed; logging to stderr",
                    self.config.path.display()
                );
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        if let Some(mut w) = self.writer.take() {
            let _ = w.flush();
        }
        let base = self.config.path.clone();
        let keep = self.config.max_rotated_files;

        if keep == 0 {
            let _ = fs::remove_file(&base);
        } else {
            // .N is dropped, .N-1 → .N, …, live → .1
            let _ = fs::remove_file(rotated_name(&base, keep));
            for i in (1..keep).rev() {
                let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
            }
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, size)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = size;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create `path` for appending. Returns the file and its current size.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| LabError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LabError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    crate::dataset::record::iso_timestamp(chrono::Utc::now())
}

// ──────────────────────── tests ────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path: PathBuf, max_size_bytes: u64) -> JsonlConfig {
        JsonlConfig {
            path,
            max_size_bytes,
            max_rotated_files: 2,
        }
    }

    #[test]
    fn entries_are_valid_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        let mut writer = JsonlWriter::open(config(path.clone(), 1024 * 1024));

        let mut entry = LogEntry::new(EventType::RowDeleted, Severity::Info);
        entry.row_id = Some("row-1-1700000000000".to_string());
        entry.rows = Some(2);
        writer.write_entry(&entry);
        writer.write_entry(&LogEntry::new(EventType::SessionStop, Severity::Info));
        writer.flush();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "row_deleted");
        assert_eq!(first["severity"], "info");
        assert_eq!(first["rows"], 2);
        assert!(first.get("fps").is_none(), "unset fields are omitted");
        assert_eq!(writer.state(), "file");
    }

    #[test]
    fn missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/activity.jsonl");
        let mut writer = JsonlWriter::open(config(path.clone(), 1024));
        writer.write_entry(&LogEntry::new(EventType::SessionStart, Severity::Info));
        writer.flush();
        assert!(path.exists());
    }

    #[test]
    fn rotation_keeps_bounded_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rot.jsonl");
        let mut writer = JsonlWriter::open(config(path.clone(), 100));

        for _ in 0..10 {
            writer.write_entry(&LogEntry::new(EventType::MetricsPublished, Severity::Info));
        }
        writer.flush();

        assert!(path.exists());
        assert!(rotated_name(&path, 1).exists());
        assert!(rotated_name(&path, 2).exists());
        assert!(!rotated_name(&path, 3).exists());
    }

    #[test]
    fn unwritable_path_degrades_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let mut writer = JsonlWriter::open(config(blocker.join("activity.jsonl"), 1024));
        assert_eq!(writer.state(), "stderr");
        writer.write_entry(&LogEntry::new(EventType::BoundaryTripped, Severity::Critical));
    }

    #[test]
    fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("append.jsonl");
        {
            let mut w = JsonlWriter::open(config(path.clone(), 1024 * 1024));
            w.write_entry(&LogEntry::new(EventType::SessionStart, Severity::Info));
        }
        let w = JsonlWriter::open(config(path.clone(), 1024 * 1024));
        assert!(w.bytes_written() > 0);
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
