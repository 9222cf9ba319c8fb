//! User-visible metrics and their health classes.

#![allow(missing_docs)]

use serde::Serialize;

use super::profiler::RenderStats;
use super::sampler::SampleReport;

/// Color class for a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Good,
    Warning,
    Danger,
    Neutral,
}

/// What the metrics panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub fps: u32,
    pub commit_ms: f64,
    pub render_count: u64,
    pub memory_mb: Option<u64>,
}

impl MetricsSnapshot {
    pub fn apply_sample(&mut self, report: &SampleReport) {
        self.fps = report.fps;
        self.memory_mb = report.memory_mb;
    }

    pub fn apply_render_stats(&mut self, stats: RenderStats) {
        self.render_count = stats.render_count;
        self.commit_ms = stats.commit_ms;
    }

    #[must_use]
    pub fn fps_health(&self) -> Health {
        match self.fps {
            0..30 => Health::Danger,
            30..50 => Health::Warning,
            _ => Health::Good,
        }
    }

    #[must_use]
    pub fn commit_health(&self) -> Health {
        if self.commit_ms > 50.0 {
            Health::Danger
        } else if self.commit_ms > 16.0 {
            Health::Warning
        } else {
            Health::Good
        }
    }

    #[must_use]
    pub fn memory_health(&self) -> Health {
        match self.memory_mb {
            Some(mb) if mb > 200 => Health::Danger,
            _ => Health::Neutral,
        }
    }

    /// `"12.3ms"`.
    #[must_use]
    pub fn commit_label(&self) -> String {
        format!("{:.1}ms", self.commit_ms)
    }

    /// `"42 MB"`, or `"N/A"` when unknown or zero.
    #[must_use]
    pub fn memory_label(&self) -> String {
        match self.memory_mb {
            Some(mb) if mb > 0 => format!("{mb} MB"),
            _ => "N/A".to_string(),
        }
    }
}
