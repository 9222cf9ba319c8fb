//! Frame-rate and memory sampler.
//!
//! The runtime loop calls [`MetricsSampler::on_frame`] once per drawn frame.
//! Frames are counted into a window; once the window has lasted at least the
//! configured span the sampler emits one [`SampleReport`] and starts a new
//! window. Between reports nothing is published, however fast frames arrive.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use super::memory::MemoryProbe;

/// One published sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport {
    pub fps: u32,
    pub memory_mb: Option<u64>,
    pub frames: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    frames: u64,
}

/// Windowed frame counter with an optional memory probe.
pub struct MetricsSampler {
    window_span: Duration,
    probe: Box<dyn MemoryProbe>,
    window: Option<Window>,
}

impl std::fmt::Debug for MetricsSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSampler")
            .field("window_span", &self.window_span)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl MetricsSampler {
    #[must_use]
    pub fn new(window_span: Duration, probe: Box<dyn MemoryProbe>) -> Self {
        Self {
            window_span,
            probe,
            window: None,
        }
    }

    /// Open a fresh window at `now`. Restarting a running sampler discards
    /// the partial window.
    pub fn start(&mut self, now: Instant) {
        self.window = Some(Window {
            started: now,
            frames: 0,
        });
    }

    pub fn stop(&mut self) {
        self.window = None;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.window.is_some()
    }

    #[must_use]
    pub fn window_span(&self) -> Duration {
        self.window_span
    }

    /// Count one frame. Returns a report when the current window closed.
    pub fn on_frame(&mut self, now: Instant) -> Option<SampleReport> {
        let span = self.window_span;
        let window = self.window.as_mut()?;
        window.frames += 1;

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed < span || elapsed.is_zero() {
            return None;
        }

        let frames = window.frames;
        *window = Window {
            started: now,
            frames: 0,
        };
        Some(SampleReport {
            fps: frames_per_second(frames, elapsed),
            memory_mb: self.probe.used_mb(),
            frames,
            elapsed,
        })
    }
}

/// `round(frames × 1000 / elapsed_ms)`.
#[must_use]
pub fn frames_per_second(frames: u64, elapsed: Duration) -> u32 {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    if elapsed_ms <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let fps = (frames as f64 * 1000.0 / elapsed_ms).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let fps = fps.clamp(0.0, f64::from(u32::MAX)) as u32;
    fps
}
