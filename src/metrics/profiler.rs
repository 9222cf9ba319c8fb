//! Render instrumentation for the data-view subtree.
//!
//! Commits are recorded into atomics on the hot path. A separate poll,
//! driven by the runtime's `RenderPoll` timer, copies them into
//! [`RenderStats`] and only reports when something changed.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Identifier of the observed subtree.
pub const DATA_VIEW_ID: &str = "data-view";

/// Profiler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilerPhase {
    /// No commit observed yet.
    Idle,
    /// At least one commit observed.
    Sampling,
}

#[derive(Debug, Default)]
struct Counters {
    render_count: AtomicU64,
    last_commit_nanos: AtomicU64,
}

/// Cloneable handle over shared commit counters.
#[derive(Debug, Clone)]
pub struct RenderProfiler {
    target: &'static str,
    counters: Arc<Counters>,
}

impl Default for RenderProfiler {
    fn default() -> Self {
        Self::new(DATA_VIEW_ID)
    }
}

impl RenderProfiler {
    #[must_use]
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            counters: Arc::new(Counters::default()),
        }
    }

    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Record one completed commit. Commits for other subtrees are ignored
    /// and return `false`.
    pub fn on_commit(&self, id: &str, duration: Duration) -> bool {
        if id != self.target {
            return false;
        }
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.counters
            .last_commit_nanos
            .store(nanos, Ordering::Relaxed);
        self.counters.render_count.fetch_add(1, Ordering::Release);
        true
    }

    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.counters.render_count.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn last_commit(&self) -> Duration {
        Duration::from_nanos(self.counters.last_commit_nanos.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn phase(&self) -> ProfilerPhase {
        if self.render_count() == 0 {
            ProfilerPhase::Idle
        } else {
            ProfilerPhase::Sampling
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RenderStats {
        let render_count = self.render_count();
        RenderStats {
            render_count,
            commit_ms: self.last_commit().as_secs_f64() * 1000.0,
        }
    }
}

/// Publishable copy of the profiler counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderStats {
    pub render_count: u64,
    pub commit_ms: f64,
}

/// Reflects profiler counters into user-visible state, skipping duplicates.
#[derive(Debug)]
pub struct RenderStatsPoller {
    profiler: RenderProfiler,
    last_published: RenderStats,
}

impl RenderStatsPoller {
    #[must_use]
    pub fn new(profiler: RenderProfiler) -> Self {
        Self {
            profiler,
            last_published: RenderStats::default(),
        }
    }

    /// New stats if they differ from the last published ones.
    pub fn poll(&mut self) -> Option<RenderStats> {
        let current = self.profiler.snapshot();
        if current == self.last_published {
            return None;
        }
        self.last_published = current;
        Some(current)
    }

    #[must_use]
    pub fn last_published(&self) -> RenderStats {
        self.last_published
    }
}
