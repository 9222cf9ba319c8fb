//! Lab session: the single owner of everything a running lab needs.
//!
//! The session wires the store, the mutation engine, the metrics sampler and
//! the render profiler to one cooperative [`Scheduler`]. It knows nothing
//! about terminals; the TUI runtime and the headless bench drive it through
//! the same methods.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::scheduler::{Scheduler, TimerKey};
use crate::core::config::{Config, RenderMode, step_dataset_size, step_update_interval};
use crate::core::errors::Result;
use crate::dataset::compute::simulate_interaction_lag;
use crate::dataset::generator::generate_with;
use crate::dataset::mutation::MutationEngine;
use crate::dataset::record::Dataset;
use crate::dataset::store::{LabState, LabStore, StoreEvent};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::metrics::memory::MemoryProbe;
use crate::metrics::profiler::{DATA_VIEW_ID, RenderProfiler, RenderStatsPoller};
use crate::metrics::sampler::{MetricsSampler, SampleReport};
use crate::metrics::snapshot::MetricsSnapshot;

/// Per-row user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

/// What a row action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowActionOutcome {
    Edited { id: String, lag: Duration },
    Deleted { id: String, remaining: usize, lag: Duration },
    /// The row vanished before the action ran (e.g. deleted twice).
    Missing { id: String },
}

/// What the timers did during one [`LabSession::on_tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub mutated: Option<usize>,
    pub stats_published: bool,
}

#[derive(Debug)]
pub struct LabSession {
    config: Config,
    store: LabStore,
    mutation: MutationEngine,
    sampler: MetricsSampler,
    profiler: RenderProfiler,
    poller: RenderStatsPoller,
    scheduler: Scheduler,
    logger: ActivityLoggerHandle,
    rng: StdRng,
    metrics: MetricsSnapshot,
    started_at: Option<Instant>,
}

impl LabSession {
    #[must_use]
    pub fn new(config: Config, logger: ActivityLoggerHandle, probe: Box<dyn MemoryProbe>) -> Self {
        Self::with_rng(config, logger, probe, StdRng::from_os_rng())
    }

    /// Session with a caller-supplied RNG (seeded in tests and benches).
    #[must_use]
    pub fn with_rng(
        config: Config,
        logger: ActivityLoggerHandle,
        probe: Box<dyn MemoryProbe>,
        rng: StdRng,
    ) -> Self {
        let profiler = RenderProfiler::new(DATA_VIEW_ID);
        Self {
            store: LabStore::new(&config.lab),
            mutation: MutationEngine::new(config.lab.update_interval_ms),
            sampler: MetricsSampler::new(config.metrics.sample_window(), probe),
            poller: RenderStatsPoller::new(profiler.clone()),
            profiler,
            scheduler: Scheduler::new(),
            logger,
            rng,
            metrics: MetricsSnapshot::default(),
            started_at: None,
            config,
        }
    }

    // ──────────────────── lifecycle ────────────────────

    /// Generate the initial dataset and arm every periodic source.
    pub fn start(&mut self, now: Instant) {
        self.regenerate();
        self.mutation.start(&mut self.scheduler, now);
        self.scheduler
            .start(TimerKey::RenderPoll, self.config.metrics.render_poll(), now);
        self.sampler.start(now);
        self.started_at = Some(now);

        self.logger.send(ActivityEvent::SessionStarted {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash: self
                .config
                .stable_hash()
                .unwrap_or_else(|_| "unknown".to_string()),
            mode: self.state().mode,
            rows: self.state().dataset.len(),
        });
    }

    /// Cancel every timer and stop sampling. Safe to call more than once.
    pub fn shutdown(&mut self, reason: &str, now: Instant) {
        let Some(started) = self.started_at.take() else {
            return;
        };
        self.mutation.stop(&mut self.scheduler);
        self.scheduler.cancel_all();
        self.sampler.stop();
        self.logger.send(ActivityEvent::SessionStopped {
            reason: reason.to_string(),
            uptime: now.saturating_duration_since(started),
            render_count: self.profiler.render_count(),
        });
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    // ──────────────────── accessors ────────────────────

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &LabState {
        self.store.state()
    }

    #[must_use]
    pub fn dataset(&self) -> Dataset {
        self.store.dataset()
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics
    }

    #[must_use]
    pub fn profiler(&self) -> RenderProfiler {
        self.profiler.clone()
    }

    #[must_use]
    pub fn logger(&self) -> &ActivityLoggerHandle {
        &self.logger
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Earliest timer deadline, if any timer is armed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // ──────────────────── controls ────────────────────

    /// Replace the dataset with a freshly generated one of the current size.
    pub fn regenerate(&mut self) {
        let rows = self.state().dataset_size;
        let started = Instant::now();
        let dataset = generate_with(rows, &mut self.rng);
        let elapsed = started.elapsed();
        self.store.replace_dataset(dataset);
        self.logger
            .send(ActivityEvent::DatasetGenerated { rows, elapsed });
    }

    pub fn set_mode(&mut self, mode: RenderMode) -> bool {
        let from = self.state().mode;
        let changed = self.store.set_mode(mode);
        if changed {
            self.logger.send(ActivityEvent::ModeChanged { from, to: mode });
        }
        changed
    }

    pub fn toggle_mode(&mut self) -> RenderMode {
        let next = self.state().mode.toggled();
        self.set_mode(next);
        next
    }

    /// Change the dataset size; a change regenerates the dataset.
    pub fn set_dataset_size(&mut self, size: usize) -> Result<bool> {
        let changed = self.store.set_dataset_size(size)?;
        if changed {
            self.logger.send(ActivityEvent::ConfigChanged {
                setting: "dataset_size",
                value: size.to_string(),
            });
            self.regenerate();
        }
        Ok(changed)
    }

    /// Move the dataset size one step up or down.
    pub fn step_dataset_size(&mut self, increase: bool) -> Result<bool> {
        self.set_dataset_size(step_dataset_size(self.state().dataset_size, increase))
    }

    pub fn set_heavy_computation(&mut self, enabled: bool) -> bool {
        let changed = self.store.set_heavy_computation(enabled);
        if changed {
            self.logger.send(ActivityEvent::ConfigChanged {
                setting: "heavy_computation",
                value: enabled.to_string(),
            });
        }
        changed
    }

    pub fn toggle_heavy_computation(&mut self) -> bool {
        let next = !self.state().heavy_computation;
        self.set_heavy_computation(next);
        next
    }

    /// Change the mutation interval and restart its timer. Zero disables.
    pub fn set_update_interval(&mut self, interval_ms: u64, now: Instant) -> Result<bool> {
        let changed = self.store.set_update_interval(interval_ms)?;
        if changed {
            self.mutation
                .set_interval(interval_ms, &mut self.scheduler, now);
            self.logger.send(ActivityEvent::ConfigChanged {
                setting: "update_interval_ms",
                value: interval_ms.to_string(),
            });
        }
        Ok(changed)
    }

    pub fn step_update_interval(&mut self, increase: bool, now: Instant) -> Result<bool> {
        let next = step_update_interval(self.state().update_interval_ms, increase);
        self.set_update_interval(next, now)
    }

    // ──────────────────── row actions ────────────────────

    /// Run a row action. In unoptimized mode the handler blocks for the
    /// configured interaction lag before doing anything.
    pub fn row_action(&mut self, action: RowAction, id: &str) -> RowActionOutcome {
        let mode = self.state().mode;
        let lag = match mode {
            RenderMode::Unoptimized => {
                simulate_interaction_lag(self.config.view.interaction_lag())
            }
            RenderMode::Optimized => Duration::ZERO,
        };

        match action {
            RowAction::Edit => {
                if self.state().dataset.position(id).is_none() {
                    return RowActionOutcome::Missing { id: id.to_string() };
                }
                self.logger.send(ActivityEvent::RowEdited {
                    id: id.to_string(),
                    mode,
                    lag,
                });
                RowActionOutcome::Edited {
                    id: id.to_string(),
                    lag,
                }
            }
            RowAction::Delete => {
                if !self.store.delete_row(id) {
                    return RowActionOutcome::Missing { id: id.to_string() };
                }
                let remaining = self.state().dataset.len();
                self.logger.send(ActivityEvent::RowDeleted {
                    id: id.to_string(),
                    remaining,
                    mode,
                });
                RowActionOutcome::Deleted {
                    id: id.to_string(),
                    remaining,
                    lag,
                }
            }
        }
    }

    // ──────────────────── periodic sources ────────────────────

    /// Fire whichever timers are due at `now`.
    pub fn on_tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        for key in self.scheduler.due(now) {
            match key {
                TimerKey::Mutation => outcome.mutated = self.force_mutation(),
                TimerKey::RenderPoll => {
                    if let Some(stats) = self.poller.poll() {
                        self.metrics.apply_render_stats(stats);
                        outcome.stats_published = true;
                    }
                }
            }
        }
        outcome
    }

    /// Apply one mutation tick immediately. Returns the replaced index.
    pub fn force_mutation(&mut self) -> Option<usize> {
        let dataset = self.store.dataset();
        let mutation = self.mutation.tick(&dataset, &mut self.rng)?;
        let index = mutation.index;
        self.store.apply_mutation(mutation);
        Some(index)
    }

    /// Per-frame hook for the metrics sampler.
    pub fn on_frame(&mut self, now: Instant) -> Option<SampleReport> {
        let report = self.sampler.on_frame(now)?;
        self.metrics.apply_sample(&report);
        self.logger.send(ActivityEvent::MetricsPublished {
            fps: self.metrics.fps,
            commit_ms: self.metrics.commit_ms,
            render_count: self.metrics.render_count,
            memory_mb: self.metrics.memory_mb,
        });
        Some(report)
    }

    /// Report one completed data-view commit to the profiler.
    pub fn record_commit(&self, duration: Duration) {
        self.profiler.on_commit(DATA_VIEW_ID, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LabConfig;
    use crate::metrics::memory::FixedMemory;

    const MS: Duration = Duration::from_millis(1);

    fn config(mode: RenderMode, update_interval_ms: u64) -> Config {
        let mut config = Config::default();
        config.lab = LabConfig {
            mode,
            dataset_size: 1_000,
            heavy_computation: false,
            update_interval_ms,
        };
        config.view.interaction_lag_ms = 5;
        config
    }

    fn session(mode: RenderMode, update_interval_ms: u64) -> LabSession {
        LabSession::with_rng(
            config(mode, update_interval_ms),
            ActivityLoggerHandle::disabled(),
            Box::new(FixedMemory(1024 * 1024)),
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn start_generates_and_arms_timers() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Unoptimized, 300);
        s.start(t0);
        assert_eq!(s.dataset().len(), 1_000);
        assert!(s.scheduler().is_active(TimerKey::Mutation));
        assert!(s.scheduler().is_active(TimerKey::RenderPoll));
        assert!(s.is_running());
    }

    #[test]
    fn disabled_updates_never_mutate() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 0);
        s.start(t0);
        let before = s.dataset();
        for i in 1..20 {
            assert!(s.on_tick(t0 + i * 500 * MS).mutated.is_none());
        }
        assert!(before.ptr_eq(&s.dataset()));
    }

    #[test]
    fn mutation_timer_replaces_one_row() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 100);
        s.start(t0);
        let rx = s.subscribe();
        let outcome = s.on_tick(t0 + 100 * MS);
        let index = outcome.mutated.expect("mutation due");
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::RowMutated { index });
        assert_eq!(s.dataset().len(), 1_000);
    }

    #[test]
    fn interval_change_restarts_timer() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 100);
        s.start(t0);
        assert!(s.set_update_interval(1_000, t0).unwrap());
        assert!(s.on_tick(t0 + 100 * MS).mutated.is_none());
        assert!(s.on_tick(t0 + 1_000 * MS).mutated.is_some());

        assert!(s.step_update_interval(false, t0).unwrap());
        assert_eq!(s.state().update_interval_ms, 900);
        assert!(s.set_update_interval(0, t0).unwrap());
        assert!(!s.scheduler().is_active(TimerKey::Mutation));
    }

    #[test]
    fn render_poll_publishes_commit_stats() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 0);
        s.start(t0);
        s.record_commit(Duration::from_millis(4));
        let outcome = s.on_tick(t0 + 500 * MS);
        assert!(outcome.stats_published);
        assert_eq!(s.metrics().render_count, 1);
        assert!(!s.on_tick(t0 + 1_000 * MS).stats_published, "unchanged");
    }

    #[test]
    fn render_count_survives_regeneration_and_resize() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Unoptimized, 0);
        s.start(t0);
        s.record_commit(Duration::from_millis(3));
        assert!(s.on_tick(t0 + 500 * MS).stats_published);

        s.regenerate();
        assert!(s.set_dataset_size(2_000).unwrap());
        assert_eq!(s.dataset().len(), 2_000);

        assert!(!s.on_tick(t0 + 1_000 * MS).stats_published);
        assert_eq!(s.profiler().render_count(), 1);
        assert_eq!(s.metrics().render_count, 1);

        s.record_commit(Duration::from_millis(3));
        assert!(s.on_tick(t0 + 1_500 * MS).stats_published);
        assert_eq!(s.metrics().render_count, 2);
    }

    #[test]
    fn frames_publish_sample() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 0);
        s.start(t0);
        for i in 1..=63 {
            s.on_frame(t0 + i * 16 * MS);
        }
        assert!(s.metrics().fps > 0);
        assert_eq!(s.metrics().memory_mb, Some(1));
    }

    #[test]
    fn dataset_size_change_regenerates() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 0);
        s.start(t0);
        assert!(s.step_dataset_size(true).unwrap());
        assert_eq!(s.dataset().len(), 2_000);
        assert!(s.step_dataset_size(false).unwrap());
        assert_eq!(s.dataset().len(), 1_000);
        assert!(!s.step_dataset_size(false).unwrap(), "clamped at minimum");
    }

    #[test]
    fn unoptimized_delete_lags_then_removes() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Unoptimized, 0);
        s.start(t0);
        let id = s.dataset().rows()[1].id.clone();

        let outcome = s.row_action(RowAction::Delete, &id);
        let RowActionOutcome::Deleted { remaining, lag, .. } = outcome else {
            panic!("expected delete, got {outcome:?}");
        };
        assert_eq!(remaining, 999);
        assert!(lag >= Duration::from_millis(5));
        assert!(s.dataset().position(&id).is_none());
        assert_eq!(
            s.row_action(RowAction::Delete, &id),
            RowActionOutcome::Missing { id }
        );
    }

    #[test]
    fn optimized_edit_has_no_lag() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Optimized, 0);
        s.start(t0);
        let id = s.dataset().rows()[0].id.clone();
        assert_eq!(
            s.row_action(RowAction::Edit, &id),
            RowActionOutcome::Edited {
                id,
                lag: Duration::ZERO
            }
        );
    }

    #[test]
    fn shutdown_cancels_everything() {
        let t0 = Instant::now();
        let mut s = session(RenderMode::Unoptimized, 200);
        s.start(t0);
        s.shutdown("test", t0 + 10 * MS);
        assert_eq!(s.scheduler().active_count(), 0);
        assert!(s.next_deadline().is_none());
        assert!(!s.is_running());
        assert!(s.on_frame(t0 + 5_000 * MS).is_none());
        s.shutdown("again", t0 + 20 * MS);
    }

    #[test]
    fn toggles_flip_state() {
        let mut s = session(RenderMode::Unoptimized, 0);
        assert_eq!(s.toggle_mode(), RenderMode::Optimized);
        assert_eq!(s.state().mode, RenderMode::Optimized);
        assert!(s.toggle_heavy_computation());
        assert!(s.state().heavy_computation);
    }
}
