//! Background mutation engine: re-randomizes one row per tick.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;

use super::generator::random_value;
use super::record::Dataset;
use crate::session::scheduler::{Scheduler, TimerKey};

/// Result of one mutation tick.
#[derive(Debug, Clone)]
pub struct Mutation {
    /// Position of the replaced row.
    pub index: usize,
    /// New sequence; every row except `index` is shared with the old one.
    pub dataset: Dataset,
}

/// Pick one row uniformly and replace it with a copy carrying a fresh value
/// and timestamp. Empty datasets yield `None`.
pub fn mutate_random_row<R: Rng + ?Sized>(dataset: &Dataset, rng: &mut R) -> Option<Mutation> {
    if dataset.is_empty() {
        return None;
    }
    let index = rng.random_range(0..dataset.len());
    let updated = dataset.get(index)?.with_value(random_value(rng), Utc::now());
    let dataset = dataset.with_replaced(index, updated)?;
    Some(Mutation { index, dataset })
}

/// Owns the mutation interval and arms/disarms its scheduler slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationEngine {
    interval: Duration,
}

impl MutationEngine {
    /// `interval_ms == 0` means disabled.
    #[must_use]
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Arm the timer if the engine is enabled.
    pub fn start(&self, scheduler: &mut Scheduler, now: Instant) {
        if self.is_enabled() {
            scheduler.start(TimerKey::Mutation, self.interval, now);
        } else {
            scheduler.cancel(TimerKey::Mutation);
        }
    }

    /// Cancel the running timer and restart it with the new interval.
    pub fn set_interval(&mut self, interval_ms: u64, scheduler: &mut Scheduler, now: Instant) {
        self.stop(scheduler);
        self.interval = Duration::from_millis(interval_ms);
        self.start(scheduler, now);
    }

    pub fn stop(&self, scheduler: &mut Scheduler) {
        scheduler.cancel(TimerKey::Mutation);
    }

    /// Run one tick against `dataset`.
    pub fn tick<R: Rng + ?Sized>(&self, dataset: &Dataset, rng: &mut R) -> Option<Mutation> {
        mutate_random_row(dataset, rng)
    }
}
