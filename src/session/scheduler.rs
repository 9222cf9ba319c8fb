//! Cooperative timer registry for the single-threaded lab loop.
//!
//! Each [`TimerKey`] owns at most one slot, so starting a timer that is
//! already armed replaces it instead of running two side by side. The loop
//! asks [`Scheduler::due`] which timers fired and
//! [`Scheduler::next_deadline`] how long it may wait.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Named periodic sources driven by the lab loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKey {
    /// Background dataset mutation.
    Mutation,
    /// Render-instrumentation poll.
    RenderPoll,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    period: Duration,
    next_due: Instant,
    generation: u64,
}

/// Fixed-delay timers keyed by [`TimerKey`].
#[derive(Debug, Default)]
pub struct Scheduler {
    slots: HashMap<TimerKey, Slot>,
    generation: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to fire every `period`, first at `now + period`.
    ///
    /// Replaces any slot already registered under `key`. A zero period is
    /// treated as a cancel. Returns the generation of the new slot.
    pub fn start(&mut self, key: TimerKey, period: Duration, now: Instant) -> Option<u64> {
        if period.is_zero() {
            self.cancel(key);
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.slots.insert(
            key,
            Slot {
                period,
                next_due: now + period,
                generation: self.generation,
            },
        );
        Some(self.generation)
    }

    /// Disarm `key`. Returns whether a slot was removed.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        self.slots.remove(&key).is_some()
    }

    /// Disarm every timer.
    pub fn cancel_all(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn is_active(&self, key: TimerKey) -> bool {
        self.slots.contains_key(&key)
    }

    #[must_use]
    pub fn period(&self, key: TimerKey) -> Option<Duration> {
        self.slots.get(&key).map(|slot| slot.period)
    }

    #[must_use]
    pub fn generation(&self, key: TimerKey) -> Option<u64> {
        self.slots.get(&key).map(|slot| slot.generation)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    /// Timers whose deadline has passed, in key order.
    ///
    /// Each fired timer is re-armed at `now + period`; a timer that overslept
    /// several periods fires once.
    pub fn due(&mut self, now: Instant) -> Vec<TimerKey> {
        let mut fired: Vec<TimerKey> = self
            .slots
            .iter_mut()
            .filter(|(_, slot)| slot.next_due <= now)
            .map(|(key, slot)| {
                slot.next_due = now + slot.period;
                *key
            })
            .collect();
        fired.sort_unstable();
        fired
    }

    /// Earliest pending deadline, if any timer is armed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().map(|slot| slot.next_due).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn timer_fires_after_period() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.start(TimerKey::Mutation, 100 * MS, t0);

        assert!(sched.due(t0 + 99 * MS).is_empty());
        assert_eq!(sched.due(t0 + 100 * MS), vec![TimerKey::Mutation]);
        assert!(sched.due(t0 + 150 * MS).is_empty());
        assert_eq!(sched.due(t0 + 200 * MS), vec![TimerKey::Mutation]);
    }

    #[test]
    fn oversleeping_fires_once() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.start(TimerKey::RenderPoll, 10 * MS, t0);
        assert_eq!(sched.due(t0 + 1_000 * MS).len(), 1);
        assert!(sched.due(t0 + 1_005 * MS).is_empty());
    }

    #[test]
    fn restart_replaces_previous_slot() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        let first = sched.start(TimerKey::Mutation, 100 * MS, t0).unwrap();
        let second = sched.start(TimerKey::Mutation, 500 * MS, t0).unwrap();

        assert_ne!(first, second);
        assert_eq!(sched.active_count(), 1);
        assert_eq!(sched.period(TimerKey::Mutation), Some(500 * MS));
        assert!(sched.due(t0 + 100 * MS).is_empty(), "old period must not fire");
        assert_eq!(sched.due(t0 + 500 * MS), vec![TimerKey::Mutation]);
    }

    #[test]
    fn zero_period_cancels() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.start(TimerKey::Mutation, 100 * MS, t0);
        assert!(sched.start(TimerKey::Mutation, Duration::ZERO, t0).is_none());
        assert!(!sched.is_active(TimerKey::Mutation));
        assert!(sched.due(t0 + 10_000 * MS).is_empty());
    }

    #[test]
    fn timers_are_independent() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.start(TimerKey::Mutation, 300 * MS, t0);
        sched.start(TimerKey::RenderPoll, 500 * MS, t0);

        assert_eq!(sched.due(t0 + 300 * MS), vec![TimerKey::Mutation]);
        assert!(sched.cancel(TimerKey::Mutation));
        assert_eq!(sched.due(t0 + 600 * MS), vec![TimerKey::RenderPoll]);
    }

    #[test]
    fn next_deadline_tracks_earliest() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        assert!(sched.next_deadline().is_none());
        sched.start(TimerKey::RenderPoll, 500 * MS, t0);
        sched.start(TimerKey::Mutation, 200 * MS, t0);
        assert_eq!(sched.next_deadline(), Some(t0 + 200 * MS));
        sched.cancel_all();
        assert!(sched.next_deadline().is_none());
    }
}
