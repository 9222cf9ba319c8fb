//! Owned application state with subscription-based change notification.
//!
//! [`LabStore`] is the single owner of the dataset and the user-facing
//! controls. Readers get cheap clones of the current [`Dataset`]; every change
//! goes through a store method that replaces state wholesale and then notifies
//! subscribers, so nobody ever observes a half-applied update.

#![allow(missing_docs)]

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::mutation::Mutation;
use super::record::Dataset;
use crate::core::config::{LabConfig, RenderMode, validate_dataset_size, validate_update_interval};
use crate::core::errors::Result;

/// Snapshot of the user-controlled state.
#[derive(Debug, Clone, PartialEq)]
pub struct LabState {
    pub dataset: Dataset,
    pub mode: RenderMode,
    pub dataset_size: usize,
    pub heavy_computation: bool,
    pub update_interval_ms: u64,
}

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    DatasetReplaced { rows: usize },
    RowMutated { index: usize },
    RowDeleted { id: String, remaining: usize },
    ModeChanged(RenderMode),
    DatasetSizeChanged(usize),
    HeavyComputationChanged(bool),
    UpdateIntervalChanged(u64),
}

impl StoreEvent {
    /// Whether the event changes what the data table shows.
    #[must_use]
    pub const fn affects_table(&self) -> bool {
        !matches!(
            self,
            Self::DatasetSizeChanged(_) | Self::UpdateIntervalChanged(_)
        )
    }
}

/// Single owner of the dataset and control values.
#[derive(Debug)]
pub struct LabStore {
    state: LabState,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl LabStore {
    /// Store seeded with control values from config and an empty dataset.
    #[must_use]
    pub fn new(config: &LabConfig) -> Self {
        Self {
            state: LabState {
                dataset: Dataset::empty(),
                mode: config.mode,
                dataset_size: config.dataset_size,
                heavy_computation: config.heavy_computation,
                update_interval_ms: config.update_interval_ms,
            },
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &LabState {
        &self.state
    }

    /// Cheap handle to the current dataset.
    #[must_use]
    pub fn dataset(&self) -> Dataset {
        self.state.dataset.clone()
    }

    /// Register a subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn replace_dataset(&mut self, dataset: Dataset) {
        let rows = dataset.len();
        self.state.dataset = dataset;
        self.publish(StoreEvent::DatasetReplaced { rows });
    }

    pub fn apply_mutation(&mut self, mutation: Mutation) {
        self.state.dataset = mutation.dataset;
        self.publish(StoreEvent::RowMutated {
            index: mutation.index,
        });
    }

    /// Remove the row with `id`. Returns `false` if no such row exists.
    pub fn delete_row(&mut self, id: &str) -> bool {
        let Some(next) = self.state.dataset.without(id) else {
            return false;
        };
        let remaining = next.len();
        self.state.dataset = next;
        self.publish(StoreEvent::RowDeleted {
            id: id.to_string(),
            remaining,
        });
        true
    }

    /// Returns whether the mode actually changed.
    pub fn set_mode(&mut self, mode: RenderMode) -> bool {
        if self.state.mode == mode {
            return false;
        }
        self.state.mode = mode;
        self.publish(StoreEvent::ModeChanged(mode));
        true
    }

    /// Returns whether the size actually changed.
    pub fn set_dataset_size(&mut self, size: usize) -> Result<bool> {
        validate_dataset_size(size)?;
        if self.state.dataset_size == size {
            return Ok(false);
        }
        self.state.dataset_size = size;
        self.publish(StoreEvent::DatasetSizeChanged(size));
        Ok(true)
    }

    pub fn set_heavy_computation(&mut self, enabled: bool) -> bool {
        if self.state.heavy_computation == enabled {
            return false;
        }
        self.state.heavy_computation = enabled;
        self.publish(StoreEvent::HeavyComputationChanged(enabled));
        true
    }

    pub fn set_update_interval(&mut self, interval_ms: u64) -> Result<bool> {
        validate_update_interval(interval_ms)?;
        if self.state.update_interval_ms == interval_ms {
            return Ok(false);
        }
        self.state.update_interval_ms = interval_ms;
        self.publish(StoreEvent::UpdateIntervalChanged(interval_ms));
        Ok(true)
    }

    fn publish(&mut self, event: StoreEvent) {
        // Disconnected receivers are pruned on the way.
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
