//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use render_lab::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, RenderMode};
pub use crate::core::errors::{LabError, Result};

// Dataset
pub use crate::dataset::compute::{calculate_expensive_tree, simulate_interaction_lag};
pub use crate::dataset::generator::{generate, generate_with};
pub use crate::dataset::mutation::{Mutation, MutationEngine, mutate_random_row};
pub use crate::dataset::record::{Dataset, RowRecord, Status};
pub use crate::dataset::store::{LabState, LabStore, StoreEvent};

// Metrics
pub use crate::metrics::memory::{MemoryProbe, ProcessMemory};
pub use crate::metrics::profiler::{RenderProfiler, RenderStats};
pub use crate::metrics::sampler::{MetricsSampler, SampleReport};
pub use crate::metrics::snapshot::{Health, MetricsSnapshot};

// Session
pub use crate::session::lab::{LabSession, RowAction, RowActionOutcome};
pub use crate::session::scheduler::{Scheduler, TimerKey};

// Logger
pub use crate::logger::activity::{ActivityEvent, ActivityLogger, ActivityLoggerHandle};

// View
#[cfg(feature = "tui")]
pub use crate::tui::table::{Commit, CommitInputs, DataTable, TableFrame};
#[cfg(feature = "tui")]
pub use crate::tui::window::{FixedSizeList, Viewport, Windowing};
