//! Synthetic dataset: records, generation, expensive work, and mutation.

pub mod compute;
pub mod generator;
pub mod mutation;
pub mod record;
pub mod store;
