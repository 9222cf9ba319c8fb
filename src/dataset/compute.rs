//! Deliberately expensive work used to make render cost visible.
//!
//! Both functions block the calling thread on purpose. They stand in for
//! heavy per-row work and for a sluggish event handler respectively, so they
//! must stay synchronous.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

use super::record::RowRecord;

/// Square-root iterations performed per record.
pub const ITERATIONS_PER_ROW: u32 = 100;

/// Accumulate `sqrt(value + j)` for `j` in `0..100` over every record.
///
/// Pure and deterministic for fixed input values; cost is proportional to
/// `rows × 100`.
pub fn calculate_expensive_tree<'a, I>(rows: I) -> f64
where
    I: IntoIterator<Item = &'a RowRecord>,
{
    let mut total = 0.0_f64;
    for row in rows {
        let value = f64::from(row.value);
        for j in 0..ITERATIONS_PER_ROW {
            total += (value + f64::from(j)).sqrt();
        }
    }
    total
}

/// Spin on the monotonic clock for `duration`. Never yields or sleeps.
///
/// Returns the time actually spent.
pub fn simulate_interaction_lag(duration: Duration) -> Duration {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
    start.elapsed()
}
