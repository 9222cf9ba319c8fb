//! Synthetic dataset generation.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::Rng;

use super::record::{Dataset, RowRecord, Status, VALUE_LIMIT, iso_timestamp};

/// Alphabet for random descriptions: A–Z, a–z, 0–9.
pub const DESCRIPTION_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Shortest generated description.
pub const DESCRIPTION_MIN_LEN: usize = 20;
/// Exclusive upper bound on generated description length.
pub const DESCRIPTION_MAX_LEN: usize = 50;

/// Last creation stamp handed out; keeps stamps strictly increasing.
static LAST_STAMP_MS: AtomicU64 = AtomicU64::new(0);

/// Outcome of one timed generation.
#[derive(Debug, Clone)]
pub struct Generated {
    pub dataset: Dataset,
    pub elapsed: Duration,
}

/// Generate `count` fresh rows using the thread-local RNG.
#[must_use]
pub fn generate(count: usize) -> Dataset {
    generate_with(count, &mut rand::rng())
}

/// Generate `count` fresh rows and report how long it took.
#[must_use]
pub fn generate_timed(count: usize) -> Generated {
    let started = Instant::now();
    let dataset = generate(count);
    Generated {
        dataset,
        elapsed: started.elapsed(),
    }
}

/// Generate `count` fresh rows from the given RNG.
///
/// Ids take the form `row-{index}-{stamp}`; the stamp is shared by every row
/// of one generation and never repeats within the process, so successive
/// generations cannot collide even though their index ranges overlap.
pub fn generate_with<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Dataset {
    let stamp = next_creation_stamp();
    let now = iso_timestamp(Utc::now());
    let rows = (0..count)
        .map(|index| RowRecord {
            id: format!("row-{index}-{stamp}"),
            label: format!("Item {index}"),
            value: random_value(rng),
            status: random_status(rng),
            description: random_description(rng),
            last_updated: now.clone(),
        })
        .collect();
    Dataset::new(rows)
}

/// Uniform value in `[0, 10000)`.
pub fn random_value<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(0..VALUE_LIMIT)
}

/// Uniform pick from the four statuses.
pub fn random_status<R: Rng + ?Sized>(rng: &mut R) -> Status {
    Status::ALL[rng.random_range(0..Status::ALL.len())]
}

/// Alphanumeric string with length in `[20, 50)`.
pub fn random_description<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(DESCRIPTION_MIN_LEN..DESCRIPTION_MAX_LEN);
    (0..len)
        .map(|_| char::from(DESCRIPTION_ALPHABET[rng.random_range(0..DESCRIPTION_ALPHABET.len())]))
        .collect()
}

/// Wall-clock milliseconds, bumped past the previous stamp when needed.
fn next_creation_stamp() -> u64 {
    let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let previous = LAST_STAMP_MS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now_ms.max(last + 1))
        })
        .unwrap_or(now_ms);
    now_ms.max(previous + 1)
}
