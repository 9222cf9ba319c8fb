#![forbid(unsafe_code)]

//! Render Lab (rlab): a terminal playground contrasting optimized and
//! unoptimized rendering of a large synthetic table.
//!
//! Two strategies render the same data:
//! 1. **Unoptimized**: every row formatted on every commit, optional heavy
//!    computation per row, blocking lag on row actions
//! 2. **Optimized**: windowed rendering of the visible rows with per-row
//!    memoization and skipped commits when nothing changed
//!
//! FPS, commit time, render count and memory are measured live.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use render_lab::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use render_lab::core::config::Config;
//! use render_lab::dataset::generator::generate;
//! ```

pub mod prelude;

pub mod core;
pub mod dataset;
pub mod logger;
pub mod metrics;
pub mod session;
#[cfg(feature = "tui")]
pub mod tui;
