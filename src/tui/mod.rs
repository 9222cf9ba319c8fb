//! Terminal front end: Elm-style model/update/render over crossterm.
//!
//! `table` and `window` build the profiled data view, `boundary` contains
//! panics raised anywhere in the view, and `runtime` owns the event loop that
//! ties them to a [`crate::session::lab::LabSession`].

#![allow(missing_docs)]

pub mod boundary;
pub mod input;
pub mod layout;
pub mod model;
pub mod render;
pub mod runtime;
pub mod table;
pub mod terminal_guard;
pub mod theme;
pub mod update;
pub mod window;

pub use runtime::{RunOptions, RunSummary, run_lab};
