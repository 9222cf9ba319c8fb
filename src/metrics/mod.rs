//! Frame-rate sampling, render instrumentation, and memory introspection.

pub mod memory;
pub mod profiler;
pub mod sampler;
pub mod snapshot;
