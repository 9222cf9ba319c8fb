//! Session orchestration: the cooperative scheduler and the lab session.

pub mod lab;
pub mod scheduler;
