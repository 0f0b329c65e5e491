//! Concurrent consolidation of violation files.

pub mod orchestrator;
pub mod render;
pub mod worker;
