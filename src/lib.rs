//! Consolidation of style-check violations.
//!
//! Rule checkers often report several findings against the same or
//! neighbouring text of a sentence. [`consolidate`] clusters those findings
//! by the spans they point at and folds every cluster into one record led by
//! the highest priority rule.

pub mod config;
pub mod consolidator;
pub mod error;
pub mod merge;
pub mod priority;
pub mod span;
pub mod types;

pub use config::PriorityConfig;
pub use consolidator::{ConsolidationStats, Consolidator, consolidate, consolidate_with_stats};
pub use error::{ConfigError, MergeError};
pub use types::{ConsolidationType, FixOption, Severity, Violation};
