//! Metrics for linktrack.
//!
//! Names live in [`definitions`]; recording goes through the `metrics` crate
//! facade, so nothing is collected until the embedding binary installs a
//! recorder.
//!
//! ```rust,ignore
//! use linktrack_metrics::{counter, scheduler};
//!
//! counter!(scheduler::BATCHES_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
