//! Update orchestration: pick the least recently checked links, route each to
//! its site updater, and keep one link's failure from touching the others.
//!
//! [`UpdateOrchestrator`] runs a single batch; [`UpdateScheduler`] drives it
//! from a timer and never lets two batches overlap.

pub mod orchestrator;
pub mod report;
pub mod service;

pub use {
    orchestrator::UpdateOrchestrator,
    report::{BatchReport, LinkOutcome, LinkReport},
    service::{SchedulerConfig, TickOutcome, UpdateScheduler},
};
