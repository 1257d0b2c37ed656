//! Metric name and label definitions.
//!
//! Centralizing these keeps names consistent between the places that record
//! them and the dashboards that read them.

/// Scheduler batch metrics
pub mod scheduler {
    /// Total batches run to completion or cancellation
    pub const BATCHES_TOTAL: &str = "linktrack_batch_runs_total";
    /// Ticks skipped because the previous batch was still running
    pub const TICKS_SKIPPED_TOTAL: &str = "linktrack_batch_ticks_skipped_total";
    /// Batch duration in seconds
    pub const BATCH_DURATION_SECONDS: &str = "linktrack_batch_duration_seconds";
    /// Links selected in the most recent batch
    pub const BATCH_SIZE: &str = "linktrack_batch_links_selected";
}

/// Per-link processing metrics
pub mod links {
    /// Links whose remote state moved past the checkpoint
    pub const CHANGED_TOTAL: &str = "linktrack_links_changed_total";
    /// Links checked with no change
    pub const UNCHANGED_TOTAL: &str = "linktrack_links_unchanged_total";
    /// Links that failed (route, fetch, parse, or persistence)
    pub const FAILED_TOTAL: &str = "linktrack_links_failed_total";
    /// Unreferenced links purged by a sweep
    pub const PURGED_TOTAL: &str = "linktrack_links_purged_total";
}

/// Notification delivery metrics
pub mod notifications {
    /// Updates handed to the gateway successfully
    pub const SENT_TOTAL: &str = "linktrack_notifications_sent_total";
    /// Updates the gateway rejected (dropped, never retried)
    pub const FAILED_TOTAL: &str = "linktrack_notifications_failed_total";
}
