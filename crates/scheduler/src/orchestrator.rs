//! One batch: select the oldest-checked links and drive each through its updater.

use std::{sync::Arc, time::Instant};

use {
    futures::{StreamExt, stream},
    linktrack_common::{Link, Result},
    linktrack_storage::LinkRepository,
    linktrack_updaters::UpdaterTable,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use linktrack_metrics::{
    counter, gauge, histogram, links as link_metrics, scheduler as batch_metrics,
};

use crate::report::{BatchReport, LinkOutcome, LinkReport};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_CONCURRENCY: usize = 4;

pub struct UpdateOrchestrator {
    links: Arc<dyn LinkRepository>,
    table: UpdaterTable,
    batch_size: usize,
    concurrency: usize,
}

impl UpdateOrchestrator {
    pub fn new(links: Arc<dyn LinkRepository>, table: UpdaterTable) -> Self {
        Self {
            links,
            table,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// How many links one batch selects.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// How many links of a batch are in flight at once (at least one).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn table(&self) -> &UpdaterTable {
        &self.table
    }

    /// Run one batch over the `batch_size` links with the oldest checkpoint.
    ///
    /// Only a failure to select the batch is returned as an error; every
    /// per-link failure is recorded in the report and the batch carries on.
    /// Cancellation is checked before each link is started.
    pub async fn run_batch(&self, cancel: &CancellationToken) -> Result<BatchReport> {
        let started = Instant::now();
        let selected = self.links.find_by_oldest_updates(self.batch_size).await?;
        info!(selected = selected.len(), "batch started");

        #[cfg(feature = "metrics")]
        gauge!(batch_metrics::BATCH_SIZE).set(selected.len() as f64);

        let links: Vec<LinkReport> = stream::iter(selected)
            .map(|link| self.check_link(link, cancel))
            .buffered(self.concurrency)
            .collect()
            .await;
        let report = BatchReport { links };

        info!(
            selected = report.selected(),
            changed = report.changed(),
            unchanged = report.unchanged(),
            route_not_found = report.route_not_found(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );

        #[cfg(feature = "metrics")]
        {
            counter!(batch_metrics::BATCHES_TOTAL).increment(1);
            histogram!(batch_metrics::BATCH_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
            counter!(link_metrics::CHANGED_TOTAL).increment(report.changed() as u64);
            counter!(link_metrics::UNCHANGED_TOTAL).increment(report.unchanged() as u64);
            counter!(link_metrics::FAILED_TOTAL)
                .increment((report.failed() + report.route_not_found()) as u64);
        }

        Ok(report)
    }

    /// Refetch every tracked link and overwrite its checkpoint without
    /// notifying. Used to repair or backfill checkpoints.
    pub async fn resync_all(&self, cancel: &CancellationToken) -> Result<BatchReport> {
        let all = self.links.find_all().await?;
        info!(links = all.len(), "resync started");

        let links: Vec<LinkReport> = stream::iter(all)
            .map(|link| self.resync_link(link, cancel))
            .buffered(self.concurrency)
            .collect()
            .await;
        let report = BatchReport { links };

        info!(
            resynced = report.resynced(),
            route_not_found = report.route_not_found(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "resync finished"
        );
        Ok(report)
    }

    async fn check_link(&self, link: Link, cancel: &CancellationToken) -> LinkReport {
        let outcome = if cancel.is_cancelled() {
            LinkOutcome::Cancelled
        } else {
            match self.table.resolve(&link.url) {
                None => {
                    warn!(link_id = link.id, url = %link.url, "no updater for link domain, skipping");
                    LinkOutcome::RouteNotFound
                },
                Some(updater) => match updater.process(&link).await {
                    Ok(true) => LinkOutcome::Changed,
                    Ok(false) => LinkOutcome::Unchanged,
                    Err(e) => {
                        warn!(link_id = link.id, url = %link.url, error = %e, "link check failed");
                        LinkOutcome::from_error(&e)
                    },
                },
            }
        };
        debug!(link_id = link.id, ?outcome, "link done");
        LinkReport {
            link_id: link.id,
            url: link.url,
            outcome,
        }
    }

    async fn resync_link(&self, link: Link, cancel: &CancellationToken) -> LinkReport {
        let outcome = if cancel.is_cancelled() {
            LinkOutcome::Cancelled
        } else {
            match self.table.resolve(&link.url) {
                None => LinkOutcome::RouteNotFound,
                Some(updater) => match updater.set_last_update(&link).await {
                    Ok(checkpoint) => LinkOutcome::Resynced { checkpoint },
                    Err(e) => {
                        warn!(link_id = link.id, url = %link.url, error = %e, "link resync failed");
                        LinkOutcome::from_error(&e)
                    },
                },
            }
        };
        LinkReport {
            link_id: link.id,
            url: link.url,
            outcome,
        }
    }
}
