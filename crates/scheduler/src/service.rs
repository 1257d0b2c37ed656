//! Periodic update scheduler: timer loop, overlap guard, sweep.

use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use {
    linktrack_common::Result,
    linktrack_storage::LinkRepository,
    tokio::{
        sync::{Mutex, RwLock},
        task::JoinHandle,
        time::MissedTickBehavior,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use linktrack_metrics::{counter, links as link_metrics, scheduler as batch_metrics};

use crate::{orchestrator::UpdateOrchestrator, report::BatchReport};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between ticks.
    pub interval: Duration,
    /// Purge links no chat references at the start of every tick.
    pub sweep_unused: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            sweep_unused: true,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(BatchReport),
    /// The previous batch was still running.
    Skipped,
}

/// Drives [`UpdateOrchestrator`] batches from a timer.
pub struct UpdateScheduler {
    orchestrator: Arc<UpdateOrchestrator>,
    links: Arc<dyn LinkRepository>,
    config: SchedulerConfig,
    in_flight: Mutex<()>,
    cancel: StdMutex<CancellationToken>,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
    running: RwLock<bool>,
}

impl UpdateScheduler {
    pub fn new(
        orchestrator: Arc<UpdateOrchestrator>,
        links: Arc<dyn LinkRepository>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            orchestrator,
            links,
            config,
            in_flight: Mutex::new(()),
            cancel: StdMutex::new(CancellationToken::new()),
            timer_handle: Mutex::new(None),
            running: RwLock::new(false),
        })
    }

    /// Start the timer loop. The first tick fires immediately.
    pub async fn start(self: &Arc<Self>) {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("update scheduler already running");
                return;
            }
            *running = true;
        }

        let cancel = {
            let mut guard = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
            if guard.is_cancelled() {
                *guard = CancellationToken::new();
            }
            guard.clone()
        };

        let svc = Arc::clone(self);
        let handle = tokio::spawn(async move {
            svc.timer_loop(cancel).await;
        });
        *self.timer_handle.lock().await = Some(handle);

        info!(
            interval_secs = self.config.interval.as_secs(),
            sweep_unused = self.config.sweep_unused,
            "update scheduler started"
        );
    }

    /// Stop the timer loop. A batch in progress halts before its next link.
    pub async fn stop(&self) {
        *self.running.write().await = false;
        self.cancel_token().cancel();

        let mut handle = self.timer_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        info!("update scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run one tick now: sweep (if enabled) then one batch. Returns
    /// [`TickOutcome::Skipped`] without doing anything while another tick is
    /// still in progress.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            info!("previous batch still running, skipping tick");
            #[cfg(feature = "metrics")]
            counter!(batch_metrics::TICKS_SKIPPED_TOTAL).increment(1);
            return Ok(TickOutcome::Skipped);
        };

        if self.config.sweep_unused
            && let Err(e) = self.sweep().await
        {
            warn!(error = %e, "sweep of unused links failed");
        }

        let cancel = self.cancel_token();
        let report = self.orchestrator.run_batch(&cancel).await?;
        Ok(TickOutcome::Completed(report))
    }

    /// Purge links no chat references. Returns how many were removed.
    pub async fn sweep(&self) -> Result<u64> {
        let purged = self.links.remove_unused_links().await?;
        if purged > 0 {
            info!(purged, "swept unused links");
            #[cfg(feature = "metrics")]
            counter!(link_metrics::PURGED_TOTAL).increment(purged);
        } else {
            debug!("no unused links to sweep");
        }
        Ok(purged)
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn timer_loop(self: &Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {},
                () = cancel.cancelled() => break,
            }

            // Each tick runs on its own task so a slow batch never delays the
            // timer; the in-flight guard turns overlapping ticks into skips.
            let svc = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(e) = svc.tick().await {
                    error!(error = %e, "update batch failed");
                }
            });
        }
        debug!("timer loop exited");
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        linktrack_storage::{ChatRepository, store_memory::InMemoryStore},
        linktrack_updaters::UpdaterTable,
        url::Url,
    };

    fn scheduler(store: Arc<InMemoryStore>, config: SchedulerConfig) -> Arc<UpdateScheduler> {
        let table = UpdaterTable::new(Vec::new()).unwrap();
        let orchestrator = Arc::new(UpdateOrchestrator::new(store.clone(), table));
        UpdateScheduler::new(orchestrator, store, config)
    }

    #[tokio::test]
    async fn tick_runs_a_batch() {
        let store = Arc::new(InMemoryStore::new());
        ChatRepository::add(store.as_ref(), 1).await.unwrap();
        LinkRepository::add(
            store.as_ref(),
            1,
            &Url::parse("https://example.com/page").unwrap(),
        )
        .await
        .unwrap();
        let svc = scheduler(store, SchedulerConfig::default());

        let TickOutcome::Completed(report) = svc.tick().await.unwrap() else {
            panic!("tick should not be skipped");
        };
        assert_eq!(report.selected(), 1);
        assert_eq!(report.route_not_found(), 1);
    }

    #[tokio::test]
    async fn overlapping_tick_is_skipped() {
        let store = Arc::new(InMemoryStore::new());
        let svc = scheduler(store, SchedulerConfig::default());

        let held = svc.in_flight.lock().await;
        assert_eq!(svc.tick().await.unwrap(), TickOutcome::Skipped);
        drop(held);
        assert!(matches!(
            svc.tick().await.unwrap(),
            TickOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn tick_sweeps_orphans_when_enabled() {
        let store = Arc::new(InMemoryStore::new());
        ChatRepository::add(store.as_ref(), 1).await.unwrap();
        let url = Url::parse("https://example.com/gone").unwrap();
        LinkRepository::add(store.as_ref(), 1, &url).await.unwrap();
        LinkRepository::remove(store.as_ref(), 1, &url).await.unwrap();

        let svc = scheduler(store.clone(), SchedulerConfig {
            sweep_unused: false,
            ..Default::default()
        });
        svc.tick().await.unwrap();
        assert_eq!(store.find_all().await.unwrap().len(), 1);

        let svc = scheduler(store.clone(), SchedulerConfig::default());
        let TickOutcome::Completed(report) = svc.tick().await.unwrap() else {
            panic!("tick should not be skipped");
        };
        assert_eq!(report.selected(), 0);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_and_stop() {
        let store = Arc::new(InMemoryStore::new());
        let svc = scheduler(store, SchedulerConfig {
            interval: Duration::from_millis(10),
            sweep_unused: false,
        });

        svc.start().await;
        assert!(svc.is_running().await);
        svc.start().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        svc.stop().await;
        assert!(!svc.is_running().await);
        assert!(svc.timer_handle.lock().await.is_none());

        // Restart gets a fresh cancellation token.
        svc.start().await;
        assert!(!svc.cancel_token().is_cancelled());
        svc.stop().await;
    }
}
