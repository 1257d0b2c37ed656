//! Change detection and notification fan-out shared by every updater variant.

use std::sync::Arc;

use {
    chrono::{DateTime, Utc},
    linktrack_common::{Link, LinkId, LinkUpdate, Result, sync::KeyedLocks, time},
    linktrack_storage::{ChatRepository, LinkRepository},
    tokio::sync::OwnedMutexGuard,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use linktrack_metrics::{counter, notifications as notify_metrics};

use crate::gateway::NotificationGateway;

/// Repositories, gateway, and per-link locks the updaters work against.
pub struct UpdateContext {
    chats: Arc<dyn ChatRepository>,
    links: Arc<dyn LinkRepository>,
    gateway: Arc<dyn NotificationGateway>,
    link_locks: KeyedLocks<LinkId>,
}

impl UpdateContext {
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        links: Arc<dyn LinkRepository>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            chats,
            links,
            gateway,
            link_locks: KeyedLocks::new(),
        }
    }

    /// Serializes checkpoint work on one link.
    pub(crate) async fn lock(&self, link_id: LinkId) -> OwnedMutexGuard<()> {
        self.link_locks.lock(link_id).await
    }

    /// Compare `remote_at` with the link's checkpoint. When the remote side is
    /// strictly newer, notify every chat tracking the link (best-effort) and
    /// move the checkpoint forward. Returns whether the link changed.
    ///
    /// A link purged after the batch was read counts as unchanged.
    ///
    /// Must be called with the link's lock held.
    pub(crate) async fn apply(
        &self,
        link: &Link,
        remote_at: DateTime<Utc>,
        description: String,
    ) -> Result<bool> {
        let remote_at = time::from_millis(remote_at.timestamp_millis());
        let stored = match self.links.find_by_url(&link.url).await {
            Ok(stored) => stored,
            Err(e) if e.is_not_found() => {
                debug!(link_id = link.id, url = %link.url, "link purged before check");
                return Ok(false);
            },
            Err(e) => return Err(e.into()),
        };
        let checkpoint = stored.last_update.max(link.last_update);
        if remote_at <= checkpoint {
            debug!(link_id = link.id, url = %link.url, %checkpoint, "link unchanged");
            return Ok(false);
        }

        let chat_ids = self.chats.find_all_chats_by_url(&link.url).await?;
        let update = LinkUpdate {
            id: link.id,
            url: link.url.clone(),
            description,
            chat_ids,
        };
        self.notify(&update).await;

        self.links.set_last_update(&link.url, remote_at).await?;
        info!(link_id = link.id, url = %link.url, %remote_at, "link changed");
        Ok(true)
    }

    /// Overwrite the checkpoint without comparing or notifying.
    pub(crate) async fn persist(&self, link: &Link, at: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let at = time::from_millis(at.timestamp_millis());
        self.links.set_last_update(&link.url, at).await?;
        debug!(link_id = link.id, url = %link.url, %at, "checkpoint resynced");
        Ok(at)
    }

    /// Delivery failures stop here: they are logged and never reach the caller.
    async fn notify(&self, update: &LinkUpdate) {
        match self.gateway.send_update(update).await {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                counter!(notify_metrics::SENT_TOTAL).increment(1);
            },
            Err(e) => {
                warn!(link_id = update.id, url = %update.url, error = %e, "dropping undelivered link update");
                #[cfg(feature = "metrics")]
                counter!(notify_metrics::FAILED_TOTAL).increment(1);
            },
        }
    }
}
