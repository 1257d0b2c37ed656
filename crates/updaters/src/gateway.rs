use {
    async_trait::async_trait,
    linktrack_common::{LinkUpdate, Result},
    tracing::info,
};

/// Delivers a "resource changed" message to the chats listed in it.
///
/// Callers treat delivery as best-effort: a failure is logged and dropped,
/// never retried.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_update(&self, update: &LinkUpdate) -> Result<()>;
}

/// Gateway used when no bot endpoint is configured: updates only reach the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyGateway;

#[async_trait]
impl NotificationGateway for LogOnlyGateway {
    async fn send_update(&self, update: &LinkUpdate) -> Result<()> {
        info!(
            link_id = update.id,
            url = %update.url,
            chats = ?update.chat_ids,
            description = %update.description,
            "link update (no bot endpoint configured)"
        );
        Ok(())
    }
}
