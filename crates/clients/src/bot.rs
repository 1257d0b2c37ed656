//! Bot endpoint client: the HTTP side of the notification gateway.

use {
    async_trait::async_trait,
    linktrack_common::LinkUpdate,
    linktrack_updaters::NotificationGateway,
    tracing::debug,
};

use crate::{Result, endpoint};

/// Posts link updates to `{base}/updates`.
pub struct BotClient {
    http: reqwest::Client,
    base_url: String,
}

impl BotClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn post_update(&self, update: &LinkUpdate) -> Result<()> {
        let url = endpoint(&self.base_url, "updates")?;
        self.http
            .post(url)
            .json(update)
            .send()
            .await?
            .error_for_status()?;
        debug!(link_id = update.id, chats = update.chat_ids.len(), "link update delivered");
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for BotClient {
    async fn send_update(&self, update: &LinkUpdate) -> linktrack_common::Result<()> {
        self.post_update(update)
            .await
            .map_err(|e| e.into_delivery(format!("bot update for link {}", update.id)))
    }
}
