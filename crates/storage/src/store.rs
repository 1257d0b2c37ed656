//! Repository traits for chats and links.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_common::{Chat, ChatId, Link},
    url::Url,
};

use crate::Result;

/// Persistence for registered chats.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Register a chat. Fails with [`crate::Error::Duplicate`] if it exists.
    async fn add(&self, chat_id: ChatId) -> Result<Chat>;

    /// Delete a chat together with all of its associations.
    /// Fails with [`crate::Error::NotFound`] if absent.
    async fn remove(&self, chat_id: ChatId) -> Result<Chat>;

    async fn find_by_id(&self, chat_id: ChatId) -> Result<Option<Chat>>;

    /// Ids of every chat tracking exactly this URL, ascending.
    async fn find_all_chats_by_url(&self, url: &Url) -> Result<Vec<ChatId>>;
}

/// Persistence for tracked links and chat associations.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Associate `url` with a registered chat, creating the shared link row
    /// on first use. An existing link keeps its id and checkpoint.
    async fn add(&self, chat_id: ChatId, url: &Url) -> Result<Link>;

    /// Drop the association between `chat_id` and `url`. The link row stays
    /// until [`LinkRepository::remove_unused_links`] runs.
    async fn remove(&self, chat_id: ChatId, url: &Url) -> Result<Link>;

    async fn find_all(&self) -> Result<Vec<Link>>;

    /// Links of one chat in the order they were added.
    async fn find_all_links_by_chat_id(&self, chat_id: ChatId) -> Result<Vec<Link>>;

    async fn find_by_url(&self, url: &Url) -> Result<Link>;

    /// The `limit` links with the oldest checkpoint, ties by ascending id.
    async fn find_by_oldest_updates(&self, limit: usize) -> Result<Vec<Link>>;

    async fn set_last_update(&self, url: &Url, at: DateTime<Utc>) -> Result<()>;

    /// Purge links no chat references any more. Returns how many were removed.
    async fn remove_unused_links(&self) -> Result<u64>;
}
