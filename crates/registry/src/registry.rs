use std::sync::Arc;

use {
    linktrack_common::{
        Chat, ChatId, Error, Link, Result,
        address::same_path,
        sync::KeyedLocks,
    },
    linktrack_storage::{ChatRepository, LinkRepository},
    tracing::{debug, info, warn},
    url::Url,
};

/// Owns chat existence and the per-chat set of tracked links.
///
/// Mutations on one chat are serialized through a per-chat lock; the
/// repositories supply the transaction boundary for each single write.
pub struct ChatLinkRegistry {
    chats: Arc<dyn ChatRepository>,
    links: Arc<dyn LinkRepository>,
    chat_locks: KeyedLocks<ChatId>,
    purge_on_remove: bool,
}

impl ChatLinkRegistry {
    pub fn new(chats: Arc<dyn ChatRepository>, links: Arc<dyn LinkRepository>) -> Self {
        Self {
            chats,
            links,
            chat_locks: KeyedLocks::new(),
            purge_on_remove: true,
        }
    }

    /// Whether links left without any chat are purged right after a removal.
    #[must_use]
    pub fn with_purge_on_remove(mut self, purge: bool) -> Self {
        self.purge_on_remove = purge;
        self
    }

    /// Register a new chat. Registering the same id twice is an error.
    pub async fn register_chat(&self, chat_id: ChatId) -> Result<Chat> {
        let _guard = self.chat_locks.lock(chat_id).await;
        let chat = self.chats.add(chat_id).await.map_err(|e| {
            if e.is_duplicate() {
                Error::DuplicateChat { chat_id }
            } else {
                e.into()
            }
        })?;
        info!(chat_id, "chat registered");
        Ok(chat)
    }

    /// Delete a chat together with all of its associations.
    pub async fn delete_chat(&self, chat_id: ChatId) -> Result<Chat> {
        let _guard = self.chat_locks.lock(chat_id).await;
        let chat = self.chats.remove(chat_id).await.map_err(|e| {
            if e.is_not_found() {
                Error::ChatNotRegistered { chat_id }
            } else {
                e.into()
            }
        })?;
        info!(chat_id, "chat deleted");
        self.purge_after_removal().await;
        Ok(chat)
    }

    /// Links tracked by `chat_id`, in the order they were added.
    pub async fn get_links(&self, chat_id: ChatId) -> Result<Vec<Link>> {
        self.ensure_registered(chat_id).await?;
        Ok(self.links.find_all_links_by_chat_id(chat_id).await?)
    }

    /// Start tracking `url` for `chat_id`.
    ///
    /// A chat never tracks two URLs with the same path: host and query are
    /// ignored when checking for duplicates.
    pub async fn add_link(&self, chat_id: ChatId, url: &Url) -> Result<Link> {
        let _guard = self.chat_locks.lock(chat_id).await;
        self.ensure_registered(chat_id).await?;

        let tracked = self.links.find_all_links_by_chat_id(chat_id).await?;
        if tracked.iter().any(|link| same_path(&link.url, url)) {
            return Err(duplicate_link(chat_id, url));
        }

        let link = self.links.add(chat_id, url).await.map_err(|e| {
            if e.is_duplicate() {
                duplicate_link(chat_id, url)
            } else {
                e.into()
            }
        })?;
        info!(chat_id, link_id = link.id, url = %link.url, "link added");
        Ok(link)
    }

    /// Stop tracking the link whose path matches `url` and return it.
    pub async fn remove_link(&self, chat_id: ChatId, url: &Url) -> Result<Link> {
        let _guard = self.chat_locks.lock(chat_id).await;
        self.ensure_registered(chat_id).await?;

        let tracked = self.links.find_all_links_by_chat_id(chat_id).await?;
        let Some(existing) = tracked.into_iter().find(|link| same_path(&link.url, url)) else {
            return Err(Error::LinkNotFound {
                chat_id,
                path: url.path().to_string(),
            });
        };

        let link = self
            .links
            .remove(chat_id, &existing.url)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::LinkNotFound {
                        chat_id,
                        path: url.path().to_string(),
                    }
                } else {
                    e.into()
                }
            })?;
        info!(chat_id, link_id = link.id, url = %link.url, "link removed");
        self.purge_after_removal().await;
        Ok(link)
    }

    async fn ensure_registered(&self, chat_id: ChatId) -> Result<()> {
        match self.chats.find_by_id(chat_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::ChatNotRegistered { chat_id }),
        }
    }

    /// The removal already succeeded, so a failed purge is only logged; the
    /// scheduler sweep picks the orphans up later.
    async fn purge_after_removal(&self) {
        if !self.purge_on_remove {
            return;
        }
        match self.links.remove_unused_links().await {
            Ok(0) => {},
            Ok(purged) => debug!(purged, "purged unused links"),
            Err(e) => warn!(error = %e, "failed to purge unused links"),
        }
    }
}

fn duplicate_link(chat_id: ChatId, url: &Url) -> Error {
    Error::DuplicateLink {
        chat_id,
        path: url.path().to_string(),
    }
}
