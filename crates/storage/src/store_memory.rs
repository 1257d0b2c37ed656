//! In-memory store for tests and throwaway runs.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_common::{Chat, ChatId, Link, LinkId, time},
    url::Url,
};

use crate::{
    Error, Result,
    store::{ChatRepository, LinkRepository},
};

#[derive(Debug, Clone, Copy)]
struct Association {
    chat_id: ChatId,
    link_id: LinkId,
}

#[derive(Default)]
struct State {
    chats: BTreeMap<ChatId, Chat>,
    links: BTreeMap<LinkId, Link>,
    by_url: HashMap<String, LinkId>,
    /// Insertion-ordered, so per-chat listings come back in add order.
    associations: Vec<Association>,
    last_link_id: LinkId,
}

impl State {
    fn link_by_url(&self, url: &Url) -> Result<&Link> {
        self.by_url
            .get(url.as_str())
            .and_then(|id| self.links.get(id))
            .ok_or_else(|| Error::not_found("link", url))
    }
}

/// Both repositories over one `Mutex`-guarded state. No persistence.
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for InMemoryStore {
    async fn add(&self, chat_id: ChatId) -> Result<Chat> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.chats.contains_key(&chat_id) {
            return Err(Error::duplicate("chat", chat_id));
        }
        let chat = Chat {
            id: chat_id,
            registered_at: time::now(),
        };
        state.chats.insert(chat_id, chat.clone());
        Ok(chat)
    }

    async fn remove(&self, chat_id: ChatId) -> Result<Chat> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let chat = state
            .chats
            .remove(&chat_id)
            .ok_or_else(|| Error::not_found("chat", chat_id))?;
        state.associations.retain(|a| a.chat_id != chat_id);
        Ok(chat)
    }

    async fn find_by_id(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.chats.get(&chat_id).cloned())
    }

    async fn find_all_chats_by_url(&self, url: &Url) -> Result<Vec<ChatId>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(&link_id) = state.by_url.get(url.as_str()) else {
            return Ok(Vec::new());
        };
        let mut chat_ids: Vec<ChatId> = state
            .associations
            .iter()
            .filter(|a| a.link_id == link_id)
            .map(|a| a.chat_id)
            .collect();
        chat_ids.sort_unstable();
        chat_ids.dedup();
        Ok(chat_ids)
    }
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn add(&self, chat_id: ChatId, url: &Url) -> Result<Link> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.chats.contains_key(&chat_id) {
            return Err(Error::not_found("chat", chat_id));
        }

        let link_id = match state.by_url.get(url.as_str()) {
            Some(&id) => id,
            None => {
                state.last_link_id += 1;
                let id = state.last_link_id;
                state.links.insert(id, Link {
                    id,
                    url: url.clone(),
                    last_update: time::now(),
                });
                state.by_url.insert(url.as_str().to_string(), id);
                id
            },
        };

        if state
            .associations
            .iter()
            .any(|a| a.chat_id == chat_id && a.link_id == link_id)
        {
            return Err(Error::duplicate("chat link", format!("{chat_id} -> {url}")));
        }
        state.associations.push(Association { chat_id, link_id });

        state
            .links
            .get(&link_id)
            .cloned()
            .ok_or_else(|| Error::not_found("link", link_id))
    }

    async fn remove(&self, chat_id: ChatId, url: &Url) -> Result<Link> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let link = state.link_by_url(url)?.clone();
        let before = state.associations.len();
        state
            .associations
            .retain(|a| !(a.chat_id == chat_id && a.link_id == link.id));
        if state.associations.len() == before {
            return Err(Error::not_found("chat link", format!("{chat_id} -> {url}")));
        }
        Ok(link)
    }

    async fn find_all(&self) -> Result<Vec<Link>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.links.values().cloned().collect())
    }

    async fn find_all_links_by_chat_id(&self, chat_id: ChatId) -> Result<Vec<Link>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .associations
            .iter()
            .filter(|a| a.chat_id == chat_id)
            .filter_map(|a| state.links.get(&a.link_id).cloned())
            .collect())
    }

    async fn find_by_url(&self, url: &Url) -> Result<Link> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.link_by_url(url).cloned()
    }

    async fn find_by_oldest_updates(&self, limit: usize) -> Result<Vec<Link>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut links: Vec<Link> = state.links.values().cloned().collect();
        links.sort_by_key(|l| (l.last_update, l.id));
        links.truncate(limit);
        Ok(links)
    }

    async fn set_last_update(&self, url: &Url, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let id = state.link_by_url(url)?.id;
        if let Some(link) = state.links.get_mut(&id) {
            link.last_update = at;
        }
        Ok(())
    }

    async fn remove_unused_links(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let State {
            links,
            by_url,
            associations,
            ..
        } = &mut *state;
        let before = links.len();
        links.retain(|id, _| associations.iter().any(|a| a.link_id == *id));
        by_url.retain(|_, id| links.contains_key(id));
        Ok((before - links.len()) as u64)
    }
}
