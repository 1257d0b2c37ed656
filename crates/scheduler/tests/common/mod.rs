#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_common::{ChatId, Error, Link, LinkUpdate, Result},
    linktrack_registry::ChatLinkRegistry,
    linktrack_scheduler::UpdateOrchestrator,
    linktrack_storage::{self as storage, LinkRepository, store_memory::InMemoryStore},
    linktrack_updaters::{
        GitHubFetch, LinkUpdater, NotificationGateway, RemoteState, StackOverflowFetch,
        UpdateContext, UpdaterTable,
    },
    url::Url,
};

#[derive(Default)]
pub struct FakeSites {
    repos: Mutex<HashMap<String, DateTime<Utc>>>,
    questions: Mutex<HashMap<u64, DateTime<Utc>>>,
    pub calls: AtomicUsize,
}

impl FakeSites {
    pub fn set_repo(&self, owner: &str, repo: &str, at: DateTime<Utc>) {
        self.repos
            .lock()
            .unwrap()
            .insert(format!("{owner}/{repo}"), at);
    }

    pub fn set_question(&self, id: u64, at: DateTime<Utc>) {
        self.questions.lock().unwrap().insert(id, at);
    }
}

#[async_trait]
impl GitHubFetch for FakeSites {
    async fn fetch_repository(&self, owner: &str, repo: &str) -> Result<RemoteState> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = format!("{owner}/{repo}");
        let at = self.repos.lock().unwrap().get(&key).copied();
        let at = at.ok_or_else(|| {
            Error::upstream(format!("github {key}"), std::io::Error::other("404"))
        })?;
        Ok(RemoteState {
            last_activity: at,
            title: key,
            author: Some(owner.to_string()),
        })
    }
}

#[async_trait]
impl StackOverflowFetch for FakeSites {
    async fn fetch_question(&self, question_id: u64) -> Result<RemoteState> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let at = self.questions.lock().unwrap().get(&question_id).copied();
        let at = at.ok_or_else(|| {
            Error::upstream(
                format!("question {question_id}"),
                std::io::Error::other("empty items"),
            )
        })?;
        Ok(RemoteState {
            last_activity: at,
            title: format!("question {question_id}"),
            author: None,
        })
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<LinkUpdate>>,
    pub fail: AtomicBool,
}

impl RecordingGateway {
    pub fn sent(&self) -> Vec<LinkUpdate> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_update(&self, update: &LinkUpdate) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::delivery("bot", std::io::Error::other("refused")));
        }
        self.sent.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Link repository over an [`InMemoryStore`] whose checkpoint writes fail
/// for one URL.
pub struct FailingCheckpoint {
    inner: Arc<InMemoryStore>,
    broken: Url,
}

#[async_trait]
impl LinkRepository for FailingCheckpoint {
    async fn add(&self, chat_id: ChatId, url: &Url) -> storage::Result<Link> {
        LinkRepository::add(self.inner.as_ref(), chat_id, url).await
    }

    async fn remove(&self, chat_id: ChatId, url: &Url) -> storage::Result<Link> {
        LinkRepository::remove(self.inner.as_ref(), chat_id, url).await
    }

    async fn find_all(&self) -> storage::Result<Vec<Link>> {
        self.inner.find_all().await
    }

    async fn find_all_links_by_chat_id(&self, chat_id: ChatId) -> storage::Result<Vec<Link>> {
        self.inner.find_all_links_by_chat_id(chat_id).await
    }

    async fn find_by_url(&self, url: &Url) -> storage::Result<Link> {
        self.inner.find_by_url(url).await
    }

    async fn find_by_oldest_updates(&self, limit: usize) -> storage::Result<Vec<Link>> {
        self.inner.find_by_oldest_updates(limit).await
    }

    async fn set_last_update(&self, url: &Url, at: DateTime<Utc>) -> storage::Result<()> {
        if *url == self.broken {
            return Err(storage::Error::Sqlx(sqlx::Error::Io(
                std::io::Error::other("disk I/O error"),
            )));
        }
        self.inner.set_last_update(url, at).await
    }

    async fn remove_unused_links(&self) -> storage::Result<u64> {
        self.inner.remove_unused_links().await
    }
}

/// In-memory store, registry, fake sites, and an orchestrator over both
/// updaters.
pub struct World {
    pub store: Arc<InMemoryStore>,
    pub registry: ChatLinkRegistry,
    pub sites: Arc<FakeSites>,
    pub gateway: Arc<RecordingGateway>,
    pub orchestrator: Arc<UpdateOrchestrator>,
}

impl World {
    pub fn new(batch_size: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::build(batch_size, store.clone(), store)
    }

    /// Like [`World::new`], but updaters and the orchestrator cannot move the
    /// checkpoint of `broken`.
    pub fn with_failing_checkpoint(batch_size: usize, broken: &str) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let links = Arc::new(FailingCheckpoint {
            inner: store.clone(),
            broken: Url::parse(broken).unwrap(),
        });
        Self::build(batch_size, store, links)
    }

    fn build(
        batch_size: usize,
        store: Arc<InMemoryStore>,
        links: Arc<dyn LinkRepository>,
    ) -> Self {
        let sites = Arc::new(FakeSites::default());
        let gateway = Arc::new(RecordingGateway::default());
        let context = Arc::new(UpdateContext::new(
            store.clone(),
            links.clone(),
            gateway.clone(),
        ));
        let table = UpdaterTable::new(vec![
            LinkUpdater::github(sites.clone(), context.clone()),
            LinkUpdater::stackoverflow(sites.clone(), context),
        ])
        .unwrap();
        let orchestrator = Arc::new(
            UpdateOrchestrator::new(links, table)
                .with_batch_size(batch_size)
                .with_concurrency(2),
        );
        Self {
            registry: ChatLinkRegistry::new(store.clone(), store.clone()),
            store,
            sites,
            gateway,
            orchestrator,
        }
    }
}
