//! Fakes for updater tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_common::{ChatId, Error, Link, LinkUpdate, Result, time},
    linktrack_storage::{ChatRepository, LinkRepository, store_memory::InMemoryStore},
    url::Url,
};

use crate::{
    context::UpdateContext,
    fetch::{GitHubFetch, RemoteState, StackOverflowFetch},
    gateway::NotificationGateway,
    updater::LinkUpdater,
};

pub(crate) fn at(ms: i64) -> DateTime<Utc> {
    time::from_millis(ms)
}

fn missing(what: String) -> Error {
    Error::upstream(what, std::io::Error::other("404 Not Found"))
}

#[derive(Default)]
pub(crate) struct FakeGitHub {
    repos: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl FakeGitHub {
    pub(crate) fn set(&self, owner: &str, repo: &str, at: DateTime<Utc>) {
        self.repos
            .lock()
            .unwrap()
            .insert((owner.to_string(), repo.to_string()), at);
    }
}

#[async_trait]
impl GitHubFetch for FakeGitHub {
    async fn fetch_repository(&self, owner: &str, repo: &str) -> Result<RemoteState> {
        let key = (owner.to_string(), repo.to_string());
        let at = self
            .repos
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .ok_or_else(|| missing(format!("github {owner}/{repo}")))?;
        Ok(RemoteState {
            last_activity: at,
            title: format!("{owner}/{repo}"),
            author: Some(owner.to_string()),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeStackOverflow {
    questions: Mutex<HashMap<u64, DateTime<Utc>>>,
}

impl FakeStackOverflow {
    pub(crate) fn set(&self, id: u64, at: DateTime<Utc>) {
        self.questions.lock().unwrap().insert(id, at);
    }
}

#[async_trait]
impl StackOverflowFetch for FakeStackOverflow {
    async fn fetch_question(&self, question_id: u64) -> Result<RemoteState> {
        let at = self
            .questions
            .lock()
            .unwrap()
            .get(&question_id)
            .copied()
            .ok_or_else(|| missing(format!("question {question_id}")))?;
        Ok(RemoteState {
            last_activity: at,
            title: format!("question {question_id}"),
            author: Some("bob".into()),
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingGateway {
    sent: Mutex<Vec<LinkUpdate>>,
    fail: AtomicBool,
}

impl RecordingGateway {
    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<LinkUpdate> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send_update(&self, update: &LinkUpdate) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::delivery(
                "bot",
                std::io::Error::other("connection refused"),
            ));
        }
        self.sent.lock().unwrap().push(update.clone());
        Ok(())
    }
}

pub(crate) struct Harness {
    pub store: Arc<InMemoryStore>,
    pub github: Arc<FakeGitHub>,
    pub stackoverflow: Arc<FakeStackOverflow>,
    pub gateway: Arc<RecordingGateway>,
    pub context: Arc<UpdateContext>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let gateway = Arc::new(RecordingGateway::default());
        let context = Arc::new(UpdateContext::new(
            store.clone(),
            store.clone(),
            gateway.clone(),
        ));
        Self {
            store,
            github: Arc::new(FakeGitHub::default()),
            stackoverflow: Arc::new(FakeStackOverflow::default()),
            gateway,
            context,
        }
    }

    pub(crate) fn github_updater(&self) -> LinkUpdater {
        LinkUpdater::github(self.github.clone(), self.context.clone())
    }

    pub(crate) fn stackoverflow_updater(&self) -> LinkUpdater {
        LinkUpdater::stackoverflow(self.stackoverflow.clone(), self.context.clone())
    }

    /// Register `chats` (if needed) and have each of them track `raw`.
    pub(crate) async fn track(&self, chats: &[ChatId], raw: &str) -> Link {
        let url = Url::parse(raw).unwrap();
        let mut link = None;
        for &chat_id in chats {
            if self.store.find_by_id(chat_id).await.unwrap().is_none() {
                ChatRepository::add(self.store.as_ref(), chat_id)
                    .await
                    .unwrap();
            }
            link = Some(
                LinkRepository::add(self.store.as_ref(), chat_id, &url)
                    .await
                    .unwrap(),
            );
        }
        link.unwrap()
    }
}
