use std::sync::Arc;

use {
    chrono::{DateTime, Utc},
    linktrack_common::{Link, Result, address},
    url::Url,
};

use crate::{
    context::UpdateContext,
    fetch::{GitHubFetch, RemoteState, StackOverflowFetch},
    github::{self, GitHubUpdater},
    stackoverflow::{self, StackOverflowUpdater},
};

/// A site-specific updater. The set of sites is closed; routing between
/// them goes through [`crate::UpdaterTable`].
pub enum LinkUpdater {
    GitHub(GitHubUpdater),
    StackOverflow(StackOverflowUpdater),
}

impl LinkUpdater {
    pub fn github(client: Arc<dyn GitHubFetch>, context: Arc<UpdateContext>) -> Self {
        Self::GitHub(GitHubUpdater::new(client, context))
    }

    pub fn stackoverflow(client: Arc<dyn StackOverflowFetch>, context: Arc<UpdateContext>) -> Self {
        Self::StackOverflow(StackOverflowUpdater::new(client, context))
    }

    /// Routing key of this updater's site.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::GitHub(_) => github::DOMAIN,
            Self::StackOverflow(_) => stackoverflow::DOMAIN,
        }
    }

    pub fn supports(&self, url: &Url) -> bool {
        address::domain_of(url).as_deref() == Some(self.domain())
    }

    /// Addressing tokens the site's client needs: `[owner, repo]` for GitHub,
    /// `[question_id]` for StackOverflow.
    pub fn process_link(&self, url: &Url) -> Result<Vec<String>> {
        match self {
            Self::GitHub(_) => Ok(github::parse_repo(url)?.tokens()),
            Self::StackOverflow(_) => Ok(vec![stackoverflow::parse_question_id(url)?.to_string()]),
        }
    }

    /// Check one link. When the remote state is newer than the checkpoint the
    /// tracking chats are notified and the checkpoint moves forward.
    ///
    /// Returns whether the link changed.
    pub async fn process(&self, link: &Link) -> Result<bool> {
        let context = self.context();
        let _guard = context.lock(link.id).await;
        let (state, description) = self.fetch(&link.url).await?;
        context.apply(link, state.last_activity, description).await
    }

    /// Forced resync: refetch and store the remote time unconditionally,
    /// without notifying anyone. Returns the stored checkpoint.
    pub async fn set_last_update(&self, link: &Link) -> Result<DateTime<Utc>> {
        let context = self.context();
        let _guard = context.lock(link.id).await;
        let (state, _) = self.fetch(&link.url).await?;
        context.persist(link, state.last_activity).await
    }

    fn context(&self) -> &UpdateContext {
        match self {
            Self::GitHub(u) => u.context(),
            Self::StackOverflow(u) => u.context(),
        }
    }

    async fn fetch(&self, url: &Url) -> Result<(RemoteState, String)> {
        match self {
            Self::GitHub(u) => u.fetch(url).await,
            Self::StackOverflow(u) => u.fetch(url).await,
        }
    }
}

impl std::fmt::Debug for LinkUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkUpdater")
            .field("domain", &self.domain())
            .finish()
    }
}
