//! Fetch capabilities the updaters consume. Implemented over HTTP by
//! `linktrack-clients` and by fakes in tests.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_common::Result,
};

/// What an updater needs to know about a remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteState {
    /// Latest modification time reported by the site.
    pub last_activity: DateTime<Utc>,
    pub title: String,
    pub author: Option<String>,
}

#[async_trait]
pub trait GitHubFetch: Send + Sync {
    async fn fetch_repository(&self, owner: &str, repo: &str) -> Result<RemoteState>;
}

#[async_trait]
pub trait StackOverflowFetch: Send + Sync {
    async fn fetch_question(&self, question_id: u64) -> Result<RemoteState>;
}
