//! reqwest implementations of the fetch capabilities and the notification
//! gateway the updaters depend on.

pub mod bot;
pub mod error;
pub mod github;
pub mod stackoverflow;

use std::time::Duration;

pub use {
    bot::BotClient,
    error::{Error, Result},
    github::GitHubClient,
    stackoverflow::StackOverflowClient,
};

/// Shared HTTP client: one connection pool, a request timeout, and a
/// `User-Agent` (GitHub rejects requests without one).
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("linktrack/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Join `path` onto `base`, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<url::Url> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    url::Url::parse(&raw).map_err(|source| Error::Endpoint { url: raw, source })
}
