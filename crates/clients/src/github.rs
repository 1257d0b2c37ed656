//! GitHub REST client: repository metadata.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_updaters::{GitHubFetch, RemoteState},
    reqwest::header::{ACCEPT, AUTHORIZATION},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use crate::{Result, endpoint};

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    full_name: String,
    owner: Owner,
    updated_at: DateTime<Utc>,
    pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

impl RepositoryResponse {
    /// Metadata edits bump `updated_at`, pushes bump `pushed_at`; either counts.
    fn last_activity(&self) -> DateTime<Utc> {
        self.pushed_at
            .map_or(self.updated_at, |pushed| pushed.max(self.updated_at))
    }
}

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<Secret<String>>,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Authenticate requests with a personal access token (raises rate limits).
    #[must_use]
    pub fn with_token(mut self, token: Option<Secret<String>>) -> Self {
        self.token = token;
        self
    }

    async fn repository(&self, owner: &str, repo: &str) -> Result<RepositoryResponse> {
        let url = endpoint(&self.base_url, &format!("repos/{owner}/{repo}"))?;
        debug!(%url, "fetching github repository");

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }

        Ok(request
            .send()
            .await?
            .error_for_status()?
            .json::<RepositoryResponse>()
            .await?)
    }
}

#[async_trait]
impl GitHubFetch for GitHubClient {
    async fn fetch_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> linktrack_common::Result<RemoteState> {
        let response = self
            .repository(owner, repo)
            .await
            .map_err(|e| e.into_fetch(format!("github repository {owner}/{repo}")))?;
        Ok(RemoteState {
            last_activity: response.last_activity(),
            title: response.full_name,
            author: Some(response.owner.login),
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, linktrack_common::Error as CoreError, mockito::Matcher};

    fn body(updated_at: &str, pushed_at: Option<&str>) -> String {
        serde_json::json!({
            "full_name": "alice/repo",
            "owner": { "login": "alice" },
            "updated_at": updated_at,
            "pushed_at": pushed_at,
        })
        .to_string()
    }

    #[tokio::test]
    async fn fetches_latest_of_update_and_push() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/repo")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body("2024-01-01T00:00:00Z", Some("2024-03-01T12:00:00Z")))
            .create_async()
            .await;

        let client = GitHubClient::new(reqwest::Client::new(), server.url());
        let state = client.fetch_repository("alice", "repo").await.unwrap();

        assert_eq!(
            state.last_activity,
            "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(state.title, "alice/repo");
        assert_eq!(state.author.as_deref(), Some("alice"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_push_falls_back_to_update() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/alice/repo")
            .with_status(200)
            .with_body(body("2024-02-02T00:00:00Z", None))
            .create_async()
            .await;

        let client = GitHubClient::new(reqwest::Client::new(), server.url());
        let state = client.fetch_repository("alice", "repo").await.unwrap();

        assert_eq!(
            state.last_activity,
            "2024-02-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/alice/repo")
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_body(body("2024-01-01T00:00:00Z", None))
            .create_async()
            .await;

        let client = GitHubClient::new(reqwest::Client::new(), format!("{}/", server.url()))
            .with_token(Some(Secret::new("s3cret".to_string())));
        client.fetch_repository("alice", "repo").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_an_upstream_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let client = GitHubClient::new(reqwest::Client::new(), server.url());
        let err = client.fetch_repository("alice", "gone").await.unwrap_err();

        assert!(matches!(err, CoreError::UpstreamFetch { .. }));
        assert!(err.to_string().contains("404"));
    }
}
