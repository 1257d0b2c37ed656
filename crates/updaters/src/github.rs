//! `github.com/{owner}/{repo}` links.

use std::sync::Arc;

use {
    linktrack_common::{Error, Result, address},
    url::Url,
};

use crate::{
    context::UpdateContext,
    fetch::{GitHubFetch, RemoteState},
};

pub const DOMAIN: &str = "github.com";

/// Owner and repository named by a GitHub link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn tokens(&self) -> Vec<String> {
        vec![self.owner.clone(), self.repo.clone()]
    }
}

/// Split `https://github.com/{owner}/{repo}` into its parts.
///
/// Exactly two path segments are accepted; a trailing slash is fine and a
/// `.git` suffix on the repository is dropped.
pub fn parse_repo(url: &Url) -> Result<RepoRef> {
    if address::domain_of(url).as_deref() != Some(DOMAIN) {
        return Err(Error::parse(url, "not a github.com link"));
    }
    let segments = address::path_segments(url);
    let [owner, repo] = segments.as_slice() else {
        return Err(Error::parse(
            url,
            format!("expected /{{owner}}/{{repo}}, got {} path segments", segments.len()),
        ));
    };
    let repo = repo.strip_suffix(".git").unwrap_or(*repo);
    if repo.is_empty() {
        return Err(Error::parse(url, "repository name is empty"));
    }
    Ok(RepoRef {
        owner: (*owner).to_string(),
        repo: repo.to_string(),
    })
}

pub struct GitHubUpdater {
    client: Arc<dyn GitHubFetch>,
    context: Arc<UpdateContext>,
}

impl GitHubUpdater {
    pub fn new(client: Arc<dyn GitHubFetch>, context: Arc<UpdateContext>) -> Self {
        Self { client, context }
    }

    pub(crate) fn context(&self) -> &UpdateContext {
        &self.context
    }

    pub(crate) async fn fetch(&self, url: &Url) -> Result<(RemoteState, String)> {
        let repo = parse_repo(url)?;
        let state = self.client.fetch_repository(&repo.owner, &repo.repo).await?;
        let description = describe(&repo, &state);
        Ok((state, description))
    }
}

fn describe(repo: &RepoRef, state: &RemoteState) -> String {
    let owner = state.author.as_deref().unwrap_or(&repo.owner);
    format!("Repository {} has new activity\nowner: {owner}", repo.repo)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("https://github.com/alice/repo", "alice", "repo")]
    #[case("https://github.com/alice/repo/", "alice", "repo")]
    #[case("https://www.github.com/alice/repo.git", "alice", "repo")]
    #[case("http://GitHub.com/alice/repo?tab=readme", "alice", "repo")]
    fn parses_owner_and_repo(#[case] raw: &str, #[case] owner: &str, #[case] repo: &str) {
        let parsed = parse_repo(&Url::parse(raw).unwrap()).unwrap();
        assert_eq!(parsed.owner, owner);
        assert_eq!(parsed.repo, repo);
        assert_eq!(parsed.tokens(), vec![owner.to_string(), repo.to_string()]);
    }

    #[rstest]
    #[case("https://github.com/alice")]
    #[case("https://github.com/alice/repo/issues")]
    #[case("https://github.com/")]
    #[case("https://github.com/alice/.git")]
    #[case("https://gitlab.com/alice/repo")]
    fn rejects_other_shapes(#[case] raw: &str) {
        let err = parse_repo(&Url::parse(raw).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{raw}: {err}");
    }

    #[test]
    fn description_names_repo_and_owner() {
        let repo = RepoRef {
            owner: "alice".into(),
            repo: "repo".into(),
        };
        let state = RemoteState {
            last_activity: Default::default(),
            title: "alice/repo".into(),
            author: None,
        };
        let text = describe(&repo, &state);
        assert!(text.contains("repo"));
        assert!(text.contains("alice"));
    }
}
