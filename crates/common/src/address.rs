//! URL addressing rules: which part of a URL identifies what.
//!
//! Two keys matter:
//! - the **path** is the per-chat dedup key (host and query are ignored);
//! - the **host** (lowercased, without a leading `www.`) routes a link to
//!   the updater that owns its site.

use url::Url;

use crate::error::{Error, Result};

/// Parse user input into a trackable URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted.
pub fn parse_tracked_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::parse(raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::parse(raw, "only http and https links can be tracked"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::parse(raw, "link has no host"));
    }
    Ok(url)
}

/// Whether two URLs collide under the per-chat dedup rule.
pub fn same_path(a: &Url, b: &Url) -> bool {
    a.path() == b.path()
}

/// Canonical form of a domain used as a routing key.
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Routing key of a URL, or `None` for host-less URLs.
pub fn domain_of(url: &Url) -> Option<String> {
    url.host_str().map(normalize_domain)
}

/// Non-empty path segments, so `https://h/a//b/` yields `["a", "b"]`.
pub fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("https://github.com/alice/repo", "github.com")]
    #[case("https://WWW.GitHub.com/alice/repo", "github.com")]
    #[case("http://stackoverflow.com./questions/1", "stackoverflow.com")]
    #[case("https://api.github.com/x", "api.github.com")]
    fn extracts_routing_domain(#[case] raw: &str, #[case] expected: &str) {
        let url = Url::parse(raw).unwrap();
        assert_eq!(domain_of(&url).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("https://a.com/x?q=1", "https://a.com/x?q=2", true)]
    #[case("https://a.com/x", "https://b.com/x", true)]
    #[case("https://a.com/x", "https://a.com/x/", false)]
    #[case("https://a.com/x", "https://a.com/y", false)]
    fn dedups_on_path_only(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        let a = Url::parse(a).unwrap();
        let b = Url::parse(b).unwrap();
        assert_eq!(same_path(&a, &b), expected);
    }

    #[test]
    fn path_segments_skip_empty_parts() {
        let url = Url::parse("https://github.com/alice//repo/").unwrap();
        assert_eq!(path_segments(&url), vec!["alice", "repo"]);
    }

    #[test]
    fn rejects_non_http_links() {
        let err = parse_tracked_url("ftp://example.com/file").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(parse_tracked_url("not a url").is_err());
    }

    #[test]
    fn accepts_and_trims_http_links() {
        let url = parse_tracked_url("  https://github.com/alice/repo ").unwrap();
        assert_eq!(url.as_str(), "https://github.com/alice/repo");
    }
}
