//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://linktrack.db?mode=rwc";
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_STACKOVERFLOW_BASE_URL: &str = "https://api.stackexchange.com/2.3";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinktrackConfig {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub registry: RegistryConfig,
    pub clients: ClientsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL, e.g. `sqlite://linktrack.db?mode=rwc` or `sqlite::memory:`.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between batches.
    pub interval_secs: u64,
    /// Links checked per batch, oldest checkpoint first.
    pub batch_size: usize,
    /// Links of one batch checked in parallel.
    pub concurrency: usize,
    /// Purge links no chat references at the start of every batch.
    pub sweep_unused: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            batch_size: 50,
            concurrency: 4,
            sweep_unused: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Purge orphaned links right after a link or chat is removed.
    pub purge_on_remove: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            purge_on_remove: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientsConfig {
    pub github_base_url: String,
    pub stackoverflow_base_url: String,
    /// Bot endpoint receiving link updates. Without it updates are only logged.
    pub bot_base_url: Option<String>,
    /// GitHub personal access token.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub github_token: Option<Secret<String>>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            github_base_url: DEFAULT_GITHUB_BASE_URL.into(),
            stackoverflow_base_url: DEFAULT_STACKOVERFLOW_BASE_URL.into(),
            bot_base_url: None,
            github_token: None,
            timeout_secs: 10,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
