use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::LinktrackConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "linktrack.toml",
    "linktrack.yaml",
    "linktrack.yml",
    "linktrack.json",
];

/// Environment variables that override file values.
pub const ENV_DATABASE_URL: &str = "LINKTRACK_DATABASE_URL";
pub const ENV_GITHUB_TOKEN: &str = "LINKTRACK_GITHUB_TOKEN";
pub const ENV_BOT_URL: &str = "LINKTRACK_BOT_URL";

/// A loaded config and the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: LinktrackConfig,
    pub path: Option<PathBuf>,
}

/// Load config from `explicit` if given, otherwise from the first file found
/// in the standard locations, otherwise defaults. Env overrides apply in
/// every case.
///
/// Search order:
/// 1. `./linktrack.{toml,yaml,yml,json}` (project-local)
/// 2. `<user config dir>/linktrack/linktrack.{toml,yaml,yml,json}`
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => find_config_file(),
    };

    let config = match &path {
        Some(p) => {
            debug!(path = %p.display(), "loading config");
            load_config(p)?
        },
        None => {
            debug!("no config file found, using defaults");
            let mut config = LinktrackConfig::default();
            apply_env_overrides(&mut config);
            config
        },
    };

    Ok(LoadedConfig { config, path })
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<LinktrackConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    let mut config = parse_config(&raw, path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply `LINKTRACK_*` environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut LinktrackConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(
    config: &mut LinktrackConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = set(ENV_DATABASE_URL) {
        info!(var = ENV_DATABASE_URL, "database url overridden from environment");
        config.database.url = url;
    }
    if let Some(token) = set(ENV_GITHUB_TOKEN) {
        config.clients.github_token = Some(Secret::new(token));
    }
    if let Some(url) = set(ENV_BOT_URL) {
        config.clients.bot_base_url = Some(url);
    }
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global
    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/linktrack/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "linktrack").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<LinktrackConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
