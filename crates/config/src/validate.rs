//! Configuration validation.
//!
//! Flags syntax errors, unknown or misspelled keys, and settings the
//! scheduler or clients cannot run with.

use std::path::{Path, PathBuf};

use url::Url;

use crate::schema::LinktrackConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "value", "security"
    pub category: &'static str,
    /// Dotted path, e.g. "scheduler.batch_size"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Known sections and their fields.
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("database", &["url"]),
    ("scheduler", &[
        "interval_secs",
        "batch_size",
        "concurrency",
        "sweep_unused",
    ]),
    ("registry", &["purge_on_remove"]),
    ("clients", &[
        "github_base_url",
        "stackoverflow_base_url",
        "bot_base_url",
        "github_token",
        "timeout_secs",
    ]),
];

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

fn unknown_field(path: String, key: &str, candidates: &[&str]) -> Diagnostic {
    let message = match suggest(key, candidates, 3) {
        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
        None => "unknown field".to_string(),
    };
    Diagnostic::new(Severity::Error, "unknown-field", path, message)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered one if `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults",
        )];
        diagnostics.extend(validate_config(&LinktrackConfig::default()));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let mut result = if is_toml {
        match std::fs::read_to_string(&actual_path) {
            Ok(content) => validate_toml_str(&content),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    format!("failed to read config file: {e}"),
                )],
                config_path: None,
            },
        }
    } else {
        // YAML and JSON skip the key walk; loading still catches type errors.
        match crate::loader::load_config(&actual_path) {
            Ok(config) => ValidationResult {
                diagnostics: validate_config(&config),
                config_path: None,
            },
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    e.to_string(),
                )],
                config_path: None,
            },
        }
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    if let Some(table) = value.as_table() {
        check_unknown_fields(table, &mut diagnostics);
    }

    match toml::from_str::<LinktrackConfig>(toml_str) {
        Ok(config) => diagnostics.extend(validate_config(&config)),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(table: &toml::Table, diagnostics: &mut Vec<Diagnostic>) {
    let sections: Vec<&str> = KNOWN_KEYS.iter().map(|(s, _)| *s).collect();

    for (key, value) in table {
        let Some((_, fields)) = KNOWN_KEYS.iter().find(|(s, _)| *s == key.as_str()) else {
            diagnostics.push(unknown_field(key.clone(), key, &sections));
            continue;
        };
        let Some(section) = value.as_table() else {
            continue;
        };
        for field in section.keys() {
            if !fields.contains(&field.as_str()) {
                diagnostics.push(unknown_field(format!("{key}.{field}"), field, fields));
            }
        }
    }
}

/// Semantic checks on a parsed config.
#[must_use]
pub fn validate_config(config: &LinktrackConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let scheduler = &config.scheduler;
    let clients = &config.clients;

    if !config.database.url.starts_with("sqlite:") {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "database.url",
            format!("expected a sqlite: URL, got \"{}\"", config.database.url),
        ));
    }

    for (path, value) in [
        ("scheduler.interval_secs", scheduler.interval_secs as usize),
        ("scheduler.batch_size", scheduler.batch_size),
        ("scheduler.concurrency", scheduler.concurrency),
        ("clients.timeout_secs", clients.timeout_secs as usize),
    ] {
        if value == 0 {
            out.push(Diagnostic::new(
                Severity::Error,
                "value",
                path,
                "must be greater than zero",
            ));
        }
    }

    if scheduler.batch_size > 0 && scheduler.concurrency > scheduler.batch_size {
        out.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "scheduler.concurrency",
            format!(
                "concurrency {} exceeds batch_size {}; extra workers stay idle",
                scheduler.concurrency, scheduler.batch_size
            ),
        ));
    }

    let mut urls = vec![
        ("clients.github_base_url", clients.github_base_url.as_str()),
        (
            "clients.stackoverflow_base_url",
            clients.stackoverflow_base_url.as_str(),
        ),
    ];
    if let Some(bot) = &clients.bot_base_url {
        urls.push(("clients.bot_base_url", bot.as_str()));
    }
    for (path, raw) in urls {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {},
            Ok(url) => out.push(Diagnostic::new(
                Severity::Error,
                "value",
                path,
                format!("unsupported scheme \"{}\"", url.scheme()),
            )),
            Err(e) => out.push(Diagnostic::new(
                Severity::Error,
                "value",
                path,
                format!("invalid URL: {e}"),
            )),
        }
    }

    if clients.bot_base_url.is_none() {
        out.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "clients.bot_base_url",
            "not set; link updates will only be logged",
        ));
    }

    if clients.github_token.is_none() {
        out.push(Diagnostic::new(
            Severity::Info,
            "security",
            "clients.github_token",
            "not set; GitHub requests are unauthenticated and heavily rate limited",
        ));
    }

    out
}
