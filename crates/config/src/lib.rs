//! Configuration loading, validation, and env substitution.
//!
//! Config files: `linktrack.toml`, `linktrack.yaml`, `linktrack.yml`, or
//! `linktrack.json`, searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{LoadedConfig, apply_env_overrides, config_dir, load, load_config},
    schema::{ClientsConfig, DatabaseConfig, LinktrackConfig, RegistryConfig, SchedulerConfig},
    validate::{
        Diagnostic, Severity, ValidationResult, validate, validate_config, validate_toml_str,
    },
};
