//! Configuration loading, validation and env substitution.
//!
//! Config files: `roster.toml`, `roster.yaml`, `roster.yml` or `roster.json`,
//! searched in `./` then the user config dir (`~/.config/roster/`).
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{ContentConfig, LineConfig, ReloadPolicy, ResolverConfig, RosterConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
