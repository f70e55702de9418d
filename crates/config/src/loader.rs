use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::RosterConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["roster.toml", "roster.yaml", "roster.yml", "roster.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<RosterConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the config, then apply environment overrides.
///
/// An explicit `path` must load; otherwise the standard locations are
/// searched:
/// 1. `./roster.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/roster/roster.{toml,yaml,yml,json}` (user-global)
///
/// A discovered file that fails to parse is logged and replaced by the
/// defaults. Returns the config and the file it came from, if any.
pub fn discover_and_load(path: Option<&Path>) -> Result<(RosterConfig, Option<PathBuf>)> {
    let (mut config, source) = match path {
        Some(path) => (load_config(path)?, Some(path.to_path_buf())),
        None => match find_config_file() {
            Some(found) => {
                debug!(path = %found.display(), "loading config");
                match load_config(&found) {
                    Ok(cfg) => (cfg, Some(found)),
                    Err(e) => {
                        warn!(path = %found.display(), error = %e, "failed to load config, using defaults");
                        (RosterConfig::default(), None)
                    },
                }
            },
            None => {
                debug!("no config file found, using defaults");
                (RosterConfig::default(), None)
            },
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok((config, source))
}

/// Apply `ROSTER_CONTENT_PATH` and `LINE_CHANNEL_ACCESS_TOKEN` on top of the
/// file config. Empty values are ignored.
pub fn apply_env_overrides(config: &mut RosterConfig, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    if let Some(path) = lookup("ROSTER_CONTENT_PATH") {
        config.content.path = PathBuf::from(path);
    }
    if let Some(token) = lookup("LINE_CHANNEL_ACCESS_TOKEN") {
        config.line.channel_access_token = Secret::new(token);
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/roster/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "roster").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<RosterConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
