use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::HookfeedConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "hookfeed.toml",
    "hookfeed.yaml",
    "hookfeed.yml",
    "hookfeed.json",
];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported config format: .{0}")]
    UnsupportedFormat(String),
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<HookfeedConfig, Error> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./hookfeed.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/hookfeed/hookfeed.{toml,yaml,yml,json}` (user-global)
///
/// Returns `HookfeedConfig::default()` if no config file is found or the one
/// found cannot be loaded.
pub fn discover_and_load() -> HookfeedConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    HookfeedConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/hookfeed/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hookfeed").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> Result<HookfeedConfig, Error> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let parse_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::Parse {
        path: path.to_path_buf(),
        source,
    };

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.into())),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.into())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.into())),
        _ => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
