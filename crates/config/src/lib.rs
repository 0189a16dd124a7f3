//! Configuration loading and env substitution.
//!
//! Config files: `hookfeed.toml`, `hookfeed.yaml` or `hookfeed.json`,
//! searched in `./` then `~/.config/hookfeed/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, which is the
//! intended way to keep the bot token and webhook secret out of the file.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod watcher;

pub use {
    loader::{Error, config_dir, discover_and_load, find_config_file, load_config},
    schema::{FeedsConfig, GithubConfig, HookfeedConfig, MattermostConfig, ServerConfig},
    watcher::{ConfigWatchEvent, ConfigWatcher},
};
