//! Config loader — reads `~/.docent/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.docent/config.json`
//! 3. Environment variables `DOCENT_<SECTION>__<FIELD>` (override JSON)
//! 4. Conventional fallbacks (`SLACK_BOT_TOKEN`, `SLACK_APP_TOKEN`,
//!    `OPENAI_API_KEY`) for fields still empty after the above

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't
/// be parsed. Startup never fails on a bad config file, only on
/// missing credentials later.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `DOCENT_<SECTION>__<FIELD>` (double underscore as
/// delimiter):
/// - `DOCENT_MODEL__BACKEND` → `model.backend`
/// - `DOCENT_MODEL__MODE` → `model.mode`
/// - `DOCENT_MODEL__NAME` → `model.name`
/// - `DOCENT_MODEL__API_KEY` / `DOCENT_MODEL__API_BASE`
/// - `DOCENT_SLACK__BOT_TOKEN` / `DOCENT_SLACK__APP_TOKEN`
/// - `DOCENT_SLACK__RESET_COMMAND`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(v) = std::env::var("DOCENT_MODEL__BACKEND") {
        config.model.backend = v;
    }
    if let Ok(v) = std::env::var("DOCENT_MODEL__MODE") {
        config.model.mode = v;
    }
    if let Ok(v) = std::env::var("DOCENT_MODEL__NAME") {
        config.model.name = v;
    }
    if let Ok(v) = std::env::var("DOCENT_MODEL__API_KEY") {
        config.model.api_key = v;
    }
    if let Ok(v) = std::env::var("DOCENT_MODEL__API_BASE") {
        config.model.api_base = Some(v);
    }
    if let Ok(v) = std::env::var("DOCENT_SLACK__BOT_TOKEN") {
        config.slack.bot_token = v;
    }
    if let Ok(v) = std::env::var("DOCENT_SLACK__APP_TOKEN") {
        config.slack.app_token = v;
    }
    if let Ok(v) = std::env::var("DOCENT_SLACK__RESET_COMMAND") {
        config.slack.reset_command = v;
    }

    // Conventional fallbacks for credentials left empty
    if config.slack.bot_token.is_empty() {
        if let Ok(v) = std::env::var("SLACK_BOT_TOKEN") {
            config.slack.bot_token = v;
        }
    }
    if config.slack.app_token.is_empty() {
        if let Ok(v) = std::env::var("SLACK_APP_TOKEN") {
            config.slack.app_token = v;
        }
    }
    if config.model.api_key.is_empty() {
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            config.model.api_key = v;
        }
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
