//! Configuration schema — typed settings for the bot and its backend.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.docent/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub model: ModelConfig,
    pub slack: SlackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            slack: SlackConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────

/// Which response backend to build, and how.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Backend selector: `"hello"`, `"completion"`, or `"chat"`.
    pub backend: String,
    /// Conversation mode for the chat backend: `"chat"` (per-user
    /// history) or `"query"` (stateless).
    pub mode: String,
    /// Model identifier sent to the completions endpoint.
    pub name: String,
    /// API base URL (e.g. an Azure deployment or a local server).
    /// `None` uses the standard OpenAI path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// API key. Falls back to `OPENAI_API_KEY` if empty.
    pub api_key: String,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// System prompt prepended to chat-mode conversations.
    pub system_prompt: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: "hello".to_string(),
            mode: "chat".to_string(),
            name: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key: String::new(),
            max_tokens: 512,
            temperature: 0.2,
            system_prompt: "You are Docent, an assistant that answers questions \
                            about the organisation's documentation."
                .to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Slack
// ─────────────────────────────────────────────

/// Slack connection and dispatcher settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`) — used for Web API calls.
    /// Falls back to `SLACK_BOT_TOKEN` if empty.
    pub bot_token: String,
    /// App-level token (`xapp-...`) — required for Socket Mode.
    /// Falls back to `SLACK_APP_TOKEN` if empty.
    pub app_token: String,
    /// Slash command that clears a user's conversation history.
    /// Matched by prefix against the command Slack delivers.
    pub reset_command: String,
    /// Work queue capacity. Events arriving while the queue is full
    /// are dropped with a warning.
    pub queue_capacity: usize,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            app_token: String::new(),
            reset_command: "/clear_history".to_string(),
            queue_capacity: 12,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.backend, "hello");
        assert_eq!(config.model.mode, "chat");
        assert_eq!(config.slack.reset_command, "/clear_history");
        assert_eq!(config.slack.queue_capacity, 12);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "model": {
                "backend": "chat",
                "name": "gpt-4o",
                "apiBase": "https://example.com/v1",
                "maxTokens": 256
            },
            "slack": {
                "botToken": "xoxb-123",
                "appToken": "xapp-456",
                "queueCapacity": 4
            }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.model.backend, "chat");
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.model.api_base.as_deref(), Some("https://example.com/v1"));
        assert_eq!(config.model.max_tokens, 256);
        assert_eq!(config.slack.bot_token, "xoxb-123");
        assert_eq!(config.slack.queue_capacity, 4);
        // Defaults preserved for missing fields
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.slack.reset_command, "/clear_history");
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["model"].get("maxTokens").is_some());
        assert!(json["slack"].get("queueCapacity").is_some());
        assert!(json["model"].get("max_tokens").is_none());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let json_str = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json_str).unwrap();
        assert_eq!(deserialized.model.backend, config.model.backend);
        assert_eq!(deserialized.slack.queue_capacity, config.slack.queue_capacity);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.model.backend, "hello");
        assert_eq!(config.slack.queue_capacity, 12);
    }
}
