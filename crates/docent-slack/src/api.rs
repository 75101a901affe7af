//! Slack Web API client — the outbound half of the dispatcher.
//!
//! Reactions are best-effort (a failed reaction is logged, never
//! propagated); posting a message is fallible so the worker can log the
//! failure per item.

use anyhow::{anyhow, bail, Result};
use serde_json::{json, Value};
use tracing::{debug, error};

/// Slack Web API base URL.
const SLACK_API_BASE: &str = "https://slack.com/api";

/// Slack message length limit for `chat.postMessage`.
const SLACK_MAX_LEN: usize = 4000;

/// Client for Slack Web API calls, authenticated with the bot token.
#[derive(Clone)]
pub struct SlackApi {
    http: reqwest::Client,
    bot_token: String,
    api_base: String,
}

impl std::fmt::Debug for SlackApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackApi")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SlackApi {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_api_base(bot_token, SLACK_API_BASE)
    }

    /// Point the client at a different API base (tests, proxies).
    pub fn with_api_base(bot_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        SlackApi {
            http: reqwest::Client::new(),
            bot_token: bot_token.into(),
            api_base: api_base.into(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), method)
    }

    /// POST a JSON body with the app-level token and return the parsed
    /// response body if `ok` is true.
    async fn call_with_token(&self, method: &str, token: &str, body: Value) -> Result<Value> {
        let resp = self
            .http
            .post(self.url(method))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let body: Value = resp.json().await?;
        if body["ok"].as_bool() != Some(true) {
            let err = body["error"].as_str().unwrap_or("unknown");
            bail!("{} failed: {}", method, err);
        }
        Ok(body)
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value> {
        self.call_with_token(method, &self.bot_token, body).await
    }

    /// Call `apps.connections.open` to get a WebSocket URL for Socket
    /// Mode. Uses the app-level token, not the bot token.
    pub async fn connections_open(&self, app_token: &str) -> Result<String> {
        let body = self
            .call_with_token("apps.connections.open", app_token, json!({}))
            .await?;
        body["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow!("no url in apps.connections.open response"))
    }

    /// Call `auth.test` to resolve the bot's own user ID.
    pub async fn auth_test(&self) -> Result<String> {
        let body = self.call("auth.test", json!({})).await?;
        body["user_id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow!("no user_id in auth.test response"))
    }

    /// Add a reaction to a message (best-effort).
    pub async fn add_reaction(&self, channel: &str, timestamp: &str, emoji: &str) {
        let result = self
            .call(
                "reactions.add",
                json!({ "channel": channel, "timestamp": timestamp, "name": emoji }),
            )
            .await;
        if let Err(e) = result {
            debug!(error = %e, emoji = %emoji, "reaction add failed (non-fatal)");
        }
    }

    /// Remove a reaction from a message (best-effort).
    pub async fn remove_reaction(&self, channel: &str, timestamp: &str, emoji: &str) {
        let result = self
            .call(
                "reactions.remove",
                json!({ "channel": channel, "timestamp": timestamp, "name": emoji }),
            )
            .await;
        if let Err(e) = result {
            debug!(error = %e, emoji = %emoji, "reaction remove failed (non-fatal)");
        }
    }

    /// Send a chat message via `chat.postMessage`, splitting bodies
    /// that exceed Slack's length limit.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        for chunk in Self::split_message(text) {
            if let Err(e) = self
                .call(
                    "chat.postMessage",
                    json!({ "channel": channel, "text": chunk }),
                )
                .await
            {
                error!(error = %e, channel = %channel, "failed to post message");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Split a long message into chunks of up to `SLACK_MAX_LEN`
    /// characters, preferring line boundaries.
    fn split_message(text: &str) -> Vec<String> {
        if text.len() <= SLACK_MAX_LEN {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut remaining = text;

        while !remaining.is_empty() {
            if remaining.len() <= SLACK_MAX_LEN {
                chunks.push(remaining.to_string());
                break;
            }

            // Walk back to a valid char boundary before slicing
            let mut safe_max = SLACK_MAX_LEN.min(remaining.len());
            while !remaining.is_char_boundary(safe_max) {
                safe_max -= 1;
            }

            let slice = &remaining[..safe_max];
            let split_at = slice.rfind('\n').unwrap_or(safe_max);
            let split_at = if split_at == 0 { safe_max } else { split_at };

            chunks.push(remaining[..split_at].to_string());
            remaining = remaining[split_at..].trim_start_matches('\n');
        }

        chunks
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
