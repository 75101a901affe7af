//! HTTP client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Shared by the completion and chat backends. The base URL, API key
//! and sampling parameters are captured at construction time and passed
//! explicitly with every request; there is no process-global SDK state
//! to configure.

use anyhow::{bail, Context, Result};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use docent_core::config::schema::ModelConfig;

/// Standard OpenAI API base, used when no `apiBase` is configured.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Request timeout. Generation can legitimately take minutes; this only
/// bounds a wedged connection.
const REQUEST_TIMEOUT_SECS: u64 = 120;

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

/// One turn in a conversation, in OpenAI message format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

// ─────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────

/// Connection-pooled client for one completions endpoint.
#[derive(Clone)]
pub struct CompletionsClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl std::fmt::Debug for CompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionsClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl CompletionsClient {
    /// Create a client from model config.
    pub fn new(config: &ModelConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        CompletionsClient {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: config.name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// The model identifier requests are sent with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// One blocking completion call; returns the assistant's text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(
            model = %self.model,
            messages = messages.len(),
            "requesting completion"
        );

        let body = CompletionsRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("completions request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            bail!("completions API returned {status}: {error_text}");
        }

        let parsed: CompletionsResponse = response
            .json()
            .await
            .context("failed to parse completions response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content)
    }

    /// Streaming completion call. Each content delta is forwarded to
    /// `tx` as it arrives; the accumulated text is returned once the
    /// server finishes.
    ///
    /// SSE frames are separated by blank lines; each `data:` payload is
    /// a JSON chunk, terminated by a literal `[DONE]`.
    pub async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        tx: mpsc::Sender<String>,
    ) -> Result<String> {
        let body = CompletionsRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: true,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("streaming completions request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            bail!("completions API returned {status}: {error_text}");
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut content = String::new();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("error reading completion stream")?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.windows(2).position(|w| w == b"\n\n") {
                let frame_bytes: Vec<u8> = buffer.drain(..pos).collect();
                buffer.drain(..2);
                let frame = String::from_utf8_lossy(&frame_bytes);
                let line = frame.trim();

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    break 'outer;
                }

                if let Ok(event) = serde_json::from_str::<StreamChunk>(data) {
                    if let Some(delta) = event
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                    {
                        content.push_str(&delta);
                        // Receiver hung up (the CLI stopped listening);
                        // stop pulling from the server too.
                        if tx.send(delta).await.is_err() {
                            break 'outer;
                        }
                    }
                }
            }
        }

        Ok(content)
    }
}

/// Format an internal failure as a user-visible reply.
pub(crate) fn error_reply(err: &anyhow::Error) -> String {
    format!(
        "Oh no! When I tried to get a response to your prompt, \
         I got the following error:\n```\n{err:#}\n```"
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_base: Option<&str>) -> ModelConfig {
        ModelConfig {
            api_base: api_base.map(String::from),
            api_key: "test-key".to_string(),
            name: "gpt-4o-mini".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_completions_url_default_base() {
        let client = CompletionsClient::new(&make_config(None));
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_completions_url_trailing_slash() {
        let client = CompletionsClient::new(&make_config(Some("https://example.com/v1/")));
        assert_eq!(
            client.completions_url(),
            "https://example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
    }

    #[test]
    fn test_error_reply_includes_cause() {
        let err = anyhow::anyhow!("connection refused");
        let reply = error_reply(&err);
        assert!(reply.contains("Oh no!"));
        assert!(reply.contains("connection refused"));
    }
}
