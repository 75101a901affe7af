//! Conversation backend — the chat/query engine over a completions API.
//!
//! In `Chat` mode each user gets a lazily-created session whose history
//! is replayed on every call, so follow-up questions work. In `Query`
//! mode every call stands alone and there is never history to clear.
//!
//! Retrieval quality is the endpoint's concern; this backend owns the
//! conversation state and the total-reply contract.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error};

use docent_core::config::schema::ModelConfig;

use crate::client::{error_reply, ChatMessage, CompletionsClient};
use crate::session::SessionStore;
use crate::traits::{ModelReply, ReplyStream, ResponseModel};

const EMOJI: &str = "brain";

/// Whether the backend keeps per-user conversation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatMode {
    /// Per-user history, replayed on every call.
    Chat,
    /// Stateless; each question stands alone.
    Query,
}

impl ChatMode {
    /// Parse the config string (`"chat"` or `"query"`).
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "chat" => Ok(ChatMode::Chat),
            "query" => Ok(ChatMode::Query),
            other => bail!("mode must be 'chat' or 'query', got '{other}'"),
        }
    }
}

/// Conversation-holding OpenAI-compatible backend.
pub struct ChatModel {
    client: CompletionsClient,
    mode: ChatMode,
    system_prompt: String,
    sessions: Arc<SessionStore>,
}

impl ChatModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(ChatModel {
            client: CompletionsClient::new(config),
            mode: ChatMode::parse(&config.mode)?,
            system_prompt: config.system_prompt.clone(),
            sessions: Arc::new(SessionStore::new()),
        })
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// History to replay for this call — empty in query mode.
    fn history_for(&self, user_id: &str) -> Vec<ChatMessage> {
        match self.mode {
            ChatMode::Chat => self.sessions.history(user_id),
            ChatMode::Query => Vec::new(),
        }
    }

    fn build_messages(&self, history: &[ChatMessage], message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(message));
        messages
    }

    async fn get_reply(&self, message: &str, user_id: &str) -> ModelReply {
        let history = self.history_for(user_id);
        let messages = self.build_messages(&history, message);

        debug!(
            user_id = %user_id,
            mode = ?self.mode,
            history_turns = history.len(),
            "requesting chat reply"
        );

        match self.client.complete(&messages).await {
            Ok(content) => {
                // Only a successful exchange becomes part of the
                // conversation; a failed call leaves the session as-is.
                if self.mode == ChatMode::Chat {
                    self.sessions.record(user_id, message, &content);
                }
                ModelReply::new(content).with_emoji(EMOJI)
            }
            Err(e) => {
                error!(error = %e, user_id = %user_id, "chat call failed");
                ModelReply::new(error_reply(&e)).with_emoji(EMOJI)
            }
        }
    }
}

#[async_trait]
impl ResponseModel for ChatModel {
    async fn direct_message(&self, message: &str, user_id: &str) -> ModelReply {
        self.get_reply(message, user_id).await
    }

    async fn channel_mention(&self, message: &str, user_id: &str) -> ModelReply {
        self.get_reply(message, user_id).await
    }

    async fn stream_message(&self, message: &str, user_id: &str) -> ReplyStream {
        let history = self.history_for(user_id);
        let messages = self.build_messages(&history, message);

        let client = self.client.clone();
        let mode = self.mode;
        let sessions = self.sessions.clone();
        let user_id = user_id.to_string();
        let message = message.to_string();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let tx_err = tx.clone();
            match client.complete_streaming(&messages, tx).await {
                Ok(content) => {
                    if mode == ChatMode::Chat {
                        sessions.record(&user_id, &message, &content);
                    }
                }
                Err(e) => {
                    error!(error = %e, "streaming chat call failed");
                    let _ = tx_err.send(error_reply(&e)).await;
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    fn clear_history(&self, user_id: &str) -> bool {
        self.mode == ChatMode::Chat && self.sessions.reset(user_id)
    }

    fn display_name(&self) -> &str {
        "Chat"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
