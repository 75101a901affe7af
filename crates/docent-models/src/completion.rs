//! Single-shot completion backend.
//!
//! Each message is answered in isolation: no conversation state, no
//! session store, so `clear_history` never has anything to do. Direct
//! messages and channel mentions are treated identically.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::error;

use docent_core::config::schema::ModelConfig;

use crate::client::{error_reply, ChatMessage, CompletionsClient};
use crate::traits::{ModelReply, ReplyStream, ResponseModel};

const EMOJI: &str = "books";

/// Stateless OpenAI-compatible completion backend.
#[derive(Clone, Debug)]
pub struct CompletionModel {
    client: CompletionsClient,
}

impl CompletionModel {
    pub fn new(config: &ModelConfig) -> Self {
        CompletionModel {
            client: CompletionsClient::new(config),
        }
    }

    async fn get_reply(&self, message: &str) -> ModelReply {
        let messages = [ChatMessage::user(message)];
        match self.client.complete(&messages).await {
            Ok(content) => ModelReply::new(content).with_emoji(EMOJI),
            Err(e) => {
                error!(error = %e, "completion call failed");
                ModelReply::new(error_reply(&e)).with_emoji(EMOJI)
            }
        }
    }
}

#[async_trait]
impl ResponseModel for CompletionModel {
    async fn direct_message(&self, message: &str, _user_id: &str) -> ModelReply {
        self.get_reply(message).await
    }

    async fn channel_mention(&self, message: &str, _user_id: &str) -> ModelReply {
        self.get_reply(message).await
    }

    async fn stream_message(&self, message: &str, _user_id: &str) -> ReplyStream {
        let messages = vec![ChatMessage::user(message)];
        let client = self.client.clone();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let tx_err = tx.clone();
            if let Err(e) = client.complete_streaming(&messages, tx).await {
                error!(error = %e, "streaming completion failed");
                let _ = tx_err.send(error_reply(&e)).await;
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    fn display_name(&self) -> &str {
        "Completion"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
