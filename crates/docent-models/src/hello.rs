//! Zero-configuration placeholder backend.
//!
//! Answers every message with a canned greeting. Useful for wiring up
//! the Slack app and checking reactions/replies end to end before an
//! LLM backend is configured.

use async_trait::async_trait;
use futures_util::stream;

use crate::traits::{ModelReply, ReplyStream, ResponseModel};

const EMOJI: &str = "wave";

#[derive(Clone, Copy, Debug, Default)]
pub struct HelloModel;

impl HelloModel {
    pub fn new() -> Self {
        HelloModel
    }
}

#[async_trait]
impl ResponseModel for HelloModel {
    async fn direct_message(&self, _message: &str, _user_id: &str) -> ModelReply {
        ModelReply::new("Let's discuss this in a channel!").with_emoji(EMOJI)
    }

    async fn channel_mention(&self, _message: &str, user_id: &str) -> ModelReply {
        ModelReply::new(format!("Hello <@{user_id}>")).with_emoji(EMOJI)
    }

    async fn stream_message(&self, _message: &str, user_id: &str) -> ReplyStream {
        Box::pin(stream::iter(vec![format!("Hello <@{user_id}>")]))
    }

    fn display_name(&self) -> &str {
        "Hello"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_direct_message() {
        let model = HelloModel::new();
        let reply = model.direct_message("anything", "U1").await;
        assert_eq!(
            reply.message.as_deref(),
            Some("Let's discuss this in a channel!")
        );
        assert_eq!(reply.emoji.as_deref(), Some("wave"));
    }

    #[tokio::test]
    async fn test_channel_mention_greets_user() {
        let model = HelloModel::new();
        let reply = model.channel_mention("hi", "U42").await;
        assert_eq!(reply.message.as_deref(), Some("Hello <@U42>"));
    }

    #[tokio::test]
    async fn test_total_over_odd_input() {
        let model = HelloModel::new();
        // Empty, very long, and mention-syntax input all get a reply.
        assert!(model.direct_message("", "U1").await.has_message());
        let long = "x".repeat(100_000);
        assert!(model.direct_message(&long, "U1").await.has_message());
        assert!(model
            .channel_mention("<@U999> tell me", "U1")
            .await
            .has_message());
    }

    #[tokio::test]
    async fn test_stream_is_finite() {
        let model = HelloModel::new();
        let fragments: Vec<String> = model.stream_message("hi", "U7").await.collect().await;
        assert_eq!(fragments, vec!["Hello <@U7>".to_string()]);
    }

    #[test]
    fn test_no_history_to_clear() {
        let model = HelloModel::new();
        assert!(!model.clear_history("U1"));
    }
}
