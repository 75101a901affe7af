//! Response model trait — the abstraction the dispatcher calls into.
//!
//! Every backend implements this trait. The dispatcher treats all
//! variants identically; they differ only in how the reply is obtained.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// A finite, non-restartable sequence of reply fragments.
/// Consumed by the interactive CLI, not by the Slack dispatcher.
pub type ReplyStream = BoxStream<'static, String>;

/// What a model call produced.
///
/// `message` is posted back to the originating channel; `emoji` is
/// applied as a reaction to the triggering message. Either may be
/// absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelReply {
    /// Text to post back, if any.
    pub message: Option<String>,
    /// Reaction emoji name (without colons), if any.
    pub emoji: Option<String>,
}

impl ModelReply {
    /// A reply carrying a message and no emoji.
    pub fn new(message: impl Into<String>) -> Self {
        ModelReply {
            message: Some(message.into()),
            emoji: None,
        }
    }

    /// A reply with nothing to post.
    pub fn empty() -> Self {
        ModelReply::default()
    }

    /// Attach a reaction emoji.
    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Whether there is a non-empty message to post.
    pub fn has_message(&self) -> bool {
        self.message.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// Trait that all response backends implement.
///
/// # Contract
///
/// Every method is **total** over well-formed `(message, user_id)`
/// input: internal failures (network, API, parse) come back as a
/// formatted error reply, never as a panic or an `Err` the dispatcher
/// would have to handle. A single bad request must not be able to take
/// the worker loop down.
#[async_trait]
pub trait ResponseModel: Send + Sync {
    /// Reply to a message sent directly to the bot.
    async fn direct_message(&self, message: &str, user_id: &str) -> ModelReply;

    /// Reply to an @-mention of the bot in a channel.
    async fn channel_mention(&self, message: &str, user_id: &str) -> ModelReply;

    /// Produce the reply as a stream of text fragments.
    ///
    /// The stream is finite and cannot be restarted; conversation state
    /// (where the backend keeps any) is updated once the stream ends.
    async fn stream_message(&self, message: &str, user_id: &str) -> ReplyStream;

    /// Drop the user's conversation state, if this backend keeps any.
    /// Returns `true` when there was a session to clear.
    fn clear_history(&self, user_id: &str) -> bool {
        let _ = user_id;
        false
    }

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
