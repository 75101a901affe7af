//! Queued work types — what the dispatcher hands to the worker.

use chrono::{DateTime, Utc};

/// How the user reached the bot, and therefore which model operation
/// the worker invokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkKind {
    /// A plain message sent directly to the bot.
    DirectMessage,
    /// An explicit @-mention of the bot in a channel.
    ChannelMention,
}

/// A classified inbound message waiting to be answered.
///
/// Owned by the queue from enqueue until the worker takes it; dropped
/// after processing whether the reply succeeded or not; never retried.
#[derive(Clone, Debug)]
pub struct WorkItem {
    /// Slack channel ID the message arrived in (reply target).
    pub channel: String,
    /// Slack timestamp of the original message (reaction target).
    pub ts: String,
    /// Message text as the user wrote it.
    pub text: String,
    /// Slack user ID of the sender.
    pub user_id: String,
    /// Direct message or channel mention.
    pub kind: WorkKind,
    /// When the dispatcher accepted the event.
    pub received_at: DateTime<Utc>,
}

impl WorkItem {
    /// Create a work item stamped with the current time.
    pub fn new(
        kind: WorkKind,
        channel: impl Into<String>,
        ts: impl Into<String>,
        text: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        WorkItem {
            channel: channel.into(),
            ts: ts.into(),
            text: text.into(),
            user_id: user_id.into(),
            kind,
            received_at: Utc::now(),
        }
    }
}
