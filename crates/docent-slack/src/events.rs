//! Socket Mode envelope types and inbound event classification.
//!
//! Slack delivers everything wrapped in an envelope whose `envelope_id`
//! must be acknowledged quickly or the platform redelivers. Inside an
//! `events_api` envelope sits the actual event; `slash_commands`
//! envelopes carry the command fields at the payload's top level.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use docent_core::bus::types::{WorkItem, WorkKind};

// ─────────────────────────────────────────────
// Socket Mode types
// ─────────────────────────────────────────────

/// Socket Mode envelope received from Slack.
#[derive(Debug, Clone, Deserialize)]
pub struct SocketEnvelope {
    /// Envelope ID — must be ACKed immediately.
    pub envelope_id: String,
    /// Envelope type: `"events_api"`, `"slash_commands"`, or other.
    #[serde(rename = "type")]
    pub envelope_type: String,
    /// The payload (events_api wraps an event callback).
    #[serde(default)]
    pub payload: Value,
}

impl SocketEnvelope {
    /// Whether this envelope class requires an acknowledgement.
    pub fn requires_ack(&self) -> bool {
        matches!(self.envelope_type.as_str(), "events_api" | "slash_commands")
    }
}

/// ACK response sent back to Slack.
#[derive(Debug, Serialize)]
pub struct SocketAck {
    pub envelope_id: String,
}

// ─────────────────────────────────────────────
// Inbound events
// ─────────────────────────────────────────────

/// What an envelope turned out to contain.
///
/// Field options mirror what Slack actually guarantees: `subtype`,
/// `bot_id` and `hidden` only appear on some messages, and malformed
/// events may miss anything.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A plain message (DM or channel).
    Message {
        channel: Option<String>,
        ts: Option<String>,
        text: Option<String>,
        user: Option<String>,
        bot_id: Option<String>,
        subtype: Option<String>,
        hidden: bool,
    },
    /// The bot was @-mentioned.
    AppMention {
        channel: Option<String>,
        ts: Option<String>,
        text: Option<String>,
        user: Option<String>,
        bot_id: Option<String>,
    },
    /// A slash command invocation.
    SlashCommand {
        command: String,
        user_id: String,
        channel_id: String,
    },
    /// Anything else — logged and dropped.
    Unknown { event_type: String },
}

/// Extract the inner event from an acknowledged envelope.
///
/// Returns `None` when the payload is missing the pieces we need; the
/// event is dropped with a warning and produces no further side effects.
pub fn parse_envelope(envelope: &SocketEnvelope) -> Option<InboundEvent> {
    match envelope.envelope_type.as_str() {
        "events_api" => {
            let event = match envelope.payload.get("event") {
                Some(e) => e,
                None => {
                    warn!("events_api envelope has no event object");
                    return None;
                }
            };
            let event_type = event["type"].as_str().unwrap_or("");

            let str_field = |name: &str| {
                event.get(name).and_then(|v| v.as_str()).map(String::from)
            };

            match event_type {
                "message" => Some(InboundEvent::Message {
                    channel: str_field("channel"),
                    ts: str_field("ts"),
                    text: str_field("text"),
                    user: str_field("user"),
                    bot_id: str_field("bot_id"),
                    subtype: str_field("subtype"),
                    hidden: event["hidden"].as_bool().unwrap_or(false),
                }),
                "app_mention" => Some(InboundEvent::AppMention {
                    channel: str_field("channel"),
                    ts: str_field("ts"),
                    text: str_field("text"),
                    user: str_field("user"),
                    bot_id: str_field("bot_id"),
                }),
                other => Some(InboundEvent::Unknown {
                    event_type: other.to_string(),
                }),
            }
        }
        "slash_commands" => {
            let payload = &envelope.payload;
            let command = payload["command"].as_str();
            let user_id = payload["user_id"].as_str();
            let channel_id = payload["channel_id"].as_str();
            match (command, user_id, channel_id) {
                (Some(command), Some(user_id), Some(channel_id)) => {
                    Some(InboundEvent::SlashCommand {
                        command: command.to_string(),
                        user_id: user_id.to_string(),
                        channel_id: channel_id.to_string(),
                    })
                }
                _ => {
                    warn!("slash_commands envelope missing command/user_id/channel_id");
                    None
                }
            }
        }
        other => {
            info!(envelope_type = %other, "received unexpected envelope type");
            None
        }
    }
}

/// Classify an event into queueable work.
///
/// Returns `None` for everything that must not reach the queue: the
/// bot's own messages, subtype'd/hidden notifications (edits, deletes,
/// joins), unknown event types, and events missing mandatory fields.
pub fn classify(event: &InboundEvent) -> Option<WorkItem> {
    match event {
        InboundEvent::Message {
            channel,
            ts,
            text,
            user,
            bot_id,
            subtype,
            hidden,
        } => {
            if bot_id.is_some() {
                info!("ignoring an event triggered by a bot");
                return None;
            }
            if subtype.is_some() {
                info!(subtype = subtype.as_deref().unwrap_or(""), "ignoring message with subtype");
                return None;
            }
            if *hidden {
                info!("ignoring hidden message");
                return None;
            }
            let (channel, ts, text, user) = require_fields(channel, ts, text, user)?;
            Some(WorkItem::new(WorkKind::DirectMessage, channel, ts, text, user))
        }
        InboundEvent::AppMention {
            channel,
            ts,
            text,
            user,
            bot_id,
        } => {
            if bot_id.is_some() {
                info!("ignoring a mention triggered by a bot");
                return None;
            }
            let (channel, ts, text, user) = require_fields(channel, ts, text, user)?;
            Some(WorkItem::new(WorkKind::ChannelMention, channel, ts, text, user))
        }
        InboundEvent::SlashCommand { .. } => {
            // Commands bypass the queue; the dispatcher answers inline.
            debug!("slash command is not queueable work");
            None
        }
        InboundEvent::Unknown { event_type } => {
            info!(event_type = %event_type, "received unexpected event type");
            None
        }
    }
}

fn require_fields<'a>(
    channel: &'a Option<String>,
    ts: &'a Option<String>,
    text: &'a Option<String>,
    user: &'a Option<String>,
) -> Option<(&'a str, &'a str, &'a str, &'a str)> {
    match (channel, ts, text, user) {
        (Some(c), Some(ts), Some(text), Some(user)) => {
            Some((c.as_str(), ts.as_str(), text.as_str(), user.as_str()))
        }
        _ => {
            warn!("event is missing channel/ts/text/user, dropping");
            None
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
