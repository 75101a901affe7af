//! Docent Slack — Socket Mode event source and message dispatcher.
//!
//! This crate provides:
//! - **events**: Socket Mode envelope types, the inbound event union,
//!   and work classification (bot/subtype filtering)
//! - **api**: the Slack Web API client (reactions, messages)
//! - **dispatcher**: the ack-then-work core — filter, react, enqueue,
//!   and the single worker that answers queued messages
//! - **socket**: the persistent Socket Mode WebSocket connection

pub mod api;
pub mod dispatcher;
pub mod events;
pub mod socket;

pub use api::SlackApi;
pub use dispatcher::Dispatcher;
pub use events::{InboundEvent, SocketEnvelope};
pub use socket::SocketListener;
