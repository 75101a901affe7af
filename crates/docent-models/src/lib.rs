//! Docent Models — response backends for the Slack bot and CLI.
//!
//! # Architecture
//!
//! - [`traits::ResponseModel`] — trait that all backends implement;
//!   every call is total and returns a [`traits::ModelReply`] even on
//!   internal failure
//! - [`session`] — in-memory per-user conversation store
//! - [`hello::HelloModel`] — zero-configuration placeholder
//! - [`completion::CompletionModel`] — single-shot OpenAI-compatible
//!   completion backend
//! - [`chat::ChatModel`] — conversation-holding backend with chat and
//!   query modes
//! - [`setup::build_model`] — convenience builder from config

pub mod chat;
pub mod client;
pub mod completion;
pub mod hello;
pub mod session;
pub mod setup;
pub mod traits;

// Re-export main types for convenience
pub use chat::{ChatMode, ChatModel};
pub use completion::CompletionModel;
pub use hello::HelloModel;
pub use session::SessionStore;
pub use setup::build_model;
pub use traits::{ModelReply, ReplyStream, ResponseModel};
