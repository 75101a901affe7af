//! Docent Core — shared types, work queue, config, and utilities.
//!
//! This crate provides:
//! - **bus**: `WorkItem` and the bounded `WorkQueue` between the Slack
//!   dispatcher and its worker
//! - **config**: typed configuration schema + JSON/env loader
//! - **utils**: path and string helpers

pub mod bus;
pub mod config;
pub mod utils;

pub use bus::queue::{EnqueueError, WorkQueue};
pub use bus::types::{WorkItem, WorkKind};
pub use config::Config;
