//! Work queue — the bounded buffer between event intake and the worker.
//!
//! The dispatcher acknowledges Slack envelopes on one task and answers
//! them on another; the only thing shared between the two is this queue.

pub mod queue;
pub mod types;

pub use queue::{EnqueueError, WorkQueue};
pub use types::{WorkItem, WorkKind};
