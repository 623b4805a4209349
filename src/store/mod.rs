//! Record storage.
//!
//! Messages, replies and subscribers live in concurrent maps and are
//! snapshotted to a JSON file after each write when a path is configured.

pub mod memory;
pub mod models;

pub use memory::{MessageStore, StoreSummary};
pub use models::{
    ContactMessage, MessageStatus, NewContactMessage, Reply, ReplyDirection, Subscriber,
};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message {0} not found")]
    NotFound(Uuid),

    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
