//! Error types for peer replication.
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `Transport` | Yes | Peer unreachable, connection dropped, request timed out |
//! | `Status` | Yes | Peer answered with a non-2xx status |
//! | `Serialization` | No | Payload could not be encoded or decoded |
//! | `InvalidPayload` | No | Received payload is missing a required field |
//! | `Store` | No | Applying a received payload to the local store failed |
//!
//! The sending side retries every delivery failure the same way; the
//! classification only matters to callers that surface errors themselves.

use peerdoc_core::error::DocumentStoreError;
use thiserror::Error;

/// Result type alias for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors that can occur while sending or applying replication payloads.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// The request to a peer could not be completed.
    #[error("transport error ({peer}): {message}")]
    Transport { peer: String, message: String },

    /// The peer answered, but not with a success status.
    #[error("peer responded with status {0}")]
    Status(u16),

    /// Encoding or decoding the wire payload failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A received payload lacks a required field.
    #[error("invalid replication payload: {0}")]
    InvalidPayload(String),

    /// The local store rejected the replicated change.
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

impl ReplicationError {
    /// Returns `true` for failures worth another delivery attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReplicationError::Transport { .. } | ReplicationError::Status(_))
    }
}
