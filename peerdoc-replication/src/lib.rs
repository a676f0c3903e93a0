//! Peer-to-peer replication for peerdoc.
//!
//! Every successful local mutation is pushed to each configured peer as a
//! [`ReplicationPayload`]. Delivery is best effort: a detached task per peer
//! retries with linear backoff and then gives up, logging only. Receivers
//! hand payloads to [`apply`], which upserts or deletes idempotently by id.
//!
//! # Modules
//!
//! - [`payload`] - Wire format
//! - [`retry`] - Attempt count and backoff schedule
//! - [`transport`] - Per-attempt delivery (`PeerTransport`, `HttpTransport`)
//! - [`replicator`] - Fan-out to peers
//! - [`apply`](mod@apply) - Receiving side
//! - [`error`] - Error type and result alias

pub mod apply;
pub mod error;
pub mod payload;
pub mod replicator;
pub mod retry;
pub mod transport;

pub use apply::apply;
pub use error::{ReplicationError, Result};
pub use payload::{Operation, ReplicationPayload};
pub use replicator::{CompletionHook, PropagationReport, Replicator};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, PeerTransport};
