//! A small replicated, multi-tenant JSON document store.
//!
//! This crate is the primary entry point for peerdoc. It re-exports the core
//! types from the sub-crates and adds the HTTP node that ties a store to its
//! peers.
//!
//! # Features
//!
//! - **Projects, collections, documents** - Schemaless JSON documents addressed by project and collection
//! - **MongoDB-style filters** - `$eq`, `$gt`, `$in`, `$regex`, `$and`, `$or` and friends, with dotted paths
//! - **Peer replication** - Every mutation is pushed to all peers with bounded retries
//! - **HTTP node** - An axum server exposing the store and the replication endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use peerdoc::{prelude::*, memory::InMemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::new());
//!     let users = store.collection("acme", "users");
//!
//!     users.create(json!({ "name": "Alice", "age": 30 })).await?;
//!     users.create(json!({ "name": "Bob", "age": 12 })).await?;
//!
//!     let adults = users
//!         .query(&Filter::try_from_json(json!({ "age": { "$gte": 18 } }))?)
//!         .await?;
//!
//!     println!("{} adult(s)", adults.count);
//!     Ok(())
//! }
//! ```
//!
//! # Running a node
//!
//! The `peerdoc-node` binary reads `PORT`, `PEERS` and
//! `REPLICATION_TIMEOUT_MS` from the environment (see [`config`]):
//!
//! ```text
//! PORT=8081 PEERS=localhost:8082 peerdoc-node
//! PORT=8082 PEERS=localhost:8081 peerdoc-node
//! ```

pub mod config;
pub mod node;
pub mod prelude;
pub mod server;

pub use peerdoc_core::{backend, collection, document, error, query, store, value};

/// In-memory storage backend.
pub mod memory {
    pub use peerdoc_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// Peer replication.
pub mod replication {
    pub use peerdoc_replication::*;
}
