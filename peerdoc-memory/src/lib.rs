//! In-memory document storage backend for peerdoc.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! The whole project hierarchy sits behind one async-aware read-write lock, so
//! writes are serialized store-wide while reads run concurrently.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and serialized writes using an async-aware RwLock
//! - **Implicit creation** - Document writes create missing projects and collections
//! - **Full query support** - Evaluates the peerdoc filter language in memory
//! - **Replication-friendly** - Idempotent `insert_with_id` for applying peer updates
//!
//! # Quick Start
//!
//! ```ignore
//! use peerdoc_core::{backend::StoreBackend, value::Value};
//! use peerdoc_memory::InMemoryStore;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryStore::builder().build();
//!     let data = Value::from(json!({ "name": "Alice" })).into_map()?;
//!
//!     let doc = store.create("acme", "users", data).await?;
//!     println!("created {}", doc.id);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as peerdoc_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
