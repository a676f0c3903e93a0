//! Core types for a replicated, multi-tenant JSON document store.
//!
//! This crate is the core of the peerdoc project and provides:
//!
//! - **Value model** ([`value`]) - The untyped, JSON-like payload representation
//! - **Documents** ([`document`]) - Stored and replicated document records
//! - **Collections** ([`collection`]) - Project/collection records and per-collection handles
//! - **Store backend abstraction** ([`backend`]) - The trait every storage backend implements
//! - **Query language** ([`query`]) - Filter validation, compilation and the visitor seam
//! - **Document store** ([`store`]) - Main interface wrapping a backend
//! - **Error handling** ([`error`]) - Error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use peerdoc_core::{store::DocumentStore, query::Filter};
//! use peerdoc_memory::InMemoryStore;
//! use serde_json::json;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let users = store.collection("acme", "users");
//!
//! users.create(json!({ "name": "Alice", "age": 30 })).await?;
//!
//! let adults = users
//!     .query(&Filter::try_from_json(json!({ "age": { "$gte": 18 } }))?)
//!     .await?;
//! assert_eq!(adults.count, 1);
//! ```

#[allow(unused_extern_crates)]
extern crate self as peerdoc_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod query;
pub mod store;
pub mod value;
