//! Convenient re-exports of commonly used types from peerdoc.
//!
//! ```ignore
//! use peerdoc::prelude::*;
//! ```

pub use peerdoc_core::{
    backend::StoreBackend,
    collection::{Collection, CollectionRef, Project},
    document::{Document, ReplicatedDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, Filter, Operator, QueryResult, QueryVisitor},
    store::DocumentStore,
    value::{Map, Value},
};
pub use peerdoc_replication::{ReplicationPayload, Replicator, RetryPolicy};
