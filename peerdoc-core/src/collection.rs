//! Projects, collections, and per-collection handles.
//!
//! [`Project`] and [`Collection`] are the records making up the store
//! hierarchy. [`CollectionRef`] is a lightweight handle bound to one
//! `(project, collection)` pair on a backend, so callers don't have to thread
//! both names through every call.
//!
//! # Example
//!
//! ```ignore
//! use peerdoc_core::{store::DocumentStore, query::Filter};
//!
//! # async fn example(store: &DocumentStore<impl peerdoc_core::backend::StoreBackend>) -> peerdoc_core::error::DocumentStoreResult<()> {
//! let users = store.collection("acme", "users");
//! let alice = users.create(serde_json::json!({ "name": "Alice" })).await?;
//! let result = users.query(&Filter::try_from_json(serde_json::json!({ "name": "Alice" }))?).await?;
//! assert_eq!(result.count, 1);
//! # Ok(()) }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    backend::StoreBackend,
    document::{Document, ReplicatedDocument},
    error::DocumentStoreResult,
    query::{Filter, QueryResult},
    value::Value,
};

/// A named bucket of documents within a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub documents: HashMap<String, Document>,
}

impl Collection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            documents: HashMap::new(),
        }
    }
}

/// A top-level tenant namespace containing collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub collections: HashMap<String, Collection>,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collections: HashMap::new(),
        }
    }
}

/// A handle to one collection on a backend.
///
/// Holds only the names and a reference to the backend; the collection itself
/// need not exist until the first write.
#[derive(Debug)]
pub struct CollectionRef<'a, B: StoreBackend> {
    project: String,
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> CollectionRef<'a, B> {
    /// Creates a new collection handle.
    pub fn new(project: String, name: String, backend: &'a B) -> Self {
        Self { project, name, backend }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a new document. The payload must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDataShape` if `data` is not an object.
    pub async fn create(&self, data: impl Into<Value>) -> DocumentStoreResult<Document> {
        self.backend
            .create(&self.project, &self.name, data.into().into_map()?)
            .await
    }

    pub async fn get(&self, id: &str) -> DocumentStoreResult<Document> {
        self.backend
            .get(&self.project, &self.name, id)
            .await
    }

    pub async fn all(&self) -> DocumentStoreResult<Vec<Document>> {
        self.backend
            .get_all(&self.project, &self.name)
            .await
    }

    /// Replaces a document's payload. The payload must be a JSON object.
    pub async fn update(&self, id: &str, data: impl Into<Value>) -> DocumentStoreResult<Document> {
        self.backend
            .update(&self.project, &self.name, id, data.into().into_map()?)
            .await
    }

    pub async fn delete(&self, id: &str) -> DocumentStoreResult<()> {
        self.backend
            .delete(&self.project, &self.name, id)
            .await
    }

    pub async fn upsert(&self, document: ReplicatedDocument) -> DocumentStoreResult<()> {
        self.backend
            .insert_with_id(&self.project, &self.name, document)
            .await
    }

    /// Runs a filter over the collection and returns the matches with their count.
    pub async fn query(&self, filter: &Filter) -> DocumentStoreResult<QueryResult> {
        Ok(
            self.backend
                .query(&self.project, &self.name, filter)
                .await?
                .into()
        )
    }
}
