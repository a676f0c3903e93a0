//! Storage backend abstraction for the document store.
//!
//! This module defines the trait that abstracts over store implementations,
//! allowing the HTTP layer and the replication receiver to work against any
//! backend holding the project → collection → document hierarchy.
//!
//! # Ancestor creation
//!
//! Backends must preserve an asymmetry in how missing ancestors are handled:
//!
//! | Operation                                  | Missing project/collection |
//! |--------------------------------------------|----------------------------|
//! | `create`, `insert_with_id`                 | created on the fly         |
//! | `get`, `get_all`, `update`, `delete`, `query` | not-found error         |
//! | `create_collection`                        | `ProjectNotFound`          |
//!
//! # Examples
//!
//! ```ignore
//! use peerdoc_core::backend::StoreBackend;
//! use peerdoc_core::value::Map;
//!
//! let doc = backend.create("acme", "users", Map::new()).await?;
//! let fetched = backend.get("acme", "users", &doc.id).await?;
//! assert_eq!(doc, fetched);
//! ```

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    collection::{Collection, Project},
    document::{Document, ReplicatedDocument},
    error::DocumentStoreResult,
    query::Filter,
    value::Map,
};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// Implementations must be safe to share across async tasks. Backends should
/// document their concurrency model; the in-memory backend serializes every
/// write behind a single readers-writer lock.
///
/// # Replication
///
/// None of these operations trigger replication themselves. Callers propagate
/// successful writes, and peers converge through [`insert_with_id`] and
/// [`delete`].
///
/// [`insert_with_id`]: StoreBackend::insert_with_id
/// [`delete`]: StoreBackend::delete
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Stores a new document with a generated id, creating the project and
    /// collection if they do not exist.
    async fn create(&self, project: &str, collection: &str, data: Map) -> DocumentStoreResult<Document>;

    /// Fetches a single document.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing project, collection or document.
    async fn get(&self, project: &str, collection: &str, id: &str) -> DocumentStoreResult<Document>;

    /// Fetches every document in a collection, in no particular order.
    async fn get_all(&self, project: &str, collection: &str) -> DocumentStoreResult<Vec<Document>>;

    /// Replaces a document's payload wholesale and advances its `updated_at`.
    async fn update(
        &self,
        project: &str,
        collection: &str,
        id: &str,
        data: Map,
    ) -> DocumentStoreResult<Document>;

    /// Removes a document.
    async fn delete(&self, project: &str, collection: &str, id: &str) -> DocumentStoreResult<()>;

    /// Idempotent upsert used when applying replicated writes.
    ///
    /// If the id exists its payload is overwritten and `updated_at` set to the
    /// local time (the origin's timestamps are ignored). Otherwise the document
    /// is inserted as given, with missing timestamps defaulted to now.
    async fn insert_with_id(
        &self,
        project: &str,
        collection: &str,
        document: ReplicatedDocument,
    ) -> DocumentStoreResult<()>;

    /// Explicitly creates an empty project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectAlreadyExists` if the id is taken.
    async fn create_project(&self, id: &str) -> DocumentStoreResult<Project>;

    /// Explicitly creates an empty collection in an existing project.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound` or `CollectionAlreadyExists`.
    async fn create_collection(&self, project: &str, id: &str) -> DocumentStoreResult<Collection>;

    /// Returns the documents whose payload satisfies the filter.
    ///
    /// The filter is validated before any document is examined; a single
    /// invalid operator fails the whole query.
    async fn query(
        &self,
        project: &str,
        collection: &str,
        filter: &Filter,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Lists the ids of all projects.
    async fn list_projects(&self) -> DocumentStoreResult<Vec<String>>;

    /// Lists the ids of all collections in a project.
    async fn list_collections(&self, project: &str) -> DocumentStoreResult<Vec<String>>;
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    async fn create(&self, project: &str, collection: &str, data: Map) -> DocumentStoreResult<Document> {
        (**self)
            .create(project, collection, data)
            .await
    }

    async fn get(&self, project: &str, collection: &str, id: &str) -> DocumentStoreResult<Document> {
        (**self)
            .get(project, collection, id)
            .await
    }

    async fn get_all(&self, project: &str, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        (**self)
            .get_all(project, collection)
            .await
    }

    async fn update(
        &self,
        project: &str,
        collection: &str,
        id: &str,
        data: Map,
    ) -> DocumentStoreResult<Document> {
        (**self)
            .update(project, collection, id, data)
            .await
    }

    async fn delete(&self, project: &str, collection: &str, id: &str) -> DocumentStoreResult<()> {
        (**self)
            .delete(project, collection, id)
            .await
    }

    async fn insert_with_id(
        &self,
        project: &str,
        collection: &str,
        document: ReplicatedDocument,
    ) -> DocumentStoreResult<()> {
        (**self)
            .insert_with_id(project, collection, document)
            .await
    }

    async fn create_project(&self, id: &str) -> DocumentStoreResult<Project> {
        (**self).create_project(id).await
    }

    async fn create_collection(&self, project: &str, id: &str) -> DocumentStoreResult<Collection> {
        (**self)
            .create_collection(project, id)
            .await
    }

    async fn query(
        &self,
        project: &str,
        collection: &str,
        filter: &Filter,
    ) -> DocumentStoreResult<Vec<Document>> {
        (**self)
            .query(project, collection, filter)
            .await
    }

    async fn list_projects(&self) -> DocumentStoreResult<Vec<String>> {
        (**self).list_projects().await
    }

    async fn list_collections(&self, project: &str) -> DocumentStoreResult<Vec<String>> {
        (**self)
            .list_collections(project)
            .await
    }
}
