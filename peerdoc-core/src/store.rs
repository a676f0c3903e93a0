//! Main document store interface.
//!
//! [`DocumentStore`] owns a backend and hands out [`CollectionRef`] handles.
//! It is constructed explicitly and passed to whoever needs it; there is no
//! global instance.
//!
//! # Example
//!
//! ```ignore
//! use peerdoc_core::store::DocumentStore;
//! use peerdoc_memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! store.create_project("acme").await?;
//! let users = store.collection("acme", "users");
//! ```

use crate::{
    backend::StoreBackend,
    collection::{Collection, CollectionRef, Project},
    error::DocumentStoreResult,
};

/// A document store bound to a specific backend implementation.
#[derive(Debug, Clone)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Gets a handle to a collection in a project.
    ///
    /// Neither needs to exist yet; `create` on the handle brings both into being.
    pub fn collection<'a>(&'a self, project: &str, name: &str) -> CollectionRef<'a, B> {
        CollectionRef::new(project.to_string(), name.to_string(), &self.backend)
    }

    /// Creates a new, empty project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project already exists.
    pub async fn create_project(&self, id: &str) -> DocumentStoreResult<Project> {
        self.backend.create_project(id).await
    }

    /// Creates a new, empty collection inside an existing project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is missing or the collection already exists.
    pub async fn create_collection(&self, project: &str, id: &str) -> DocumentStoreResult<Collection> {
        self.backend
            .create_collection(project, id)
            .await
    }

    /// Lists all project ids.
    pub async fn list_projects(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_projects().await
    }

    /// Lists the collection ids of a project.
    pub async fn list_collections(&self, project: &str) -> DocumentStoreResult<Vec<String>> {
        self.backend
            .list_collections(project)
            .await
    }

    /// Consumes the store, returning the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }
}
