//! In-memory storage implementation for document stores.
//!
//! This module provides a backend that keeps the whole project → collection →
//! document hierarchy in nested `HashMap`s behind one async-aware
//! readers-writer lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use tracing::debug;

use peerdoc_core::{
    backend::StoreBackend,
    collection::{Collection, Project},
    document::{Document, ReplicatedDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    query::Filter,
    value::Map,
};

use crate::evaluator::DocumentMatcher;

type ProjectMap = HashMap<String, Project>;


/// Thread-safe in-memory document storage backend.
///
/// # Concurrency
///
/// A single lock guards the entire hierarchy. Every mutation (`create`,
/// `update`, `delete`, `insert_with_id`, `create_project`,
/// `create_collection`) takes it exclusively, so all writes in the store are
/// serialized regardless of which project or collection they target. Reads
/// (`get`, `get_all`, `query`, `list_*`) share it. No I/O happens while the
/// lock is held.
///
/// `InMemoryStore` is cloneable; clones share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use peerdoc_memory::InMemoryStore;
/// use peerdoc_core::backend::StoreBackend;
///
/// let store = InMemoryStore::new();
/// let doc = store.create("acme", "users", Map::new()).await?;
/// assert_eq!(store.get("acme", "users", &doc.id).await?, doc);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    projects: Arc<RwLock<ProjectMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            projects: Arc::new(RwLock::new(ProjectMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn project<'a>(projects: &'a ProjectMap, id: &str) -> DocumentStoreResult<&'a Project> {
    projects
        .get(id)
        .ok_or_else(|| DocumentStoreError::ProjectNotFound(id.to_string()))
}

fn collection<'a>(projects: &'a ProjectMap, project_id: &str, id: &str) -> DocumentStoreResult<&'a Collection> {
    project(projects, project_id)?
        .collections
        .get(id)
        .ok_or_else(|| DocumentStoreError::CollectionNotFound(id.to_string(), project_id.to_string()))
}

fn collection_mut<'a>(
    projects: &'a mut ProjectMap,
    project_id: &str,
    id: &str,
) -> DocumentStoreResult<&'a mut Collection> {
    projects
        .get_mut(project_id)
        .ok_or_else(|| DocumentStoreError::ProjectNotFound(project_id.to_string()))?
        .collections
        .get_mut(id)
        .ok_or_else(|| DocumentStoreError::CollectionNotFound(id.to_string(), project_id.to_string()))
}

// Creates whichever of the project and collection are missing.
fn collection_or_create<'a>(projects: &'a mut ProjectMap, project_id: &str, id: &str) -> &'a mut Collection {
    let project = projects
        .entry(project_id.to_string())
        .or_insert_with(|| {
            debug!(project = %project_id, "Creating project on first write");
            Project::new(project_id)
        });

    project
        .collections
        .entry(id.to_string())
        .or_insert_with(|| {
            debug!(project = %project_id, collection = %id, "Creating collection on first write");
            Collection::new(id)
        })
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn create(&self, project: &str, collection: &str, data: Map) -> DocumentStoreResult<Document> {
        let mut projects = self.projects.write().await;
        let documents = &mut collection_or_create(&mut projects, project, collection).documents;

        let mut document = Document::new(data);
        while documents.contains_key(&document.id) {
            document = Document::new(document.data);
        }

        documents.insert(document.id.clone(), document.clone());

        Ok(document)
    }

    async fn get(&self, project: &str, collection: &str, id: &str) -> DocumentStoreResult<Document> {
        let projects = self.projects.read().await;

        self::collection(&projects, project, collection)?
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))
    }

    async fn get_all(&self, project: &str, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let projects = self.projects.read().await;

        Ok(
            self::collection(&projects, project, collection)?
                .documents
                .values()
                .cloned()
                .collect()
        )
    }

    async fn update(
        &self,
        project: &str,
        collection: &str,
        id: &str,
        data: Map,
    ) -> DocumentStoreResult<Document> {
        let mut projects = self.projects.write().await;
        let document = collection_mut(&mut projects, project, collection)?
            .documents
            .get_mut(id)
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        document.replace_data(data);

        Ok(document.clone())
    }

    async fn delete(&self, project: &str, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let mut projects = self.projects.write().await;

        collection_mut(&mut projects, project, collection)?
            .documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(id.to_string(), collection.to_string()))
    }

    async fn insert_with_id(
        &self,
        project: &str,
        collection: &str,
        document: ReplicatedDocument,
    ) -> DocumentStoreResult<()> {
        let mut projects = self.projects.write().await;
        let documents = &mut collection_or_create(&mut projects, project, collection).documents;

        match documents.get_mut(&document.id) {
            Some(existing) => existing.replace_data(document.data),
            None => {
                let document = document.into_document();
                documents.insert(document.id.clone(), document);
            },
        }

        Ok(())
    }

    async fn create_project(&self, id: &str) -> DocumentStoreResult<Project> {
        let mut projects = self.projects.write().await;

        if projects.contains_key(id) {
            return Err(DocumentStoreError::ProjectAlreadyExists(id.to_string()));
        }

        let project = Project::new(id);
        projects.insert(id.to_string(), project.clone());

        Ok(project)
    }

    async fn create_collection(&self, project: &str, id: &str) -> DocumentStoreResult<Collection> {
        let mut projects = self.projects.write().await;
        let collections = &mut projects
            .get_mut(project)
            .ok_or_else(|| DocumentStoreError::ProjectNotFound(project.to_string()))?
            .collections;

        if collections.contains_key(id) {
            return Err(DocumentStoreError::CollectionAlreadyExists(id.to_string(), project.to_string()));
        }

        let collection = Collection::new(id);
        collections.insert(id.to_string(), collection.clone());

        Ok(collection)
    }

    async fn query(
        &self,
        project: &str,
        collection: &str,
        filter: &Filter,
    ) -> DocumentStoreResult<Vec<Document>> {
        let projects = self.projects.read().await;
        let documents = &self::collection(&projects, project, collection)?.documents;

        // Compiling validates the whole filter before any document is examined.
        let expr = filter.compile()?;

        Ok(DocumentMatcher::filter_documents(documents.values(), &expr))
    }

    async fn list_projects(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.projects
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }

    async fn list_collections(&self, project: &str) -> DocumentStoreResult<Vec<String>> {
        let projects = self.projects.read().await;

        Ok(
            self::project(&projects, project)?
                .collections
                .keys()
                .cloned()
                .collect()
        )
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// Optionally seeds the store with empty projects, which is convenient for
/// tests and for nodes that should expose a fixed set of tenants up front.
///
/// # Example
///
/// ```ignore
/// use peerdoc_memory::InMemoryStore;
///
/// let store = InMemoryStore::builder()
///     .with_project("acme")
///     .build();
/// ```
#[derive(Default, Debug)]
pub struct InMemoryStoreBuilder {
    projects: Vec<String>,
}

impl InMemoryStoreBuilder {
    /// Pre-creates an empty project.
    pub fn with_project(mut self, id: impl Into<String>) -> Self {
        self.projects.push(id.into());
        self
    }

    /// Builds and returns a new [`InMemoryStore`].
    pub fn build(self) -> InMemoryStore {
        let projects = self.projects
            .into_iter()
            .map(|id| (id.clone(), Project::new(id)))
            .collect::<ProjectMap>();

        InMemoryStore {
            projects: Arc::new(RwLock::new(projects)),
        }
    }
}
