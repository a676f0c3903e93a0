//! HTTP surface of a peerdoc node.
//!
//! Every successful document mutation is followed by a fire-and-forget
//! [`Replicator::replicate`] call; peers push their own changes back through
//! `POST /replicate`.
//!
//! | Method | Path | Action |
//! |--------|------|--------|
//! | `GET` | `/` | List projects |
//! | `POST` | `/replicate` | Apply a peer's change |
//! | `GET` | `/{project}` | List collections |
//! | `POST` | `/{project}` | Create project |
//! | `POST` | `/{project}/{collection}` | Create collection |
//! | `GET` | `/{project}/{collection}/document` | List documents |
//! | `POST` | `/{project}/{collection}/document` | Create document |
//! | `GET` | `/{project}/{collection}/document/{id}` | Get document |
//! | `PUT` | `/{project}/{collection}/document/{id}` | Replace document data |
//! | `DELETE` | `/{project}/{collection}/document/{id}` | Delete document |
//! | `POST` | `/{project}/{collection}/query` | Run a filter |

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use peerdoc_core::{
    backend::StoreBackend,
    collection::{Collection, Project},
    document::Document,
    error::DocumentStoreError,
    query::{Filter, QueryResult},
    store::DocumentStore,
    value::Value,
};
use peerdoc_replication::{ReplicationError, ReplicationPayload, Replicator};

/// Store type shared by all handlers.
pub type SharedStore = DocumentStore<Arc<dyn StoreBackend>>;

/// State handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    store: SharedStore,
    replicator: Replicator,
}

impl AppState {
    pub fn new(backend: Arc<dyn StoreBackend>, replicator: Replicator) -> Self {
        Self {
            store: DocumentStore::new(backend),
            replicator,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] DocumentStoreError),

    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => store_status(e),
            ApiError::Replication(e) => match e {
                ReplicationError::InvalidPayload(_) | ReplicationError::Serialization(_) => StatusCode::BAD_REQUEST,
                ReplicationError::Store(e) if e.is_invalid_input() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

fn store_status(error: &DocumentStoreError) -> StatusCode {
    if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else if error.is_already_exists() {
        StatusCode::CONFLICT
    } else if error.is_invalid_input() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[derive(Serialize)]
struct DocumentList {
    documents: Vec<Document>,
}

/// Builds the router for a node.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_projects))
        .route("/replicate", post(receive_replication))
        .route("/:project", get(list_collections).post(create_project))
        .route("/:project/:collection", post(create_collection))
        .route(
            "/:project/:collection/document",
            get(list_documents).post(create_document),
        )
        .route(
            "/:project/:collection/document/:id",
            get(get_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route("/:project/:collection/query", post(query_documents))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let mut projects = state.store.list_projects().await?;
    projects.sort();

    Ok(Json(json!({ "projects": projects })))
}

async fn list_collections(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut collections = state.store.list_collections(&project).await?;
    collections.sort();

    Ok(Json(json!({ "collections": collections })))
}

async fn create_project(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.store.create_project(&project).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

async fn create_collection(
    State(state): State<AppState>,
    Path((project, collection)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    let collection = state.store.create_collection(&project, &collection).await?;

    Ok((StatusCode::CREATED, Json(collection)))
}

async fn list_documents(
    State(state): State<AppState>,
    Path((project, collection)): Path<(String, String)>,
) -> ApiResult<Json<DocumentList>> {
    let documents = state.store
        .collection(&project, &collection)
        .all()
        .await?;

    Ok(Json(DocumentList { documents }))
}

async fn create_document(
    State(state): State<AppState>,
    Path((project, collection)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Document>> {
    let data: Value = parse_body(&body)?;
    let document = state.store
        .collection(&project, &collection)
        .create(data)
        .await?;

    state.replicator.replicate(ReplicationPayload::created(&project, &collection, &document));

    Ok(Json(document))
}

async fn get_document(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
) -> ApiResult<Json<Document>> {
    let document = state.store
        .collection(&project, &collection)
        .get(&id)
        .await?;

    Ok(Json(document))
}

async fn update_document(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<Json<Document>> {
    let data: Value = parse_body(&body)?;
    let document = state.store
        .collection(&project, &collection)
        .update(&id, data)
        .await?;

    state.replicator.replicate(ReplicationPayload::updated(&project, &collection, &document));

    Ok(Json(document))
}

async fn delete_document(
    State(state): State<AppState>,
    Path((project, collection, id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let documents = state.store.collection(&project, &collection);

    // The deleted document's timestamps travel with the replication payload.
    let document = documents.get(&id).await?;
    documents.delete(&id).await?;

    state.replicator.replicate(ReplicationPayload::deleted(&project, &collection, &document));

    Ok(StatusCode::NO_CONTENT)
}

async fn query_documents(
    State(state): State<AppState>,
    Path((project, collection)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<QueryResult>> {
    let filter = if body.iter().all(u8::is_ascii_whitespace) {
        Filter::all()
    } else {
        Filter::try_from_value(parse_body(&body)?)?
    };

    let result = state.store
        .collection(&project, &collection)
        .query(&filter)
        .await?;

    Ok(Json(result))
}

async fn receive_replication(State(state): State<AppState>, body: Bytes) -> ApiResult<StatusCode> {
    let payload: ReplicationPayload = parse_body(&body)?;

    peerdoc_replication::apply(state.store.backend(), payload).await?;

    Ok(StatusCode::NO_CONTENT)
}
