//! Wiring a node together from its configuration.

use std::{io, net::SocketAddr, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use peerdoc_core::backend::StoreBackend;
use peerdoc_memory::InMemoryStore;
use peerdoc_replication::{ReplicationError, Replicator};

use crate::{
    config::{ConfigError, NodeConfig},
    server::{self, AppState},
};

#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up replication: {0}")]
    Replication(#[from] ReplicationError),

    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Builds the handler state for `config`: a fresh in-memory store and an
/// HTTP replicator targeting the configured peers.
pub fn state_from_config(config: &NodeConfig) -> Result<AppState, NodeError> {
    let backend: Arc<dyn StoreBackend> = Arc::new(InMemoryStore::new());
    let replicator = Replicator::http(config.peers.clone(), config.replication_timeout)?;

    Ok(AppState::new(backend, replicator))
}

/// Serves `state` on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), NodeError> {
    axum::serve(listener, server::router(state)).await?;

    Ok(())
}

/// Binds all interfaces on the configured port and serves forever.
pub async fn run(config: NodeConfig) -> Result<(), NodeError> {
    let state = state_from_config(&config)?;
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.port))).await?;

    info!(
        addr = %listener.local_addr()?,
        peers = ?config.peers,
        "peerdoc node listening"
    );

    serve(listener, state).await
}
