//! Delivery of payloads to a single peer.

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::{ReplicationError, Result},
    payload::ReplicationPayload,
};

/// Sends one payload to one peer, once.
///
/// Retrying is the caller's job; an implementation reports each attempt's
/// outcome and nothing more.
#[async_trait]
pub trait PeerTransport: Send + Sync + Debug {
    /// Delivers `payload` to `peer` (a `host:port` address).
    async fn deliver(&self, peer: &str, payload: &ReplicationPayload) -> Result<()>;
}

/// JSON-over-HTTP transport posting to `http://{peer}/replicate`.
///
/// Peers are contacted directly; proxy settings from the environment are
/// ignored.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests fail after `timeout`, if given.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().no_proxy();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ReplicationError::Transport {
                peer: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn deliver(&self, peer: &str, payload: &ReplicationPayload) -> Result<()> {
        let body = serde_json::to_vec(payload)?;

        let response = self.client
            .post(format!("http://{peer}/replicate"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ReplicationError::Transport {
                peer: peer.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ReplicationError::Status(status.as_u16()))
        }
    }
}
