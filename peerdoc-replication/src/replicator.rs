//! Fire-and-forget fan-out of local changes to peers.
//!
//! [`Replicator::replicate`] spawns one detached task per configured peer and
//! returns immediately. Each task retries delivery per its [`RetryPolicy`],
//! then logs the outcome and exits. Nothing is reported back to the caller
//! that triggered the change; the optional completion hook exists so tests
//! and embedders can observe outcomes.

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, error, warn};

use crate::{
    error::Result,
    payload::ReplicationPayload,
    retry::RetryPolicy,
    transport::{HttpTransport, PeerTransport},
};

/// Outcome of one per-peer propagation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationReport {
    pub peer: String,
    /// Delivery attempts made, including the successful one.
    pub attempts: u32,
    pub delivered: bool,
}

/// Callback invoked once per peer when its propagation task finishes.
pub type CompletionHook = Arc<dyn Fn(PropagationReport) + Send + Sync>;

/// Pushes payloads to a fixed set of peers.
#[derive(Clone)]
pub struct Replicator {
    peers: Arc<[String]>,
    transport: Arc<dyn PeerTransport>,
    policy: RetryPolicy,
    hook: Option<CompletionHook>,
}

impl fmt::Debug for Replicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replicator")
            .field("peers", &self.peers)
            .field("transport", &self.transport)
            .field("policy", &self.policy)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl Replicator {
    /// Creates a replicator delivering through `transport` with the default
    /// retry policy.
    pub fn new(peers: Vec<String>, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            peers: peers.into(),
            transport,
            policy: RetryPolicy::default(),
            hook: None,
        }
    }

    /// Creates a replicator backed by [`HttpTransport`].
    pub fn http(peers: Vec<String>, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self::new(peers, Arc::new(HttpTransport::new(timeout)?)))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a callback run when each per-peer task finishes.
    pub fn with_completion_hook(mut self, hook: impl Fn(PropagationReport) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Starts propagating `payload` to every peer and returns without waiting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn replicate(&self, payload: ReplicationPayload) {
        if self.peers.is_empty() {
            return;
        }

        debug!(
            project = %payload.project,
            collection = %payload.collection,
            id = %payload.id,
            peers = self.peers.len(),
            "Replicating change"
        );

        let payload = Arc::new(payload);

        for peer in self.peers.iter() {
            tokio::spawn(propagate(
                peer.clone(),
                Arc::clone(&payload),
                Arc::clone(&self.transport),
                self.policy,
                self.hook.clone(),
            ));
        }
    }
}

async fn propagate(
    peer: String,
    payload: Arc<ReplicationPayload>,
    transport: Arc<dyn PeerTransport>,
    policy: RetryPolicy,
    hook: Option<CompletionHook>,
) {
    let mut attempts = 0;
    let mut delivered = false;

    while attempts < policy.max_attempts {
        attempts += 1;

        match transport.deliver(&peer, &payload).await {
            Ok(()) => {
                debug!(peer = %peer, id = %payload.id, attempt = attempts, "Replicated to peer");
                delivered = true;
                break;
            },
            Err(e) => {
                let delay = policy.delay_for_attempt(attempts);
                warn!(
                    peer = %peer,
                    id = %payload.id,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Replication attempt failed"
                );
                tokio::time::sleep(delay).await;
            },
        }
    }

    if !delivered {
        error!(peer = %peer, id = %payload.id, attempts, "Giving up on replication to peer");
    }

    if let Some(hook) = hook {
        hook(PropagationReport { peer, attempts, delivered });
    }
}
