//! The composition root and event surface.

use std::sync::Arc;

use tracing::debug;

use crate::auth::CredentialProvider;
use crate::config::ClientConfig;
use crate::coordinator::RequestCoordinator;
use crate::events::{ClientEvent, EventBus, Subscription};
use crate::transport::{ClientIdentity, SessionMetadata, StreamingConnector, TransportSession};
use crate::types::{ClassificationInput, Deployment, InputResult};
use crate::Result;

/// Client for a remote image-classification service.
///
/// Composes the streaming session, the request coordinator, and the event
/// bus. Streaming results are delivered through subscribed listeners;
/// [`VisionClient::list_deployments`] and
/// [`VisionClient::submit_single_shot`] are independent unary paths that
/// need no open session.
pub struct VisionClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) session: Arc<TransportSession>,
    pub(crate) coordinator: RequestCoordinator,
    pub(crate) connector: Arc<dyn StreamingConnector>,
    pub(crate) credentials: Arc<dyn CredentialProvider>,
    pub(crate) identity: ClientIdentity,
    pub(crate) events: EventBus,
}

impl std::fmt::Debug for VisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionClient")
            .field("config", &self.config)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl VisionClient {
    /// Open the streaming session. Fails if one is already open.
    pub async fn open(&self) -> Result<()> {
        self.session.open().await
    }

    /// Close the streaming session. Idempotent.
    pub async fn close(&self) {
        self.session.close().await
    }

    /// Whether the streaming session is open.
    pub async fn is_open(&self) -> bool {
        self.session.is_open().await
    }

    /// Submit a batch of inputs as one envelope on the open session.
    /// Results arrive later as `Data` events, correlated by id.
    pub async fn submit(&self, inputs: Vec<ClassificationInput>) -> Result<()> {
        self.coordinator.submit(inputs).await
    }

    /// Submit a single input on the open session.
    pub async fn submit_one(&self, input: ClassificationInput) -> Result<()> {
        self.coordinator.submit(vec![input]).await
    }

    /// Single-shot request/response classification for one input; no open
    /// session required.
    pub async fn submit_single_shot(&self, input: ClassificationInput) -> Result<InputResult> {
        self.coordinator.submit_single_shot(input).await
    }

    /// List the server-side deployments.
    ///
    /// Independent of session state; fetches a fresh credential on every
    /// call and never caches the result. An empty server answer yields an
    /// empty vector.
    pub async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        let authorization = self.credentials.bearer_header().await?;
        let metadata = self.identity.metadata(authorization);
        let deployments = self.connector.list_deployments(&metadata).await?;
        debug!(count = deployments.len(), "listed deployments");
        Ok(deployments)
    }

    /// Subscribe to client events.
    ///
    /// Listeners run synchronously in subscription order with at-most-once
    /// delivery per underlying transport event; there is no replay for late
    /// subscribers. Unsubscribe via the returned handle.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ClientEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.events.subscribe(listener)
    }

    /// Recompute the cached session metadata (client identity + a freshly
    /// acquired credential). Applies from the next `open()`.
    pub async fn refresh_metadata(&self) -> Result<SessionMetadata> {
        self.session.refresh_metadata().await
    }

    /// The immutable configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
