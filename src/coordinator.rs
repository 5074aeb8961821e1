//! Request coordination: defaults, preparation, batching, and the write.
//!
//! One `submit` call produces exactly one envelope and exactly one write,
//! no matter how many inputs it batches. Inputs are prepared sequentially —
//! not concurrently — to bound peak memory and keep side effects such as
//! hash computation in caller order.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::auth::CredentialProvider;
use crate::config::ClientConfig;
use crate::prepare::PayloadPreparer;
use crate::transport::{ClientIdentity, StreamingConnector, TransportSession};
use crate::types::{
    ClassificationInput, HashKind, InputResult, PreparedInput, RequestEnvelope,
};
use crate::{Error, Result};

/// Turns caller inputs into outbound envelopes.
pub struct RequestCoordinator {
    config: Arc<ClientConfig>,
    preparer: Arc<dyn PayloadPreparer>,
    session: Arc<TransportSession>,
    connector: Arc<dyn StreamingConnector>,
    credentials: Arc<dyn CredentialProvider>,
    identity: ClientIdentity,
}

impl RequestCoordinator {
    pub fn new(
        config: Arc<ClientConfig>,
        preparer: Arc<dyn PayloadPreparer>,
        session: Arc<TransportSession>,
        connector: Arc<dyn StreamingConnector>,
        credentials: Arc<dyn CredentialProvider>,
        identity: ClientIdentity,
    ) -> Self {
        Self {
            config,
            preparer,
            session,
            connector,
            credentials,
            identity,
        }
    }

    /// Prepare the given inputs and write them as one envelope.
    ///
    /// Rejects before invoking any collaborator when no session is open;
    /// opening is never implicit. Empty batches are rejected too: an
    /// envelope without inputs is the keep-warm heartbeat form and must not
    /// be writable through the submission path. The write suspends while the
    /// transport buffer is full and resolves once capacity drains. Input
    /// order is preserved in the envelope.
    pub async fn submit(&self, inputs: Vec<ClassificationInput>) -> Result<()> {
        // Session precondition first: checked before any preparation work.
        self.session.ensure_open().await?;
        if inputs.is_empty() {
            return Err(Error::configuration(
                "a submission must contain at least one input",
            ));
        }

        let mut prepared = Vec::with_capacity(inputs.len());
        for input in inputs {
            prepared.push(self.prepare_input(input).await?);
        }

        let envelope = RequestEnvelope {
            deployment_id: self.config.deployment_id.clone(),
            inputs: prepared,
        };
        debug!(inputs = envelope.inputs.len(), "writing request envelope");
        self.session.write(envelope).await
    }

    /// Independent request/response path for a single input.
    ///
    /// Does not require an open session, a heartbeat, or any session
    /// machinery; fetches fresh metadata and performs one unary call.
    pub async fn submit_single_shot(&self, input: ClassificationInput) -> Result<InputResult> {
        let prepared = self.prepare_input(input).await?;
        let correlation_id = prepared.correlation_id.clone();

        let authorization = self.credentials.bearer_header().await?;
        let metadata = self.identity.metadata(authorization);

        let envelope = RequestEnvelope {
            deployment_id: self.config.deployment_id.clone(),
            inputs: vec![prepared],
        };
        let response = self.connector.classify(&metadata, envelope).await?;

        if let Some(message) = response.error {
            return Err(Error::remote(message));
        }
        response
            .results
            .into_iter()
            .find(|result| result.correlation_id == correlation_id)
            .ok_or_else(|| {
                Error::transport("response did not contain a result for the submitted input")
            })
    }

    /// Resolve defaults and invoke the preparer for one input.
    ///
    /// Affiliate falls back to the configured default, the correlation id to
    /// a fresh v4 UUID (the sole join key with the eventual result), the
    /// encoding to uncompressed, and the hash set to the two default
    /// algorithms.
    async fn prepare_input(&self, input: ClassificationInput) -> Result<PreparedInput> {
        let affiliate = input
            .affiliate
            .unwrap_or_else(|| self.config.default_affiliate.clone());
        let correlation_id = input
            .correlation_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let encoding = input.encoding.unwrap_or_default();
        let hash_kinds = input
            .hashes
            .unwrap_or_else(|| HashKind::DEFAULT_SET.to_vec());

        let payload = self
            .preparer
            .prepare(input.image, encoding, input.sizing, &hash_kinds)
            .await?;

        Ok(PreparedInput {
            affiliate,
            correlation_id,
            data: payload.data,
            format: payload.format,
            encoding: payload.encoding,
            hashes: payload.hashes,
        })
    }
}
