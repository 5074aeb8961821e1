//! Shared test doubles: an in-memory connector, a recording preparer, and a
//! counting credential provider.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use visionlink::auth::CredentialProvider;
use visionlink::prepare::{PayloadPreparer, PreparedPayload};
use visionlink::transport::{EnvelopeSink, InboundStream, SessionMetadata, StreamingConnector};
use visionlink::types::{
    Deployment, HashKind, HashResult, InputEncoding, RequestEnvelope, ResponseEnvelope, SizingMode,
};
use visionlink::{
    AuthConfig, ClientConfig, ClientEvent, Error, Result, Subscription, VisionClient,
    VisionClientBuilder,
};

#[derive(Default)]
pub struct MockState {
    pub sent: Mutex<Vec<RequestEnvelope>>,
    pub inbound: Mutex<Option<mpsc::UnboundedSender<Result<ResponseEnvelope>>>>,
    pub connects: AtomicUsize,
    pub last_metadata: Mutex<Option<SessionMetadata>>,
    pub classify_response: Mutex<Option<ResponseEnvelope>>,
    pub deployments: Mutex<Vec<Deployment>>,
}

/// In-memory connector: records writes, lets tests push inbound envelopes
/// and simulate transport-initiated close.
#[derive(Clone, Default)]
pub struct MockConnector {
    pub state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<RequestEnvelope> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.sent().iter().filter(|e| e.is_heartbeat()).count()
    }

    pub fn push_response(&self, envelope: ResponseEnvelope) {
        if let Some(tx) = self.state.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(Ok(envelope));
        }
    }

    pub fn push_error(&self, error: Error) {
        if let Some(tx) = self.state.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(Err(error));
        }
    }

    /// Simulate the transport's terminal signal (peer end/close).
    pub fn close_inbound(&self) {
        self.state.inbound.lock().unwrap().take();
    }

    pub fn set_classify_response(&self, envelope: ResponseEnvelope) {
        *self.state.classify_response.lock().unwrap() = Some(envelope);
    }

    pub fn set_deployments(&self, deployments: Vec<Deployment>) {
        *self.state.deployments.lock().unwrap() = deployments;
    }
}

#[async_trait]
impl StreamingConnector for MockConnector {
    async fn connect(
        &self,
        metadata: &SessionMetadata,
    ) -> Result<(Arc<dyn EnvelopeSink>, InboundStream)> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        *self.state.last_metadata.lock().unwrap() = Some(metadata.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.inbound.lock().unwrap() = Some(tx);
        let stream: InboundStream = Box::pin(UnboundedReceiverStream::new(rx));
        Ok((
            Arc::new(MockSink {
                state: self.state.clone(),
            }),
            stream,
        ))
    }

    async fn classify(
        &self,
        _metadata: &SessionMetadata,
        envelope: RequestEnvelope,
    ) -> Result<ResponseEnvelope> {
        self.state.sent.lock().unwrap().push(envelope);
        self.state
            .classify_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::transport("no canned classify response"))
    }

    async fn list_deployments(&self, _metadata: &SessionMetadata) -> Result<Vec<Deployment>> {
        Ok(self.state.deployments.lock().unwrap().clone())
    }
}

struct MockSink {
    state: Arc<MockState>,
}

#[async_trait]
impl EnvelopeSink for MockSink {
    async fn send(&self, envelope: RequestEnvelope) -> Result<()> {
        self.state.sent.lock().unwrap().push(envelope);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.inbound.lock().unwrap().take();
        Ok(())
    }
}

/// Preparer that never touches pixels: passes bytes through and fabricates
/// one digest per requested hash kind. Counts invocations.
#[derive(Clone, Default)]
pub struct MockPreparer {
    pub calls: Arc<AtomicUsize>,
}

impl MockPreparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PayloadPreparer for MockPreparer {
    async fn prepare(
        &self,
        image: bytes::Bytes,
        encoding: InputEncoding,
        sizing: SizingMode,
        hash_kinds: &[HashKind],
    ) -> Result<PreparedPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let format = match sizing {
            SizingMode::Resize => "raw-rgb8".to_string(),
            SizingMode::Explicit(format) => format.as_str().to_string(),
        };
        Ok(PreparedPayload {
            data: image,
            format,
            encoding,
            hashes: hash_kinds
                .iter()
                .map(|kind| HashResult {
                    kind: *kind,
                    value: format!("{}-digest", kind.as_str()),
                })
                .collect(),
        })
    }
}

/// Credential provider counting acquisitions; the session metadata cache
/// should keep this at one per client unless explicitly refreshed.
#[derive(Clone, Default)]
pub struct CountingCredential {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl CredentialProvider for CountingCredential {
    async fn bearer_header(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Bearer counted".to_string())
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new(
        "127.0.0.1:1",
        "dep-test",
        "affiliate-default",
        AuthConfig::Static {
            token: "tkn".to_string(),
        },
    )
}

pub fn build_client(
    connector: &MockConnector,
    preparer: &MockPreparer,
    config: ClientConfig,
) -> VisionClient {
    VisionClientBuilder::new()
        .config(config)
        .connector(Arc::new(connector.clone()))
        .preparer(Arc::new(preparer.clone()))
        .build()
        .unwrap()
}

/// Forward every client event into a channel so tests can await delivery.
pub fn event_channel(
    client: &VisionClient,
) -> (Subscription, mpsc::UnboundedReceiver<ClientEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = client.subscribe(move |event| {
        let _ = tx.send(event.clone());
    });
    (subscription, rx)
}
