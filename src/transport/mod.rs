//! Transport seam and session lifecycle.
//!
//! The streaming protocol itself (framing, multiplexing) is the RPC
//! runtime's concern. This module defines the seam the core talks through —
//! [`StreamingConnector`] opens duplex channels and performs the unary
//! calls, [`EnvelopeSink`] is the backpressure-aware outbound half — plus
//! the production TCP binding and the [`TransportSession`] state machine
//! that owns exactly one channel at a time.

pub mod session;
pub mod tcp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Deployment, RequestEnvelope, ResponseEnvelope};
use crate::{BoxStream, Result};

pub use session::TransportSession;
pub use tcp::TcpConnector;

/// Metadata attached once per streaming session and fetched fresh for each
/// unary call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub client_version: String,
    pub client_language: String,
    /// Bearer authorization header value.
    pub authorization: String,
}

/// Client identification constants, computed once at facade construction
/// rather than held in process-wide static state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub version: String,
    pub language: String,
}

impl ClientIdentity {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            language: "rust".to_string(),
        }
    }

    pub(crate) fn metadata(&self, authorization: String) -> SessionMetadata {
        SessionMetadata {
            client_version: self.version.clone(),
            client_language: self.language.clone(),
            authorization,
        }
    }
}

/// Inbound half of a duplex channel. `Err` items are mid-stream transport
/// errors; the stream ending is the transport's terminal signal.
pub type InboundStream = BoxStream<'static, ResponseEnvelope>;

/// Outbound half of a duplex channel.
#[async_trait]
pub trait EnvelopeSink: Send + Sync {
    /// Write one envelope. Completes once the transport buffer accepts it;
    /// suspends while the buffer is full. This is the sole backpressure
    /// coupling point — callers must not queue in front of it.
    async fn send(&self, envelope: RequestEnvelope) -> Result<()>;

    /// Gracefully end the outbound side.
    async fn close(&self) -> Result<()>;
}

/// Opens duplex channels and performs the unary calls.
#[async_trait]
pub trait StreamingConnector: Send + Sync {
    /// Establish a duplex channel carrying the given session metadata.
    async fn connect(
        &self,
        metadata: &SessionMetadata,
    ) -> Result<(std::sync::Arc<dyn EnvelopeSink>, InboundStream)>;

    /// Single-shot request/response classification, independent of any
    /// streaming session.
    async fn classify(
        &self,
        metadata: &SessionMetadata,
        envelope: RequestEnvelope,
    ) -> Result<ResponseEnvelope>;

    /// List the server-side deployments. Never cached by callers.
    async fn list_deployments(&self, metadata: &SessionMetadata) -> Result<Vec<Deployment>>;
}
