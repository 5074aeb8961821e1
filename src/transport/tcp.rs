//! Length-delimited JSON framing over TCP.
//!
//! Wire protocol: every frame is a length-prefixed JSON object. The first
//! client frame after connect is a `hello` carrying the session metadata;
//! the stream then carries `request` frames outbound and `response` frames
//! inbound. Unary calls (`classify`, `list-deployments`) use a short-lived
//! connection each, with the same hello handshake.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, warn};

use super::{EnvelopeSink, InboundStream, SessionMetadata, StreamingConnector};
use crate::types::{Deployment, RequestEnvelope, ResponseEnvelope};
use crate::{Error, Result};

/// Upper bound on a single frame; resized raw buffers are small, but
/// passthrough payloads can be large.
const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Outbound frames queued beyond this count exert backpressure on writers.
const DEFAULT_OUTBOUND_CAPACITY: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "kebab-case")]
enum ClientFrame {
    Hello { metadata: SessionMetadata },
    Request { envelope: RequestEnvelope },
    Classify { envelope: RequestEnvelope },
    ListDeployments,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "kebab-case")]
enum ServerFrame {
    Response { envelope: ResponseEnvelope },
    Deployments { deployments: Vec<Deployment> },
    Error { message: String },
}

type Wire = Framed<TcpStream, LengthDelimitedCodec>;

/// Production connector: one TCP connection per duplex session, one per
/// unary call.
pub struct TcpConnector {
    endpoint: String,
    outbound_capacity: usize,
}

impl TcpConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }

    /// Override the outbound buffer size (frames, not bytes).
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity.max(1);
        self
    }

    async fn handshake(&self, metadata: &SessionMetadata) -> Result<Wire> {
        let stream = TcpStream::connect(&self.endpoint).await?;
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_BYTES)
            .new_codec();
        let mut wire = Framed::new(stream, codec);
        send_frame(
            &mut wire,
            &ClientFrame::Hello {
                metadata: metadata.clone(),
            },
        )
        .await?;
        Ok(wire)
    }
}

async fn send_frame(wire: &mut Wire, frame: &ClientFrame) -> Result<()> {
    let buf = serde_json::to_vec(frame)?;
    wire.send(Bytes::from(buf)).await.map_err(Error::Io)
}

async fn read_frame(wire: &mut Wire) -> Result<ServerFrame> {
    match wire.next().await {
        None => Err(Error::transport("connection closed before a response arrived")),
        Some(Err(e)) => Err(Error::Io(e)),
        Some(Ok(buf)) => Ok(serde_json::from_slice(&buf)?),
    }
}

#[async_trait]
impl StreamingConnector for TcpConnector {
    async fn connect(
        &self,
        metadata: &SessionMetadata,
    ) -> Result<(Arc<dyn EnvelopeSink>, InboundStream)> {
        let wire = self.handshake(metadata).await?;
        let (mut wire_tx, wire_rx) = wire.split();

        // The bounded channel is the transport buffer; a full channel
        // suspends senders until the writer drains it.
        let (tx, mut rx) = mpsc::channel::<RequestEnvelope>(self.outbound_capacity);
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let frame = ClientFrame::Request { envelope };
                let buf = match serde_json::to_vec(&frame) {
                    Ok(buf) => buf,
                    Err(e) => {
                        warn!(error = %e, "dropping unencodable envelope");
                        continue;
                    }
                };
                if let Err(e) = wire_tx.send(Bytes::from(buf)).await {
                    warn!(error = %e, "outbound write failed; ending writer");
                    break;
                }
            }
            if let Err(e) = wire_tx.close().await {
                debug!(error = %e, "error closing outbound stream");
            }
        });

        let inbound: InboundStream = Box::pin(wire_rx.filter_map(|frame| async move {
            match frame {
                Err(e) => Some(Err(Error::Io(e))),
                Ok(buf) => match serde_json::from_slice::<ServerFrame>(&buf) {
                    Ok(ServerFrame::Response { envelope }) => Some(Ok(envelope)),
                    Ok(ServerFrame::Error { message }) => Some(Err(Error::transport(message))),
                    Ok(ServerFrame::Deployments { .. }) => {
                        warn!("unexpected deployments frame on duplex stream; ignoring");
                        None
                    }
                    Err(e) => Some(Err(Error::Serialization(e))),
                },
            }
        }));

        Ok((
            Arc::new(TcpSink {
                tx: std::sync::Mutex::new(Some(tx)),
            }),
            inbound,
        ))
    }

    async fn classify(
        &self,
        metadata: &SessionMetadata,
        envelope: RequestEnvelope,
    ) -> Result<ResponseEnvelope> {
        let mut wire = self.handshake(metadata).await?;
        send_frame(&mut wire, &ClientFrame::Classify { envelope }).await?;
        match read_frame(&mut wire).await? {
            ServerFrame::Response { envelope } => Ok(envelope),
            ServerFrame::Error { message } => Err(Error::transport(message)),
            ServerFrame::Deployments { .. } => {
                Err(Error::transport("unexpected deployments frame for classify call"))
            }
        }
    }

    async fn list_deployments(&self, metadata: &SessionMetadata) -> Result<Vec<Deployment>> {
        let mut wire = self.handshake(metadata).await?;
        send_frame(&mut wire, &ClientFrame::ListDeployments).await?;
        match read_frame(&mut wire).await? {
            ServerFrame::Deployments { deployments } => Ok(deployments),
            ServerFrame::Error { message } => Err(Error::transport(message)),
            ServerFrame::Response { .. } => {
                Err(Error::transport("unexpected response frame for listing call"))
            }
        }
    }
}

struct TcpSink {
    /// `None` once the outbound side has been gracefully ended.
    tx: std::sync::Mutex<Option<mpsc::Sender<RequestEnvelope>>>,
}

#[async_trait]
impl EnvelopeSink for TcpSink {
    async fn send(&self, envelope: RequestEnvelope) -> Result<()> {
        let tx = match self.tx.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        };
        let Some(tx) = tx else {
            return Err(Error::transport("outbound stream already ended"));
        };
        tx.send(envelope)
            .await
            .map_err(|_| Error::transport("connection closed"))
    }

    async fn close(&self) -> Result<()> {
        // Dropping the sender ends the writer task, which closes the wire.
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_tags() {
        let frame = ClientFrame::ListDeployments;
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"frame":"list-deployments"}"#);

        let parsed: ServerFrame =
            serde_json::from_str(r#"{"frame":"error","message":"nope"}"#).unwrap();
        assert!(matches!(parsed, ServerFrame::Error { message } if message == "nope"));
    }
}
