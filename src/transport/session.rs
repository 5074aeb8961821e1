//! Streaming session state machine.
//!
//! A [`TransportSession`] owns at most one duplex channel at a time, plus
//! the two background tasks tied to it: the liveness heartbeat and the
//! inbound pump. The channel handle, the task handles, and the cached
//! session metadata are the only mutable shared state in the library; all
//! of it lives behind one async mutex because it is read-modify-written
//! across the open, heartbeat, and close paths.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{ClientIdentity, EnvelopeSink, SessionMetadata, StreamingConnector};
use crate::auth::CredentialProvider;
use crate::config::ClientConfig;
use crate::events::{ClientEvent, EventBus};
use crate::types::RequestEnvelope;
use crate::{Error, Result};

#[derive(Default)]
struct SessionState {
    /// `None` means closed or not yet opened. A present sink implies a
    /// running heartbeat task; both are cleared together on every terminal
    /// transition.
    sink: Option<Arc<dyn EnvelopeSink>>,
    heartbeat: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
    /// Cancelled when the session closes; writes suspended on backpressure
    /// race against it instead of hanging.
    lifetime: Option<CancellationToken>,
    /// Computed once and reused across heartbeats, writes, and reopens
    /// until explicitly refreshed.
    metadata: Option<SessionMetadata>,
}

struct SessionShared {
    config: Arc<ClientConfig>,
    connector: Arc<dyn StreamingConnector>,
    credentials: Arc<dyn CredentialProvider>,
    identity: ClientIdentity,
    events: EventBus,
    state: tokio::sync::Mutex<SessionState>,
}

/// Manages exactly one duplex stream's full lifecycle.
pub struct TransportSession {
    shared: Arc<SessionShared>,
}

impl TransportSession {
    pub fn new(
        config: Arc<ClientConfig>,
        connector: Arc<dyn StreamingConnector>,
        credentials: Arc<dyn CredentialProvider>,
        identity: ClientIdentity,
        events: EventBus,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                config,
                connector,
                credentials,
                identity,
                events,
                state: tokio::sync::Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Establish the duplex stream, start the heartbeat, attach the inbound
    /// pump, and emit `Open`.
    ///
    /// Fails with a session error if a session is already open: reopening
    /// over a live stream would silently abandon its handle, so an explicit
    /// `close()` is required first. Returns as soon as listeners are
    /// attached; it does not wait for the remote peer to acknowledge.
    pub async fn open(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        if state.sink.is_some() {
            return Err(Error::session(
                "session already open; close() it before reopening",
            ));
        }

        let metadata = match state.metadata.clone() {
            Some(metadata) => metadata,
            None => {
                let authorization = self.shared.credentials.bearer_header().await?;
                let metadata = self.shared.identity.metadata(authorization);
                state.metadata = Some(metadata.clone());
                metadata
            }
        };

        let (sink, mut inbound) = self.shared.connector.connect(&metadata).await?;

        state.sink = Some(sink);
        state.lifetime = Some(CancellationToken::new());
        state.heartbeat = Some(tokio::spawn(heartbeat_loop(self.shared.clone())));

        let pump_shared = self.shared.clone();
        state.pump = Some(tokio::spawn(async move {
            while let Some(item) = inbound.next().await {
                match item {
                    Ok(envelope) => pump_shared.events.emit(&ClientEvent::Data(envelope)),
                    Err(err) => pump_shared.events.emit(&ClientEvent::Error(Arc::new(err))),
                }
            }
            finalize_transport_close(&pump_shared).await;
        }));

        drop(state);
        self.shared.events.emit(&ClientEvent::Open);
        debug!(deployment_id = %self.shared.config.deployment_id, "session opened");
        Ok(())
    }

    /// End the session: stop the heartbeat, cancel pending writes,
    /// gracefully end the stream, and emit `Close`.
    ///
    /// Idempotent — a second call is a no-op. Caller-initiated and
    /// transport-initiated closes funnel to the same `Close` event; the
    /// handle is taken under the lock so each terminal transition emits it
    /// once.
    pub async fn close(&self) {
        let mut state = self.shared.state.lock().await;
        let Some(sink) = state.sink.take() else {
            return;
        };
        if let Some(heartbeat) = state.heartbeat.take() {
            heartbeat.abort();
        }
        if let Some(lifetime) = state.lifetime.take() {
            lifetime.cancel();
        }
        if let Some(pump) = state.pump.take() {
            pump.abort();
        }
        drop(state);

        if let Err(err) = sink.close().await {
            warn!(error = %err, "error while ending the stream");
        }
        self.shared.events.emit(&ClientEvent::Close);
        debug!("session closed");
    }

    /// Whether a session is currently open.
    pub async fn is_open(&self) -> bool {
        self.shared.state.lock().await.sink.is_some()
    }

    /// Synchronous session precondition for submissions: the handle is read
    /// once, before any async collaborator is invoked.
    pub(crate) async fn ensure_open(&self) -> Result<()> {
        if self.shared.state.lock().await.sink.is_some() {
            Ok(())
        } else {
            Err(Error::session("no open session; call open() first"))
        }
    }

    /// Write one envelope onto the stream, suspending under backpressure.
    ///
    /// A write still pending when the session closes rejects with a session
    /// error rather than hanging on a drained-capacity signal that will
    /// never come.
    pub(crate) async fn write(&self, envelope: RequestEnvelope) -> Result<()> {
        let (sink, lifetime) = {
            let state = self.shared.state.lock().await;
            match (state.sink.clone(), state.lifetime.clone()) {
                (Some(sink), Some(lifetime)) => (sink, lifetime),
                _ => return Err(Error::session("no open session; call open() first")),
            }
        };

        tokio::select! {
            _ = lifetime.cancelled() => {
                Err(Error::session("session closed while the write was pending"))
            }
            result = sink.send(envelope) => result,
        }
    }

    /// Recompute the cached session metadata (e.g. after a credential
    /// rotation). Takes effect from the next `open()`; a live session keeps
    /// the metadata it was established with.
    pub async fn refresh_metadata(&self) -> Result<SessionMetadata> {
        let authorization = self.shared.credentials.bearer_header().await?;
        let metadata = self.shared.identity.metadata(authorization);
        self.shared.state.lock().await.metadata = Some(metadata.clone());
        Ok(metadata)
    }
}

/// Keep-warm writer: one empty-input envelope per interval while the sink
/// is present. A failed write surfaces on the error event and does not
/// terminate the session; only the transport's terminal signal or an
/// explicit `close()` does.
async fn heartbeat_loop(shared: Arc<SessionShared>) {
    let mut ticker = tokio::time::interval(shared.config.heartbeat_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so the first write
    // lands one full interval after open.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let sink = shared.state.lock().await.sink.clone();
        let Some(sink) = sink else {
            return;
        };
        let envelope = RequestEnvelope::heartbeat(shared.config.deployment_id.as_str());
        if let Err(err) = sink.send(envelope).await {
            warn!(error = %err, "heartbeat write failed");
            shared.events.emit(&ClientEvent::Error(Arc::new(err)));
        }
    }
}

/// Terminal transition driven by the transport (`end`/`close` from the
/// peer): clear the heartbeat and the handle together, then emit `Close` —
/// unless `close()` already did.
async fn finalize_transport_close(shared: &Arc<SessionShared>) {
    let mut state = shared.state.lock().await;
    if state.sink.take().is_none() {
        return;
    }
    if let Some(heartbeat) = state.heartbeat.take() {
        heartbeat.abort();
    }
    if let Some(lifetime) = state.lifetime.take() {
        lifetime.cancel();
    }
    state.pump = None;
    drop(state);

    debug!("transport signalled terminal close");
    shared.events.emit(&ClientEvent::Close);
}
