//! Client configuration.
//!
//! [`ClientConfig`] is immutable after construction and shared by reference
//! (behind an `Arc`) between the facade, the session, and the coordinator.

use std::time::Duration;

/// Default liveness heartbeat interval (10 seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10_000);

/// Authentication configuration for the remote service.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// Fixed bearer token supplied by the caller.
    Static { token: String },
    /// OAuth 2.0 client-credentials grant against a token endpoint. The
    /// provider caches the token and refreshes it internally before expiry.
    OAuth {
        token_url: String,
        client_id: String,
        client_secret: String,
        scope: Option<String>,
    },
}

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Remote service address, `host:port`.
    pub endpoint: String,
    /// Server-side processing context all streamed requests are routed to.
    pub deployment_id: String,
    /// Affiliate identifier applied to inputs that do not name one.
    pub default_affiliate: String,
    /// How sessions authenticate.
    pub auth: AuthConfig,
    /// Interval between keep-warm heartbeat writes on an open session.
    pub heartbeat_interval: Duration,
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        deployment_id: impl Into<String>,
        default_affiliate: impl Into<String>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment_id: deployment_id.into(),
            default_affiliate: default_affiliate.into(),
            auth,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    /// Override the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}
