//! Builder for wiring a client with custom collaborators.

use std::sync::Arc;

use crate::auth::{provider_from_config, CredentialProvider};
use crate::config::ClientConfig;
use crate::coordinator::RequestCoordinator;
use crate::events::EventBus;
use crate::prepare::{ImagePreparer, PayloadPreparer};
use crate::transport::{ClientIdentity, StreamingConnector, TcpConnector, TransportSession};
use crate::{Error, Result, VisionClient};

/// Builder for [`VisionClient`].
///
/// Only the configuration is required; the connector, preparer, and
/// credential provider default to the production implementations. Injecting
/// alternatives is how tests swap in mocks.
#[derive(Default)]
pub struct VisionClientBuilder {
    config: Option<ClientConfig>,
    connector: Option<Arc<dyn StreamingConnector>>,
    preparer: Option<Arc<dyn PayloadPreparer>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl VisionClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client configuration (required).
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Inject a transport connector. Defaults to [`TcpConnector`] against
    /// the configured endpoint.
    pub fn connector(mut self, connector: Arc<dyn StreamingConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Inject a payload preparer. Defaults to [`ImagePreparer`] at the
    /// service's fixed input dimensions.
    pub fn preparer(mut self, preparer: Arc<dyn PayloadPreparer>) -> Self {
        self.preparer = Some(preparer);
        self
    }

    /// Inject a credential provider. Defaults to the provider matching the
    /// configuration's auth section.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build the client.
    ///
    /// Client identity (version and language) is computed here, once, and
    /// reused for every session and unary call.
    pub fn build(self) -> Result<VisionClient> {
        let config = Arc::new(
            self.config
                .ok_or_else(|| Error::configuration("a ClientConfig is required"))?,
        );

        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(TcpConnector::new(config.endpoint.clone())),
        };
        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => provider_from_config(&config.auth)?,
        };
        let preparer = self
            .preparer
            .unwrap_or_else(|| Arc::new(ImagePreparer::default()));

        let identity = ClientIdentity::current();
        let events = EventBus::new();

        let session = Arc::new(TransportSession::new(
            config.clone(),
            connector.clone(),
            credentials.clone(),
            identity.clone(),
            events.clone(),
        ));
        let coordinator = RequestCoordinator::new(
            config.clone(),
            preparer,
            session.clone(),
            connector.clone(),
            credentials.clone(),
            identity.clone(),
        );

        Ok(VisionClient {
            config,
            session,
            coordinator,
            connector,
            credentials,
            identity,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    #[test]
    fn test_build_requires_config() {
        let err = VisionClientBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_build_with_static_auth() {
        let config = ClientConfig::new(
            "localhost:9040",
            "dep-1",
            "acme",
            AuthConfig::Static {
                token: "t".to_string(),
            },
        );
        let client = VisionClientBuilder::new().config(config).build().unwrap();
        assert_eq!(client.config().deployment_id, "dep-1");
        assert_eq!(client.identity.language, "rust");
    }
}
