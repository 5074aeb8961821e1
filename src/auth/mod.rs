//! Credential acquisition.
//!
//! The session and the unary calls only need one thing from this module:
//! "produce a current authorization header value". How that value is
//! obtained — a fixed token or an OAuth client-credentials exchange with its
//! own expiry policy — is the provider's concern. Acquisition failures
//! propagate to the triggering call; nothing here retries.

pub mod oauth;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::Result;

pub use oauth::OAuthClientCredentials;

/// Produces a current bearer authorization header value.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a header value such as `Bearer <token>`, refreshing internally
    /// as needed. Must be cheap when a cached credential is still valid.
    async fn bearer_header(&self) -> Result<String>;
}

/// Fixed-token provider; never expires, never fails.
pub struct StaticCredential {
    header: String,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            header: format!("Bearer {}", token.into()),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn bearer_header(&self) -> Result<String> {
        Ok(self.header.clone())
    }
}

/// Build the provider matching an [`AuthConfig`].
pub fn provider_from_config(auth: &AuthConfig) -> Result<Arc<dyn CredentialProvider>> {
    match auth {
        AuthConfig::Static { token } => Ok(Arc::new(StaticCredential::new(token.clone()))),
        AuthConfig::OAuth {
            token_url,
            client_id,
            client_secret,
            scope,
        } => Ok(Arc::new(OAuthClientCredentials::new(
            token_url.clone(),
            client_id.clone(),
            client_secret.clone(),
            scope.clone(),
        )?)),
    }
}
