//! OAuth 2.0 client-credentials provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::CredentialProvider;
use crate::{Error, ErrorContext, Result};

/// Refresh this long before the reported expiry to avoid using a token that
/// dies mid-request.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Assumed lifetime when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    header: String,
    expires_at: Instant,
}

/// Client-credentials grant with in-process caching.
///
/// Refreshes are serialized behind an async mutex so concurrent callers
/// trigger at most one token exchange.
pub struct OAuthClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthClientCredentials {
    pub fn new(
        token_url: String,
        client_id: String,
        client_secret: String,
        scope: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::Http)?;
        Ok(Self {
            http,
            token_url,
            client_id,
            client_secret,
            scope,
            cached: Mutex::new(None),
        })
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        debug!(token_url = %self.token_url, "fetching oauth token");

        let mut form = vec![("grant_type", "client_credentials")];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::credential_with_context(
                format!("token endpoint returned HTTP {}", status.as_u16()),
                ErrorContext::new().with_source("oauth_provider"),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(Error::Http)?;
        if token.access_token.is_empty() {
            return Err(Error::credential_with_context(
                "token endpoint returned an empty access token",
                ErrorContext::new().with_source("oauth_provider"),
            ));
        }

        let token_type = token.token_type.as_deref().unwrap_or("Bearer");
        let scheme = if token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            token_type
        };
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS));
        let expires_at = Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            header: format!("{} {}", scheme, token.access_token),
            expires_at,
        })
    }
}

#[async_trait]
impl CredentialProvider for OAuthClientCredentials {
    async fn bearer_header(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.header.clone());
            }
        }
        let fresh = self.fetch_token().await?;
        let header = fresh.header.clone();
        *cached = Some(fresh);
        Ok(header)
    }
}
