//! Outbound grant requests against the provider token endpoint.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::AUTHORIZATION;
use tokenswap_config::Config;

use crate::error::{Result, SwapError};
use crate::types::{Grant, ProviderResponse, TokenPayload};

/// Default provider base URL.
pub const DEFAULT_PROVIDER_URL: &str = "https://accounts.spotify.com";

/// Token endpoint path on the provider.
pub const TOKEN_PATH: &str = "/api/token";

/// Client for the provider token endpoint.
///
/// Non-2xx replies are not errors: the status and body are handed back
/// unchanged. Only transport failures and unparseable bodies fail.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    config: Arc<Config>,
    base_url: String,
    http: reqwest::Client,
}

impl ProviderClient {
    /// Create a client for a provider base URL, usually
    /// [`DEFAULT_PROVIDER_URL`].
    pub fn with_base_url(config: Arc<Config>, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, auth_code: &str) -> Result<ProviderResponse> {
        self.request(&Grant::AuthorizationCode {
            code: auth_code.to_string(),
        })
        .await
    }

    /// Exchange a (plaintext) refresh token for a fresh access token.
    pub async fn exchange_refresh(&self, refresh_token: &str) -> Result<ProviderResponse> {
        self.request(&Grant::RefreshToken {
            refresh_token: refresh_token.to_string(),
        })
        .await
    }

    /// Send a grant to the token endpoint.
    pub async fn request(&self, grant: &Grant) -> Result<ProviderResponse> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        tracing::debug!(grant = grant.grant_type(), %url, "Forwarding grant to provider");

        let response = self
            .http
            .post(&url)
            .query(&grant.query(self.config.callback_url()))
            .header(AUTHORIZATION, authorization_basic(&self.config))
            .send()
            .await
            .map_err(|e| SwapError::Network(format!("Token request failed: {}", e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SwapError::Network(format!("Failed to read token response: {}", e)))?;

        let body: TokenPayload = serde_json::from_str(&text).map_err(|e| {
            SwapError::Provider(format!(
                "Failed to parse token response (status {}): {}",
                status, e
            ))
        })?;

        tracing::debug!(grant = grant.grant_type(), status, "Provider responded");
        Ok(ProviderResponse { status, body })
    }
}

/// `Authorization` header value for the configured client credentials.
pub fn authorization_basic(config: &Config) -> String {
    let credentials = format!("{}:{}", config.client_id(), config.client_secret());
    format!("Basic {}", STANDARD.encode(credentials))
}
