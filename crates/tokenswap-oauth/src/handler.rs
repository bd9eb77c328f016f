//! Per-endpoint orchestration.
//!
//! The handlers are the single error boundary: every failure becomes a
//! 400 `{"error": ...}` response, and provider statuses are passed through
//! otherwise.

use std::sync::Arc;

use tokenswap_config::Config;

use crate::error::{Result, SwapError};
use crate::middleware::{CredentialMiddleware, REFRESH_TOKEN_PARAM};
use crate::provider::ProviderClient;
use crate::types::{Params, SwapResponse, TokenPayload};

/// Error message returned when an inbound refresh token cannot be decrypted.
pub const INVALID_REFRESH_TOKEN: &str = "invalid refresh_token";

/// Token exchange service: provider client plus credential middleware.
#[derive(Debug, Clone)]
pub struct TokenSwap {
    provider: ProviderClient,
    middleware: CredentialMiddleware,
}

impl TokenSwap {
    /// Create a service for the provider at `provider_url`. Refresh token
    /// encryption follows the configuration.
    pub fn new(config: Arc<Config>, provider_url: impl Into<String>) -> Self {
        let middleware = CredentialMiddleware::new(&config);
        Self {
            provider: ProviderClient::with_base_url(config, provider_url),
            middleware,
        }
    }

    /// Whether refresh tokens are encrypted by this service.
    pub fn encrypts_refresh_tokens(&self) -> bool {
        self.middleware.is_active()
    }

    /// `POST /api/token`: exchange an authorization code, encrypting the
    /// returned refresh token.
    pub async fn handle_token_exchange(&self, auth_code: &str) -> SwapResponse {
        match self.token_exchange(auth_code).await {
            Ok((status, body)) => {
                tracing::info!(status, "Token exchange completed");
                SwapResponse::token(status, body)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token exchange failed");
                SwapResponse::error(e.to_string())
            }
        }
    }

    /// `POST /api/refresh_token`: decrypt the inbound refresh token and
    /// exchange it. The provider reply is passed through without
    /// re-encryption.
    pub async fn handle_refresh(&self, params: &Params) -> SwapResponse {
        match self.refresh(params).await {
            Ok((status, body)) => {
                tracing::info!(status, "Refresh token exchange completed");
                SwapResponse::token(status, body)
            }
            Err(SwapError::Cipher(e)) => {
                tracing::warn!(error = %e, "Rejected undecryptable refresh token");
                SwapResponse::error(INVALID_REFRESH_TOKEN)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh token exchange failed");
                SwapResponse::error(e.to_string())
            }
        }
    }

    async fn token_exchange(&self, auth_code: &str) -> Result<(u16, TokenPayload)> {
        let response = self.provider.exchange_code(auth_code).await?;
        Ok(self.middleware.protect_outbound(response)?)
    }

    async fn refresh(&self, params: &Params) -> Result<(u16, TokenPayload)> {
        let revealed = self.middleware.reveal_inbound(params)?;
        let refresh_token = revealed
            .get(REFRESH_TOKEN_PARAM)
            .map(String::as_str)
            .unwrap_or_default();

        let response = self.provider.exchange_refresh(refresh_token).await?;
        Ok((response.status, response.body))
    }
}
