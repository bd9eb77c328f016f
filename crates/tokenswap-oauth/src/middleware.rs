//! Refresh token protection applied around the provider call.
//!
//! Outbound: the refresh token in a provider response is replaced by its
//! ciphertext envelope before it reaches the client. Inbound: an envelope
//! sent by the client is decrypted before being forwarded to the provider.
//! Without an encryption secret both directions are the identity.

use tokenswap_config::Config;

use crate::cipher::RefreshTokenCipher;
use crate::error::CipherError;
use crate::types::{Params, ProviderResponse, TokenPayload};

/// Name of the refresh token field, both in provider bodies and in request
/// parameters.
pub const REFRESH_TOKEN_PARAM: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct CredentialMiddleware {
    cipher: Option<RefreshTokenCipher>,
}

impl CredentialMiddleware {
    /// Build the middleware for a configuration. Encryption is active iff the
    /// configuration has an encryption secret.
    pub fn new(config: &Config) -> Self {
        Self {
            cipher: config.encryption_secret().map(RefreshTokenCipher::new),
        }
    }

    pub fn is_active(&self) -> bool {
        self.cipher.is_some()
    }

    /// Encrypt the refresh token of a provider response, if present and
    /// non-empty. Returns the provider status unchanged alongside the body.
    pub fn protect_outbound(
        &self,
        response: ProviderResponse,
    ) -> Result<(u16, TokenPayload), CipherError> {
        let ProviderResponse { status, mut body } = response;

        if let Some(cipher) = &self.cipher {
            if let Some(token) = body.refresh_token().filter(|t| !t.is_empty()) {
                let envelope = cipher.encrypt(token)?;
                body.set_refresh_token(envelope);
                tracing::debug!(status, "Encrypted outbound refresh token");
            }
        }

        Ok((status, body))
    }

    /// Resolve the inbound `refresh_token` parameter to plaintext.
    ///
    /// Literal `\n` sequences are turned back into newlines first. A missing
    /// parameter is treated as empty. All other parameters are copied as-is.
    pub fn reveal_inbound(&self, params: &Params) -> Result<Params, CipherError> {
        let raw = params
            .get(REFRESH_TOKEN_PARAM)
            .map(String::as_str)
            .unwrap_or_default();
        let token = unescape_newlines(raw);

        let resolved = match &self.cipher {
            Some(cipher) => cipher.decrypt(&token)?,
            None => token,
        };

        let mut revealed = params.clone();
        revealed.insert(REFRESH_TOKEN_PARAM.to_string(), resolved);
        Ok(revealed)
    }
}

/// Replace literal two-character `\n` sequences with real newlines.
pub fn unescape_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}
