//! Error types for the token exchange proxy.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SwapError>;

/// Errors that can occur while brokering a token exchange.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    /// Network/HTTP error talking to the provider.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider returned a body that could not be parsed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Invalid inbound request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Refresh token encryption or decryption failed.
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

impl SwapError {
    /// A required request parameter was not supplied.
    pub fn missing_param(name: &str) -> Self {
        SwapError::InvalidRequest(format!("missing required parameter '{}'", name))
    }
}

/// Symmetric cipher failures.
///
/// Messages are deliberately generic; none of them carry key or plaintext
/// material.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Envelope does not start with a known version prefix.
    #[error("unsupported envelope version")]
    UnsupportedVersion,

    /// Envelope could not be decoded.
    #[error("malformed envelope: {0}")]
    Malformed(&'static str),

    /// Authentication tag mismatch (wrong key or tampered data).
    #[error("decryption failed")]
    Decrypt,

    /// Encryption failed.
    #[error("encryption failed")]
    Encrypt,

    /// Key derivation failed.
    #[error("key derivation failed")]
    KeyDerivation,

    /// Decrypted bytes are not valid UTF-8.
    #[error("decrypted token is not valid UTF-8")]
    InvalidUtf8,
}
