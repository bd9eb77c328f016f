//! Refresh token encryption.
//!
//! Envelope format (version 1):
//!
//! ```text
//! v1:<base64url-no-pad(salt[16] || nonce[12] || ciphertext || tag[16])>
//! ```
//!
//! The AES-256-GCM key is derived per envelope with HKDF-SHA256 from the
//! configured secret and the random salt. The version prefix lets a future
//! scheme coexist with tokens already handed out under this one.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use crate::error::CipherError;

/// Prefix identifying a version 1 envelope.
pub const ENVELOPE_PREFIX: &str = "v1:";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_INFO: &[u8] = b"tokenswap refresh_token v1";

/// Symmetric cipher keyed by the configured encryption secret.
#[derive(Clone)]
pub struct RefreshTokenCipher {
    secret: String,
}

impl RefreshTokenCipher {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Encrypt a token into a versioned envelope.
    ///
    /// Each call uses a fresh salt and nonce, so encrypting the same token
    /// twice yields different envelopes.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let cipher = self.cipher_for(&salt)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut raw = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&salt);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", ENVELOPE_PREFIX, URL_SAFE_NO_PAD.encode(raw)))
    }

    /// Decrypt an envelope produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let encoded = envelope
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(CipherError::UnsupportedVersion)?;

        let raw = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| CipherError::Malformed("invalid base64"))?;

        if raw.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
            return Err(CipherError::Malformed("envelope too short"));
        }

        let (salt, rest) = raw.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let cipher = self.cipher_for(salt)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }

    fn cipher_for(&self, salt: &[u8]) -> Result<Aes256Gcm, CipherError> {
        let mut key = [0u8; 32];
        Hkdf::<Sha256>::new(Some(salt), self.secret.as_bytes())
            .expand(KEY_INFO, &mut key)
            .map_err(|_| CipherError::KeyDerivation)?;
        Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::KeyDerivation)
    }
}

impl std::fmt::Debug for RefreshTokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenCipher")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
