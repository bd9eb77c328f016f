//! OAuth token exchange proxy.
//!
//! Forwards authorization-code and refresh-token grants to the provider with
//! server-side client credentials, optionally encrypting the refresh token
//! handed back to the client.
//!
//! # Components
//!
//! - [`provider`]: outbound grant requests with Basic-Auth client credentials
//! - [`cipher`]: versioned AES-256-GCM envelopes for refresh tokens
//! - [`middleware`]: encrypt outbound / decrypt inbound refresh tokens
//! - [`handler`]: per-endpoint orchestration and error envelopes
//! - [`server`]: axum router with CORS

pub mod cipher;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod provider;
pub mod server;
pub mod types;

pub use cipher::RefreshTokenCipher;
pub use error::{CipherError, Result, SwapError};
pub use handler::{INVALID_REFRESH_TOKEN, TokenSwap};
pub use middleware::CredentialMiddleware;
pub use provider::{DEFAULT_PROVIDER_URL, ProviderClient};
pub use server::{ServerConfig, SwapServer};
pub use types::{ErrorBody, Grant, Params, ProviderResponse, SwapBody, SwapResponse, TokenPayload};
