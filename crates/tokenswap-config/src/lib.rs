//! Configuration for the tokenswap proxy.
//!
//! Secrets come from the process environment (optionally seeded from a
//! `.env` file):
//! - `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`, `SPOTIFY_CLIENT_CALLBACK_URL`
//!   are required together
//! - `ENCRYPTION_SECRET` is optional; without it refresh tokens travel in
//!   plaintext
//!
//! Components receive an [`Arc<Config>`](std::sync::Arc) explicitly. The
//! process-wide instance is available through [`resolve`] for callers that
//! want the ambient one.

pub mod error;
pub mod resolver;

pub use error::{ConfigError, Result};
pub use resolver::{
    CLIENT_CALLBACK_URL_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR, Config, ENCRYPTION_SECRET_VAR,
    load_dotenv, reset, resolve,
};
