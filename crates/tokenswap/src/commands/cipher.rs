//! Encrypt / decrypt commands - operator access to refresh token envelopes.

use anyhow::{Result, bail};
use clap::Args;

use tokenswap_config::ENCRYPTION_SECRET_VAR;
use tokenswap_oauth::RefreshTokenCipher;
use tokenswap_oauth::middleware::unescape_newlines;

use super::Context;

/// Arguments for the encrypt command.
#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Plaintext refresh token
    pub token: String,
}

/// Arguments for the decrypt command.
#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Envelope produced by `encrypt` or by the token endpoint
    pub envelope: String,
}

/// Run the encrypt command.
pub fn encrypt(args: EncryptArgs, ctx: &Context) -> Result<()> {
    let cipher = configured_cipher()?;
    let envelope = cipher.encrypt(&args.token)?;
    print_value("envelope", &envelope, ctx)
}

/// Run the decrypt command.
pub fn decrypt(args: DecryptArgs, ctx: &Context) -> Result<()> {
    let cipher = configured_cipher()?;
    let token = cipher.decrypt(&unescape_newlines(&args.envelope))?;
    print_value("refresh_token", &token, ctx)
}

fn configured_cipher() -> Result<RefreshTokenCipher> {
    let config = tokenswap_config::resolve()?;
    match config.encryption_secret() {
        Some(secret) => Ok(RefreshTokenCipher::new(secret)),
        None => bail!("{} is not set", ENCRYPTION_SECRET_VAR),
    }
}

fn print_value(key: &str, value: &str, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::json!({ key: value }));
    } else {
        println!("{}", value);
    }
    Ok(())
}
