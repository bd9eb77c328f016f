//! Check command - validates configuration without starting the server.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use tokenswap_config::{
    CLIENT_CALLBACK_URL_VAR, CLIENT_ID_VAR, CLIENT_SECRET_VAR, ENCRYPTION_SECRET_VAR,
};

use super::Context;

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Check result for JSON output. Never carries secret values.
#[derive(Debug, Serialize)]
struct CheckOutput {
    client_credentials: bool,
    encryption: bool,
    client_id: String,
    callback_url: String,
}

/// Run the check command.
pub fn run(_args: CheckArgs, ctx: &Context) -> Result<()> {
    let config = match tokenswap_config::resolve() {
        Ok(config) => config,
        Err(e) => {
            if !ctx.json_output {
                let red = Style::new().red();
                eprintln!("{} {}", red.apply_to("✗"), e);
                eprintln!(
                    "  Set {}, {} and {}",
                    CLIENT_ID_VAR, CLIENT_SECRET_VAR, CLIENT_CALLBACK_URL_VAR
                );
            }
            return Err(e.into());
        }
    };

    if ctx.json_output {
        let output = CheckOutput {
            client_credentials: config.has_client_credentials(),
            encryption: config.has_encryption_secret(),
            client_id: config.client_id().to_string(),
            callback_url: config.callback_url().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let green = Style::new().green();
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();

    println!("{} client credentials", green.apply_to("✓"));
    println!("  {} {}", dim.apply_to("Client ID:"), config.client_id());
    println!("  {} {}", dim.apply_to("Callback:"), config.callback_url());
    if config.has_encryption_secret() {
        println!("{} refresh token encryption", green.apply_to("✓"));
    } else {
        println!(
            "{} refresh token encryption disabled (set {})",
            yellow.apply_to("!"),
            ENCRYPTION_SECRET_VAR
        );
    }

    Ok(())
}
