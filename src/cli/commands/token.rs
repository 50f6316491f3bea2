use clap::Args;
use serde_json::json;

use crate::auth::{issue_token, Principal};
use crate::cli::OutputFormat;
use crate::config;

/// Ten years
pub const MAX_TOKEN_HOURS: u64 = 24 * 365 * 10;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(help = "Principal id (the JWT subject)")]
    pub id: i64,

    #[arg(long, default_value = "cli", help = "Principal display name")]
    pub name: String,

    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TOKEN_HOURS),
        help = "Token lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)"
    )]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);
    let principal = Principal {
        id: args.id,
        name: args.name,
    };

    let token = issue_token(&principal, &security.jwt_secret, hours)?;

    match output_format {
        OutputFormat::Json => {
            let body = json!({
                "token": token,
                "principal": principal,
                "expires_in_hours": hours,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
