use anyhow::Context;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::auth::{Identity, Role, SessionKeys};
use crate::cli::OutputFormat;
use crate::config::config;

/// Sign a token with the configured secret for the given identity
pub fn issue(
    email: String,
    name: String,
    role: &str,
    id: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let role: Role = role.parse().with_context(|| format!("invalid role '{}'", role))?;
    let identity = Identity {
        id: id.unwrap_or_else(|| email.clone()),
        email,
        name,
        role,
    };

    let keys = SessionKeys::from_config(&config().security);
    let issued = keys.issue(&identity).context("failed to sign session token")?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issued)?),
        OutputFormat::Text => {
            println!("{}", issued.token);
            eprintln!(
                "Session for {} ({}) expires at {}",
                issued.session.email, issued.session.role, issued.expires_at
            );
        }
    }

    Ok(())
}

/// Print an Argon2 PHC string for a fixture `passwordHash` entry
pub fn hash(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let hash = hash_password(password).context("failed to hash password")?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "passwordHash": hash })),
        OutputFormat::Text => println!("{}", hash),
    }

    Ok(())
}
