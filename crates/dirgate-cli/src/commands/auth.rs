//! auth command - run one authentication attempt

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use dirgate_auth::LdapAuthenticator;
use dirgate_core::{AuthResult, Credential};
use std::io::BufRead;

pub async fn execute(ctx: &CommandContext, user: &str, password_env: &str) -> Result<()> {
    let password = read_password(password_env)?;
    let credential = Credential::new(user, password);

    let authenticator = LdapAuthenticator::new(ctx.config.ldap.clone())
        .context("Invalid directory configuration")?;

    ctx.info(&format!("Authenticating {} against {}", user, ctx.config.ldap.url()));

    let result = match authenticator.authenticate_credential(&credential).await {
        Ok(result) => result,
        Err(e) if e.is_user_facing() => anyhow::bail!("login rejected ({}): {}", e.code(), e),
        Err(e) => anyhow::bail!("directory unavailable ({}): {}", e.code(), e),
    };

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        AuthResult::Success(identity) => {
            println!("{}: {}", "authenticated".green(), identity.username);
            println!("  dn:           {}", identity.dn);
            println!("  email:        {}", identity.email);
            println!("  display name: {}", identity.display_name);
            println!("  auto create:  {}", identity.auto_create_account);
        }
        AuthResult::Fallback => {
            println!("{}: {} should be verified locally", "fallback".yellow(), user);
        }
    }

    Ok(())
}

fn read_password(password_env: &str) -> Result<String> {
    if let Ok(password) = std::env::var(password_env) {
        return Ok(password);
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
