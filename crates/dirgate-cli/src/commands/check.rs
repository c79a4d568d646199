//! check-config command - validate the loaded configuration

use super::CommandContext;
use crate::config::summary;
use anyhow::Result;
use colored::Colorize;
use dirgate_auth::MembershipPolicy;

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let ldap = &ctx.config.ldap;
    let outcome = ldap
        .validate()
        .and_then(|_| MembershipPolicy::from_config(ldap).map(|_| ()));
    let rows = summary(ldap);

    if ctx.is_json() {
        let settings: serde_json::Map<String, serde_json::Value> = rows
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();

        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "valid": outcome.is_ok(),
                "error": outcome.as_ref().err().map(|e| e.to_string()),
                "settings": settings,
            }))?
        );
    } else {
        println!("{}", "Directory configuration:".bold());
        for (key, value) in rows {
            println!("  {}: {}", key.cyan(), value);
        }
        println!();
    }

    match outcome {
        Ok(()) => {
            ctx.info(&format!("{}", "configuration is valid".green()));
            Ok(())
        }
        Err(e) => anyhow::bail!("{}: {}", e.code(), e),
    }
}
