//! Dirgate - directory-backed login verification
//!
//! Command-line front end for checking Active Directory / LDAP logins the way
//! a host application would.

mod commands;
mod config;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirgate")]
#[command(author = "Dirgate Team")]
#[command(version = dirgate_core::VERSION)]
#[command(about = "Verify logins against Active Directory or LDAP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRGATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DIRGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Only print results
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one authentication attempt
    Auth {
        /// Account name (DOMAIN\login, login@domain or login)
        #[arg(short, long)]
        user: String,

        /// Environment variable holding the password; stdin is read when unset
        #[arg(long, default_value = "DIRGATE_PASSWORD")]
        password_env: String,
    },

    /// Escape a value for a search filter or DN
    Escape {
        value: String,

        /// Apply filter escaping
        #[arg(long)]
        filter: bool,

        /// Apply DN escaping
        #[arg(long)]
        dn: bool,

        /// Characters to leave unescaped
        #[arg(long, default_value = "")]
        ignore: String,
    },

    /// Load and validate the configuration
    CheckConfig,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("dirgate {}", dirgate_core::VERSION);
        return Ok(());
    }

    let config = config::load(cli.config.as_deref())?;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, &config.logging.format);

    let ctx = CommandContext {
        config,
        output_format: cli.output,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Auth { user, password_env } => {
            commands::auth::execute(&ctx, &user, &password_env).await
        }
        Commands::Escape {
            value,
            filter,
            dn,
            ignore,
        } => commands::escape::execute(&ctx, &value, filter, dn, &ignore),
        Commands::CheckConfig => commands::check::execute(&ctx),
        Commands::Version => Ok(()),
    }
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays machine-readable
    if format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}
