//! DocVault CLI
//!
//! Runs the DocVault server and offers a few offline helpers.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docvault_api::{ApiConfig, ApiServer};
use docvault_auth::password::hash_password;
use docvault_core::validation::{is_valid_login, is_valid_password};

/// DocVault - token-authenticated document store
#[derive(Parser)]
#[command(name = "docvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "DOCVAULT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "DOCVAULT_PORT")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0", env = "DOCVAULT_BIND")]
        bind: String,
    },

    /// Print an Argon2id hash of a password
    HashPassword {
        /// Password to hash
        password: String,
    },

    /// Check a login and password against the account rules
    CheckCredentials {
        /// Login to check
        login: String,
        /// Password to check
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "docvault=debug,info"
    } else {
        "docvault=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::HashPassword { password } => cmd_hash_password(&password),
        Commands::CheckCredentials { login, password } => cmd_check_credentials(&login, &password),
    }
}

/// Run the API server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    let config = ApiConfig::from_env().context("Invalid server configuration")?;

    println!("{}", "🚀 Starting DocVault API server...".cyan().bold());
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!(
        "   {} {:?} (sweep every {:?})",
        "Cache TTL:".dimmed(),
        config.cache.default_ttl,
        config.cache.sweep_interval
    );
    if config.admin_token.is_none() {
        println!(
            "   {} ADMIN_TOKEN is not set; registration is disabled",
            "⚠".yellow()
        );
    }
    println!("\n   Press Ctrl+C to stop.\n");

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {bind}:{port}"))?;
    ApiServer::new(config)
        .run(addr)
        .await
        .context("Server failed")?;

    Ok(())
}

/// Print an Argon2id hash
fn cmd_hash_password(password: &str) -> Result<()> {
    let hash = hash_password(password).context("Failed to hash password")?;
    println!("{hash}");
    Ok(())
}

/// Validate credentials offline
fn cmd_check_credentials(login: &str, password: &str) -> Result<()> {
    let login_ok = is_valid_login(login);
    let password_ok = is_valid_password(password);

    report("Login", login_ok, "at least 8 letters or digits");
    report(
        "Password",
        password_ok,
        "at least 8 characters with upper, lower, digit and special",
    );

    if login_ok && password_ok {
        Ok(())
    } else {
        anyhow::bail!("credentials do not meet the account rules")
    }
}

fn report(label: &str, ok: bool, rule: &str) {
    if ok {
        println!("   {} {}", "✓".green(), label);
    } else {
        println!("   {} {} ({})", "✗".red(), label, rule.dimmed());
    }
}
