use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use keyward::{Client, ClientConfig, DEFAULT_BASE_URL};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "keyward",
    about = "Issue, check and delete license keys on a keyward server",
    version
)]
struct Cli {
    /// Server endpoint to target
    #[arg(long, global = true, env = "KEYWARD_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Request timeout, e.g. "10s"
    #[arg(long, global = true, env = "KEYWARD_TIMEOUT", default_value = "10s", value_parser = humantime::parse_duration)]
    timeout: Duration,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a new license key
    Create {
        /// Days until the key expires; omit for a key that never expires
        #[arg(long, allow_hyphen_values = true)]
        expires_in_days: Option<i64>,
    },
    /// Check whether a license key is valid
    Check { key: String },
    /// Delete (revoke) a license key
    Delete { key: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KEYWARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let client = Client::new(ClientConfig {
        base_url: cli.base_url,
        timeout: cli.timeout,
    })?;

    let line = match cli.command {
        Commands::Create { expires_in_days } => {
            let created = client.create(expires_in_days).await?;
            format!(
                "License created: {} (Expires: {})",
                created.license_key,
                created.expires_at.as_deref().unwrap_or("never")
            )
        }
        Commands::Check { key } => {
            let outcome = client.check(&key).await?;
            format!(
                "{} (Expires: {})",
                outcome.message,
                outcome.expires_at.as_deref().unwrap_or("never")
            )
        }
        Commands::Delete { key } => client.delete(&key).await?,
    };
    Ok(line)
}
