use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use keyward_server::StorageBackend;
use tracing_subscriber::EnvFilter;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "keywardd",
    about = "Keywardd — license key authority server daemon",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Keyward HTTP server
    Serve {
        /// Port to listen on (default: $KEYWARD_PORT or 5000)
        #[arg(long, env = "KEYWARD_PORT", default_value = "5000")]
        port: u16,
        /// Host to bind (default: $KEYWARD_HOST or 127.0.0.1)
        #[arg(long, env = "KEYWARD_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Storage backend: redb or memory
        #[arg(long, env = "KEYWARD_STORAGE", default_value = "redb", value_parser = parse_storage)]
        storage: StorageBackend,
        /// Directory holding keyward.db (default: platform data dir)
        #[arg(long, env = "KEYWARD_DATA_DIR")]
        data_dir: Option<PathBuf>,
        /// Fail a request with 503 when the store takes longer than this, e.g. "5s", "500ms"
        #[arg(long, env = "KEYWARD_STORE_TIMEOUT", default_value = "5s", value_parser = humantime::parse_duration)]
        store_timeout: Duration,
        /// Bearer token required for create and delete (default: none, open access)
        #[arg(long, env = "KEYWARD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Comma-separated CORS origins (default: any)
        #[arg(long, env = "KEYWARD_CORS_ORIGINS")]
        cors_origins: Option<String>,
        /// Log level: error, warn, info, debug, verbose (default: $KEYWARD_LOG_LEVEL or info)
        #[arg(long, env = "KEYWARD_LOG_LEVEL")]
        log_level: Option<String>,
    },
}

fn parse_storage(s: &str) -> Result<StorageBackend, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let Commands::Serve { ref log_level, .. } = cli.command;
    let raw = log_level.clone().unwrap_or_else(|| "info".into());
    let effective_log_level = if raw.eq_ignore_ascii_case("verbose") {
        "debug".to_owned()
    } else {
        raw
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&effective_log_level))
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            storage,
            data_dir,
            store_timeout,
            api_key,
            cors_origins,
            log_level: _,
        } => {
            let cfg = keyward_server::ServerConfig {
                host,
                port,
                api_key,
                data_dir,
                storage,
                store_timeout,
                cors_origins,
            };
            cmd_serve(cfg).await
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_serve(cfg: keyward_server::ServerConfig) -> Result<()> {
    tracing::info!(
        storage = ?cfg.storage,
        auth = cfg.api_key.is_some(),
        "starting keywardd"
    );
    keyward_server::run(cfg).await
}
