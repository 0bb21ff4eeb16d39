use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    auth::require_api_key,
    clock::SystemClock,
    handlers::{
        check_license, create_license, delete_license, health, method_not_allowed,
        route_not_found,
    },
    service::LicenseService,
    store::{KeyStore, MemoryStore, RedbStore},
    AppState,
};

/// Where license records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `keyward.db` in the data directory.
    Redb,
    /// Process memory; everything is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" | "disk" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown storage backend {other:?} (expected redb or memory)"),
        }
    }
}

/// Runtime settings, assembled by `keywardd` from flags and `KEYWARD_*` variables.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub storage: StorageBackend,
    /// Deadline for a single store operation before the request fails with 503.
    pub store_timeout: Duration,
    pub cors_origins: Option<String>,
}

/// Use `dir` if given (creating it), else the platform data directory.
pub fn resolve_data_dir(dir: Option<&PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(d) => {
            std::fs::create_dir_all(d).context("create data dir")?;
            Ok(d.clone())
        }
        None => crate::dirs::data_dir(),
    }
}

fn open_store(cfg: &ServerConfig) -> Result<Arc<dyn KeyStore>> {
    match cfg.storage {
        StorageBackend::Memory => {
            info!("using in-memory license store; records are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Redb => {
            let data_dir = resolve_data_dir(cfg.data_dir.as_ref())?;
            info!(data_dir = %data_dir.display(), "using data directory");
            let db_path = data_dir.join("keyward.db");
            Ok(Arc::new(RedbStore::open(&db_path).context("open store")?))
        }
    }
}

/// Build the HTTP router. `cors_origins` is a comma-separated allow list; `None` allows any.
pub fn build_router(state: AppState, cors_origins: Option<&str>) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/check/{key}", get(check_license));

    // Mutations (API key required if configured).
    let protected = Router::new()
        .route("/create", post(create_license))
        .route("/delete/{key}", delete(delete_license))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(build_cors(cors_origins))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let store = open_store(&cfg)?;
    let licenses = LicenseService::new(store, Arc::new(SystemClock), cfg.store_timeout);

    if cfg.api_key.is_some() {
        info!("API key required for create and delete");
    }

    let state = AppState {
        licenses,
        api_key: cfg.api_key,
    };
    let app = build_router(state, cfg.cors_origins.as_deref());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, store_timeout = ?cfg.store_timeout, "keyward server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, stopping server");
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<_> = o
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}
