pub mod auth;
pub mod clock;
pub mod dirs;
pub mod error;
pub mod handlers;
pub mod server;
pub mod service;
pub mod store;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub licenses: service::LicenseService,
    /// Optional API key for write-protecting create and delete.
    pub api_key: Option<String>,
}

pub use error::LicenseError;
pub use server::{build_router, resolve_data_dir, run, ServerConfig, StorageBackend};
pub use service::LicenseService;
