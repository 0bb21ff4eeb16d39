//! HTTP client for a keyward license server.
//!
//! Success is decided by the HTTP status alone: any 2xx is a success, anything
//! else is a [`ClientError::Api`] carrying the server's `error` or `message`.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The service endpoint to target.
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    InvalidInput(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("error connecting to server: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    pub license_key: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckOutcome {
    #[serde(default)]
    pub valid: bool,
    pub message: String,
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Deleted {
    message: String,
}

#[derive(Serialize)]
struct CreateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in_days: Option<i64>,
}

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(cfg: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| ClientError::InvalidInput(format!("invalid base URL {:?}: {e}", cfg.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidInput(format!(
                "base URL {:?} cannot carry a path",
                cfg.base_url
            )));
        }
        let http = reqwest::Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// `POST /create`. `None` asks for a key that never expires.
    pub async fn create(&self, expires_in_days: Option<i64>) -> Result<Created, ClientError> {
        let url = self.endpoint(&["create"]);
        debug!(%url, ?expires_in_days, "creating license");
        let resp = self
            .http
            .post(url)
            .json(&CreateBody { expires_in_days })
            .send()
            .await?;
        decode(resp, "Error creating license.").await
    }

    /// `GET /check/{key}`.
    pub async fn check(&self, key: &str) -> Result<CheckOutcome, ClientError> {
        let key = require_key(key)?;
        let url = self.endpoint(&["check", key]);
        debug!(%url, "checking license");
        let resp = self.http.get(url).send().await?;
        decode(resp, "Error checking license.").await
    }

    /// `DELETE /delete/{key}`. Returns the server's confirmation message.
    pub async fn delete(&self, key: &str) -> Result<String, ClientError> {
        let key = require_key(key)?;
        let url = self.endpoint(&["delete", key]);
        debug!(%url, "deleting license");
        let resp = self.http.delete(url).send().await?;
        let deleted: Deleted = decode(resp, "Error deleting license.").await?;
        Ok(deleted.message)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn require_key(key: &str) -> Result<&str, ClientError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ClientError::InvalidInput("Please enter a license key.".into()));
    }
    Ok(key)
}

async fn decode<T: DeserializeOwned>(resp: Response, fallback: &str) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let body: Value = resp.json().await.unwrap_or_default();
    let message = body
        .get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_owned());
    debug!(status = status.as_u16(), %message, "server rejected request");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
