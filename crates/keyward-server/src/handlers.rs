use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    error::{error_response, LicenseError},
    store::{model::iso8601, KeyStatus},
    AppState,
};

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health(State(state): State<AppState>) -> Response {
    match state.licenses.count().await {
        Ok(n) => Json(json!({"status": "ok", "licenses": n})).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Create ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateRequest {
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    pub license_key: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<String>,
}

pub async fn create_license(
    State(state): State<AppState>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return LicenseError::InvalidArgument(rejection.body_text()).into_response();
        }
    };

    match state.licenses.create(body.expires_in_days).await {
        Ok(record) => {
            info!(
                key = key_hint(&record.key),
                expires_in_days = ?body.expires_in_days,
                "audit: license.create"
            );
            (
                StatusCode::CREATED,
                Json(CreateResponse {
                    license_key: record.key,
                    expires_at: record.expires_at.map(iso8601),
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

// ── Check ─────────────────────────────────────────────────────────────────────

pub async fn check_license(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let status = match state.licenses.check(&key).await {
        Ok(status) => status,
        Err(e) => return e.into_response(),
    };
    info!(key = key_hint(&key), status = ?status, "audit: license.check");

    match status {
        KeyStatus::Valid { expires_at } => Json(json!({
            "valid": true,
            "message": "License key valid",
            "expiresAt": expires_at.map(iso8601),
        }))
        .into_response(),
        KeyStatus::Expired { expires_at } => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "valid": false,
                "message": "License key expired",
                "expiresAt": iso8601(expires_at),
            })),
        )
            .into_response(),
        KeyStatus::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({"valid": false, "message": "License key not found"})),
        )
            .into_response(),
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_license(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.licenses.revoke(&key).await {
        Ok(()) => {
            info!(key = key_hint(&key), "audit: license.delete");
            Json(json!({"success": true, "message": "License key deleted"})).into_response()
        }
        Err(LicenseError::NotFound) => {
            info!(key = key_hint(&key), "audit: license.delete.not_found");
            LicenseError::NotFound.into_response()
        }
        Err(e) => e.into_response(),
    }
}

// ── Fallbacks ─────────────────────────────────────────────────────────────────

pub async fn route_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "no such endpoint")
}

pub async fn method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method not allowed on this endpoint",
    )
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Leading characters of a key, enough to correlate log lines without
/// writing whole license keys to the log.
fn key_hint(key: &str) -> &str {
    key.get(..8).unwrap_or(key)
}
