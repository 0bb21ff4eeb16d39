use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use constant_time_eq::constant_time_eq;
use tracing::info;

use crate::{error::error_response, AppState};

/// Why a create or delete was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denied {
    /// No `Authorization` header at all.
    Missing,
    /// Header present but not `Bearer <token>`.
    NotBearer,
    WrongToken,
}

fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), Denied> {
    let value = headers.get(AUTHORIZATION).ok_or(Denied::Missing)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(Denied::NotBearer)?;
    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(Denied::WrongToken)
    }
}

/// Guards license issuance and deletion with `Authorization: Bearer <api_key>`
/// when KEYWARD_API_KEY is configured. Checks stay public either way.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    match authorize(request.headers(), expected) {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            info!(
                method = %request.method(),
                path = request.uri().path(),
                reason = ?reason,
                "audit: license.auth.rejected"
            );
            error_response(
                StatusCode::UNAUTHORIZED,
                "a valid API key is required to issue or delete licenses",
            )
        }
    }
}
