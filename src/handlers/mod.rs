pub mod corrections;
pub mod health;
pub mod reconcile;
pub mod slots;

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;

/// Bearer-token gate shared by every /api route. The dashboard is the only
/// intended caller.
pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized.into_response());
    }
    Ok(())
}
