//! API Middleware
//!
//! API-key authentication resolving the acting identity, and request
//! logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::domain::{Grant, Identity};

use super::AppState;

/// Hex SHA-256 of a presented API key, matching the stored `key_hash`.
fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Extract and validate the API key from the X-API-Key header, then attach
/// the resolved [`Identity`] to the request. The identity is immutable for
/// the rest of the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let api_key = match headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
        Some(key) => key,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Missing X-API-Key header",
                    "error_code": "missing_api_key"
                })),
            )
                .into_response());
        }
    };

    let record: Option<(i64, Vec<String>, bool)> = match sqlx::query_as(
        r#"
        SELECT u.id, u.grants, k.is_active
        FROM api_keys k
        JOIN users u ON u.id = k.user_id
        WHERE k.key_hash = $1
        "#,
    )
    .bind(hash_api_key(api_key))
    .fetch_optional(&state.pool)
    .await
    {
        Ok(record) => record,
        Err(e) => {
            tracing::error!("Database error during API key validation: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "error_code": "database_error"
                })),
            )
                .into_response());
        }
    };

    let (user_id, grants, is_active) = match record {
        Some(record) => record,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Invalid API key",
                    "error_code": "invalid_api_key"
                })),
            )
                .into_response());
        }
    };

    if !is_active {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "API key is disabled",
                "error_code": "api_key_disabled"
            })),
        )
            .into_response());
    }

    let grants: Vec<Grant> = grants
        .iter()
        .filter_map(|raw| match raw.parse() {
            Ok(grant) => Some(grant),
            Err(e) => {
                tracing::warn!(user_id, grant = %raw, "Skipping unparseable grant: {}", e);
                None
            }
        })
        .collect();

    request
        .extensions_mut()
        .insert(Identity::new(user_id, grants));

    Ok(next.run(request).await)
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}
