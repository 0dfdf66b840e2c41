//! API Middleware
//!
//! Bearer authentication, request history and request logging.

use axum::{
    body::{to_bytes, Body, Bytes, HttpBody},
    extract::{OriginalUri, State},
    http::{header, HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::TokenKind;
use crate::domain::{HistoryEntry, OperationContext, ANONYMOUS_CUSTOMER};
use crate::error::AppError;

use super::AppState;

const REDACTED: &str = "[REDACTED]";

/// Largest request body buffered for the history log, same as axum's `DefaultBodyLimit`
const MAX_RECORDED_BODY_BYTES: usize = 2 * 1024 * 1024;

// =========================================================================
// Bearer Authentication Middleware
// =========================================================================

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::MissingAuthorization)?
        .to_str()
        .map_err(|_| AppError::InvalidAuthorizationFormat)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AppError::InvalidAuthorizationFormat),
    }
}

/// Validate the bearer access token and attach the username to the request context
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(request.headers())?;

    let claims = state
        .tokens
        .validate(token, TokenKind::Access)
        .map_err(AppError::Unauthorized)?;

    let mut context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_default();
    let correlation_id = context.ensure_correlation_id();

    tracing::debug!(username = %claims.sub, correlation_id = %correlation_id, "Authenticated request");

    request
        .extensions_mut()
        .insert(context.with_username(claims.sub));

    Ok(next.run(request).await)
}

// =========================================================================
// History Middleware
// =========================================================================

/// Record one history entry per request once the response is known.
///
/// Failures to record are logged and never change the response.
pub async fn history_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(history) = state.history.clone() else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let (body, payload) = match recordable_len(&parts.method, &body) {
        Some(len) => match to_bytes(body, len).await {
            Ok(bytes) => (Body::from(bytes.clone()), bytes),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to buffer request body");
                return AppError::InvalidRequest.into_response();
            }
        },
        None => (body, Bytes::new()),
    };

    let customer_id = extract_bearer(&parts.headers)
        .ok()
        .and_then(|token| state.tokens.validate(token, TokenKind::Access).ok())
        .map(|claims| claims.sub)
        .unwrap_or_else(|| ANONYMOUS_CUSTOMER.to_string());

    let action = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let details = history_details(&parts.headers, &payload);

    let response = next.run(Request::from_parts(parts, body)).await;

    let status = response.status().canonical_reason().unwrap_or_default();
    let entry = HistoryEntry::new(Uuid::new_v4(), customer_id, status, action, details);

    match tokio::task::spawn_blocking(move || history.append(entry)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Failed to save history"),
        Err(e) => tracing::error!(error = %e, "History task failed"),
    }

    response
}

/// Size of a body small enough to record. Bodies of unknown or oversized
/// length pass through untouched and are logged without a payload.
fn recordable_len(method: &Method, body: &Body) -> Option<usize> {
    if method == Method::GET {
        return None;
    }
    body.size_hint()
        .exact()
        .and_then(|len| usize::try_from(len).ok())
        .filter(|len| *len <= MAX_RECORDED_BODY_BYTES)
}

/// Request payload fields never written to the history log
const SENSITIVE_FIELDS: &[&str] = &["password", "refresh_token"];

/// `{headers, payload?}` with sensitive headers and fields masked
fn history_details(headers: &HeaderMap, body: &[u8]) -> Value {
    let mut grouped = Map::new();
    for (name, value) in mask_headers_for_logging(headers) {
        if let Value::Array(values) = grouped.entry(name).or_insert_with(|| Value::Array(Vec::new())) {
            values.push(Value::String(value));
        }
    }

    let mut details = json!({ "headers": grouped });
    if !body.is_empty() {
        details["payload"] = redact_payload(body);
    }
    details
}

fn redact_payload(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut fields)) => {
            for field in SENSITIVE_FIELDS {
                if let Some(value) = fields.get_mut(*field) {
                    *value = Value::String(REDACTED.to_string());
                }
            }
            Value::Object(fields)
        }
        Ok(other) => other,
        Err(_) => Value::String(String::from_utf8_lossy(body).into_owned()),
    }
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "token"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
///
/// Also seeds the request's [`OperationContext`] with a correlation ID taken
/// from `X-Correlation-Id` or freshly generated.
pub async fn logging_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .headers()
        .get("X-Correlation-Id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    request
        .extensions_mut()
        .insert(OperationContext::new().with_correlation_id(correlation_id));

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = %correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    response
}
