//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::HeaderMap,
    middleware,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::auth::TokenError;
use crate::domain::{AccountView, Amount, OperationContext};
use crate::error::{AppError, AppResult, SuccessResponse};
use crate::services::{AccessToken, Credentials, PaymentCommand, TokenPair};

use super::middleware::{auth_middleware, extract_bearer};
use super::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub merchant_id: String,
    pub amount: Amount,
}

/// Unwrap a JSON body, mapping every rejection to 400 "invalid request body"
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            Err(AppError::InvalidRequest)
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
///
/// Logout and payment sit behind the bearer authentication middleware.
pub fn create_router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/customer/payment", post(payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .merge(protected)
}

// =========================================================================
// POST /auth/login
// =========================================================================

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<SuccessResponse<TokenPair>> {
    let request = body(payload)?;
    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::InvalidRequest);
    }

    let tokens = state
        .auth
        .login(&Credentials::new(request.username, request.password))?;

    Ok(SuccessResponse::ok("login successful", tokens))
}

// =========================================================================
// POST /auth/logout
// =========================================================================

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<SuccessResponse<()>> {
    let token = extract_bearer(&headers)?;
    state.auth.logout(token)?;

    Ok(SuccessResponse::message("logout successful"))
}

// =========================================================================
// POST /auth/refresh-token
// =========================================================================

async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> AppResult<SuccessResponse<AccessToken>> {
    let request = body(payload)?;

    let token = state
        .auth
        .refresh_access_token(&request.refresh_token)
        .map_err(|source| AppError::TokenRefresh {
            source,
            legacy_status: state.legacy_refresh_status,
        })?;

    Ok(SuccessResponse::ok("token refreshed successfully", token))
}

// =========================================================================
// POST /customer/payment
// =========================================================================

async fn payment(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> AppResult<SuccessResponse<AccountView>> {
    let request = body(payload)?;
    if request.merchant_id.is_empty() {
        return Err(AppError::InvalidRequest);
    }

    let username = context.username.ok_or_else(|| {
        AppError::Unauthorized(TokenError::Invalid("Invalid username in token".to_string()))
    })?;

    let command = PaymentCommand::new(request.merchant_id, request.amount);
    let payments = state.payments.clone();

    // Stores write files under a lock, keep that off the async workers
    let account = tokio::task::spawn_blocking(move || payments.pay(&command, &username))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(SuccessResponse::ok("payment successful", account.view()))
}
