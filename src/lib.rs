//! merchant_pay Library
//!
//! Authenticated customer-to-merchant payment API. Re-exports modules for
//! integration testing and external use.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod services;
pub mod store;

mod error;

use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use api::AppState;
pub use config::{Config, ConfigError};
pub use domain::{Account, Amount, AmountError, Balance, Merchant, OperationContext};
pub use error::{AppError, AppResult, ErrorResponse, SuccessResponse};

use auth::{JwtIssuer, TokenIssuer};
use services::{AuthService, PaymentService};
use store::{
    HistoryStore, JsonAccountStore, JsonHistoryStore, JsonMerchantStore, StoreResult,
    CUSTOMERS_FILE, HISTORIES_FILE, MERCHANTS_FILE,
};

/// Load the stores from `config.data_dir` and wire the services.
pub fn build_state(config: &Config) -> StoreResult<AppState> {
    let accounts = Arc::new(JsonAccountStore::load(config.data_dir.join(CUSTOMERS_FILE))?);
    let merchants = Arc::new(JsonMerchantStore::load(config.data_dir.join(MERCHANTS_FILE))?);

    let history: Option<Arc<dyn HistoryStore>> = if config.history_enabled {
        Some(Arc::new(JsonHistoryStore::load(
            config.data_dir.join(HISTORIES_FILE),
        )?))
    } else {
        None
    };

    let tokens: Arc<dyn TokenIssuer> = Arc::new(JwtIssuer::new(config.token_settings()));

    Ok(AppState {
        auth: Arc::new(AuthService::new(accounts.clone(), tokens.clone())),
        payments: Arc::new(PaymentService::new(accounts, merchants)),
        tokens,
        history,
        legacy_refresh_status: config.legacy_refresh_status,
    })
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Axum layers run in reverse order: logging -> history -> (auth) -> handler
    let api_router = api::create_router(&state)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::history_middleware,
        ))
        .layer(middleware::from_fn(api::middleware::logging_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("token"),
        ]);

    Router::new()
        // Health check (no auth)
        .route("/health", axum::routing::get(health_check))
        .nest("/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
