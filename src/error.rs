//! Error handling module
//!
//! Boundary error type and the `{status, message, data?}` response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::TokenError;
use crate::services::{AuthError, PaymentError};

/// Message returned for every failure whose detail stays in the logs
const INTERNAL_MESSAGE: &str = "internal server error";

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("invalid request body")]
    InvalidRequest,

    #[error("Authorization header is missing")]
    MissingAuthorization,

    #[error("Invalid Authorization header format")]
    InvalidAuthorizationFormat,

    #[error("Unauthorized: {0}")]
    Unauthorized(#[source] TokenError),

    // Service errors, status depends on the kind
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Refresh failures keep a separate mapping, see [`AppError::status`]
    #[error("{source}")]
    TokenRefresh {
        #[source]
        source: AuthError,
        legacy_status: bool,
    },

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest => StatusCode::BAD_REQUEST,
            AppError::MissingAuthorization
            | AppError::InvalidAuthorizationFormat
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Auth(e) if e.is_client_error() => StatusCode::UNAUTHORIZED,
            AppError::Payment(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::TokenRefresh {
                source,
                legacy_status: false,
            } if source.is_client_error() => StatusCode::UNAUTHORIZED,
            AppError::Auth(_)
            | AppError::Payment(_)
            | AppError::TokenRefresh { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to the client
    fn public_message(&self) -> String {
        match self {
            AppError::Auth(e) if !e.is_client_error() => INTERNAL_MESSAGE.to_string(),
            AppError::Payment(e) if !e.is_client_error() => INTERNAL_MESSAGE.to_string(),
            AppError::TokenRefresh { source, .. } if !source.is_client_error() => {
                INTERNAL_MESSAGE.to_string()
            }
            AppError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Success response body
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl SuccessResponse<()> {
    /// 200 without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use rust_decimal_macros::dec;

    fn persist_error() -> StoreError {
        StoreError::Persist {
            path: "/srv/data/customers.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        }
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::Store(persist_error())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::MissingAuthorization.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidRequest.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_payment_error_statuses() {
        let insufficient = PaymentError::InsufficientFunds {
            required: dec!(2000),
            available: dec!(1000),
        };
        assert_eq!(AppError::Payment(insufficient).status(), StatusCode::BAD_REQUEST);

        let missing = PaymentError::MerchantNotFound(StoreError::not_found("merchant", "m-9"));
        assert_eq!(AppError::Payment(missing).status(), StatusCode::BAD_REQUEST);

        let persist = PaymentError::PersistAccount(persist_error());
        assert_eq!(AppError::Payment(persist).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_refresh_status_follows_legacy_flag() {
        let current = AppError::TokenRefresh {
            source: AuthError::InvalidToken(TokenError::Empty),
            legacy_status: false,
        };
        assert_eq!(current.status(), StatusCode::UNAUTHORIZED);

        let legacy = AppError::TokenRefresh {
            source: AuthError::InvalidToken(TokenError::Empty),
            legacy_status: true,
        };
        assert_eq!(legacy.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(legacy.public_message(), "invalid token: token is empty");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Payment(PaymentError::PersistMerchant(persist_error()));
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);

        let err = AppError::Payment(PaymentError::InsufficientFunds {
            required: dec!(1),
            available: dec!(0),
        });
        assert_eq!(err.public_message(), "insufficient balance");
    }

    #[test]
    fn test_unauthorized_message() {
        let err = AppError::Unauthorized(TokenError::Expired);
        assert_eq!(err.to_string(), "Unauthorized: token has expired");
    }

    #[test]
    fn test_success_response_omits_missing_data() {
        let body = serde_json::to_value(SuccessResponse::<()>::message("logout successful")).unwrap();
        assert_eq!(body, serde_json::json!({"status": 200, "message": "logout successful"}));
    }
}
