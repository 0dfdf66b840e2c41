//! Authentication Service
//!
//! Verifies credentials and issues or rotates tokens. Tokens are stateless,
//! so logout only confirms that the presented access token is valid.

use std::sync::Arc;

use crate::auth::{verify_password, TokenError, TokenIssuer, TokenKind};
use crate::store::{AccountStore, StoreError};

use super::{AccessToken, Credentials, TokenPair};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username and wrong password are deliberately indistinguishable
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(#[source] TokenError),

    #[error("failed to issue token: {0}")]
    TokenIssue(#[source] TokenError),

    #[error("failed to get user by username: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    fn from_rotation(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => AuthError::TokenIssue(err),
            _ => AuthError::InvalidToken(err),
        }
    }

    /// Check if this is the caller's fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::InvalidToken(_))
    }
}

pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { accounts, tokens }
    }

    /// Verify credentials and issue an access/refresh token pair.
    pub fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let account = match self.accounts.find_by_username(&credentials.username) {
            Ok(account) => account,
            Err(e) if e.is_not_found() => {
                tracing::warn!(username = %credentials.username, "Login rejected: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(&account.password, &credentials.password) {
            tracing::warn!(username = %credentials.username, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .tokens
            .issue_access(&account.username)
            .map_err(AuthError::TokenIssue)?;
        let refresh_token = self
            .tokens
            .issue_refresh(&account.username)
            .map_err(AuthError::TokenIssue)?;

        tracing::info!(username = %account.username, "Login succeeded");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate an access token. No server state changes.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .validate(token, TokenKind::Access)
            .map_err(AuthError::InvalidToken)?;

        tracing::info!(username = %claims.sub, "Logout");
        Ok(())
    }

    /// Exchange a refresh token for a new access token.
    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let access_token = self
            .tokens
            .rotate(refresh_token)
            .map_err(AuthError::from_rotation)?;

        Ok(AccessToken { access_token })
    }
}
