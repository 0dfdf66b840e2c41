//! Signed, time-bound tokens
//!
//! Access and refresh tokens are compact HS256 JWTs signed with two
//! independent secrets. The kind is also carried in the `typ` claim and
//! checked on validation, so neither kind can stand in for the other.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer embedded in every token
pub const DEFAULT_ISSUER: &str = "merchant-pay";

/// Default access token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

/// Default refresh token lifetime (7 days)
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Token purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiry (unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Token kind
    pub typ: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,

    #[error("{0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,

    #[error("expected {expected} token, got {found} token")]
    KindMismatch { expected: TokenKind, found: TokenKind },

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Secrets, lifetimes and issuer for a [`JwtIssuer`].
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl TokenSettings {
    /// Settings with the default lifetimes and issuer
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Issues, validates and rotates tokens.
pub trait TokenIssuer: Send + Sync {
    /// Issue a token of `kind` for `subject` as if the current time were `now`.
    fn issue_at(&self, subject: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<String, TokenError>;

    /// Validate `token` as a `kind` token at unix time `now`.
    fn validate_at(&self, token: &str, kind: TokenKind, now: i64) -> Result<Claims, TokenError>;

    fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, TokenKind::Access, Utc::now())
    }

    fn issue_refresh(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, TokenKind::Refresh, Utc::now())
    }

    fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        self.validate_at(token, kind, Utc::now().timestamp())
    }

    /// Exchange a valid refresh token for a fresh access token with the same subject.
    fn rotate(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        self.issue_access(&claims.sub)
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// HS256 JWT implementation of [`TokenIssuer`].
pub struct JwtIssuer {
    settings: TokenSettings,
    access: Keys,
    refresh: Keys,
}

impl JwtIssuer {
    pub fn new(settings: TokenSettings) -> Self {
        Self {
            access: Keys::from_secret(&settings.access_secret),
            refresh: Keys::from_secret(&settings.refresh_secret),
            settings,
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the caller's clock in validate_at
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);
        validation.set_issuer(&[&self.settings.issuer]);
        validation
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue_at(&self, subject: &str, kind: TokenKind, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.settings.ttl(kind))
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.settings.issuer.clone(),
            typ: kind,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.keys(kind).encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validate_at(&self, token: &str, kind: TokenKind, now: i64) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation())
            .map_err(|e| TokenError::Invalid(e.to_string()))?
            .claims;

        if claims.typ != kind {
            return Err(TokenError::KindMismatch {
                expected: kind,
                found: claims.typ,
            });
        }

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
