//! Authentication primitives
//!
//! Token issuing/validation and password verification. The orchestration
//! (login, logout, refresh) lives in [`crate::services::AuthService`].

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{
    Claims, JwtIssuer, TokenError, TokenIssuer, TokenKind, TokenSettings, DEFAULT_ACCESS_TTL_MINUTES,
    DEFAULT_REFRESH_TTL_DAYS,
};
