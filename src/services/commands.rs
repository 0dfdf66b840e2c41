//! Command and result definitions
//!
//! Commands carry already-validated input into the services.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Amount;

// =========================================================================
// Authentication
// =========================================================================

/// Login credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
}

// =========================================================================
// Payment
// =========================================================================

/// Command to pay a merchant from the authenticated customer's balance
#[derive(Debug, Clone)]
pub struct PaymentCommand {
    pub merchant_id: String,
    /// Strictly positive, validated at construction
    pub amount: Amount,
}

impl PaymentCommand {
    pub fn new(merchant_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            amount,
        }
    }
}
