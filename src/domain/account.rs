//! Account and Merchant entities
//!
//! Both are seeded out-of-band and only ever have their balance rewritten.

use serde::{Deserialize, Serialize};

use super::Balance;

/// A customer account that can log in and pay merchants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque account ID (e.g. `cust-001`)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Unique login name
    pub username: String,

    /// Stored credential; plaintext or `sha256:<hex>`
    pub password: String,

    /// Current balance, never negative
    pub balance: Balance,
}

impl Account {
    /// Public projection of the account, without the credential.
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            balance: self.balance,
        }
    }
}

/// Account as returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub balance: Balance,
}

/// A merchant receiving payments. Addressed only by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub bank_account: String,

    #[serde(default)]
    pub bank_name: String,

    pub balance: Balance,
}
