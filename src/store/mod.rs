//! Store module
//!
//! Capability traits for the account, merchant and history collections, and
//! their JSON-file backed implementations. Services only see the traits, so a
//! different backend can be substituted without touching them.

mod account_store;
mod history_store;
mod json_file;
mod merchant_store;

use std::io;

use crate::domain::{Account, Balance, HistoryEntry, Merchant};

pub use account_store::JsonAccountStore;
pub use history_store::JsonHistoryStore;
pub use json_file::{JsonCollection, Record};
pub use merchant_store::JsonMerchantStore;

/// File names inside the data directory
pub const CUSTOMERS_FILE: &str = "customers.json";
pub const MERCHANTS_FILE: &str = "merchants.json";
pub const HISTORIES_FILE: &str = "histories.json";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("duplicate {entity} {field}: {key}")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        key: String,
    },

    #[error("failed to read {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {entity} collection: {source}")]
    Serialize {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Customer accounts, addressed by username or ID.
pub trait AccountStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> StoreResult<Account>;

    fn find_by_id(&self, id: &str) -> StoreResult<Account>;

    fn get_balance(&self, id: &str) -> StoreResult<Balance>;

    /// Overwrite the balance and durably persist the whole collection.
    fn set_balance(&self, id: &str, balance: Balance) -> StoreResult<Account>;
}

/// Merchants, addressed only by ID.
pub trait MerchantStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> StoreResult<Merchant>;

    fn get_balance(&self, id: &str) -> StoreResult<Balance>;

    /// Overwrite the balance and durably persist the whole collection.
    fn set_balance(&self, id: &str, balance: Balance) -> StoreResult<Merchant>;
}

/// Append-only request history.
pub trait HistoryStore: Send + Sync {
    fn append(&self, entry: HistoryEntry) -> StoreResult<HistoryEntry>;

    fn entries_for(&self, customer_id: &str) -> Vec<HistoryEntry>;
}
