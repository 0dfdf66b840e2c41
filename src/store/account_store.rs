//! JSON-file backed customer account store

use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::{Account, Balance};

use super::{AccountStore, JsonCollection, Record, StoreError, StoreResult};

impl Record for Account {
    const ENTITY: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Account store backed by `customers.json`.
#[derive(Debug)]
pub struct JsonAccountStore {
    accounts: JsonCollection<Account>,
    /// username -> account ID; usernames never change after load
    usernames: HashMap<String, String>,
}

impl JsonAccountStore {
    /// Load accounts from `path`. Rejects duplicate IDs and usernames.
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::from_collection(JsonCollection::load(path)?)
    }

    pub fn from_collection(accounts: JsonCollection<Account>) -> StoreResult<Self> {
        let mut usernames = HashMap::new();
        let duplicate = accounts.read(|items| {
            items.iter().find_map(|account| {
                usernames
                    .insert(account.username.clone(), account.id.clone())
                    .map(|_| account.username.clone())
            })
        });

        if let Some(username) = duplicate {
            return Err(StoreError::Duplicate {
                entity: Account::ENTITY,
                field: "username",
                key: username,
            });
        }

        tracing::info!(
            path = %accounts.path().display(),
            accounts = accounts.len(),
            "Loaded customer accounts"
        );

        Ok(Self {
            accounts,
            usernames,
        })
    }
}

impl AccountStore for JsonAccountStore {
    fn find_by_username(&self, username: &str) -> StoreResult<Account> {
        self.usernames
            .get(username)
            .and_then(|id| self.accounts.get(id))
            .ok_or_else(|| StoreError::not_found(Account::ENTITY, username))
    }

    fn find_by_id(&self, id: &str) -> StoreResult<Account> {
        self.accounts
            .get(id)
            .ok_or_else(|| StoreError::not_found(Account::ENTITY, id))
    }

    fn get_balance(&self, id: &str) -> StoreResult<Balance> {
        self.find_by_id(id).map(|account| account.balance)
    }

    fn set_balance(&self, id: &str, balance: Balance) -> StoreResult<Account> {
        self.accounts
            .update(id, |account| account.balance = balance)?
            .ok_or_else(|| StoreError::not_found(Account::ENTITY, id))
    }
}
