//! JSON-file backed merchant store

use std::path::PathBuf;

use crate::domain::{Balance, Merchant};

use super::{JsonCollection, MerchantStore, Record, StoreError, StoreResult};

impl Record for Merchant {
    const ENTITY: &'static str = "merchant";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Merchant store backed by `merchants.json`.
#[derive(Debug)]
pub struct JsonMerchantStore {
    merchants: JsonCollection<Merchant>,
}

impl JsonMerchantStore {
    pub fn load(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let merchants = JsonCollection::load(path)?;
        tracing::info!(
            path = %merchants.path().display(),
            merchants = merchants.len(),
            "Loaded merchants"
        );
        Ok(Self { merchants })
    }
}

impl MerchantStore for JsonMerchantStore {
    fn find_by_id(&self, id: &str) -> StoreResult<Merchant> {
        self.merchants
            .get(id)
            .ok_or_else(|| StoreError::not_found(Merchant::ENTITY, id))
    }

    fn get_balance(&self, id: &str) -> StoreResult<Balance> {
        self.find_by_id(id).map(|merchant| merchant.balance)
    }

    fn set_balance(&self, id: &str, balance: Balance) -> StoreResult<Merchant> {
        self.merchants
            .update(id, |merchant| merchant.balance = balance)?
            .ok_or_else(|| StoreError::not_found(Merchant::ENTITY, id))
    }
}
