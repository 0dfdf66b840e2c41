//! Payment Service
//!
//! Moves money from a customer account to a merchant.
//!
//! The two stores commit independently. If the merchant credit fails after
//! the payer debit was persisted, the debit is reverted with a compensating
//! write; if that also fails the payer stays debited and an error is logged
//! for manual reconciliation.

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Account, AmountError};
use crate::store::{AccountStore, MerchantStore, StoreError};

use super::PaymentCommand;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("failed to get user by username: {0}")]
    AccountNotFound(#[source] StoreError),

    #[error("failed to get merchant balance: {0}")]
    MerchantNotFound(#[source] StoreError),

    #[error("insufficient balance")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("balance out of range: {0}")]
    BalanceOutOfRange(#[from] AmountError),

    #[error("failed to update user balance: {0}")]
    PersistAccount(#[source] StoreError),

    #[error("failed to update merchant balance: {0}")]
    PersistMerchant(#[source] StoreError),
}

impl PaymentError {
    /// Check if this is a validation or business failure rather than a storage fault
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::AccountNotFound(e) | Self::MerchantNotFound(e) => e.is_not_found(),
            Self::InsufficientFunds { .. } | Self::BalanceOutOfRange(_) => true,
            Self::PersistAccount(_) | Self::PersistMerchant(_) => false,
        }
    }
}

pub struct PaymentService {
    accounts: Arc<dyn AccountStore>,
    merchants: Arc<dyn MerchantStore>,
    /// Serializes payments so concurrent ones never read the same starting balance
    lock: Mutex<()>,
}

impl PaymentService {
    pub fn new(accounts: Arc<dyn AccountStore>, merchants: Arc<dyn MerchantStore>) -> Self {
        Self {
            accounts,
            merchants,
            lock: Mutex::new(()),
        }
    }

    /// Pay `command.amount` from the account of `payer_username` to `command.merchant_id`.
    ///
    /// Returns the payer account with its new balance.
    pub fn pay(&self, command: &PaymentCommand, payer_username: &str) -> Result<Account, PaymentError> {
        let _guard = self.lock.lock();

        let payer = self
            .accounts
            .find_by_username(payer_username)
            .map_err(PaymentError::AccountNotFound)?;

        let merchant_balance = self
            .merchants
            .get_balance(&command.merchant_id)
            .map_err(PaymentError::MerchantNotFound)?;

        if !payer.balance.is_sufficient_for(&command.amount) {
            return Err(PaymentError::InsufficientFunds {
                required: command.amount.value(),
                available: payer.balance.value(),
            });
        }

        let new_payer_balance = payer.balance.debit(&command.amount)?;
        let new_merchant_balance = merchant_balance.credit(&command.amount)?;

        let updated = self
            .accounts
            .set_balance(&payer.id, new_payer_balance)
            .map_err(PaymentError::PersistAccount)?;

        if let Err(e) = self.merchants.set_balance(&command.merchant_id, new_merchant_balance) {
            self.revert_debit(&payer, &command.merchant_id);
            return Err(PaymentError::PersistMerchant(e));
        }

        tracing::info!(
            payer = %payer.username,
            merchant_id = %command.merchant_id,
            amount = %command.amount,
            payer_balance = %updated.balance,
            merchant_balance = %new_merchant_balance,
            "Payment committed"
        );

        Ok(updated)
    }

    fn revert_debit(&self, payer: &Account, merchant_id: &str) {
        match self.accounts.set_balance(&payer.id, payer.balance) {
            Ok(_) => tracing::warn!(
                payer = %payer.username,
                merchant_id = %merchant_id,
                "Merchant credit failed, payer debit reverted"
            ),
            Err(e) => tracing::error!(
                payer = %payer.username,
                merchant_id = %merchant_id,
                restore_balance = %payer.balance,
                error = %e,
                "Merchant credit failed and payer debit could not be reverted; reconcile manually"
            ),
        }
    }
}
