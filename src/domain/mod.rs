//! Domain module
//!
//! Core domain types shared by the stores, services and API.

pub mod account;
pub mod amount;
pub mod context;
pub mod history;

pub use account::{Account, AccountView, Merchant};
pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use history::{HistoryEntry, ANONYMOUS_CUSTOMER};
