//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::services::{AuthService, PaymentService};
use crate::store::HistoryStore;

pub use routes::create_router;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub payments: Arc<PaymentService>,
    pub tokens: Arc<dyn TokenIssuer>,
    /// `None` disables request history
    pub history: Option<Arc<dyn HistoryStore>>,
    /// Map refresh failures to 500 instead of 401
    pub legacy_refresh_status: bool,
}
