//! Services module
//!
//! Orchestrates the stores and the token issuer. Nothing here knows about HTTP.

mod auth_service;
mod commands;
mod payment_service;


pub use auth_service::{AuthError, AuthService};
pub use commands::*;
pub use payment_service::{PaymentError, PaymentService};
