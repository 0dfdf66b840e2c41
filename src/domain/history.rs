//! Request history entries
//!
//! One append-only record per handled request.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer ID recorded when the request carried no valid access token
pub const ANONYMOUS_CUSTOMER: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub customer_id: String,
    /// HTTP reason phrase of the response (e.g. `OK`, `Bad Request`)
    #[serde(default)]
    pub status: String,
    /// Request path
    pub action: String,
    #[serde(default)]
    pub details: serde_json::Value,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn new(
        id: Uuid,
        customer_id: impl Into<String>,
        status: impl Into<String>,
        action: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: id.to_string(),
            customer_id: customer_id.into(),
            status: status.into(),
            action: action.into(),
            details,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
