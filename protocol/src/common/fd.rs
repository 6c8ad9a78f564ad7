//! Fixed-deposit records

use serde::{Deserialize, Serialize};

/// A booked fixed deposit as returned by the server
///
/// `maturity_amount` is computed server-side; the client only displays it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub principal: f64,
    pub rate: f64,
    pub tenure_in_months: u32,
    pub maturity_amount: f64,
    /// Server timestamp, kept verbatim for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}
