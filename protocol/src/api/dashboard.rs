//! Dashboard API DTOs

use serde::{Deserialize, Serialize};

use crate::common::Investment;

/// Response of `GET /api/customer/dashboard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDashboard {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub welcome_message: String,
}

/// One entry of `GET /api/manager/customers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub total_investment: f64,
    #[serde(default)]
    pub investments: Vec<Investment>,
}
