//! Fixed-deposit API DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::Investment;

/// Body of `POST /api/fd/calculate` and `POST /api/fd/invest`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FdRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub principal: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub rate: f64,
    #[validate(range(min = 1))]
    pub tenure_in_months: u32,
}

impl FdRequest {
    pub fn new(principal: f64, rate: f64, tenure_in_months: u32) -> Self {
        Self {
            principal,
            rate,
            tenure_in_months,
        }
    }

    /// True when every field is a positive, finite number
    pub fn is_positive(&self) -> bool {
        self.principal.is_finite() && self.rate.is_finite() && self.validate().is_ok()
    }
}

/// Response of `POST /api/fd/calculate`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FdCalculation {
    pub maturity_amount: f64,
    pub interest_earned: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fd_request_camel_case() {
        let request = FdRequest::new(10000.0, 6.5, 24);
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"principal": 10000.0, "rate": 6.5, "tenureInMonths": 24})
        );
    }

    #[test]
    fn test_fd_request_positive() {
        assert!(FdRequest::new(1.0, 0.5, 1).is_positive());
        assert!(!FdRequest::new(0.0, 6.5, 12).is_positive());
        assert!(!FdRequest::new(1000.0, -1.0, 12).is_positive());
        assert!(!FdRequest::new(1000.0, 6.5, 0).is_positive());
        assert!(!FdRequest::new(f64::NAN, 6.5, 12).is_positive());
        assert!(!FdRequest::new(1000.0, f64::INFINITY, 12).is_positive());
    }
}
