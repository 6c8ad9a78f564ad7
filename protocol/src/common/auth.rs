//! Identity-related common types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role claim carried in the session credential
///
/// The set is closed: any other claim value is treated as "no role".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Retail customer: own dashboard and FD investments
    Customer,
    /// Bank manager: overview of all customers and their investments
    BankManager,
}

impl Role {
    /// Wire identifier, as used in the credential and in request bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::BankManager => "BANK_MANAGER",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::BankManager => "Bank Manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role identifier is outside the closed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Role::Customer),
            "BANK_MANAGER" => Ok(Role::BankManager),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
