//! Authentication API DTOs

use serde::{Deserialize, Serialize};

pub use crate::common::Role;

/// Body of `POST /api/auth/login`
///
/// The server answers with the raw credential as plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}
