//! Wire types for the fixed-deposit portal REST API
//!
//! - `common`: types shared by several endpoints (roles, investment records)
//! - `api`: request/response bodies grouped by endpoint family

pub mod api;
pub mod common;

pub use common::*;
