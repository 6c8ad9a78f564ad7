//! API DTOs module
//!
//! - `auth`: login and registration
//! - `dashboard`: customer and manager dashboards
//! - `fd`: fixed-deposit calculation and investment

pub mod auth;
pub mod dashboard;
pub mod fd;

pub use auth::*;
pub use dashboard::*;
pub use fd::*;
