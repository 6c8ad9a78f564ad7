pub mod auth;
pub mod fd;

pub use auth::*;
pub use fd::*;
