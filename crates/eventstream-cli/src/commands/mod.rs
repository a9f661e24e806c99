//! Command implementations for eventstream

pub mod auth_header;
pub mod tail;

pub use auth_header::auth_header;
pub use tail::tail;
