//! Server middleware
//!
//! Provides request logging and the shared-token gate.

pub mod auth;
pub mod logging;

pub use auth::{TOKEN_HEADER, require_token};
pub use logging::log_request;
