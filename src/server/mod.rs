//! Server core functionality
//!
//! The HTTP surface over the storage service: routing, handlers and
//! response encoding.

pub mod body;
pub mod core;
pub mod handlers;
pub mod responses;

pub use self::core::{AppState, Server, router};
