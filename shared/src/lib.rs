//! Jingle Accounts Shared Library
//!
//! This crate contains the error kinds, wire types and field validation
//! shared between the backend and its clients.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
