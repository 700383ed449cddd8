//! Business logic services
//!
//! Services coordinate the account repository and the auth service.

pub mod user;

pub use user::UserService;
