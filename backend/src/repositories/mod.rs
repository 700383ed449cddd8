//! Account repositories
//!
//! Provides the data access layer for account records.

pub mod user;

pub use user::{
    MemoryUserRepository, NewUser, PgUserRepository, RepositoryError, RepositoryResult,
    UserRecord, UserRepository,
};
