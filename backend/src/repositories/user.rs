//! User repository for account records
//!
//! Two backends share one trait: PostgreSQL for deployments and an
//! in-memory map for development and tests. Both enforce unique usernames
//! and email addresses atomically with the write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sqlx::PgPool;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::UserId;

const USERNAME_CONSTRAINT: &str = "users_username_unique";
const EMAIL_CONSTRAINT: &str = "users_email_address_unique";

/// User record
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub pass_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub pass_hash: Vec<u8>,
}

/// Repository failures the account layer reacts to
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email address already taken")]
    EmailTaken,

    #[error("User with userid ({0}) doesn't exist")]
    NotFound(UserId),

    #[error(transparent)]
    Database(sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                match db_err.constraint() {
                    Some(USERNAME_CONSTRAINT) => return RepositoryError::UsernameTaken,
                    Some(EMAIL_CONSTRAINT) => return RepositoryError::EmailTaken,
                    _ => {}
                }
            }
        }
        RepositoryError::Database(err)
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Account persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, assigning its id
    async fn create(&self, user: NewUser) -> RepositoryResult<UserRecord>;

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<UserRecord>>;

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserRecord>>;

    /// Overwrite the mutable fields of an existing user
    async fn update(&self, user: &UserRecord) -> RepositoryResult<UserRecord>;

    /// Delete a user; returns whether a row was removed
    async fn delete(&self, id: UserId) -> RepositoryResult<bool>;

    /// Check that the backing store is reachable
    async fn ping(&self) -> RepositoryResult<()>;
}

/// PostgreSQL-backed repository
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> RepositoryResult<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, first_name, last_name, email_address, pass_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, first_name, last_name, email_address, pass_hash,
                      created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_address)
        .bind(&user.pass_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, first_name, last_name, email_address, pass_hash,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, first_name, last_name, email_address, pass_hash,
                   created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update(&self, user: &UserRecord) -> RepositoryResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                username = $2,
                first_name = $3,
                last_name = $4,
                email_address = $5,
                pass_hash = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, first_name, last_name, email_address, pass_hash,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email_address)
        .bind(&user.pass_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound(user.id))
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(RepositoryError::Other)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: UserId,
    users: BTreeMap<UserId, UserRecord>,
}

impl MemoryState {
    /// Uniqueness check against every user except `skip`
    fn check_unique(&self, username: &str, email: &str, skip: Option<UserId>) -> RepositoryResult<()> {
        let others = self.users.values().filter(|u| Some(u.id) != skip);
        for other in others {
            if other.username == username {
                return Err(RepositoryError::UsernameTaken);
            }
            if other.email_address == email {
                return Err(RepositoryError::EmailTaken);
            }
        }
        Ok(())
    }
}

/// In-memory repository; ids start at 1 and are never reused
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    state: Mutex<MemoryState>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> RepositoryResult<UserRecord> {
        let mut state = self.state.lock();
        state.check_unique(&user.username, &user.email_address, None)?;

        state.last_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: state.last_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
            pass_hash: user.pass_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
        Ok(self.state.lock().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserRecord>> {
        let state = self.state.lock();
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn update(&self, user: &UserRecord) -> RepositoryResult<UserRecord> {
        let mut state = self.state.lock();
        state.check_unique(&user.username, &user.email_address, Some(user.id))?;

        let existing = state
            .users
            .get_mut(&user.id)
            .ok_or(RepositoryError::NotFound(user.id))?;
        existing.username = user.username.clone();
        existing.first_name = user.first_name.clone();
        existing.last_name = user.last_name.clone();
        existing.email_address = user.email_address.clone();
        existing.pass_hash = user.pass_hash.clone();
        existing.updated_at = Utc::now();

        Ok(existing.clone())
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<bool> {
        Ok(self.state.lock().users.remove(&id).is_some())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
