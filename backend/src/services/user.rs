//! User service for account management
//!
//! Every mutation of an existing account first resolves the account, then
//! checks the presented auth key against it, and only then touches state.
//!
//! # Performance
//!
//! Password hashing runs on the blocking thread pool so key derivation does
//! not stall the async runtime.

use crate::auth::{AuthKey, AuthService, Digest, UserId};
use crate::error::ApiError;
use crate::repositories::{NewUser, UserRecord, UserRepository};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jingle_shared::validation::{validate_email_address, validate_name, validate_username};
use jingle_shared::{
    AuthError, DeleteForm, DeleteResponse, EditForm, LoginForm, LoginResponse, SignupForm,
    UserQuery, UserResponse,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

const INCORRECT_CREDENTIALS: &str = "Incorrect username or password";

/// User service for account operations
pub struct UserService;

impl UserService {
    /// Create an account
    pub async fn signup(
        users: &dyn UserRepository,
        auth: &AuthService,
        form: SignupForm,
    ) -> Result<UserResponse, ApiError> {
        let username = required(form.username, "username")?;
        let first_name = required(form.first_name, "firstname")?;
        let last_name = required(form.last_name, "lastname")?;
        let email_address = required(form.email_address, "email")?;
        let password = required(form.password, "password")?;

        validate_username(&username).map_err(ApiError::Validation)?;
        validate_name("First name", &first_name).map_err(ApiError::Validation)?;
        validate_name("Last name", &last_name).map_err(ApiError::Validation)?;
        validate_email_address(&email_address).map_err(ApiError::Validation)?;

        let digest = hash_password(auth, password).await??;

        let user = users
            .create(NewUser {
                username,
                first_name,
                last_name,
                email_address,
                pass_hash: digest.as_bytes().to_vec(),
            })
            .await?;

        info!(user_id = user.id, "Account created");
        Ok(to_response(user))
    }

    /// Exchange a username and password for an auth key
    ///
    /// Unknown users, malformed passwords and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(
        users: &dyn UserRepository,
        auth: &AuthService,
        form: LoginForm,
    ) -> Result<LoginResponse, ApiError> {
        let username = required(form.username, "username")?;
        let password = required(form.password, "password")?;

        let user = users
            .find_by_username(&username)
            .await?
            .ok_or_else(incorrect_credentials)?;

        let digest = hash_password(auth, password)
            .await?
            .map_err(|_| incorrect_credentials())?;

        if user.pass_hash.as_slice() != digest.as_bytes() {
            debug!(user_id = user.id, "Login rejected: password mismatch");
            return Err(incorrect_credentials());
        }

        let auth_key = auth.new_auth_key(user.id);

        // A delete that finished while the password was hashing has already
        // revoked this account's keys, so the one just issued would outlive it
        match users.find_by_id(user.id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                auth.revoke_auth_key(&auth_key);
                debug!(user_id = user.id, "Login rejected: account deleted during login");
                return Err(incorrect_credentials());
            }
            Err(e) => {
                auth.revoke_auth_key(&auth_key);
                return Err(e.into());
            }
        }

        info!(user_id = user.id, "Login succeeded");

        Ok(LoginResponse {
            id: user.id,
            auth_key,
        })
    }

    /// Update the provided fields of an account
    pub async fn edit(
        users: &dyn UserRepository,
        auth: &AuthService,
        auth_key: &AuthKey,
        form: EditForm,
    ) -> Result<UserResponse, ApiError> {
        let user_id = parse_user_id(form.user_id)?;
        let mut user = load_user(users, user_id).await?;

        auth.is_valid_auth_key(auth_key.as_str(), user_id)?;

        if let Some(username) = form.username {
            validate_username(&username).map_err(ApiError::Validation)?;
            user.username = username;
        }
        if let Some(first_name) = form.first_name {
            validate_name("First name", &first_name).map_err(ApiError::Validation)?;
            user.first_name = first_name;
        }
        if let Some(last_name) = form.last_name {
            validate_name("Last name", &last_name).map_err(ApiError::Validation)?;
            user.last_name = last_name;
        }
        if let Some(email_address) = form.email_address {
            validate_email_address(&email_address).map_err(ApiError::Validation)?;
            user.email_address = email_address;
        }
        if let Some(password) = form.password {
            user.pass_hash = hash_password(auth, password).await??.as_bytes().to_vec();
        }

        let updated = users.update(&user).await?;
        info!(user_id, "Account updated");

        Ok(to_response(updated))
    }

    /// Delete an account and every auth key bound to it
    pub async fn delete(
        users: &dyn UserRepository,
        auth: &AuthService,
        auth_key: &AuthKey,
        form: DeleteForm,
    ) -> Result<DeleteResponse, ApiError> {
        let user_id = parse_user_id(form.user_id)?;
        load_user(users, user_id).await?;

        auth.is_valid_auth_key(auth_key.as_str(), user_id)?;

        if !users.delete(user_id).await? {
            // Deleted concurrently by another request
            return Err(user_not_found(user_id));
        }
        let revoked = auth.revoke_auth_keys(user_id);
        info!(user_id, revoked, "Account deleted");

        Ok(DeleteResponse {
            id: user_id,
            success: true,
        })
    }

    /// Look up an account by id (preferred) or username
    pub async fn get(users: &dyn UserRepository, query: UserQuery) -> Result<UserResponse, ApiError> {
        let user = match (query.user_id, query.username) {
            (Some(raw_id), _) => {
                let user_id = parse_user_id(Some(raw_id))?;
                load_user(users, user_id).await?
            }
            (None, Some(username)) => users
                .find_by_username(&username)
                .await?
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("User with username ({}) doesn't exist", username))
                })?,
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "Either a userid or username must be provided".to_string(),
                ))
            }
        };

        Ok(to_response(user))
    }
}

/// Hash on the blocking pool; the outer error is a task failure
async fn hash_password(
    auth: &AuthService,
    password: SecretString,
) -> Result<Result<Digest, AuthError>, ApiError> {
    let auth = auth.clone();
    tokio::task::spawn_blocking(move || auth.get_password_hash(password.expose_secret()))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Task join error: {}", e)))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("Required parameter '{}' is not present", name)))
}

fn parse_user_id(raw: Option<String>) -> Result<UserId, ApiError> {
    required(raw, "userid")?
        .trim()
        .parse::<UserId>()
        .map_err(|_| ApiError::BadRequest("Userid must be a numeric value".to_string()))
}

async fn load_user(users: &dyn UserRepository, user_id: UserId) -> Result<UserRecord, ApiError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| user_not_found(user_id))
}

fn user_not_found(user_id: UserId) -> ApiError {
    ApiError::BadRequest(format!("User with userid ({}) doesn't exist", user_id))
}

fn incorrect_credentials() -> ApiError {
    ApiError::Unauthorized(INCORRECT_CREDENTIALS.to_string())
}

fn to_response(user: UserRecord) -> UserResponse {
    UserResponse {
        id: user.id,
        pass_hash: STANDARD.encode(&user.pass_hash),
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email_address: user.email_address,
    }
}
