//! API request and response types
//!
//! Requests arrive as `application/x-www-form-urlencoded` bodies (or query
//! strings for lookups). Every field is optional at the type level so the
//! account layer can report exactly which required parameter is missing.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Signup form
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub username: Option<String>,
    #[serde(rename = "firstname")]
    pub first_name: Option<String>,
    #[serde(rename = "lastname")]
    pub last_name: Option<String>,
    #[serde(rename = "email")]
    pub email_address: Option<String>,
    pub password: Option<SecretString>,
}

/// Login form
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

/// Edit form; every field except `userid` is optional
#[derive(Debug, Default, Deserialize)]
pub struct EditForm {
    #[serde(rename = "userid")]
    pub user_id: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "firstname")]
    pub first_name: Option<String>,
    #[serde(rename = "lastname")]
    pub last_name: Option<String>,
    #[serde(rename = "email")]
    pub email_address: Option<String>,
    pub password: Option<SecretString>,
}

/// Delete form
#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "userid")]
    pub user_id: Option<String>,
}

/// User lookup query (userid takes preference over username)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "userid")]
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// User account as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    /// Base64-encoded password digest
    pub pass_hash: String,
}

/// Successful login response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: i64,
    pub auth_key: String,
}

/// Account deletion response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: i64,
    pub success: bool,
}

/// API error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
