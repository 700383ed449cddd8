//! Account routes
//!
//! Mutating endpoints take `application/x-www-form-urlencoded` bodies;
//! `edit` and `delete` also require the `Auth-Key` header.

use crate::auth::AuthKey;
use crate::error::ApiResult;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Form, Json, Router,
};
use jingle_shared::types::{
    DeleteForm, DeleteResponse, EditForm, LoginForm, LoginResponse, SignupForm, UserQuery,
    UserResponse,
};

/// Create account routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/edit", put(edit))
        .route("/delete", delete(delete_account))
        .route("/user", get(get_user))
}

/// Register a new account
///
/// POST /signup
async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = UserService::signup(state.users(), state.auth(), form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for an auth key
///
/// POST /login
async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let response = UserService::login(state.users(), state.auth(), form).await?;
    Ok(Json(response))
}

/// Update an account
///
/// PUT /edit
async fn edit(
    State(state): State<AppState>,
    auth_key: AuthKey,
    Form(form): Form<EditForm>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::edit(state.users(), state.auth(), &auth_key, form).await?;
    Ok(Json(user))
}

/// Delete an account
///
/// DELETE /delete
async fn delete_account(
    State(state): State<AppState>,
    auth_key: AuthKey,
    Form(form): Form<DeleteForm>,
) -> ApiResult<Json<DeleteResponse>> {
    let response = UserService::delete(state.users(), state.auth(), &auth_key, form).await?;
    Ok(Json(response))
}

/// GET /user?userid=N or /user?username=NAME
async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<UserResponse>> {
    let user = UserService::get(state.users(), query).await?;
    Ok(Json(user))
}
