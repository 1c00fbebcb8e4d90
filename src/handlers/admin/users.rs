// handlers/admin/users.rs - /api/users handlers and POST /api/auth/register
//
// Accounts are never removed; DELETE deactivates.

use axum::extract::{Path, Query, State};
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::hash_password;
use crate::database::models::{Role, User};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{non_empty, page_params, parse_bool, parse_label, trimmed, trimmed_opt, Pagination};
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::policy::CallerContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub role: Option<String>,
    pub center: Option<String>,
    pub search: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub role: Role,
    pub center: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    pub role: Option<Role>,
    pub center: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
}

fn require_center(role: Role, center: &Option<String>) -> Result<(), ApiError> {
    if role == Role::Tutor && non_empty(center).is_none() {
        return Err(ApiError::field("center", "Center is required for tutor role"));
    }
    Ok(())
}

async fn load_user(state: &AppState, raw_id: &str) -> Result<User, ApiError> {
    let id = Uuid::parse_str(raw_id).map_err(|_| ApiError::not_found("User not found"))?;
    state
        .store
        .users()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// GET /api/users - Paginated accounts, newest first
pub async fn list_users(State(state): State<AppState>, Query(query): Query<UserListQuery>) -> ApiResult<Value> {
    let (page, limit) = page_params(&query.page, &query.limit, &state.config.api)?;
    let role = non_empty(&query.role).map(|r| parse_label::<Role>(r, "role")).transpose()?;
    let is_active = non_empty(&query.is_active).map(|v| parse_bool(v, "isActive")).transpose()?;

    let filter = Filter::new()
        .eq_opt("role", role)
        .eq_opt("center", non_empty(&query.center))
        .eq_opt("is_active", is_active)
        .search_opt(&["name", "email"], non_empty(&query.search))
        .order_by("created_at", SortDirection::Desc);

    let paged = filter.clone().page(page, limit);
    let all = filter.unpaged();
    let (users, total) = futures::try_join!(
        state.store.users().find(&paged),
        state.store.users().count(&all),
    )?;

    Ok(ApiResponse::success(json!({
        "users": users,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// GET /api/users/:id
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let user = load_user(&state, &id).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/**
 * POST /api/users and POST /api/auth/register - Create an account
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Priya Sharma",
 *   "email": "priya@kalamfoundation.org",
 *   "password": "tutor123",
 *   "role": "tutor",
 *   "center": "Delhi Center"     // required for tutors, dropped for admins
 * }
 * ```
 *
 * A duplicate email is reported against the `email` field.
 */
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<CreateUserRequest>,
) -> ApiResult<Value> {
    require_center(body.role, &body.center)?;

    let hash = hash_password(&body.password)?;
    let center = non_empty(&body.center).map(str::to_string);
    let user = User::new(body.name.trim().to_string(), &body.email, hash, body.role, center);
    state.store.users().insert(&user).await?;
    tracing::info!(user = %user.id, role = %user.role, by = %caller.id, "user created");

    Ok(ApiResponse::created(json!({ "user": user })).with_message("User created successfully"))
}

/// PUT /api/users/:id - Merge supplied fields; a new password is re-hashed
pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateUserRequest>,
) -> ApiResult<Value> {
    let mut user = load_user(&state, &id).await?;

    if user.id == caller.id && body.is_active == Some(false) {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    if let Some(name) = body.name {
        user.name = name.trim().to_string();
    }
    if let Some(role) = body.role {
        user.role = role;
    }
    if body.center.is_some() {
        user.center = non_empty(&body.center).map(str::to_string);
    }
    require_center(user.role, &user.center)?;
    if user.role == Role::Admin {
        user.center = None;
    }
    if let Some(is_active) = body.is_active {
        user.is_active = is_active;
    }
    if let Some(password) = body.password {
        user.password_hash = hash_password(&password)?;
    }
    user.updated_at = Utc::now();

    state.store.users().update(&user).await?;
    tracing::info!(user = %user.id, by = %caller.id, "user updated");

    Ok(ApiResponse::success(json!({ "user": user })).with_message("User updated successfully"))
}

/// DELETE /api/users/:id - Deactivate an account
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let mut user = load_user(&state, &id).await?;
    if user.id == caller.id {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    user.is_active = false;
    user.updated_at = Utc::now();
    state.store.users().update(&user).await?;
    tracing::info!(user = %user.id, by = %caller.id, "user deactivated");

    Ok(ApiResponse::message("User deactivated successfully"))
}
