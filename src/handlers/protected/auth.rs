// handlers/protected/auth.rs - GET /api/auth/me handler

use axum::Extension;
use serde_json::{json, Value};

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/me - The account behind the bearer token
///
/// The user was reloaded by the auth middleware, so this reflects the
/// stored record rather than the token claims.
pub async fn me(Extension(user): Extension<User>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "user": user })))
}
