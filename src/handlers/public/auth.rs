// handlers/public/auth.rs - POST /api/auth/login handler

use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::{issue_token, verify_password};
use crate::database::models::user::normalize_email;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/**
 * POST /api/auth/login - Exchange email and password for a bearer token
 *
 * Expected Input:
 * ```json
 * { "email": "priya@kalamfoundation.org", "password": "tutor123" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "message": "Login successful",
 *   "data": { "token": "eyJhbGciOiJIUzI1NiI...", "user": { "id": "...", "role": "tutor", "center": "Delhi Center" } }
 * }
 * ```
 *
 * Unknown email, wrong password and deactivated accounts all answer with the
 * same 401 so callers cannot probe which accounts exist.
 */
pub async fn login(State(state): State<AppState>, ValidJson(body): ValidJson<LoginRequest>) -> ApiResult<Value> {
    let email = normalize_email(&body.email);
    let user = state
        .store
        .users()
        .find_one(&Filter::new().eq("email", email.as_str()))
        .await?;

    let Some(mut user) = user.filter(|u| u.is_active) else {
        tracing::debug!(%email, "login rejected: unknown or inactive account");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::debug!(user = %user.id, "login rejected: password mismatch");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    user.last_login = Some(Utc::now());
    state.store.users().update(&user).await?;

    let token = issue_token(&user, &state.config.security)?;
    tracing::info!(user = %user.id, role = %user.role, "user logged in");

    Ok(ApiResponse::success(json!({ "token": token, "user": user })).with_message("Login successful"))
}
