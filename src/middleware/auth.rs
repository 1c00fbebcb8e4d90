use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_token, JwtError};
use crate::error::ApiError;
use crate::policy::{AccessError, CallerContext};
use crate::state::AppState;

/// Validates the bearer token, reloads the user and injects the caller.
///
/// Inserts both the [`CallerContext`] and the stored `User` into request
/// extensions.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers()).map_err(ApiError::unauthorized)?;

    let claims = decode_token(&token, &state.config.security).map_err(|e| match e {
        JwtError::Expired => ApiError::unauthorized("Token expired"),
        _ => ApiError::unauthorized("Invalid token"),
    })?;

    // Reject roles outside admin/tutor before touching the store
    CallerContext::from_parts(claims.sub, &claims.role, claims.center.clone()).map_err(|e| match e {
        AccessError::UnknownRole(_) => {
            tracing::warn!(user = %claims.sub, role = %claims.role, "token carries unsupported role");
            ApiError::from(e)
        }
        _ => ApiError::unauthorized("Invalid token"),
    })?;

    let user = match state.store.users().get(claims.sub).await? {
        Some(user) if user.is_active => user,
        _ => return Err(ApiError::unauthorized("User not found or inactive")),
    };

    if user.role.as_str() != claims.role {
        return Err(ApiError::unauthorized("Token no longer matches account role"));
    }

    let caller = CallerContext::from_user(&user).map_err(|_| ApiError::unauthorized("Invalid token"))?;

    request.extensions_mut().insert(caller);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Admin gate for routes layered after [`jwt_auth_middleware`]
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let caller = request
        .extensions()
        .get::<CallerContext>()
        .ok_or_else(|| ApiError::unauthorized("Not authorized"))?;

    caller.require_admin()?;

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "No token, authorization denied".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("No token, authorization denied".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }
}
