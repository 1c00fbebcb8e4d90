mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{spawn_app, spawn_app_with, test_config, PASSWORD};

#[tokio::test]
async fn test_health_reports_connected_store() -> Result<()> {
    let app = spawn_app().await?;
    let (status, body) = app.request(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["database"], "connected");
    assert!(body["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_login_returns_token_and_user() -> Result<()> {
    let app = spawn_app().await?;
    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "Priya@KalamFoundation.org", "password": PASSWORD })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["user"]["role"], "tutor");
    assert_eq!(body["data"]["user"]["center"], "Delhi Center");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    // The issued token opens protected routes
    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();
    let (status, me) = app.get("/auth/me", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["user"]["email"], "priya@kalamfoundation.org");
    Ok(())
}

#[tokio::test]
async fn test_login_failures_share_one_message() -> Result<()> {
    let app = spawn_app().await?;

    let (status, wrong_password) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "priya@kalamfoundation.org", "password": "not-the-password" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@kalamfoundation.org", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["message"], unknown["message"]);
    assert_eq!(unknown["success"], false);
    Ok(())
}

#[tokio::test]
async fn test_login_validates_input() -> Result<()> {
    let app = spawn_app().await?;
    let (status, body) = app
        .request(Method::POST, "/auth/login", None, Some(json!({ "email": "not-an-email", "password": "abc" })))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .map(|errs| errs.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    Ok(())
}

#[tokio::test]
async fn test_deactivated_user_cannot_log_in_or_use_token() -> Result<()> {
    let app = spawn_app().await?;
    let path = format!("/users/{}", app.mumbai_tutor.id);
    let (status, _) = app.delete(&path, &app.admin_token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "rajesh@kalamfoundation.org", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/families", &app.mumbai_token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.request(Method::GET, "/families", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app.get("/families", "not.a.token").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_admin_routes_reject_tutors() -> Result<()> {
    let app = spawn_app().await?;

    for path in ["/users", "/admin/stats", "/admin/export?type=families"] {
        let (status, _) = app.get(path, &app.delhi_token).await?;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
    }
    let (status, _) = app
        .post(
            "/auth/register",
            &app.delhi_token,
            json!({ "name": "Sneaky", "email": "sneaky@kalamfoundation.org", "password": "secret123", "role": "admin" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_register_creates_tutor_that_can_log_in() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app
        .post(
            "/auth/register",
            &app.admin_token,
            json!({ "name": "Anita Patel", "email": "anita@kalamfoundation.org", "password": "tutor123", "role": "tutor" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "tutors need a center: {body}");

    let (status, body) = app
        .post(
            "/auth/register",
            &app.admin_token,
            json!({
                "name": "Anita Patel",
                "email": "anita@kalamfoundation.org",
                "password": "tutor123",
                "role": "tutor",
                "center": "Bangalore Center",
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "anita@kalamfoundation.org", "password": "tutor123" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["center"], "Bangalore Center");
    Ok(())
}

#[tokio::test]
async fn test_login_limit_counts_only_failures() -> Result<()> {
    let mut config = test_config();
    config.api.enable_rate_limiting = true;
    config.api.login_rate_limit_requests = 2;
    let app = spawn_app_with(config).await?;

    let good = json!({ "email": "priya@kalamfoundation.org", "password": PASSWORD });
    let bad = json!({ "email": "priya@kalamfoundation.org", "password": "wrong-password" });

    for _ in 0..3 {
        let (status, _) = app.request(Method::POST, "/auth/login", None, Some(good.clone())).await?;
        assert_eq!(status, StatusCode::OK);
    }
    for _ in 0..2 {
        let (status, _) = app.request(Method::POST, "/auth/login", None, Some(bad.clone())).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = app.request(Method::POST, "/auth/login", None, Some(good)).await?;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    Ok(())
}
