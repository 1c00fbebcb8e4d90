mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{spawn_app, strings, TestApp, DELHI, MUMBAI};

async fn login(app: &TestApp, email: &str, password: &str) -> Result<StatusCode> {
    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await?;
    Ok(status)
}

#[tokio::test]
async fn test_list_filters_and_pages() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.get("/users", &app.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 3);
    // Newest first
    assert_eq!(
        strings(&body["data"]["users"], "name"),
        vec!["Rajesh Kumar", "Priya Sharma", "Admin User"]
    );
    assert!(body["data"]["users"][0].get("passwordHash").is_none());

    let (_, body) = app.get("/users?role=tutor", &app.admin_token).await?;
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let (_, body) = app.get("/users?center=Delhi%20Center", &app.admin_token).await?;
    assert_eq!(strings(&body["data"]["users"], "email"), vec!["priya@kalamfoundation.org"]);

    let (_, body) = app.get("/users?search=RAJESH", &app.admin_token).await?;
    assert_eq!(strings(&body["data"]["users"], "center"), vec![MUMBAI]);

    let (_, body) = app.get("/users?limit=2&page=2", &app.admin_token).await?;
    assert_eq!(body["data"]["pagination"]["pages"], 2);
    assert_eq!(body["data"]["pagination"]["current"], 2);
    assert_eq!(strings(&body["data"]["users"], "name"), vec!["Admin User"]);

    let (status, _) = app.get("/users?role=manager", &app.admin_token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_get_user() -> Result<()> {
    let app = spawn_app().await?;
    let (status, body) = app.get(&format!("/users/{}", app.delhi_tutor.id), &app.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["center"], DELHI);
    assert_eq!(body["data"]["user"]["isActive"], true);

    let (status, body) = app.get("/users/not-a-uuid", &app.admin_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    Ok(())
}

#[tokio::test]
async fn test_create_rules() -> Result<()> {
    let app = spawn_app().await?;
    let tutor = json!({
        "name": "Anita Desai",
        "email": "Anita@KalamFoundation.org",
        "password": "tutor123",
        "role": "tutor",
        "center": "Bangalore Center"
    });

    let (status, body) = app.post("/users", &app.admin_token, tutor.clone()).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["user"]["email"], "anita@kalamfoundation.org");
    assert_eq!(login(&app, "anita@kalamfoundation.org", "tutor123").await?, StatusCode::OK);

    let (status, body) = app.post("/users", &app.admin_token, tutor).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(strings(&body["errors"], "field"), vec!["email"]);

    let (status, body) = app
        .post(
            "/users",
            &app.admin_token,
            json!({ "name": "No Center", "email": "nc@kalamfoundation.org", "password": "tutor123", "role": "tutor" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(strings(&body["errors"], "field"), vec!["center"]);

    // Admin accounts drop any center they are given
    let (status, body) = app
        .post(
            "/users",
            &app.admin_token,
            json!({ "name": "Second Admin", "email": "ops@kalamfoundation.org", "password": "admin123", "role": "admin", "center": DELHI }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["user"]["center"].is_null());

    let (status, _) = app
        .post(
            "/users",
            &app.delhi_token,
            json!({ "name": "Sneaky", "email": "sneaky@kalamfoundation.org", "password": "tutor123", "role": "admin" }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_update_merges_and_rehashes() -> Result<()> {
    let app = spawn_app().await?;
    let path = format!("/users/{}", app.mumbai_tutor.id);

    let (status, body) = app
        .put(&path, &app.admin_token, json!({ "name": "Rajesh K", "password": "changed456" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["data"]["user"]["name"], "Rajesh K");
    assert_eq!(body["data"]["user"]["center"], MUMBAI);

    assert_eq!(login(&app, "rajesh@kalamfoundation.org", "changed456").await?, StatusCode::OK);
    assert_eq!(
        login(&app, "rajesh@kalamfoundation.org", common::PASSWORD).await?,
        StatusCode::UNAUTHORIZED
    );

    let (_, body) = app.put(&path, &app.admin_token, json!({ "role": "admin" })).await?;
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"]["center"].is_null());

    // Back to tutor without a center is rejected
    let (status, body) = app.put(&path, &app.admin_token, json!({ "role": "tutor" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(strings(&body["errors"], "field"), vec!["center"]);

    let (status, body) = app
        .put(&path, &app.admin_token, json!({ "password": "abc" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(strings(&body["errors"], "field"), vec!["password"]);
    Ok(())
}

#[tokio::test]
async fn test_admins_cannot_deactivate_themselves() -> Result<()> {
    let app = spawn_app().await?;
    let own = format!("/users/{}", app.admin.id);

    let (status, body) = app.put(&own, &app.admin_token, json!({ "isActive": false })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot deactivate your own account");

    let (status, body) = app.delete(&own, &app.admin_token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot deactivate your own account");

    // Renaming yourself is fine
    let (status, _) = app.put(&own, &app.admin_token, json!({ "name": "Head Admin" })).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_delete_deactivates_but_keeps_the_account() -> Result<()> {
    let app = spawn_app().await?;
    let path = format!("/users/{}", app.delhi_tutor.id);

    let (status, body) = app.delete(&path, &app.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deactivated successfully");

    let (status, body) = app.get(&path, &app.admin_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["isActive"], false);

    let (_, body) = app.get("/users?isActive=false", &app.admin_token).await?;
    assert_eq!(strings(&body["data"]["users"], "name"), vec!["Priya Sharma"]);

    // Reactivation restores login
    app.put(&path, &app.admin_token, json!({ "isActive": true })).await?;
    assert_eq!(login(&app, "priya@kalamfoundation.org", common::PASSWORD).await?, StatusCode::OK);
    Ok(())
}
