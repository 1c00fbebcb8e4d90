mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{spawn_app, strings, DELHI, MUMBAI};

#[tokio::test]
async fn test_create_applies_defaults() -> Result<()> {
    let app = spawn_app().await?;
    let family = app.family("Sharma Family", DELHI).await?;

    let (status, body) = app
        .post(
            "/women",
            &app.delhi_token,
            json!({ "name": "Sunita Sharma", "familyId": family, "age": 35, "skill": "Tailoring" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let woman = &body["data"];
    assert_eq!(woman["trainingStatus"], "Not Started");
    assert_eq!(woman["jobStatus"], "Unemployed");
    assert_eq!(woman["monthlyIncome"], 0.0);
    assert_eq!(woman["center"], DELHI);
    assert_eq!(woman["trainingDuration"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn test_center_must_match_family() -> Result<()> {
    let app = spawn_app().await?;
    let family = app.family("Patel Family", MUMBAI).await?;

    let (status, body) = app
        .post(
            "/women",
            &app.admin_token,
            json!({ "name": "Rekha Patel", "familyId": family, "center": DELHI, "age": 28, "skill": "Cooking" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Woman center must match family center");
    assert_eq!(strings(&body["errors"], "field"), vec!["center"]);

    let (_, list) = app.get("/women", &app.admin_token).await?;
    assert_eq!(list["data"]["pagination"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn test_create_validates_age_and_contact() -> Result<()> {
    let app = spawn_app().await?;
    let family = app.family("Sharma Family", DELHI).await?;

    let (status, body) = app
        .post(
            "/women",
            &app.admin_token,
            json!({ "name": "Too Young", "familyId": family, "age": 16, "skill": "Cooking", "contactNumber": "12-34" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = strings(&body["errors"], "field");
    assert!(fields.contains(&"age".to_string()));
    assert!(fields.contains(&"contactNumber".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_stats_are_zero_without_women() -> Result<()> {
    let app = spawn_app().await?;
    let (status, body) = app.get("/women/stats", &app.delhi_token).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalWomen"], 0);
    assert_eq!(body["data"]["employmentRate"], 0);
    assert_eq!(body["data"]["trainingCompletionRate"], 0);
    Ok(())
}

#[tokio::test]
async fn test_stats_rates_are_scoped() -> Result<()> {
    let app = spawn_app().await?;
    let delhi = app.family("Sharma Family", DELHI).await?;
    let mumbai = app.family("Patel Family", MUMBAI).await?;
    app.woman(&delhi, "Sunita Sharma", "Self Employed", "Completed").await?;
    app.woman(&delhi, "Meera Sharma", "Seeking Employment", "In Progress").await?;
    app.woman(&delhi, "Asha Sharma", "Unemployed", "Not Started").await?;
    app.woman(&mumbai, "Rekha Patel", "Employed", "Completed").await?;

    let (_, body) = app.get("/women/stats?center=Mumbai%20Center", &app.delhi_token).await?;
    let stats = &body["data"];
    assert_eq!(stats["totalWomen"], 3);
    assert_eq!(stats["employedWomen"], 1);
    assert_eq!(stats["employmentRate"], 33);
    assert_eq!(stats["trainingCompletionRate"], 33);

    let (_, body) = app.get("/women/stats", &app.admin_token).await?;
    assert_eq!(body["data"]["totalWomen"], 4);
    assert_eq!(body["data"]["employmentRate"], 50);
    Ok(())
}

#[tokio::test]
async fn test_list_filters() -> Result<()> {
    let app = spawn_app().await?;
    let delhi = app.family("Sharma Family", DELHI).await?;
    let mumbai = app.family("Patel Family", MUMBAI).await?;
    app.woman(&delhi, "Sunita Sharma", "Employed", "Completed").await?;
    app.woman(&delhi, "Meera Sharma", "Unemployed", "Started").await?;
    app.woman(&mumbai, "Rekha Patel", "Employed", "Completed").await?;

    let (_, body) = app.get("/women?jobStatus=Employed", &app.delhi_token).await?;
    assert_eq!(strings(&body["data"]["women"], "name"), vec!["Sunita Sharma"]);

    let (_, body) = app.get("/women?trainingStatus=Completed", &app.admin_token).await?;
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let (status, _) = app.get("/women?jobStatus=Retired", &app.admin_token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_training_dates_set_and_clear() -> Result<()> {
    let app = spawn_app().await?;
    let family = app.family("Sharma Family", DELHI).await?;
    let woman = app.woman(&family, "Sunita Sharma", "Unemployed", "Started").await?;
    let path = format!("/women/{woman}");

    let (status, body) = app
        .put(
            &path,
            &app.delhi_token,
            json!({ "trainingStartDate": "2024-01-01", "trainingEndDate": "2024-01-31", "trainingStatus": "Completed" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["trainingDuration"], 30);
    assert_eq!(body["data"]["trainingStatus"], "Completed");

    let (_, body) = app.put(&path, &app.delhi_token, json!({ "trainingEndDate": "" })).await?;
    assert_eq!(body["data"]["trainingEndDate"], Value::Null);
    assert_eq!(body["data"]["trainingDuration"], Value::Null);

    let (status, _) = app.get(&path, &app.mumbai_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
