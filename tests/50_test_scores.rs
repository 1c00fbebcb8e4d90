mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{spawn_app, strings, DELHI, MUMBAI};

#[tokio::test]
async fn test_add_derives_percentage_and_grade() -> Result<()> {
    let app = spawn_app().await?;
    let family = app.family("Sharma Family", DELHI).await?;
    let student = app.student(&family, "Arjun Sharma").await?;

    let (status, body) = app
        .post(
            "/testscores",
            &app.delhi_token,
            json!({ "studentId": student, "subject": "Science", "score": 42, "maxScore": 50, "testType": "Unit Test", "date": "2024-02-14" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Test score added successfully");
    let score = &body["data"];
    assert_eq!(score["percentage"], 84);
    assert_eq!(score["grade"], "A");
    assert_eq!(score["center"], DELHI);
    assert_eq!(score["student"]["name"], "Arjun Sharma");
    assert_eq!(score["marker"]["name"], "Priya Sharma");

    let (status, body) = app
        .post(
            "/testscores",
            &app.delhi_token,
            json!({ "studentId": student, "subject": "Science", "score": 140, "testType": "Quiz" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(strings(&body["errors"], "field"), vec!["score"]);
    Ok(())
}

#[tokio::test]
async fn test_scores_are_center_scoped() -> Result<()> {
    let app = spawn_app().await?;
    let mumbai = app.family("Patel Family", MUMBAI).await?;
    let sneha = app.student(&mumbai, "Sneha Patel").await?;
    let score = json!({ "studentId": sneha, "subject": "English", "score": 75, "testType": "Quiz" });

    let (status, _) = app.post("/testscores", &app.delhi_token, score.clone()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post("/testscores", &app.mumbai_token, score).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    let path = format!("/testscores/{id}");

    let (status, _) = app.get(&path, &app.delhi_token).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.put(&path, &app.delhi_token, json!({ "score": 99 })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = app.get("/testscores?center=Mumbai%20Center", &app.delhi_token).await?;
    assert_eq!(list["data"]["pagination"]["total"], 0);

    let (status, body) = app.put(&path, &app.mumbai_token, json!({ "score": 81 })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["score"], 81.0);
    assert_eq!(body["data"]["subject"], "English");

    let (status, _) = app.delete(&path, &app.mumbai_token).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&path, &app.admin_token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_bulk_shares_test_details() -> Result<()> {
    let app = spawn_app().await?;
    let delhi = app.family("Sharma Family", DELHI).await?;
    let mumbai = app.family("Patel Family", MUMBAI).await?;
    let arjun = app.student(&delhi, "Arjun Sharma").await?;
    let priya = app.student(&delhi, "Priya Sharma").await?;
    let sneha = app.student(&mumbai, "Sneha Patel").await?;

    let (status, body) = app
        .post(
            "/testscores/bulk",
            &app.delhi_token,
            json!({
                "subject": "Mathematics",
                "testType": "Mid Term",
                "maxScore": 100,
                "date": "2024-03-01",
                "testScores": [
                    { "studentId": arjun, "score": 88 },
                    { "studentId": sneha, "score": 70 },
                    { "studentId": priya, "score": 120 },
                    { "studentId": priya, "score": 64, "remarks": "Improving" },
                    { "score": 50 },
                ],
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["summary"], json!({ "total": 5, "successful": 2, "failed": 3 }));
    assert_eq!(strings(&data["results"], "studentId"), vec![arjun.clone(), priya.clone()]);
    assert_eq!(data["errors"][0]["error"], "Access denied for this student");
    assert_eq!(data["errors"][1]["error"], "Score must be between 0 and 100");
    assert_eq!(data["errors"][2]["error"], "Student ID and score are required");

    let (_, list) = app.get("/testscores?subject=Mathematics", &app.admin_token).await?;
    let scores = list["data"]["testScores"].as_array().cloned().unwrap_or_default();
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|s| s["testType"] == "Mid Term" && s["maxScore"] == 100.0));
    Ok(())
}

#[tokio::test]
async fn test_bulk_malformed_score_fails_alone() -> Result<()> {
    let app = spawn_app().await?;
    let family = app.family("Sharma Family", DELHI).await?;
    let arjun = app.student(&family, "Arjun Sharma").await?;
    let priya = app.student(&family, "Priya Sharma").await?;

    let (status, body) = app
        .post(
            "/testscores/bulk",
            &app.delhi_token,
            json!({
                "subject": "English",
                "testType": "Quiz",
                "testScores": [
                    { "studentId": arjun, "score": 91 },
                    { "studentId": priya, "score": "85" },
                ],
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["summary"], json!({ "total": 2, "successful": 1, "failed": 1 }));
    assert_eq!(strings(&data["errors"], "studentId"), vec![priya]);
    assert!(data["errors"][0]["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid test score"));

    let (status, body) = app
        .post(
            "/testscores/bulk",
            &app.delhi_token,
            json!({ "subject": "English", "testType": "Quiz", "testScores": [] }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Test scores array is required");
    Ok(())
}

#[tokio::test]
async fn test_analytics_groups_by_subject_and_type() -> Result<()> {
    let app = spawn_app().await?;
    let delhi = app.family("Sharma Family", DELHI).await?;
    let mumbai = app.family("Patel Family", MUMBAI).await?;
    let arjun = app.student(&delhi, "Arjun Sharma").await?;
    let rohit = app.student(&delhi, "Rohit Sharma").await?;
    let sneha = app.student(&mumbai, "Sneha Patel").await?;
    app.put(&format!("/students/{rohit}"), &app.admin_token, json!({ "educationLevel": "Class 7" }))
        .await?;

    let entries = [
        (&arjun, "Mathematics", "Quiz", 60, "2024-01-05"),
        (&rohit, "Mathematics", "Quiz", 80, "2024-01-06"),
        (&arjun, "English", "Quiz", 90, "2024-01-07"),
        (&sneha, "Mathematics", "Quiz", 10, "2024-01-08"),
        (&arjun, "Mathematics", "Quiz", 100, "2024-03-01"),
    ];
    for (student, subject, test_type, score, date) in entries {
        let (status, body) = app
            .post(
                "/testscores",
                &app.admin_token,
                json!({ "studentId": student, "subject": subject, "score": score, "testType": test_type, "date": date }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = app
        .get("/testscores/analytics?startDate=2024-01-01&endDate=2024-01-31", &app.delhi_token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let analytics = &body["data"]["analytics"];
    assert_eq!(analytics.as_array().map(Vec::len), Some(2));
    let maths = &analytics[0];
    assert_eq!(maths["subject"], "Mathematics");
    assert_eq!(maths["totalTests"], 2);
    assert_eq!(maths["averageScore"], 70.0);
    assert_eq!(maths["minScore"], 60.0);
    assert_eq!(maths["maxScore"], 80.0);

    let (_, body) = app
        .get("/testscores/analytics?educationLevel=Class%207", &app.delhi_token)
        .await?;
    assert_eq!(body["data"]["analytics"][0]["totalTests"], 1);
    assert_eq!(body["data"]["analytics"][0]["averageScore"], 80.0);

    let (_, body) = app
        .get("/testscores/analytics?educationLevel=Class%2012", &app.admin_token)
        .await?;
    assert_eq!(body["data"]["analytics"], json!([]));
    Ok(())
}
