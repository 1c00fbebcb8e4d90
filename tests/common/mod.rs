#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use outreach_api::auth::{hash_password, issue_token};
use outreach_api::config::AppConfig;
use outreach_api::database::models::{Role, User};
use outreach_api::database::{MemoryStore, Store};
use outreach_api::{app, AppState};

pub const PASSWORD: &str = "secret123";
pub const DELHI: &str = "Delhi Center";
pub const MUMBAI: &str = "Mumbai Center";

// Hashing is slow in debug builds; every seeded account shares one hash
static PASSWORD_HASH: OnceLock<String> = OnceLock::new();

fn password_hash() -> String {
    PASSWORD_HASH
        .get_or_init(|| hash_password(PASSWORD).expect("hash test password"))
        .clone()
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
    pub admin: User,
    pub delhi_tutor: User,
    pub mumbai_tutor: User,
    pub admin_token: String,
    pub delhi_token: String,
    pub mumbai_token: String,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_rate_limiting = false;
    config
}

/// Serve the router over a fresh in-memory store with one admin and two tutors
pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: AppConfig) -> Result<TestApp> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

    let admin = seed_user(store.as_ref(), "Admin User", "admin@kalamfoundation.org", Role::Admin, None).await?;
    let delhi_tutor =
        seed_user(store.as_ref(), "Priya Sharma", "priya@kalamfoundation.org", Role::Tutor, Some(DELHI)).await?;
    let mumbai_tutor =
        seed_user(store.as_ref(), "Rajesh Kumar", "rajesh@kalamfoundation.org", Role::Tutor, Some(MUMBAI)).await?;

    let admin_token = issue_token(&admin, &config.security)?;
    let delhi_token = issue_token(&delhi_tutor, &config.security)?;
    let mumbai_token = issue_token(&mumbai_tutor, &config.security)?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let router = app(AppState::new(store.clone(), config.clone()));
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .ok();
    });

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{port}/api"),
        client: reqwest::Client::new(),
        store,
        config,
        admin,
        delhi_tutor,
        mumbai_tutor,
        admin_token,
        delhi_token,
        mumbai_token,
    })
}

pub async fn seed_user(store: &dyn Store, name: &str, email: &str, role: Role, center: Option<&str>) -> Result<User> {
    let user = User::new(name.to_string(), email, password_hash(), role, center.map(str::to_string));
    store.users().insert(&user).await?;
    Ok(user)
}

impl TestApp {
    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, value))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, path, Some(token), None).await
    }

    /// Raw body and headers, for CSV downloads
    pub async fn get_raw(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Create a family as the admin and return its id
    pub async fn family(&self, name: &str, center: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/families",
                &self.admin_token,
                json!({
                    "name": name,
                    "contact": "9876543210",
                    "center": center,
                    "address": "123 Main Street, New Delhi",
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "family create failed: {body}");
        id_of(&body["data"])
    }

    pub async fn student(&self, family_id: &str, name: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/students",
                &self.admin_token,
                json!({
                    "name": name,
                    "familyId": family_id,
                    "educationLevel": "Class 5",
                    "age": 10,
                    "gender": "Male",
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "student create failed: {body}");
        id_of(&body["data"])
    }

    pub async fn woman(&self, family_id: &str, name: &str, job_status: &str, training_status: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/women",
                &self.admin_token,
                json!({
                    "name": name,
                    "familyId": family_id,
                    "age": 30,
                    "skill": "Tailoring",
                    "jobStatus": job_status,
                    "trainingStatus": training_status,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "woman create failed: {body}");
        id_of(&body["data"])
    }
}

pub fn id_of(value: &Value) -> Result<String> {
    value["id"]
        .as_str()
        .map(str::to_string)
        .context("response has no id")
}

/// Every element's `field` as a string
pub fn strings(values: &Value, field: &str) -> Vec<String> {
    values
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v[field].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
