// handlers/public/health.rs - GET /api/health liveness probe

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/health - Report process and store liveness
///
/// Answers 503 with `database: "disconnected"` when the store ping fails.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Outreach API is running!",
                "timestamp": timestamp,
                "database": "connected",
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Outreach API is running but the database is unreachable",
                    "timestamp": timestamp,
                    "database": "disconnected",
                })),
            )
        }
    }
}
