// handlers/admin/export.rs - GET /api/admin/export handler

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ApiError;
use crate::export::{self, ExportKind};
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{day_window, instant_window, non_empty};
use crate::handlers::populate::{attendance_views, family_views, student_views, test_score_views, woman_views};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub center: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/**
 * GET /api/admin/export?type=families|students|women|attendance|testscores
 *
 * Families, students and women are active records windowed on creation
 * time. Attendance and test scores are windowed on their own `date`. Rows
 * come in the same order as the matching list endpoint.
 *
 * Answers `text/csv` as an attachment; an empty result is the body
 * `No data available`.
 */
pub async fn export_data(State(state): State<AppState>, Query(query): Query<ExportQuery>) -> Result<Response, ApiError> {
    let kind: ExportKind = non_empty(&query.kind)
        .ok_or_else(|| ApiError::bad_request("Export type is required (families, students, women, attendance, testscores)"))?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid export type"))?;

    let scope = Filter::new().eq_opt("center", non_empty(&query.center));
    let store = state.store.as_ref();

    let body = match kind {
        ExportKind::Families | ExportKind::Students | ExportKind::Women => {
            let (from, to) = instant_window(&query.start_date, &query.end_date)?;
            let filter = scope
                .eq("is_active", true)
                .range("created_at", from, to)
                .order_by("created_at", SortDirection::Desc);
            match kind {
                ExportKind::Families => export::families(&family_views(store, store.families().find(&filter).await?).await?),
                ExportKind::Students => export::students(&student_views(store, store.students().find(&filter).await?).await?),
                _ => export::women(&woman_views(store, store.women().find(&filter).await?).await?),
            }
        }
        ExportKind::Attendance => {
            let (from, to) = day_window(&query.start_date, &query.end_date)?;
            let filter = scope
                .range("date", from, to)
                .order_by("date", SortDirection::Desc)
                .order_by("created_at", SortDirection::Desc);
            export::attendance(&attendance_views(store, store.attendance().find(&filter).await?).await?)
        }
        ExportKind::TestScores => {
            let (from, to) = instant_window(&query.start_date, &query.end_date)?;
            let filter = scope
                .range("date", from, to)
                .order_by("date", SortDirection::Desc)
                .order_by("created_at", SortDirection::Desc);
            export::test_scores(&test_score_views(store, store.test_scores().find(&filter).await?).await?)
        }
    };

    tracing::info!(kind = ?kind, bytes = body.len(), "export generated");

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", kind.filename()))
        .map_err(|_| ApiError::internal_server_error("Failed to build export headers"))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
