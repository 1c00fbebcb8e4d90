// handlers/protected/test_scores.rs - /api/testscores handlers

use axum::extract::{Path, Query, State};
use axum::Extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{EducationLevel, Student, Subject, TestScore, TestScoreView, TestType};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{
    bulk_item_student, instant_window, load_scoped, non_empty, page_params, parse_instant, parse_label, parse_uuid_field, Pagination,
};
use crate::handlers::populate::test_score_views;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::policy::CallerContext;
use crate::reports::scores::analytics;
use crate::state::AppState;
use crate::types::{Action, Resource};

const DEFAULT_MAX_SCORE: f64 = 100.0;
const MAX_REMARKS: usize = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScoreListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub student_id: Option<String>,
    pub subject: Option<String>,
    pub center: Option<String>,
    pub test_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub center: Option<String>,
    pub subject: Option<String>,
    pub education_level: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddTestScoreRequest {
    pub student_id: String,
    pub subject: Subject,
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100"))]
    pub score: f64,
    #[validate(range(min = 1.0, message = "Max score must be at least 1"))]
    pub max_score: Option<f64>,
    pub test_type: TestType,
    pub date: Option<String>,
    #[validate(length(max = 300, message = "Remarks cannot exceed 300 characters"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScoreItem {
    pub student_id: Option<String>,
    pub score: Option<f64>,
    pub remarks: Option<String>,
}

/// Subject, test type, max score and date are shared by every item
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkTestScoreRequest {
    #[serde(default)]
    pub test_scores: Vec<Value>,
    pub subject: Subject,
    pub test_type: TestType,
    #[validate(range(min = 1.0, message = "Max score must be at least 1"))]
    pub max_score: Option<f64>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestScoreRequest {
    pub subject: Option<Subject>,
    #[validate(range(min = 0.0, max = 100.0, message = "Score must be between 0 and 100"))]
    pub score: Option<f64>,
    #[validate(range(min = 1.0, message = "Max score must be at least 1"))]
    pub max_score: Option<f64>,
    pub test_type: Option<TestType>,
    pub date: Option<String>,
    #[validate(length(max = 300, message = "Remarks cannot exceed 300 characters"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScoreResult {
    pub student_id: Uuid,
    pub test_score_id: Uuid,
    pub score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkScoreFailure {
    pub student_id: Option<String>,
    pub error: String,
}

struct NewScore {
    subject: Subject,
    score: f64,
    max_score: f64,
    test_type: TestType,
    date: DateTime<Utc>,
    remarks: Option<String>,
}

fn test_date(raw: &Option<String>) -> Result<DateTime<Utc>, ApiError> {
    match non_empty(raw) {
        Some(d) => parse_instant(d, "date", false),
        None => Ok(Utc::now()),
    }
}

async fn scorable_student(state: &AppState, caller: &CallerContext, student_id: Uuid) -> Result<Student, ApiError> {
    let student = state
        .store
        .students()
        .get(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Student.not_found()))?;
    caller.authorize(Action::Create, Resource::TestScore, &student.center)?;
    Ok(student)
}

async fn insert_score(state: &AppState, caller: &CallerContext, student: &Student, new: NewScore) -> Result<TestScore, ApiError> {
    let now = Utc::now();
    let score = TestScore {
        id: Uuid::new_v4(),
        student_id: student.id,
        subject: new.subject,
        score: new.score,
        max_score: new.max_score,
        test_type: new.test_type,
        date: new.date,
        marked_by: caller.id,
        center: student.center.clone(),
        remarks: new.remarks,
        created_at: now,
        updated_at: now,
    };
    state.store.test_scores().insert(&score).await?;
    Ok(score)
}

async fn single_view(state: &AppState, score: TestScore) -> Result<TestScoreView, ApiError> {
    test_score_views(state.store.as_ref(), vec![score])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_server_error("Failed to load test score"))
}

/// GET /api/testscores - Paginated scores, most recent test first
pub async fn list_test_scores(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<TestScoreListQuery>,
) -> ApiResult<Value> {
    let (page, limit) = page_params(&query.page, &query.limit, &state.config.api)?;
    let student_id = non_empty(&query.student_id).map(|s| parse_uuid_field(s, "studentId")).transpose()?;
    let subject = non_empty(&query.subject)
        .map(|s| parse_label::<Subject>(s, "subject"))
        .transpose()?;
    let test_type = non_empty(&query.test_type)
        .map(|s| parse_label::<TestType>(s, "testType"))
        .transpose()?;

    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .eq_opt("student_id", student_id)
        .eq_opt("subject", subject)
        .eq_opt("test_type", test_type)
        .order_by("date", SortDirection::Desc)
        .order_by("created_at", SortDirection::Desc);

    let paged = filter.clone().page(page, limit);
    let all = filter.unpaged();
    let (scores, total) = futures::try_join!(
        state.store.test_scores().find(&paged),
        state.store.test_scores().count(&all),
    )?;
    let scores = test_score_views(state.store.as_ref(), scores).await?;

    Ok(ApiResponse::success(json!({
        "testScores": scores,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// GET /api/testscores/:id
pub async fn get_test_score(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let score = load_scoped(state.store.test_scores(), &id, Resource::TestScore, &caller, Action::ReadOne).await?;
    Ok(ApiResponse::success(json!({ "testScore": single_view(&state, score).await? })))
}

/// POST /api/testscores - Record one test result; center comes from the student
pub async fn add_test_score(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<AddTestScoreRequest>,
) -> ApiResult<TestScoreView> {
    let student_id = parse_uuid_field(&body.student_id, "studentId")?;
    let date = test_date(&body.date)?;
    let student = scorable_student(&state, &caller, student_id).await?;

    let score = insert_score(
        &state,
        &caller,
        &student,
        NewScore {
            subject: body.subject,
            score: body.score,
            max_score: body.max_score.unwrap_or(DEFAULT_MAX_SCORE),
            test_type: body.test_type,
            date,
            remarks: body.remarks,
        },
    )
    .await?;
    tracing::debug!(score = %score.id, student = %student.id, "test score added");

    Ok(ApiResponse::created(single_view(&state, score).await?).with_message("Test score added successfully"))
}

/// POST /api/testscores/bulk - One test, many students
///
/// Each item is checked and stored on its own; failures are collected
/// rather than aborting the batch.
pub async fn add_bulk_test_scores(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<BulkTestScoreRequest>,
) -> ApiResult<Value> {
    if body.test_scores.is_empty() {
        return Err(ApiError::field("testScores", "Test scores array is required"));
    }
    let date = test_date(&body.date)?;
    let max_score = body.max_score.unwrap_or(DEFAULT_MAX_SCORE);
    let (subject, test_type) = (body.subject, body.test_type);
    let total = body.test_scores.len();
    let mut results = Vec::new();
    let mut errors = Vec::new();

    for item in body.test_scores {
        let raw_id = bulk_item_student(&item);
        let new = |score: f64, remarks: Option<String>| NewScore {
            subject,
            score,
            max_score,
            test_type,
            date,
            remarks,
        };
        match score_item(&state, &caller, item, new).await {
            Ok(result) => results.push(result),
            Err(error) => errors.push(BulkScoreFailure {
                student_id: raw_id,
                error,
            }),
        }
    }

    tracing::info!(by = %caller.id, total, failed = errors.len(), "bulk test scores processed");
    let summary = json!({ "total": total, "successful": results.len(), "failed": errors.len() });
    Ok(ApiResponse::success(json!({ "results": results, "errors": errors, "summary": summary }))
        .with_message("Bulk test scores processing completed"))
}

async fn score_item(
    state: &AppState,
    caller: &CallerContext,
    item: Value,
    new: impl FnOnce(f64, Option<String>) -> NewScore,
) -> Result<BulkScoreResult, String> {
    let item: BulkScoreItem = serde_json::from_value(item).map_err(|e| format!("Invalid test score: {e}"))?;
    let (Some(raw_id), Some(score)) = (non_empty(&item.student_id), item.score) else {
        return Err("Student ID and score are required".to_string());
    };
    let student_id = Uuid::parse_str(raw_id).map_err(|_| Resource::Student.not_found())?;
    if !(0.0..=100.0).contains(&score) {
        return Err("Score must be between 0 and 100".to_string());
    }
    if item.remarks.as_ref().is_some_and(|r| r.chars().count() > MAX_REMARKS) {
        return Err("Remarks cannot exceed 300 characters".to_string());
    }

    let student = match scorable_student(state, caller, student_id).await {
        Ok(student) => student,
        Err(ApiError::Forbidden(_)) => return Err("Access denied for this student".to_string()),
        Err(e) => return Err(e.message().to_string()),
    };
    let stored = insert_score(state, caller, &student, new(score, item.remarks))
        .await
        .map_err(|e| e.message().to_string())?;

    Ok(BulkScoreResult {
        student_id,
        test_score_id: stored.id,
        score,
    })
}

/// PUT /api/testscores/:id
pub async fn update_test_score(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateTestScoreRequest>,
) -> ApiResult<TestScoreView> {
    let mut score = load_scoped(state.store.test_scores(), &id, Resource::TestScore, &caller, Action::Update).await?;

    if let Some(subject) = body.subject {
        score.subject = subject;
    }
    if let Some(value) = body.score {
        score.score = value;
    }
    if let Some(max_score) = body.max_score {
        score.max_score = max_score;
    }
    if let Some(test_type) = body.test_type {
        score.test_type = test_type;
    }
    if let Some(date) = non_empty(&body.date) {
        score.date = parse_instant(date, "date", false)?;
    }
    if let Some(remarks) = body.remarks {
        score.remarks = Some(remarks);
    }
    score.updated_at = Utc::now();

    state.store.test_scores().update(&score).await?;

    Ok(ApiResponse::success(single_view(&state, score).await?).with_message("Test score updated successfully"))
}

/// DELETE /api/testscores/:id
pub async fn delete_test_score(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let score = load_scoped(state.store.test_scores(), &id, Resource::TestScore, &caller, Action::Delete).await?;
    state.store.test_scores().delete(score.id).await?;
    Ok(ApiResponse::message("Test score deleted successfully"))
}

/// GET /api/testscores/analytics - Averages and extremes per subject and test type
///
/// `educationLevel` narrows to scores of students currently at that level.
pub async fn test_score_analytics(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Value> {
    let center = caller.scope(non_empty(&query.center));
    let subject = non_empty(&query.subject)
        .map(|s| parse_label::<Subject>(s, "subject"))
        .transpose()?;
    let level = non_empty(&query.education_level)
        .map(|l| parse_label::<EducationLevel>(l, "educationLevel"))
        .transpose()?;
    let (from, to) = instant_window(&query.start_date, &query.end_date)?;

    let mut filter = Filter::new()
        .eq_opt("center", center.clone())
        .eq_opt("subject", subject)
        .range("date", from, to);

    if let Some(level) = level {
        let students = state
            .store
            .students()
            .find(&Filter::new().eq_opt("center", center).eq("education_level", level))
            .await?;
        if students.is_empty() {
            return Ok(ApiResponse::success(json!({ "analytics": [] })));
        }
        filter = filter.is_in("student_id", students.iter().map(|s| s.id).collect());
    }

    let scores = state.store.test_scores().find(&filter).await?;
    Ok(ApiResponse::success(json!({ "analytics": analytics(&scores) })))
}
