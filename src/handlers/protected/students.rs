// handlers/protected/students.rs - /api/students handlers

use axum::extract::{Path, Query, State};
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::database::models::{EducationLevel, Gender, Student, StudentView};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{
    days_ago, load_scoped, non_empty, page_params, parse_bool, parse_label, parse_uuid_field, trimmed,
    trimmed_opt, Pagination,
};
use crate::handlers::populate::student_views;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::policy::{ensure_family_center, CallerContext};
use crate::reports::{attendance::AttendanceSummary, scores::latest_by_subject};
use crate::state::AppState;
use crate::types::{Action, Resource};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub center: Option<String>,
    pub education_level: Option<String>,
    pub search: Option<String>,
    pub family_id: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Student name must be between 1 and 100 characters"))]
    pub name: String,
    pub family_id: String,
    pub center: Option<String>,
    pub education_level: EducationLevel,
    #[validate(range(min = 3, max = 25, message = "Age must be between 3 and 25"))]
    pub age: i32,
    pub gender: Gender,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "Student name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub education_level: Option<EducationLevel>,
    #[validate(range(min = 3, max = 25, message = "Age must be between 3 and 25"))]
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_active: Option<bool>,
}

async fn single_view(state: &AppState, student: Student) -> Result<StudentView, ApiError> {
    student_views(state.store.as_ref(), vec![student])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_server_error("Failed to load student"))
}

/// GET /api/students - Paginated students, newest first
///
/// Active students only unless `isActive=false` is passed.
pub async fn list_students(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<StudentListQuery>,
) -> ApiResult<Value> {
    let (page, limit) = page_params(&query.page, &query.limit, &state.config.api)?;
    let family_id = non_empty(&query.family_id).map(|f| parse_uuid_field(f, "familyId")).transpose()?;
    let level = non_empty(&query.education_level)
        .map(|l| parse_label::<EducationLevel>(l, "educationLevel"))
        .transpose()?;
    let is_active = non_empty(&query.is_active).map(|v| parse_bool(v, "isActive")).transpose()?;

    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .eq("is_active", is_active.unwrap_or(true))
        .eq_opt("family_id", family_id)
        .eq_opt("education_level", level)
        .search_opt(&["name"], non_empty(&query.search))
        .order_by("created_at", SortDirection::Desc);

    let paged = filter.clone().page(page, limit);
    let all = filter.unpaged();
    let (students, total) = futures::try_join!(
        state.store.students().find(&paged),
        state.store.students().count(&all),
    )?;
    let students = student_views(state.store.as_ref(), students).await?;

    Ok(ApiResponse::success(json!({
        "students": students,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// GET /api/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let student = load_scoped(state.store.students(), &id, Resource::Student, &caller, Action::ReadOne).await?;
    Ok(ApiResponse::success(json!({ "student": single_view(&state, student).await? })))
}

/// GET /api/students/:id/progress - Recent attendance and latest score per subject
pub async fn student_progress(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let student = load_scoped(state.store.students(), &id, Resource::Student, &caller, Action::ReadOne).await?;

    let since = days_ago(state.config.reporting.attendance_window_days);
    let scores_filter = Filter::new().eq("student_id", student.id);
    let attendance_filter = scores_filter.clone().gte("date", since);
    let (attendance, scores) = futures::try_join!(
        state.store.attendance().find(&attendance_filter),
        state.store.test_scores().find(&scores_filter),
    )?;

    let summary = AttendanceSummary::from_records(&attendance);

    Ok(ApiResponse::success(json!({
        "student": {
            "id": student.id,
            "name": student.name,
            "educationLevel": student.education_level,
            "center": student.center,
        },
        "progress": {
            "attendancePercentage": summary.attendance_percentage,
            "totalAttendanceDays": summary.total_records,
            "presentDays": summary.present_count,
            "latestScores": latest_by_subject(&scores),
        },
    })))
}

/// POST /api/students - Enroll a student into an existing family
///
/// The student's center defaults to the family's and must match it.
pub async fn create_student(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<CreateStudentRequest>,
) -> ApiResult<StudentView> {
    let family_id = parse_uuid_field(&body.family_id, "familyId")?;
    let family = state
        .store
        .families()
        .get(family_id)
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Family.not_found()))?;

    let center = non_empty(&body.center).unwrap_or(&family.center).to_string();
    ensure_family_center(Resource::Student, &center, &family.center)?;
    caller.authorize(Action::Create, Resource::Student, &center)?;

    let now = Utc::now();
    let student = Student {
        id: uuid::Uuid::new_v4(),
        name: body.name.trim().to_string(),
        family_id: family.id,
        center,
        education_level: body.education_level,
        age: body.age,
        gender: body.gender,
        enrollment_date: now,
        is_active: true,
        created_by: Some(caller.id),
        created_at: now,
        updated_at: now,
    };
    state.store.students().insert(&student).await?;
    tracing::info!(student = %student.id, family = %family.id, by = %caller.id, "student enrolled");

    Ok(ApiResponse::created(single_view(&state, student).await?).with_message("Student created successfully"))
}

/// PUT /api/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateStudentRequest>,
) -> ApiResult<StudentView> {
    let mut student = load_scoped(state.store.students(), &id, Resource::Student, &caller, Action::Update).await?;

    if let Some(name) = body.name {
        student.name = name.trim().to_string();
    }
    if let Some(level) = body.education_level {
        student.education_level = level;
    }
    if let Some(age) = body.age {
        student.age = age;
    }
    if let Some(gender) = body.gender {
        student.gender = gender;
    }
    if let Some(is_active) = body.is_active {
        student.is_active = is_active;
    }
    student.updated_at = Utc::now();

    state.store.students().update(&student).await?;

    Ok(ApiResponse::success(single_view(&state, student).await?).with_message("Student updated successfully"))
}

/// DELETE /api/students/:id - Hard delete, including attendance and scores
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let student = load_scoped(state.store.students(), &id, Resource::Student, &caller, Action::Delete).await?;

    let records = Filter::new().eq("student_id", student.id);
    state.store.attendance().delete_where(&records).await?;
    state.store.test_scores().delete_where(&records).await?;
    state.store.students().delete(student.id).await?;

    tracing::info!(student = %student.id, by = %caller.id, "student deleted");
    Ok(ApiResponse::message("Student deleted successfully"))
}
