// handlers/protected/attendance.rs - /api/attendance handlers
//
// A student has at most one attendance record per day. Marking a day twice
// overwrites status, notes and marker on the existing record.

use axum::extract::{Query, State};
use axum::Extension;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{Attendance, AttendanceStatus, AttendanceView, Student};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{
    bulk_item_student, day_window, days_ago, non_empty, page_params, parse_date, parse_label, parse_uuid_field, Pagination,
};
use crate::handlers::populate::attendance_views;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::policy::CallerContext;
use crate::reports::attendance::{status_breakdown, AttendanceSummary};
use crate::state::AppState;
use crate::types::{Action, Resource};

const MAX_NOTES: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub date: Option<String>,
    pub student_id: Option<String>,
    pub center: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub center: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub student_id: String,
    pub date: Option<String>,
    pub status: AttendanceStatus,
    #[validate(length(max = 200, message = "Notes cannot exceed 200 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceItem {
    pub student_id: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Records stay raw JSON until each one is decoded on its own
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendanceRequest {
    #[serde(default)]
    pub attendance_records: Vec<Value>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    pub student_id: Uuid,
    pub action: &'static str,
    pub attendance_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFailure {
    pub student_id: Option<String>,
    pub error: String,
}

/// Insert or overwrite the record for `(student, date)`; true when inserted
async fn upsert(
    state: &AppState,
    caller: &CallerContext,
    student: &Student,
    date: NaiveDate,
    status: AttendanceStatus,
    notes: Option<String>,
) -> Result<(Attendance, bool), ApiError> {
    let table = state.store.attendance();
    let key = Filter::new().eq("student_id", student.id).eq("date", date);

    let overwrite = |mut existing: Attendance, notes: Option<String>| {
        existing.status = status;
        existing.notes = notes;
        existing.marked_by = caller.id;
        existing.updated_at = Utc::now();
        existing
    };

    if let Some(existing) = table.find_one(&key).await? {
        let record = overwrite(existing, notes);
        table.update(&record).await?;
        return Ok((record, false));
    }

    let now = Utc::now();
    let record = Attendance {
        id: Uuid::new_v4(),
        student_id: student.id,
        date,
        status,
        marked_by: caller.id,
        center: student.center.clone(),
        notes: notes.clone(),
        created_at: now,
        updated_at: now,
    };
    match table.insert(&record).await {
        Ok(()) => Ok((record, true)),
        // Lost the race with a concurrent mark for the same day
        Err(StoreError::UniqueViolation { .. }) => {
            let existing = table
                .find_one(&key)
                .await?
                .ok_or_else(|| ApiError::conflict("Attendance already marked for this date"))?;
            let record = overwrite(existing, notes);
            table.update(&record).await?;
            Ok((record, false))
        }
        Err(e) => Err(e.into()),
    }
}

async fn markable_student(state: &AppState, caller: &CallerContext, student_id: Uuid) -> Result<Student, ApiError> {
    let student = state
        .store
        .students()
        .get(student_id)
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Student.not_found()))?;
    caller.authorize(Action::Create, Resource::Attendance, &student.center)?;
    Ok(student)
}

fn mark_date(raw: &Option<String>) -> Result<NaiveDate, ApiError> {
    match non_empty(raw) {
        Some(d) => parse_date(d, "date"),
        None => Ok(Utc::now().date_naive()),
    }
}

/// GET /api/attendance - Paginated records, newest day first
pub async fn list_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<AttendanceListQuery>,
) -> ApiResult<Value> {
    let (page, limit) = page_params(&query.page, &query.limit, &state.config.api)?;
    let date = non_empty(&query.date).map(|d| parse_date(d, "date")).transpose()?;
    let student_id = non_empty(&query.student_id).map(|s| parse_uuid_field(s, "studentId")).transpose()?;
    let status = non_empty(&query.status)
        .map(|s| parse_label::<AttendanceStatus>(s, "status"))
        .transpose()?;

    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .eq_opt("date", date)
        .eq_opt("student_id", student_id)
        .eq_opt("status", status)
        .order_by("date", SortDirection::Desc)
        .order_by("created_at", SortDirection::Desc);

    let paged = filter.clone().page(page, limit);
    let all = filter.unpaged();
    let (records, total) = futures::try_join!(
        state.store.attendance().find(&paged),
        state.store.attendance().count(&all),
    )?;
    let records = attendance_views(state.store.as_ref(), records).await?;

    Ok(ApiResponse::success(json!({
        "attendance": records,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// POST /api/attendance - Mark one student for one day
///
/// Answers 201 when a record is created and 200 when an existing one for
/// that day is overwritten.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<MarkAttendanceRequest>,
) -> ApiResult<AttendanceView> {
    let student_id = parse_uuid_field(&body.student_id, "studentId")?;
    let date = mark_date(&body.date)?;
    let student = markable_student(&state, &caller, student_id).await?;

    let (record, created) = upsert(&state, &caller, &student, date, body.status, body.notes).await?;
    tracing::debug!(student = %student.id, %date, created, "attendance marked");

    let view = attendance_views(state.store.as_ref(), vec![record])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_server_error("Failed to load attendance"))?;

    Ok(if created {
        ApiResponse::created(view).with_message("Attendance marked successfully")
    } else {
        ApiResponse::success(view).with_message("Attendance updated successfully")
    })
}

/// POST /api/attendance/bulk - Mark many students for one day
///
/// Items are processed in order and independently; failures are reported
/// per item next to the successes.
pub async fn mark_bulk_attendance(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<BulkAttendanceRequest>,
) -> ApiResult<Value> {
    if body.attendance_records.is_empty() {
        return Err(ApiError::field("attendanceRecords", "Attendance records array is required"));
    }
    let date = mark_date(&body.date)?;
    let total = body.attendance_records.len();
    let mut results = Vec::new();
    let mut errors = Vec::new();

    for item in body.attendance_records {
        let raw_id = bulk_item_student(&item);
        match mark_item(&state, &caller, date, item).await {
            Ok(result) => results.push(result),
            Err(error) => errors.push(BulkFailure {
                student_id: raw_id,
                error,
            }),
        }
    }

    tracing::info!(by = %caller.id, %date, total, failed = errors.len(), "bulk attendance processed");
    let summary = json!({ "total": total, "successful": results.len(), "failed": errors.len() });
    Ok(ApiResponse::success(json!({ "results": results, "errors": errors, "summary": summary }))
        .with_message("Bulk attendance processing completed"))
}

async fn mark_item(
    state: &AppState,
    caller: &CallerContext,
    date: NaiveDate,
    item: Value,
) -> Result<BulkResult, String> {
    let item: BulkAttendanceItem =
        serde_json::from_value(item).map_err(|e| format!("Invalid attendance record: {e}"))?;
    let (Some(raw_id), Some(raw_status)) = (non_empty(&item.student_id), non_empty(&item.status)) else {
        return Err("Student ID and status are required".to_string());
    };
    let student_id = Uuid::parse_str(raw_id).map_err(|_| Resource::Student.not_found())?;
    let status = raw_status.parse::<AttendanceStatus>().map_err(|e| e.to_string())?;
    if item.notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES) {
        return Err("Notes cannot exceed 200 characters".to_string());
    }

    let student = match markable_student(state, caller, student_id).await {
        Ok(student) => student,
        Err(ApiError::Forbidden(_)) => return Err("Access denied for this student".to_string()),
        Err(e) => return Err(e.message().to_string()),
    };
    let (record, created) = upsert(state, caller, &student, date, status, item.notes)
        .await
        .map_err(|e| e.message().to_string())?;

    Ok(BulkResult {
        student_id,
        action: if created { "created" } else { "updated" },
        attendance_id: record.id,
    })
}

/// GET /api/attendance/summary - Present and absent totals over a window
///
/// Without both `startDate` and `endDate` the window is the recent
/// reporting period.
pub async fn attendance_summary(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Value> {
    let student_id = non_empty(&query.student_id).map(|s| parse_uuid_field(s, "studentId")).transpose()?;
    let (from, to) = match (non_empty(&query.start_date), non_empty(&query.end_date)) {
        (Some(_), Some(_)) => day_window(&query.start_date, &query.end_date)?,
        _ => (Some(days_ago(state.config.reporting.attendance_window_days)), None),
    };

    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .eq_opt("student_id", student_id)
        .range("date", from, to);
    let records = state.store.attendance().find(&filter).await?;

    Ok(ApiResponse::success(json!({
        "summary": AttendanceSummary::from_records(&records),
        "breakdown": status_breakdown(&records),
    })))
}

