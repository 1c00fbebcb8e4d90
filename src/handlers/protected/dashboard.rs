// handlers/protected/dashboard.rs - /api/dashboard handlers
//
// Tutors always see their own center. Admins see every center unless they
// pass `center`.

use axum::extract::{Query, State};
use axum::Extension;
use chrono::{Months, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{AttendanceStatus, EducationLevel, TestScore};
use crate::database::StoreError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{day_window, days_ago, non_empty};
use crate::handlers::populate::students_by_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::policy::CallerContext;
use crate::reports::activity::{recent_activity, Activity, RECENT_FAMILIES, RECENT_STUDENTS, RECENT_TESTS};
use crate::reports::attendance::{by_student, daily_rows, status_breakdown, AttendanceReport, AttendanceSummary};
use crate::reports::scores::{average_score, latest_by_student};
use crate::reports::{growth_label, growth_percentage, mean, rate};
use crate::state::AppState;

const RECENT_ATTENDANCE_RECORDS: usize = 10;
const REPORT_DAYS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub center: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub center: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: Uuid,
    pub name: String,
    pub education_level: EducationLevel,
    pub center: String,
    pub family_id: Uuid,
    pub attendance_percentage: i64,
    pub last_test_score: Option<f64>,
    pub last_test_max_score: Option<f64>,
    pub is_active: bool,
}

/// GET /api/dashboard/stats - Headline counts, growth and recent activity
///
/// Growth compares today's totals with the totals a month ago.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Value> {
    let scope = Filter::new().eq_opt("center", caller.scope(non_empty(&query.center)));
    let now = Utc::now();
    let month_ago = now.checked_sub_months(Months::new(1)).unwrap_or(now);
    let reporting = &state.config.reporting;
    let window_start = days_ago(reporting.attendance_window_days);
    let window_start_at = window_start.and_time(NaiveTime::MIN).and_utc();

    let active = scope.clone().eq("is_active", true);
    let before_month = scope.clone().lt("created_at", month_ago);
    let (total_students, active_students, total_families, prev_students, prev_families) = futures::try_join!(
        state.store.students().count(&scope),
        state.store.students().count(&active),
        state.store.families().count(&scope),
        state.store.students().count(&before_month),
        state.store.families().count(&before_month),
    )?;

    let attendance_window = scope.clone().gte("date", window_start);
    let score_window = scope.clone().gte("date", window_start_at);
    let (attendance, recent_scores) = futures::try_join!(
        state.store.attendance().find(&attendance_window),
        state.store.test_scores().find(&score_window),
    )?;
    let summary = AttendanceSummary::from_records(&attendance);

    let activities = activity_feed(&state, &scope, reporting.recent_activity_limit).await?;

    Ok(ApiResponse::success(json!({
        "overview": {
            "totalStudents": total_students,
            "activeStudents": active_students,
            "totalFamilies": total_families,
            "studentGrowth": growth_label(growth_percentage(total_students, prev_students)),
            "familyGrowth": growth_label(growth_percentage(total_families, prev_families)),
            "attendancePercentage": summary.attendance_percentage,
            "averageTestScore": average_score(&recent_scores),
        },
        "attendance": {
            "totalRecords": summary.total_records,
            "presentCount": summary.present_count,
            "attendancePercentage": summary.attendance_percentage,
            "breakdown": status_breakdown(&attendance),
        },
        "recentActivities": activities,
    })))
}

async fn activity_feed(state: &AppState, scope: &Filter, limit: usize) -> Result<Vec<Activity>, StoreError> {
    let newest = |n: usize| scope.clone().order_by("created_at", SortDirection::Desc).limit(n as i64);
    let (newest_students, newest_scores, newest_families) =
        (newest(RECENT_STUDENTS), newest(RECENT_TESTS), newest(RECENT_FAMILIES));
    let (students, scores, families) = futures::try_join!(
        state.store.students().find(&newest_students),
        state.store.test_scores().find(&newest_scores),
        state.store.families().find(&newest_families),
    )?;

    let names = students_by_id(state.store.as_ref(), scores.iter().map(|s| s.student_id)).await?;
    let scores: Vec<(TestScore, String)> = scores
        .into_iter()
        .map(|s| {
            let name = names.get(&s.student_id).map(|st| st.name.clone()).unwrap_or_default();
            (s, name)
        })
        .collect();

    Ok(recent_activity(&students, &scores, &families, Utc::now(), limit))
}

/// GET /api/dashboard/students - Every student with recent attendance and last score
pub async fn dashboard_students(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Value> {
    let scope = Filter::new().eq_opt("center", caller.scope(non_empty(&query.center)));
    let students = state
        .store
        .students()
        .find(&scope.order_by("name", SortDirection::Asc))
        .await?;

    let ids: Vec<Uuid> = students.iter().map(|s| s.id).collect();
    let (attendance, scores) = if ids.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        let by_ids = Filter::new().is_in("student_id", ids);
        futures::try_join!(
            state.store.attendance().find(&by_ids),
            state.store.test_scores().find(&by_ids),
        )?
    };
    let attendance = by_student(&attendance);
    let latest = latest_by_student(&scores);

    let rows: Vec<StudentRow> = students
        .into_iter()
        .map(|s| {
            let recent: Vec<_> = attendance
                .get(&s.id)
                .map(|records| records.iter().take(RECENT_ATTENDANCE_RECORDS).collect())
                .unwrap_or_default();
            let present = recent
                .iter()
                .filter(|r| r.status == AttendanceStatus::Present)
                .count();
            let last = latest.get(&s.id);
            StudentRow {
                id: s.id,
                name: s.name,
                education_level: s.education_level,
                center: s.center,
                family_id: s.family_id,
                attendance_percentage: rate(present, recent.len()),
                last_test_score: last.map(|t| t.score),
                last_test_max_score: last.map(|t| t.max_score),
                is_active: s.is_active,
            }
        })
        .collect();

    let average_attendance = mean(rows.iter().map(|r| r.attendance_percentage as f64))
        .unwrap_or(0.0)
        .round() as i64;
    let average_test_score = mean(rows.iter().filter_map(|r| r.last_test_score))
        .unwrap_or(0.0)
        .round() as i64;

    Ok(ApiResponse::success(json!({
        "totalStudents": rows.len(),
        "averageAttendance": average_attendance,
        "averageTestScore": average_test_score,
        "students": rows,
    })))
}

/// GET /api/dashboard/attendance-reports - Window totals plus the latest days
pub async fn attendance_reports(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Value> {
    let (from, to) = match (non_empty(&query.start_date), non_empty(&query.end_date)) {
        (Some(_), Some(_)) => day_window(&query.start_date, &query.end_date)?,
        _ => (Some(days_ago(state.config.reporting.attendance_window_days)), None),
    };
    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .range("date", from, to);
    let records = state.store.attendance().find(&filter).await?;

    Ok(ApiResponse::success(json!({
        "summary": AttendanceReport::from_records(&records),
        "recentRecords": daily_rows(&records, REPORT_DAYS),
    })))
}
