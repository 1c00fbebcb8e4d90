// handlers/admin/stats.rs - GET /api/admin/stats handler

use axum::extract::{Query, State};
use chrono::{NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::filter::Filter;
use crate::handlers::common::{days_ago, instant_window, non_empty};
use crate::middleware::{ApiResponse, ApiResult};
use crate::reports::attendance::{status_breakdown, AttendanceSummary};
use crate::reports::trends::{center_rollup, level_distribution, monthly_growth, months_ago};
use crate::reports::women::{job_breakdown, training_breakdown, WomenStats};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsQuery {
    pub center: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/**
 * GET /api/admin/stats - Organisation-wide figures
 *
 * `center` narrows every section except `centerStats`, which always rolls up
 * all active records per center. `startDate`/`endDate` window the overview
 * counts on creation time.
 */
pub async fn admin_stats(State(state): State<AppState>, Query(query): Query<AdminStatsQuery>) -> ApiResult<Value> {
    let center = non_empty(&query.center).map(str::to_string);
    let (from, to) = instant_window(&query.start_date, &query.end_date)?;
    let reporting = &state.config.reporting;
    let now = Utc::now();
    let recent_day = days_ago(reporting.attendance_window_days);
    let recent_at = recent_day.and_time(NaiveTime::MIN).and_utc();

    let scope = Filter::new().eq_opt("center", center);
    let active = Filter::new().eq("is_active", true);
    let scoped_active = scope.clone().eq("is_active", true);
    let overview = scoped_active.clone().range("created_at", from, to);
    let created_recently = scope.clone().gte("created_at", recent_at);

    let (total_families, total_students, total_women, total_users) = futures::try_join!(
        state.store.families().count(&overview),
        state.store.students().count(&overview),
        state.store.women().count(&overview),
        state.store.users().count(&active),
    )?;

    let (new_families, new_students, new_women) = futures::try_join!(
        state.store.families().count(&created_recently),
        state.store.students().count(&created_recently),
        state.store.women().count(&created_recently),
    )?;

    let (all_families, all_students, all_women) = futures::try_join!(
        state.store.families().find(&active),
        state.store.students().find(&active),
        state.store.women().find(&active),
    )?;
    let centers = center_rollup(&all_families, &all_students, &all_women);

    let trend_start = months_ago(now, reporting.trend_months);
    let recent_attendance = scope.clone().gte("date", recent_day);
    let trend_families = scope.clone().gte("created_at", trend_start);
    let (attendance, women, students, recent_families) = futures::try_join!(
        state.store.attendance().find(&recent_attendance),
        state.store.women().find(&scoped_active),
        state.store.students().find(&scoped_active),
        state.store.families().find(&trend_families),
    )?;

    let summary = AttendanceSummary::from_records(&attendance);
    let women_stats = WomenStats::from_records(&women);

    Ok(ApiResponse::success(json!({
        "overview": {
            "totalFamilies": total_families,
            "totalStudents": total_students,
            "totalWomen": total_women,
            "totalUsers": total_users,
            "totalMembers": total_students + total_women,
        },
        "recentActivity": {
            "newFamilies": new_families,
            "newStudents": new_students,
            "newWomen": new_women,
        },
        "centerStats": centers,
        "attendance": {
            "totalRecords": summary.total_records,
            "presentCount": summary.present_count,
            "attendancePercentage": summary.attendance_percentage,
            "breakdown": status_breakdown(&attendance),
        },
        "womenEmpowerment": {
            "totalWomen": women_stats.total_women,
            "employedWomen": women_stats.employed_women,
            "employmentRate": women_stats.employment_rate,
            "trainingCompletionRate": women_stats.training_completion_rate,
            "employmentBreakdown": job_breakdown(&women),
            "trainingBreakdown": training_breakdown(&women),
        },
        "education": {
            "totalStudents": students.len(),
            "levelDistribution": level_distribution(&students),
        },
        "trends": {
            "monthlyGrowth": monthly_growth(&recent_families, now, reporting.trend_months),
        },
    })))
}
