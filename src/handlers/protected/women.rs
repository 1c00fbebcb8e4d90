// handlers/protected/women.rs - /api/women handlers

use axum::extract::{Path, Query, State};
use axum::Extension;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::database::models::{JobStatus, Skill, TrainingStatus, Woman, WomanView};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{
    load_scoped, non_empty, page_params, parse_bool, parse_instant, parse_label, parse_uuid_field, trimmed,
    trimmed_opt, Pagination, CONTACT_RE,
};
use crate::handlers::populate::woman_views;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::policy::{ensure_family_center, CallerContext};
use crate::reports::women::WomenStats;
use crate::state::AppState;
use crate::types::{Action, Resource};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WomenListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub center: Option<String>,
    pub skill: Option<String>,
    pub training_status: Option<String>,
    pub job_status: Option<String>,
    pub search: Option<String>,
    pub family_id: Option<String>,
    pub is_active: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WomenStatsQuery {
    pub center: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWomanRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub family_id: String,
    pub center: Option<String>,
    #[validate(range(min = 18, max = 65, message = "Age must be between 18 and 65"))]
    pub age: i32,
    pub skill: Skill,
    pub training_status: Option<TrainingStatus>,
    pub training_start_date: Option<String>,
    pub training_end_date: Option<String>,
    pub job_status: Option<JobStatus>,
    #[validate(range(min = 0.0, message = "Monthly income cannot be negative"))]
    pub monthly_income: Option<f64>,
    #[validate(regex(path = *CONTACT_RE, message = "Contact number must be a 10-digit number"))]
    pub contact_number: Option<String>,
}

/// Partial update; an empty training date string clears it
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWomanRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 18, max = 65, message = "Age must be between 18 and 65"))]
    pub age: Option<i32>,
    pub skill: Option<Skill>,
    pub training_status: Option<TrainingStatus>,
    pub training_start_date: Option<String>,
    pub training_end_date: Option<String>,
    pub job_status: Option<JobStatus>,
    #[validate(range(min = 0.0, message = "Monthly income cannot be negative"))]
    pub monthly_income: Option<f64>,
    #[validate(regex(path = *CONTACT_RE, message = "Contact number must be a 10-digit number"))]
    pub contact_number: Option<String>,
    pub is_active: Option<bool>,
}

fn training_date(raw: &Option<String>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    non_empty(raw).map(|d| parse_instant(d, field, false)).transpose()
}

async fn single_view(state: &AppState, woman: Woman) -> Result<WomanView, ApiError> {
    woman_views(state.store.as_ref(), vec![woman])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_server_error("Failed to load woman"))
}

/// GET /api/women - Paginated women, newest first
pub async fn list_women(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<WomenListQuery>,
) -> ApiResult<Value> {
    let (page, limit) = page_params(&query.page, &query.limit, &state.config.api)?;
    let family_id = non_empty(&query.family_id).map(|f| parse_uuid_field(f, "familyId")).transpose()?;
    let skill = non_empty(&query.skill).map(|s| parse_label::<Skill>(s, "skill")).transpose()?;
    let training = non_empty(&query.training_status)
        .map(|s| parse_label::<TrainingStatus>(s, "trainingStatus"))
        .transpose()?;
    let job = non_empty(&query.job_status)
        .map(|s| parse_label::<JobStatus>(s, "jobStatus"))
        .transpose()?;
    let is_active = non_empty(&query.is_active).map(|v| parse_bool(v, "isActive")).transpose()?;

    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .eq("is_active", is_active.unwrap_or(true))
        .eq_opt("family_id", family_id)
        .eq_opt("skill", skill)
        .eq_opt("training_status", training)
        .eq_opt("job_status", job)
        .search_opt(&["name"], non_empty(&query.search))
        .order_by("created_at", SortDirection::Desc);

    let paged = filter.clone().page(page, limit);
    let all = filter.unpaged();
    let (women, total) = futures::try_join!(
        state.store.women().find(&paged),
        state.store.women().count(&all),
    )?;
    let women = woman_views(state.store.as_ref(), women).await?;

    Ok(ApiResponse::success(json!({
        "women": women,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// GET /api/women/stats - Employment and training figures for active women
pub async fn women_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<WomenStatsQuery>,
) -> ApiResult<WomenStats> {
    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .eq("is_active", true);
    let women = state.store.women().find(&filter).await?;
    Ok(ApiResponse::success(WomenStats::from_records(&women)))
}

/// GET /api/women/:id
pub async fn get_woman(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let woman = load_scoped(state.store.women(), &id, Resource::Woman, &caller, Action::ReadOne).await?;
    Ok(ApiResponse::success(json!({ "woman": single_view(&state, woman).await? })))
}

/// POST /api/women - Register a woman under an existing family
pub async fn create_woman(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<CreateWomanRequest>,
) -> ApiResult<WomanView> {
    let family_id = parse_uuid_field(&body.family_id, "familyId")?;
    let family = state
        .store
        .families()
        .get(family_id)
        .await?
        .ok_or_else(|| ApiError::not_found(Resource::Family.not_found()))?;

    let center = non_empty(&body.center).unwrap_or(&family.center).to_string();
    ensure_family_center(Resource::Woman, &center, &family.center)?;
    caller.authorize(Action::Create, Resource::Woman, &center)?;

    let now = Utc::now();
    let woman = Woman {
        id: uuid::Uuid::new_v4(),
        name: body.name.trim().to_string(),
        family_id: family.id,
        age: body.age,
        skill: body.skill,
        training_status: body.training_status.unwrap_or(TrainingStatus::NotStarted),
        training_start_date: training_date(&body.training_start_date, "trainingStartDate")?,
        training_end_date: training_date(&body.training_end_date, "trainingEndDate")?,
        job_status: body.job_status.unwrap_or(JobStatus::Unemployed),
        monthly_income: body.monthly_income.unwrap_or(0.0),
        center,
        contact_number: body.contact_number,
        is_active: true,
        created_by: Some(caller.id),
        created_at: now,
        updated_at: now,
    };
    state.store.women().insert(&woman).await?;
    tracing::info!(woman = %woman.id, family = %family.id, by = %caller.id, "woman registered");

    Ok(ApiResponse::created(single_view(&state, woman).await?).with_message("Woman created successfully"))
}

/// PUT /api/women/:id
pub async fn update_woman(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateWomanRequest>,
) -> ApiResult<WomanView> {
    let mut woman = load_scoped(state.store.women(), &id, Resource::Woman, &caller, Action::Update).await?;

    if let Some(name) = body.name {
        woman.name = name.trim().to_string();
    }
    if let Some(age) = body.age {
        woman.age = age;
    }
    if let Some(skill) = body.skill {
        woman.skill = skill;
    }
    if let Some(status) = body.training_status {
        woman.training_status = status;
    }
    if body.training_start_date.is_some() {
        woman.training_start_date = training_date(&body.training_start_date, "trainingStartDate")?;
    }
    if body.training_end_date.is_some() {
        woman.training_end_date = training_date(&body.training_end_date, "trainingEndDate")?;
    }
    if let Some(job) = body.job_status {
        woman.job_status = job;
    }
    if let Some(income) = body.monthly_income {
        woman.monthly_income = income;
    }
    if let Some(contact) = body.contact_number {
        woman.contact_number = Some(contact);
    }
    if let Some(is_active) = body.is_active {
        woman.is_active = is_active;
    }
    woman.updated_at = Utc::now();

    state.store.women().update(&woman).await?;

    Ok(ApiResponse::success(single_view(&state, woman).await?).with_message("Woman updated successfully"))
}

/// DELETE /api/women/:id
pub async fn delete_woman(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let woman = load_scoped(state.store.women(), &id, Resource::Woman, &caller, Action::Delete).await?;
    state.store.women().delete(woman.id).await?;

    tracing::info!(woman = %woman.id, by = %caller.id, "woman deleted");
    Ok(ApiResponse::message("Woman deleted successfully"))
}
