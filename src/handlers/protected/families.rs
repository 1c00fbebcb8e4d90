// handlers/protected/families.rs - /api/families handlers

use axum::extract::{Path, Query, State};
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::database::models::{Family, FamilyView};
use crate::error::ApiError;
use crate::filter::{Filter, SortDirection};
use crate::handlers::common::{
    create_center, load_scoped, non_empty, page_params, trimmed, trimmed_opt, Pagination, CONTACT_RE,
};
use crate::handlers::populate::family_views;
use crate::middleware::{ApiResponse, ApiResult, ValidJson};
use crate::policy::CallerContext;
use crate::state::AppState;
use crate::types::{Action, Resource};

#[derive(Debug, Deserialize)]
pub struct FamilyListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub center: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFamilyRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 2, max = 100, message = "Family name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(regex(path = *CONTACT_RE, message = "Contact must be a 10-digit number"))]
    pub contact: String,
    pub center: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 10, max = 500, message = "Address must be between 10 and 500 characters"))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFamilyRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 2, max = 100, message = "Family name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(regex(path = *CONTACT_RE, message = "Contact must be a 10-digit number"))]
    pub contact: Option<String>,
    #[validate(length(min = 1, message = "Center cannot be empty"))]
    pub center: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 10, max = 500, message = "Address must be between 10 and 500 characters"))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

async fn single_view(state: &AppState, family: Family) -> Result<FamilyView, ApiError> {
    family_views(state.store.as_ref(), vec![family])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal_server_error("Failed to load family"))
}

async fn active_member_count(state: &AppState, family: &Family) -> Result<i64, ApiError> {
    let filter = Filter::new().eq("family_id", family.id).eq("is_active", true);
    let (students, women) = futures::try_join!(
        state.store.students().count(&filter),
        state.store.women().count(&filter),
    )?;
    Ok(students + women)
}

/// GET /api/families - Paginated families, newest first
///
/// `search` matches name or contact. Tutors only ever see their own center.
pub async fn list_families(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Query(query): Query<FamilyListQuery>,
) -> ApiResult<Value> {
    let (page, limit) = page_params(&query.page, &query.limit, &state.config.api)?;

    let filter = Filter::new()
        .eq_opt("center", caller.scope(non_empty(&query.center)))
        .search_opt(&["name", "contact"], non_empty(&query.search))
        .order_by("created_at", SortDirection::Desc);

    let paged = filter.clone().page(page, limit);
    let all = filter.unpaged();
    let (families, total) = futures::try_join!(
        state.store.families().find(&paged),
        state.store.families().count(&all),
    )?;
    let families = family_views(state.store.as_ref(), families).await?;

    Ok(ApiResponse::success(json!({
        "families": families,
        "pagination": Pagination::new(page, limit, total),
    })))
}

/// GET /api/families/:id - Family plus its active students and women
pub async fn get_family(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let family = load_scoped(state.store.families(), &id, Resource::Family, &caller, Action::ReadOne).await?;

    let members = Filter::new()
        .eq("family_id", family.id)
        .eq("is_active", true)
        .order_by("created_at", SortDirection::Asc);
    let (students, women) = futures::try_join!(
        state.store.students().find(&members),
        state.store.women().find(&members),
    )?;

    Ok(ApiResponse::success(json!({
        "family": single_view(&state, family).await?,
        "members": { "students": students, "women": women },
    })))
}

/// POST /api/families - Register a household
pub async fn create_family(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    ValidJson(body): ValidJson<CreateFamilyRequest>,
) -> ApiResult<FamilyView> {
    let center = create_center(&caller, Resource::Family, body.center.as_deref())?;

    let family = Family::new(body.name.trim().to_string(), body.contact, center, body.address.trim().to_string(), caller.id);
    state.store.families().insert(&family).await?;
    tracing::info!(family = %family.id, center = %family.center, by = %caller.id, "family created");

    Ok(ApiResponse::created(single_view(&state, family).await?).with_message("Family created successfully"))
}

/// PUT /api/families/:id - Merge the supplied fields into the family
///
/// Moving a family to another center is refused while it has active
/// members, since their records carry the old center.
pub async fn update_family(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateFamilyRequest>,
) -> ApiResult<FamilyView> {
    let mut family = load_scoped(state.store.families(), &id, Resource::Family, &caller, Action::Update).await?;

    if let Some(center) = body.center.map(|c| c.trim().to_string()).filter(|c| *c != family.center) {
        if !caller.is_admin() {
            return Err(ApiError::forbidden("You cannot change family center to a different center"));
        }
        if active_member_count(&state, &family).await? > 0 {
            return Err(ApiError::bad_request(
                "Cannot change center of a family with active members. Please deactivate all members first.",
            ));
        }
        family.center = center;
    }
    if let Some(name) = body.name {
        family.name = name.trim().to_string();
    }
    if let Some(contact) = body.contact {
        family.contact = contact;
    }
    if let Some(address) = body.address {
        family.address = address.trim().to_string();
    }
    if let Some(is_active) = body.is_active {
        family.is_active = is_active;
    }
    family.updated_at = Utc::now();

    state.store.families().update(&family).await?;

    Ok(ApiResponse::success(single_view(&state, family).await?).with_message("Family updated successfully"))
}

/// DELETE /api/families/:id - Remove a family with no active members
///
/// Inactive members go with it, along with their attendance and scores.
pub async fn delete_family(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let family = load_scoped(state.store.families(), &id, Resource::Family, &caller, Action::Delete).await?;

    if active_member_count(&state, &family).await? > 0 {
        return Err(ApiError::bad_request(
            "Cannot delete family with active members. Please deactivate all members first.",
        ));
    }

    let members = Filter::new().eq("family_id", family.id);
    let student_ids: Vec<_> = state.store.students().find(&members).await?.iter().map(|s| s.id).collect();
    if !student_ids.is_empty() {
        let records = Filter::new().is_in("student_id", student_ids);
        state.store.attendance().delete_where(&records).await?;
        state.store.test_scores().delete_where(&records).await?;
    }
    state.store.students().delete_where(&members).await?;
    state.store.women().delete_where(&members).await?;
    state.store.families().delete(family.id).await?;

    tracing::info!(family = %family.id, by = %caller.id, "family deleted");
    Ok(ApiResponse::message("Family deleted successfully"))
}
