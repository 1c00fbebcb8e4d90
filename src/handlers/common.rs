// handlers/common.rs - Query parsing and pagination shared by the resource handlers

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::database::{Record, Table};
use crate::error::ApiError;
use crate::policy::{CallerContext, Scoped};
use crate::types::{Action, Resource};

/// Ten-digit phone number
pub static CONTACT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid contact regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            ((total.max(0) as u64 + limit as u64 - 1) / limit as u64) as u32
        };
        Self {
            current: page,
            pages,
            total,
        }
    }
}

/// Strip surrounding whitespace while deserializing, so length rules see the stored value
pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

pub fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

/// Query values arrive as strings; blank ones count as absent
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve `page`/`limit` against the configured defaults and cap
pub fn page_params(page: &Option<String>, limit: &Option<String>, api: &ApiConfig) -> Result<(u32, u32), ApiError> {
    let page = match non_empty(page) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ApiError::field("page", "Page must be a positive integer"))?,
        None => 1,
    };
    let limit = match non_empty(limit) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| ApiError::field("limit", "Limit must be a positive integer"))?,
        None => api.default_page_size,
    };
    Ok((page, limit.min(api.max_page_size)))
}

/// Path ids that do not parse can never match a record
pub fn parse_id(raw: &str, resource: Resource) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(resource.not_found()))
}

/// `studentId` of a raw bulk item as sent, for echoing back in per-item errors
pub fn bulk_item_student(item: &Value) -> Option<String> {
    match item.get("studentId") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Fetch a record by path id and check the caller may perform `action` on it
pub async fn load_scoped<T>(
    table: &dyn Table<T>,
    raw_id: &str,
    resource: Resource,
    caller: &CallerContext,
    action: Action,
) -> Result<T, ApiError>
where
    T: Record + Scoped,
{
    let id = parse_id(raw_id, resource)?;
    let record = table
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(resource.not_found()))?;
    caller.authorize(action, resource, record.center())?;
    Ok(record)
}

/// Center for a new record: tutors default to their own, admins must name one
pub fn create_center(caller: &CallerContext, resource: Resource, requested: Option<&str>) -> Result<String, ApiError> {
    let requested = requested.map(str::trim).filter(|c| !c.is_empty());
    let center = match (requested, caller.center()) {
        (Some(center), _) => center.to_string(),
        (None, Some(own)) => own.to_string(),
        (None, None) => return Err(ApiError::field("center", "Center is required")),
    };
    caller.authorize(Action::Create, resource, &center)?;
    Ok(center)
}

pub fn parse_uuid_field(raw: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::field(field, format!("Invalid {field}")))
}

pub fn parse_bool(raw: &str, field: &str) -> Result<bool, ApiError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ApiError::field(field, format!("{field} must be true or false"))),
    }
}

/// Parse a parameter into an enum label, naming the field on failure
pub fn parse_label<T>(raw: &str, field: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ApiError::field(field, e.to_string()))
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Instant bound from an RFC 3339 timestamp or a bare `YYYY-MM-DD`.
///
/// A bare end date covers that whole day, so it resolves to the next
/// midnight and is used as an exclusive bound.
pub fn parse_instant(raw: &str, field: &str, end: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        let at = at.with_timezone(&Utc);
        // Exclusive bound: keep records stamped exactly at `at`
        return Ok(if end { at + chrono::Duration::milliseconds(1) } else { at });
    }
    let day = parse_day(raw).ok_or_else(|| ApiError::field(field, format!("Invalid {field}")))?;
    let day = if end { day.checked_add_days(Days::new(1)).unwrap_or(day) } else { day };
    Ok(day.and_time(NaiveTime::MIN).and_utc())
}

/// Day bound for date-only columns, end exclusive
pub fn parse_day_bound(raw: &str, field: &str, end: bool) -> Result<NaiveDate, ApiError> {
    let day = match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.with_timezone(&Utc).date_naive(),
        Err(_) => parse_day(raw).ok_or_else(|| ApiError::field(field, format!("Invalid {field}")))?,
    };
    Ok(if end { day.checked_add_days(Days::new(1)).unwrap_or(day) } else { day })
}

/// `[start, end)` instants from optional query strings
pub fn instant_window(
    start: &Option<String>,
    end: &Option<String>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ApiError> {
    let from = non_empty(start).map(|s| parse_instant(s, "startDate", false)).transpose()?;
    let to = non_empty(end).map(|s| parse_instant(s, "endDate", true)).transpose()?;
    Ok((from, to))
}

/// `[start, end)` days from optional query strings
pub fn day_window(start: &Option<String>, end: &Option<String>) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ApiError> {
    let from = non_empty(start).map(|s| parse_day_bound(s, "startDate", false)).transpose()?;
    let to = non_empty(end).map(|s| parse_day_bound(s, "endDate", true)).transpose()?;
    Ok((from, to))
}

/// UTC calendar day `days` before today
pub fn days_ago(days: i64) -> NaiveDate {
    let today = Utc::now().date_naive();
    today.checked_sub_days(Days::new(days.max(0) as u64)).unwrap_or(today)
}

/// Calendar day of a timestamp or date parameter
pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, ApiError> {
    parse_day_bound(raw, field, false)
}
