use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::enums::{decode_label, JobStatus, Skill, TrainingStatus};
use super::family::FamilyRef;
use super::user::UserRef;
use crate::database::record::Record;
use crate::filter::FieldValue;

/// Women's skills-training beneficiary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Woman {
    pub id: Uuid,
    pub name: String,
    pub family_id: Uuid,
    pub age: i32,
    pub skill: Skill,
    pub training_status: TrainingStatus,
    pub training_start_date: Option<DateTime<Utc>>,
    pub training_end_date: Option<DateTime<Utc>>,
    pub job_status: JobStatus,
    pub monthly_income: f64,
    pub center: String,
    pub contact_number: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Woman {
    /// Whole days between training start and end, rounded up
    pub fn training_duration_days(&self) -> Option<i64> {
        let (start, end) = (self.training_start_date?, self.training_end_date?);
        let seconds = (end - start).num_seconds().abs();
        Some((seconds + 86_399) / 86_400)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WomanView {
    #[serde(flatten)]
    pub woman: Woman,
    pub training_duration: Option<i64>,
    pub family: Option<FamilyRef>,
    pub creator: Option<UserRef>,
}

impl<'r> FromRow<'r, PgRow> for Woman {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            family_id: row.try_get("family_id")?,
            age: row.try_get("age")?,
            skill: decode_label(row.try_get("skill")?, "skill")?,
            training_status: decode_label(row.try_get("training_status")?, "training_status")?,
            training_start_date: row.try_get("training_start_date")?,
            training_end_date: row.try_get("training_end_date")?,
            job_status: decode_label(row.try_get("job_status")?, "job_status")?,
            monthly_income: row.try_get("monthly_income")?,
            center: row.try_get("center")?,
            contact_number: row.try_get("contact_number")?,
            is_active: row.try_get("is_active")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Record for Woman {
    const TABLE: &'static str = "women";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "family_id",
        "age",
        "skill",
        "training_status",
        "training_start_date",
        "training_end_date",
        "job_status",
        "monthly_income",
        "center",
        "contact_number",
        "is_active",
        "created_by",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.family_id.into(),
            self.age.into(),
            self.skill.into(),
            self.training_status.into(),
            self.training_start_date.into(),
            self.training_end_date.into(),
            self.job_status.into(),
            self.monthly_income.into(),
            self.center.clone().into(),
            self.contact_number.clone().into(),
            self.is_active.into(),
            self.created_by.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn woman() -> Woman {
        let now = Utc::now();
        Woman {
            id: Uuid::new_v4(),
            name: "Sunita Sharma".to_string(),
            family_id: Uuid::new_v4(),
            age: 35,
            skill: Skill::Tailoring,
            training_status: TrainingStatus::Completed,
            training_start_date: None,
            training_end_date: None,
            job_status: JobStatus::SelfEmployed,
            monthly_income: 15000.0,
            center: "Delhi Center".to_string(),
            contact_number: None,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_training_duration_rounds_up() {
        let mut w = woman();
        assert_eq!(w.training_duration_days(), None);

        let start = Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap();
        w.training_start_date = Some(start);
        w.training_end_date = Some(start + Duration::days(151));
        assert_eq!(w.training_duration_days(), Some(151));

        w.training_end_date = Some(start + Duration::days(10) + Duration::hours(1));
        assert_eq!(w.training_duration_days(), Some(11));
    }
}
