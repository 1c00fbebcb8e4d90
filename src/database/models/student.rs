use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::enums::{decode_label, EducationLevel, Gender};
use super::family::FamilyRef;
use super::user::UserRef;
use crate::database::record::Record;
use crate::filter::FieldValue;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub family_id: Uuid,
    pub center: String,
    pub education_level: EducationLevel,
    pub age: i32,
    pub gender: Gender,
    pub enrollment_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    #[serde(flatten)]
    pub student: Student,
    pub family: Option<FamilyRef>,
    pub creator: Option<UserRef>,
}

/// Embedded reference used by attendance and score records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: Uuid,
    pub name: String,
    pub education_level: EducationLevel,
}

impl From<&Student> for StudentRef {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.name.clone(),
            education_level: student.education_level,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for Student {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            family_id: row.try_get("family_id")?,
            center: row.try_get("center")?,
            education_level: decode_label(row.try_get("education_level")?, "education_level")?,
            age: row.try_get("age")?,
            gender: decode_label(row.try_get("gender")?, "gender")?,
            enrollment_date: row.try_get("enrollment_date")?,
            is_active: row.try_get("is_active")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Record for Student {
    const TABLE: &'static str = "students";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "family_id",
        "center",
        "education_level",
        "age",
        "gender",
        "enrollment_date",
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
            self.center.clone().into(),
            self.education_level.into(),
            self.age.into(),
            self.gender.into(),
            self.enrollment_date.into(),
            self.is_active.into(),
            self.created_by.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}
