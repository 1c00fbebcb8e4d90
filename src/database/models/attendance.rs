use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::enums::{decode_label, AttendanceStatus};
use super::student::StudentRef;
use super::user::UserRef;
use crate::database::record::Record;
use crate::filter::FieldValue;

/// One student's attendance on one day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Uuid,
    pub center: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub student: Option<StudentRef>,
    pub marker: Option<UserRef>,
}

impl<'r> FromRow<'r, PgRow> for Attendance {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            date: row.try_get("date")?,
            status: decode_label(row.try_get("status")?, "status")?,
            marked_by: row.try_get("marked_by")?,
            center: row.try_get("center")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Record for Attendance {
    const TABLE: &'static str = "attendance";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "student_id",
        "date",
        "status",
        "marked_by",
        "center",
        "notes",
        "created_at",
        "updated_at",
    ];
    const UNIQUE: &'static [(&'static str, &'static [&'static str])] =
        &[("attendance_student_date_key", &["student_id", "date"])];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.student_id.into(),
            self.date.into(),
            self.status.into(),
            self.marked_by.into(),
            self.center.clone().into(),
            self.notes.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}
