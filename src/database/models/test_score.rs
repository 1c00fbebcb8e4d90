use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::enums::{decode_label, Subject, TestType};
use super::student::StudentRef;
use super::user::UserRef;
use crate::database::record::Record;
use crate::filter::FieldValue;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScore {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject: Subject,
    pub score: f64,
    pub max_score: f64,
    pub test_type: TestType,
    pub date: DateTime<Utc>,
    pub marked_by: Uuid,
    pub center: String,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestScore {
    /// Score as a whole-number percentage of the maximum
    pub fn percentage(&self) -> i64 {
        percentage(self.score, self.max_score)
    }

    pub fn grade(&self) -> &'static str {
        grade(self.percentage())
    }
}

pub fn percentage(score: f64, max_score: f64) -> i64 {
    if max_score <= 0.0 {
        return 0;
    }
    (score / max_score * 100.0).round() as i64
}

pub fn grade(percentage: i64) -> &'static str {
    match percentage {
        p if p >= 90 => "A+",
        p if p >= 80 => "A",
        p if p >= 70 => "B+",
        p if p >= 60 => "B",
        p if p >= 50 => "C",
        p if p >= 40 => "D",
        _ => "F",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScoreView {
    #[serde(flatten)]
    pub test_score: TestScore,
    pub percentage: i64,
    pub grade: &'static str,
    pub student: Option<StudentRef>,
    pub marker: Option<UserRef>,
}

impl<'r> FromRow<'r, PgRow> for TestScore {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            subject: decode_label(row.try_get("subject")?, "subject")?,
            score: row.try_get("score")?,
            max_score: row.try_get("max_score")?,
            test_type: decode_label(row.try_get("test_type")?, "test_type")?,
            date: row.try_get("date")?,
            marked_by: row.try_get("marked_by")?,
            center: row.try_get("center")?,
            remarks: row.try_get("remarks")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Record for TestScore {
    const TABLE: &'static str = "test_scores";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "student_id",
        "subject",
        "score",
        "max_score",
        "test_type",
        "date",
        "marked_by",
        "center",
        "remarks",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.into(),
            self.student_id.into(),
            self.subject.into(),
            self.score.into(),
            self.max_score.into(),
            self.test_type.into(),
            self.date.into(),
            self.marked_by.into(),
            self.center.clone().into(),
            self.remarks.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_nearest() {
        assert_eq!(percentage(45.0, 50.0), 90);
        assert_eq!(percentage(2.0, 3.0), 67);
        assert_eq!(percentage(10.0, 0.0), 0);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(grade(90), "A+");
        assert_eq!(grade(89), "A");
        assert_eq!(grade(70), "B+");
        assert_eq!(grade(60), "B");
        assert_eq!(grade(50), "C");
        assert_eq!(grade(40), "D");
        assert_eq!(grade(39), "F");
    }
}
