//! CSV rendering of populated record sets.
//!
//! Every field is wrapped in double quotes and embedded quotes are doubled.
//! Missing related records render as an empty field.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::database::models::{AttendanceView, FamilyView, StudentView, TestScoreView, WomanView};

pub const EMPTY_EXPORT: &str = "No data available";

pub const FAMILY_HEADER: &[&str] = &["Name", "Contact", "Center", "Address", "Total Members", "Created By", "Created At"];
pub const STUDENT_HEADER: &[&str] = &[
    "Name",
    "Family",
    "Center",
    "Education Level",
    "Age",
    "Gender",
    "Created By",
    "Created At",
];
pub const WOMAN_HEADER: &[&str] = &[
    "Name",
    "Family",
    "Age",
    "Skill",
    "Training Status",
    "Job Status",
    "Monthly Income",
    "Center",
    "Created At",
];
pub const ATTENDANCE_HEADER: &[&str] = &["Student", "Education Level", "Date", "Status", "Center", "Marked By", "Notes"];
pub const TEST_SCORE_HEADER: &[&str] = &[
    "Student",
    "Education Level",
    "Subject",
    "Score",
    "Max Score",
    "Percentage",
    "Test Type",
    "Date",
    "Center",
    "Marked By",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Families,
    Students,
    Women,
    Attendance,
    TestScores,
}

impl ExportKind {
    pub fn filename(&self) -> &'static str {
        match self {
            ExportKind::Families => "families_export.csv",
            ExportKind::Students => "students_export.csv",
            ExportKind::Women => "women_export.csv",
            ExportKind::Attendance => "attendance_export.csv",
            ExportKind::TestScores => "testscores_export.csv",
        }
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "families" => Ok(ExportKind::Families),
            "students" => Ok(ExportKind::Students),
            "women" => Ok(ExportKind::Women),
            "attendance" => Ok(ExportKind::Attendance),
            "testscores" => Ok(ExportKind::TestScores),
            other => Err(format!("Invalid export type '{other}'")),
        }
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn day(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Header line plus one quoted line per row, or the empty marker
pub fn render(header: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return EMPTY_EXPORT.to_string();
    }
    let mut out = header.join(",");
    for row in rows {
        out.push('\n');
        out.push_str(&row.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","));
    }
    out
}

pub fn families(records: &[FamilyView]) -> String {
    let rows = records
        .iter()
        .map(|v| {
            vec![
                v.family.name.clone(),
                v.family.contact.clone(),
                v.family.center.clone(),
                v.family.address.clone(),
                v.total_members.to_string(),
                v.creator.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
                day(v.family.created_at),
            ]
        })
        .collect();
    render(FAMILY_HEADER, rows)
}

pub fn students(records: &[StudentView]) -> String {
    let rows = records
        .iter()
        .map(|v| {
            vec![
                v.student.name.clone(),
                v.family.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
                v.student.center.clone(),
                v.student.education_level.to_string(),
                v.student.age.to_string(),
                v.student.gender.to_string(),
                v.creator.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
                day(v.student.created_at),
            ]
        })
        .collect();
    render(STUDENT_HEADER, rows)
}

pub fn women(records: &[WomanView]) -> String {
    let rows = records
        .iter()
        .map(|v| {
            vec![
                v.woman.name.clone(),
                v.family.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
                v.woman.age.to_string(),
                v.woman.skill.to_string(),
                v.woman.training_status.to_string(),
                v.woman.job_status.to_string(),
                v.woman.monthly_income.to_string(),
                v.woman.center.clone(),
                day(v.woman.created_at),
            ]
        })
        .collect();
    render(WOMAN_HEADER, rows)
}

pub fn attendance(records: &[AttendanceView]) -> String {
    let rows = records
        .iter()
        .map(|v| {
            vec![
                v.student.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
                v.student.as_ref().map(|s| s.education_level.to_string()).unwrap_or_default(),
                v.attendance.date.to_string(),
                v.attendance.status.to_string(),
                v.attendance.center.clone(),
                v.marker.as_ref().map(|m| m.name.clone()).unwrap_or_default(),
                v.attendance.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render(ATTENDANCE_HEADER, rows)
}

pub fn test_scores(records: &[TestScoreView]) -> String {
    let rows = records
        .iter()
        .map(|v| {
            vec![
                v.student.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
                v.student.as_ref().map(|s| s.education_level.to_string()).unwrap_or_default(),
                v.test_score.subject.to_string(),
                v.test_score.score.to_string(),
                v.test_score.max_score.to_string(),
                format!("{}%", v.percentage),
                v.test_score.test_type.to_string(),
                day(v.test_score.date),
                v.test_score.center.clone(),
                v.marker.as_ref().map(|m| m.name.clone()).unwrap_or_default(),
            ]
        })
        .collect();
    render(TEST_SCORE_HEADER, rows)
}
