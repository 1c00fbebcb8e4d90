use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, Utc};
use serde::Serialize;

use crate::database::models::{EducationLevel, Family, Student, Woman};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterRollup {
    pub center: String,
    pub families: usize,
    pub students: usize,
    pub women: usize,
    pub total_members: usize,
}

/// Families, students and women per center, most families first.
///
/// Only centers that have at least one family appear, ties keep center name order.
pub fn center_rollup(families: &[Family], students: &[Student], women: &[Woman]) -> Vec<CenterRollup> {
    let mut centers: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
    for family in families {
        centers.entry(family.center.as_str()).or_default().0 += 1;
    }
    for student in students {
        if let Some(row) = centers.get_mut(student.center.as_str()) {
            row.1 += 1;
        }
    }
    for woman in women {
        if let Some(row) = centers.get_mut(woman.center.as_str()) {
            row.2 += 1;
        }
    }

    let mut rollup: Vec<CenterRollup> = centers
        .into_iter()
        .map(|(center, (families, students, women))| CenterRollup {
            center: center.to_string(),
            families,
            students,
            women,
            total_members: students + women,
        })
        .collect();
    rollup.sort_by(|a, b| b.families.cmp(&a.families));
    rollup
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub families: usize,
}

/// Start of the trailing window `months` back from `now`
pub fn months_ago(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months)).unwrap_or(now)
}

/// New families per calendar month over the trailing window, oldest first
pub fn monthly_growth(families: &[Family], now: DateTime<Utc>, months: u32) -> Vec<MonthlyCount> {
    let since = months_ago(now, months);
    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for family in families.iter().filter(|f| f.created_at >= since) {
        *buckets
            .entry((family.created_at.year(), family.created_at.month()))
            .or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month), families)| MonthlyCount { year, month, families })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCount {
    pub education_level: EducationLevel,
    pub count: usize,
}

/// Students per education level, Nursery through Class 12
pub fn level_distribution(students: &[Student]) -> Vec<LevelCount> {
    let mut levels: BTreeMap<EducationLevel, usize> = BTreeMap::new();
    for student in students {
        *levels.entry(student.education_level).or_default() += 1;
    }
    levels
        .into_iter()
        .map(|(education_level, count)| LevelCount { education_level, count })
        .collect()
}
