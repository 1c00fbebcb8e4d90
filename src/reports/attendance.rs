use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::{count_by, rate, GroupCount};
use crate::database::models::{Attendance, AttendanceStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_records: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub attendance_percentage: i64,
}

impl AttendanceSummary {
    pub fn from_records(records: &[Attendance]) -> Self {
        let present_count = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count();
        Self {
            total_records: records.len(),
            present_count,
            absent_count: records.len() - present_count,
            attendance_percentage: rate(present_count, records.len()),
        }
    }
}

/// Count per status, only statuses that occur
pub fn status_breakdown(records: &[Attendance]) -> Vec<GroupCount> {
    count_by(records, |r| r.status)
}

/// Present share of the given records; 0 when nothing was marked
pub fn attendance_rate(records: &[Attendance]) -> i64 {
    AttendanceSummary::from_records(records).attendance_percentage
}

/// Present share over the `limit` most recent records of one student
pub fn recent_rate(records: &[Attendance], student_id: Uuid, limit: usize) -> i64 {
    let mut own: Vec<&Attendance> = records.iter().filter(|r| r.student_id == student_id).collect();
    own.sort_by(|a, b| b.date.cmp(&a.date));
    own.truncate(limit);
    let present = own.iter().filter(|r| r.status == AttendanceStatus::Present).count();
    rate(present, own.len())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub present: usize,
    pub absent: usize,
    pub total: usize,
    pub rate: i64,
}

/// Per-day tallies, newest day first
pub fn daily_rows(records: &[Attendance], limit: usize) -> Vec<DailyAttendance> {
    let mut days: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for record in records {
        let day = days.entry(record.date).or_default();
        match record.status {
            AttendanceStatus::Present => day.0 += 1,
            AttendanceStatus::Absent => day.1 += 1,
        }
    }
    days.into_iter()
        .rev()
        .take(limit)
        .map(|(date, (present, absent))| DailyAttendance {
            date,
            present,
            absent,
            total: present + absent,
            rate: rate(present, present + absent),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
    pub total_sessions: usize,
    pub average_attendance: i64,
    pub students_tracked: usize,
}

impl AttendanceReport {
    pub fn from_records(records: &[Attendance]) -> Self {
        let students: HashSet<Uuid> = records.iter().map(|r| r.student_id).collect();
        Self {
            total_sessions: records.len(),
            average_attendance: attendance_rate(records),
            students_tracked: students.len(),
        }
    }
}

/// Records grouped by student, each group newest first
pub fn by_student(records: &[Attendance]) -> HashMap<Uuid, Vec<&Attendance>> {
    let mut grouped: HashMap<Uuid, Vec<&Attendance>> = HashMap::new();
    for record in records {
        grouped.entry(record.student_id).or_default().push(record);
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| b.date.cmp(&a.date));
    }
    grouped
}
