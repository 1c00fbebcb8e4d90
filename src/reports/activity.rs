use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::{Family, Student, TestScore};

pub const RECENT_STUDENTS: usize = 3;
pub const RECENT_TESTS: usize = 2;
pub const RECENT_FAMILIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Student,
    Test,
    Family,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub time: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

/// Relative age of an event, in whole hours under a day and whole days beyond
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - created_at).num_hours();
    if hours < 1 {
        return "Just now".to_string();
    }
    if hours < 24 {
        return format!("{hours} hours ago");
    }
    match hours / 24 {
        1 => "1 day ago".to_string(),
        days => format!("{days} days ago"),
    }
}

fn newest<T>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>, take: usize) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    sorted.truncate(take);
    sorted
}

/// Merge the newest enrollments, test results and family registrations.
///
/// `scores` pairs each test score with its student's name. Entries with equal
/// timestamps keep the order students, tests, families.
pub fn recent_activity(
    students: &[Student],
    scores: &[(TestScore, String)],
    families: &[Family],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<Activity> {
    let mut feed = Vec::new();

    for student in newest(students, |s| s.created_at, RECENT_STUDENTS) {
        feed.push(Activity {
            kind: ActivityKind::Student,
            message: format!("New student {} enrolled in {}", student.name, student.education_level),
            time: time_ago(student.created_at, now),
            status: "success",
            created_at: student.created_at,
        });
    }
    for (score, student_name) in newest(scores, |(s, _)| s.created_at, RECENT_TESTS) {
        feed.push(Activity {
            kind: ActivityKind::Test,
            message: format!("{} completed {} test", student_name, score.subject),
            time: time_ago(score.created_at, now),
            status: "success",
            created_at: score.created_at,
        });
    }
    for family in newest(families, |f| f.created_at, RECENT_FAMILIES) {
        feed.push(Activity {
            kind: ActivityKind::Family,
            message: format!("New family registered: {}", family.name),
            time: time_ago(family.created_at, now),
            status: "info",
            created_at: family.created_at,
        });
    }

    feed.sort_by_key(|a| std::cmp::Reverse(a.created_at));
    feed.truncate(limit);
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{EducationLevel, Gender, Subject, TestType};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn student(name: &str, created_at: DateTime<Utc>) -> Student {
        Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            family_id: Uuid::new_v4(),
            center: "Delhi Center".to_string(),
            education_level: EducationLevel::Class3,
            age: 9,
            gender: Gender::Female,
            enrollment_date: created_at,
            is_active: true,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn family(name: &str, created_at: DateTime<Utc>) -> Family {
        let mut f = Family::new(
            name.to_string(),
            "9876543210".to_string(),
            "Delhi Center".to_string(),
            "45 Park Road, Delhi".to_string(),
            Uuid::new_v4(),
        );
        f.created_at = created_at;
        f
    }

    fn score(created_at: DateTime<Utc>) -> TestScore {
        TestScore {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            subject: Subject::Science,
            score: 72.0,
            max_score: 100.0,
            test_type: TestType::Quiz,
            date: created_at,
            marked_by: Uuid::new_v4(),
            center: "Delhi Center".to_string(),
            remarks: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_time_ago_buckets() {
        let now = now();
        assert_eq!(time_ago(now - Duration::minutes(59), now), "Just now");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::hours(30), now), "1 day ago");
        assert_eq!(time_ago(now - Duration::days(4), now), "4 days ago");
    }

    #[test]
    fn test_feed_is_merged_newest_first() {
        let now = now();
        let students: Vec<_> = (1..=4)
            .map(|h| student(&format!("Student {h}"), now - Duration::hours(h * 10)))
            .collect();
        let scores = vec![(score(now - Duration::hours(15)), "Priya".to_string())];
        let families = vec![family("Verma Family", now - Duration::hours(1))];

        let feed = recent_activity(&students, &scores, &families, now, 5);
        assert_eq!(feed.len(), 5);
        assert_eq!(feed[0].kind, ActivityKind::Family);
        assert_eq!(feed[0].time, "1 hours ago");
        assert_eq!(feed[1].message, "New student Student 1 enrolled in Class 3");
        assert_eq!(feed[2].kind, ActivityKind::Test);
        assert_eq!(feed[2].message, "Priya completed Science test");
        assert_eq!(feed[4].message, "New student Student 3 enrolled in Class 3");
        assert!(feed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn test_feed_keeps_source_order_on_ties() {
        let now = now();
        let at = now - Duration::days(2);
        let feed = recent_activity(
            &[student("Aarav", at)],
            &[(score(at), "Aarav".to_string())],
            &[family("Kumar Family", at)],
            now,
            5,
        );
        let kinds: Vec<_> = feed.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActivityKind::Student, ActivityKind::Test, ActivityKind::Family]);
        assert_eq!(feed[2].message, "New family registered: Kumar Family");
        assert_eq!(feed[2].status, "info");
    }
}
