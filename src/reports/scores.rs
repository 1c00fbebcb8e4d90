use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{mean, round_to};
use crate::database::models::{Subject, TestScore, TestType};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestScore {
    pub subject: Subject,
    pub latest_score: f64,
    pub max_score: f64,
    pub date: DateTime<Utc>,
    pub test_type: TestType,
}

/// Most recent score per subject, subjects in declaration order
pub fn latest_by_subject(scores: &[TestScore]) -> Vec<LatestScore> {
    let mut latest: BTreeMap<Subject, &TestScore> = BTreeMap::new();
    for score in scores {
        latest
            .entry(score.subject)
            .and_modify(|current| {
                if score.date > current.date {
                    *current = score;
                }
            })
            .or_insert(score);
    }
    latest
        .into_values()
        .map(|s| LatestScore {
            subject: s.subject,
            latest_score: s.score,
            max_score: s.max_score,
            date: s.date,
            test_type: s.test_type,
        })
        .collect()
}

/// Newest score per student by test date
pub fn latest_by_student(scores: &[TestScore]) -> HashMap<Uuid, &TestScore> {
    let mut latest: HashMap<Uuid, &TestScore> = HashMap::new();
    for score in scores {
        latest
            .entry(score.student_id)
            .and_modify(|current| {
                if score.date > current.date {
                    *current = score;
                }
            })
            .or_insert(score);
    }
    latest
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAnalytics {
    pub subject: Subject,
    pub test_type: TestType,
    pub average_score: f64,
    pub average_percentage: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub total_tests: usize,
}

/// Aggregates per (subject, test type), ordered by subject then test type
pub fn analytics(scores: &[TestScore]) -> Vec<ScoreAnalytics> {
    let mut groups: BTreeMap<(Subject, TestType), Vec<&TestScore>> = BTreeMap::new();
    for score in scores {
        groups.entry((score.subject, score.test_type)).or_default().push(score);
    }
    groups
        .into_iter()
        .map(|((subject, test_type), group)| {
            let values = group.iter().map(|s| s.score);
            let percentages = group.iter().filter(|s| s.max_score > 0.0).map(|s| s.score / s.max_score * 100.0);
            ScoreAnalytics {
                subject,
                test_type,
                average_score: round_to(mean(values.clone()).unwrap_or(0.0), 2),
                average_percentage: round_to(mean(percentages).unwrap_or(0.0), 2),
                max_score: values.clone().fold(f64::MIN, f64::max),
                min_score: values.fold(f64::MAX, f64::min),
                total_tests: group.len(),
            }
        })
        .collect()
}

/// Mean raw score rounded to a whole number, 0 for no scores
pub fn average_score(scores: &[TestScore]) -> i64 {
    mean(scores.iter().map(|s| s.score)).unwrap_or(0.0).round() as i64
}
