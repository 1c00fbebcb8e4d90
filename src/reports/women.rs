use std::collections::BTreeMap;

use serde::Serialize;

use super::{count_by, mean, rate, round_to, GroupCount};
use crate::database::models::{JobStatus, TrainingStatus, Woman};

pub fn employed_count(women: &[Woman]) -> usize {
    women.iter().filter(|w| w.job_status.is_employed()).count()
}

/// Self employed or employed share; 0 for an empty set
pub fn employment_rate(women: &[Woman]) -> i64 {
    rate(employed_count(women), women.len())
}

pub fn training_completion_rate(women: &[Woman]) -> i64 {
    let completed = women
        .iter()
        .filter(|w| w.training_status == TrainingStatus::Completed)
        .count();
    rate(completed, women.len())
}

/// Skill counts, most common first
pub fn skill_breakdown(women: &[Woman]) -> Vec<GroupCount> {
    let mut counts = count_by(women, |w| w.skill);
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

pub fn training_breakdown(women: &[Woman]) -> Vec<GroupCount> {
    count_by(women, |w| w.training_status)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobGroup {
    pub label: String,
    pub count: usize,
    pub avg_income: f64,
}

/// Count and mean monthly income per job status
pub fn job_breakdown(women: &[Woman]) -> Vec<JobGroup> {
    let mut groups: BTreeMap<JobStatus, Vec<f64>> = BTreeMap::new();
    for woman in women {
        groups.entry(woman.job_status).or_default().push(woman.monthly_income);
    }
    groups
        .into_iter()
        .map(|(status, incomes)| JobGroup {
            label: status.to_string(),
            count: incomes.len(),
            avg_income: round_to(mean(incomes).unwrap_or(0.0), 2),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WomenStats {
    pub total_women: usize,
    pub employed_women: usize,
    pub employment_rate: i64,
    pub training_completion_rate: i64,
    pub skill_stats: Vec<GroupCount>,
    pub training_stats: Vec<GroupCount>,
    pub job_stats: Vec<JobGroup>,
}

impl WomenStats {
    pub fn from_records(women: &[Woman]) -> Self {
        Self {
            total_women: women.len(),
            employed_women: employed_count(women),
            employment_rate: employment_rate(women),
            training_completion_rate: training_completion_rate(women),
            skill_stats: skill_breakdown(women),
            training_stats: training_breakdown(women),
            job_stats: job_breakdown(women),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Skill;
    use chrono::Utc;
    use uuid::Uuid;

    fn woman(skill: Skill, training: TrainingStatus, job: JobStatus, income: f64) -> Woman {
        let now = Utc::now();
        Woman {
            id: Uuid::new_v4(),
            name: "Kavita Devi".to_string(),
            family_id: Uuid::new_v4(),
            age: 30,
            skill,
            training_status: training,
            training_start_date: None,
            training_end_date: None,
            job_status: job,
            monthly_income: income,
            center: "Mumbai Center".to_string(),
            contact_number: None,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rates_are_zero_without_women() {
        let stats = WomenStats::from_records(&[]);
        assert_eq!(stats.total_women, 0);
        assert_eq!(stats.employment_rate, 0);
        assert_eq!(stats.training_completion_rate, 0);
        assert!(stats.skill_stats.is_empty());
        assert!(stats.job_stats.is_empty());
    }

    #[test]
    fn test_rates_and_breakdowns() {
        let women = vec![
            woman(Skill::Tailoring, TrainingStatus::Completed, JobStatus::SelfEmployed, 15000.0),
            woman(Skill::Cooking, TrainingStatus::InProgress, JobStatus::SeekingEmployment, 0.0),
            woman(Skill::Tailoring, TrainingStatus::Completed, JobStatus::Employed, 12000.0),
            woman(Skill::Handicrafts, TrainingStatus::Started, JobStatus::Unemployed, 0.0),
        ];
        let stats = WomenStats::from_records(&women);
        assert_eq!(stats.employed_women, 2);
        assert_eq!(stats.employment_rate, 50);
        assert_eq!(stats.training_completion_rate, 50);

        assert_eq!(stats.skill_stats[0].label, "Tailoring");
        assert_eq!(stats.skill_stats[0].count, 2);

        let employed = stats.job_stats.iter().find(|g| g.label == "Employed").unwrap();
        assert_eq!(employed.count, 1);
        assert_eq!(employed.avg_income, 12000.0);
    }
}
