use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use clap::Args;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::user::create_account;
use crate::cli::utils::{connect, output_details, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{
    Attendance, AttendanceStatus, EducationLevel, Family, Gender, JobStatus, Role, Skill, Student, Subject, TestScore,
    TestType, TrainingStatus, User, Woman,
};
use crate::database::models::user::normalize_email;
use crate::database::Store;
use crate::filter::Filter;

const ATTENDANCE_DAYS: u64 = 30;
const SCORE_SUBJECTS: &[Subject] = &[Subject::Mathematics, Subject::English, Subject::Science, Subject::Hindi];
const SCORE_TEST_TYPES: &[TestType] = &[TestType::Quiz, TestType::UnitTest, TestType::MidTerm, TestType::FinalExam];
/// Tests per subject, spaced this many days apart
const TESTS_PER_SUBJECT: u64 = 3;
const TEST_SPACING_DAYS: u64 = 15;

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long, help = "Fixture file", default_value = "fixtures/seed.yaml")]
    pub file: PathBuf,

    #[arg(long, help = "Delete all existing records first")]
    pub reset: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedFixture {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub families: Vec<SeedFamily>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub center: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFamily {
    pub name: String,
    pub contact: String,
    pub center: String,
    pub address: String,
    /// Email of a fixture user
    pub created_by: String,
    #[serde(default)]
    pub students: Vec<SeedStudent>,
    #[serde(default)]
    pub women: Vec<SeedWoman>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStudent {
    pub name: String,
    pub education_level: EducationLevel,
    pub age: i32,
    pub gender: Gender,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedWoman {
    pub name: String,
    pub age: i32,
    pub skill: Skill,
    #[serde(default = "not_started")]
    pub training_status: TrainingStatus,
    pub training_start_date: Option<NaiveDate>,
    pub training_end_date: Option<NaiveDate>,
    #[serde(default = "unemployed")]
    pub job_status: JobStatus,
    #[serde(default)]
    pub monthly_income: f64,
    pub contact_number: Option<String>,
}

fn not_started() -> TrainingStatus {
    TrainingStatus::NotStarted
}

fn unemployed() -> JobStatus {
    JobStatus::Unemployed
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub users: usize,
    pub families: usize,
    pub students: usize,
    pub women: usize,
    pub attendance: usize,
    pub test_scores: usize,
}

pub async fn handle(args: SeedArgs, database_url: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file).with_context(|| format!("failed to read {}", args.file.display()))?;
    let fixture: SeedFixture =
        serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {}", args.file.display()))?;

    let store = connect(database_url).await?;
    let summary = seed_store(&store, &fixture, args.reset, Utc::now().date_naive()).await?;

    output_success(
        &output_format,
        &format!("Seeded from {}", args.file.display()),
        Some(json!({ "summary": summary })),
    )?;
    output_details(
        &output_format,
        &[
            ("users", summary.users.to_string()),
            ("families", summary.families.to_string()),
            ("students", summary.students.to_string()),
            ("women", summary.women.to_string()),
            ("attendance", summary.attendance.to_string()),
            ("test scores", summary.test_scores.to_string()),
        ],
    );
    Ok(())
}

/// Remove every record, children before parents
pub async fn reset_store(store: &dyn Store) -> anyhow::Result<()> {
    let all = Filter::new();
    store.attendance().delete_where(&all).await?;
    store.test_scores().delete_where(&all).await?;
    store.students().delete_where(&all).await?;
    store.women().delete_where(&all).await?;
    store.families().delete_where(&all).await?;
    store.users().delete_where(&all).await?;
    Ok(())
}

/// Load `fixture` and synthesize attendance and scores ending at `today`
pub async fn seed_store(
    store: &dyn Store,
    fixture: &SeedFixture,
    reset: bool,
    today: NaiveDate,
) -> anyhow::Result<SeedSummary> {
    if reset {
        reset_store(store).await?;
        tracing::info!("cleared existing records");
    }

    let mut summary = SeedSummary::default();
    let mut users: HashMap<String, User> = HashMap::new();
    for seed in &fixture.users {
        let user = create_account(store, &seed.name, &seed.email, &seed.password, seed.role, seed.center.clone())
            .await
            .with_context(|| format!("failed to create user {}", seed.email))?;
        users.insert(user.email.clone(), user);
        summary.users += 1;
    }

    let mut students = Vec::new();
    for seed in &fixture.families {
        let creator = users
            .get(&normalize_email(&seed.created_by))
            .with_context(|| format!("family {} references unknown user {}", seed.name, seed.created_by))?;

        let family = Family::new(
            seed.name.clone(),
            seed.contact.clone(),
            seed.center.clone(),
            seed.address.clone(),
            creator.id,
        );
        store.families().insert(&family).await?;
        summary.families += 1;

        for s in &seed.students {
            let now = Utc::now();
            let student = Student {
                id: Uuid::new_v4(),
                name: s.name.clone(),
                family_id: family.id,
                center: family.center.clone(),
                education_level: s.education_level,
                age: s.age,
                gender: s.gender,
                enrollment_date: now,
                is_active: true,
                created_by: Some(creator.id),
                created_at: now,
                updated_at: now,
            };
            store.students().insert(&student).await?;
            students.push(student);
            summary.students += 1;
        }

        for w in &seed.women {
            let now = Utc::now();
            let woman = Woman {
                id: Uuid::new_v4(),
                name: w.name.clone(),
                family_id: family.id,
                age: w.age,
                skill: w.skill,
                training_status: w.training_status,
                training_start_date: w.training_start_date.map(midnight),
                training_end_date: w.training_end_date.map(midnight),
                job_status: w.job_status,
                monthly_income: w.monthly_income,
                center: family.center.clone(),
                contact_number: w.contact_number.clone(),
                is_active: true,
                created_by: Some(creator.id),
                created_at: now,
                updated_at: now,
            };
            store.women().insert(&woman).await?;
            summary.women += 1;
        }
    }

    for (index, student) in students.iter().enumerate() {
        let Some(marker) = marker_for(&users, &student.center) else {
            tracing::warn!(student = %student.name, "no user available to mark records; skipping");
            continue;
        };
        summary.attendance += seed_attendance(store, student, index, marker, today).await?;
        summary.test_scores += seed_scores(store, student, index, marker, today).await?;
    }

    tracing::info!(?summary, "seed complete");
    Ok(summary)
}

/// The center's tutor, else any admin
fn marker_for(users: &HashMap<String, User>, center: &str) -> Option<Uuid> {
    let mut tutors: Vec<&User> = users
        .values()
        .filter(|u| u.role == Role::Tutor && u.center.as_deref() == Some(center))
        .collect();
    tutors.sort_by(|a, b| a.email.cmp(&b.email));
    tutors
        .first()
        .map(|u| u.id)
        .or_else(|| users.values().find(|u| u.role == Role::Admin).map(|u| u.id))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Roughly one absence in seven, spread so no two students share a pattern
fn is_present(day_offset: u64, student_index: usize) -> bool {
    (day_offset * 3 + student_index as u64 * 5) % 7 != 0
}

/// Score out of 100 in the 60..100 band
fn synthetic_score(student_index: usize, subject_index: usize, test_index: u64) -> f64 {
    let spread = (student_index as u64 * 13 + subject_index as u64 * 7 + test_index * 11) % 40;
    (60 + spread) as f64
}

async fn seed_attendance(
    store: &dyn Store,
    student: &Student,
    index: usize,
    marker: Uuid,
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for offset in 0..ATTENDANCE_DAYS {
        let Some(date) = today.checked_sub_days(Days::new(offset)) else {
            continue;
        };
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        let now = Utc::now();
        let record = Attendance {
            id: Uuid::new_v4(),
            student_id: student.id,
            date,
            status: if is_present(offset, index) {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
            marked_by: marker,
            center: student.center.clone(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        store.attendance().insert(&record).await?;
        inserted += 1;
    }
    Ok(inserted)
}

async fn seed_scores(
    store: &dyn Store,
    student: &Student,
    index: usize,
    marker: Uuid,
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let mut inserted = 0;
    for (subject_index, subject) in SCORE_SUBJECTS.iter().enumerate() {
        for test_index in 0..TESTS_PER_SUBJECT {
            let Some(day) = today.checked_sub_days(Days::new(test_index * TEST_SPACING_DAYS)) else {
                continue;
            };
            let now = Utc::now();
            let score = TestScore {
                id: Uuid::new_v4(),
                student_id: student.id,
                subject: *subject,
                score: synthetic_score(index, subject_index, test_index),
                max_score: 100.0,
                test_type: SCORE_TEST_TYPES[(index + subject_index + test_index as usize) % SCORE_TEST_TYPES.len()],
                date: midnight(day),
                marked_by: marker,
                center: student.center.clone(),
                remarks: None,
                created_at: now,
                updated_at: now,
            };
            store.test_scores().insert(&score).await?;
            inserted += 1;
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    const FIXTURE: &str = r#"
users:
  - { name: Admin User, email: admin@kalamfoundation.org, password: admin123, role: admin }
  - { name: Priya Sharma, email: priya@kalamfoundation.org, password: tutor123, role: tutor, center: Delhi Center }
families:
  - name: Sharma Family
    contact: "9876543210"
    center: Delhi Center
    address: 123 Main Street, New Delhi
    createdBy: Priya@kalamfoundation.org
    students:
      - { name: Arjun Sharma, educationLevel: Class 5, age: 10, gender: Male }
    women:
      - name: Sunita Sharma
        age: 35
        skill: Beauty & Wellness
        trainingStartDate: 2023-01-15
        jobStatus: Self Employed
        monthlyIncome: 15000
"#;

    fn fixture() -> SeedFixture {
        serde_yaml::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn test_fixture_parses_labels_and_defaults() {
        let fixture = fixture();
        let woman = &fixture.families[0].women[0];
        assert_eq!(woman.skill, Skill::BeautyWellness);
        assert_eq!(woman.training_status, TrainingStatus::NotStarted);
        assert_eq!(woman.job_status, JobStatus::SelfEmployed);
        assert_eq!(woman.monthly_income, 15000.0);
        assert_eq!(woman.training_start_date, NaiveDate::from_ymd_opt(2023, 1, 15));
    }

    #[tokio::test]
    async fn test_seed_synthesizes_weekday_attendance_and_scores() {
        let store = MemoryStore::new();
        // A Monday; the 30 days back to Sunday 4 Feb hold 21 weekdays
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let summary = seed_store(&store, &fixture(), false, today).await.unwrap();

        assert_eq!(summary.users, 2);
        assert_eq!(summary.families, 1);
        assert_eq!(summary.students, 1);
        assert_eq!(summary.women, 1);
        assert_eq!(summary.attendance, 21);
        assert_eq!(summary.test_scores, 12);

        let student = store.students().find(&Filter::new()).await.unwrap().remove(0);
        assert_eq!(student.center, "Delhi Center");

        let priya = store
            .users()
            .find_one(&Filter::new().eq("email", "priya@kalamfoundation.org"))
            .await
            .unwrap()
            .unwrap();
        let records = store.attendance().find(&Filter::new()).await.unwrap();
        assert!(records.iter().all(|r| r.marked_by == priya.id));
        assert!(records.iter().any(|r| r.status == AttendanceStatus::Absent));

        let scores = store.test_scores().find(&Filter::new()).await.unwrap();
        assert!(scores.iter().all(|s| (60.0..100.0).contains(&s.score)));
    }

    #[tokio::test]
    async fn test_reseed_requires_reset() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        seed_store(&store, &fixture(), false, today).await.unwrap();

        // Users are unique by email
        assert!(seed_store(&store, &fixture(), false, today).await.is_err());

        let summary = seed_store(&store, &fixture(), true, today).await.unwrap();
        assert_eq!(summary.families, 1);
        assert_eq!(store.families().count(&Filter::new()).await.unwrap(), 1);
        assert_eq!(store.attendance().count(&Filter::new()).await.unwrap(), 21);
    }

    #[tokio::test]
    async fn test_unknown_creator_is_rejected() {
        let store = MemoryStore::new();
        let mut fixture = fixture();
        fixture.families[0].created_by = "nobody@kalamfoundation.org".to_string();
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let err = seed_store(&store, &fixture, false, today).await.unwrap_err();
        assert!(err.to_string().contains("unknown user"));
    }
}
