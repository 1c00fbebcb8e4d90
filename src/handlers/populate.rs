// handlers/populate.rs - Resolve referenced records into API views
//
// Each helper issues one IN query per referenced collection, never one per row.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::database::models::{
    Attendance, AttendanceView, Family, FamilyRef, FamilyView, Student, StudentRef, StudentView, TestScore,
    TestScoreView, User, UserRef, Woman, WomanView,
};
use crate::database::{Record, Store, StoreError, Table};
use crate::filter::Filter;

fn distinct(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let set: HashSet<Uuid> = ids.collect();
    set.into_iter().collect()
}

async fn by_id<T: Record>(table: &dyn Table<T>, ids: Vec<Uuid>) -> Result<HashMap<Uuid, T>, StoreError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = table.find(&Filter::new().is_in("id", ids)).await?;
    Ok(rows.into_iter().map(|r| (r.id(), r)).collect())
}

pub async fn user_refs(store: &dyn Store, ids: impl Iterator<Item = Uuid>) -> Result<HashMap<Uuid, UserRef>, StoreError> {
    let users: HashMap<Uuid, User> = by_id(store.users(), distinct(ids)).await?;
    Ok(users.iter().map(|(id, u)| (*id, UserRef::from(u))).collect())
}

pub async fn families_by_id(store: &dyn Store, ids: impl Iterator<Item = Uuid>) -> Result<HashMap<Uuid, Family>, StoreError> {
    by_id(store.families(), distinct(ids)).await
}

pub async fn students_by_id(store: &dyn Store, ids: impl Iterator<Item = Uuid>) -> Result<HashMap<Uuid, Student>, StoreError> {
    by_id(store.students(), distinct(ids)).await
}

/// Active students plus active women per family
pub async fn member_counts(store: &dyn Store, family_ids: Vec<Uuid>) -> Result<HashMap<Uuid, i64>, StoreError> {
    if family_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let filter = Filter::new().is_in("family_id", family_ids).eq("is_active", true);
    let (students, women) = futures::try_join!(store.students().find(&filter), store.women().find(&filter))?;

    let mut counts: HashMap<Uuid, i64> = HashMap::new();
    for family_id in students.iter().map(|s| s.family_id).chain(women.iter().map(|w| w.family_id)) {
        *counts.entry(family_id).or_default() += 1;
    }
    Ok(counts)
}

pub async fn family_views(store: &dyn Store, families: Vec<Family>) -> Result<Vec<FamilyView>, StoreError> {
    let (counts, creators) = futures::try_join!(
        member_counts(store, families.iter().map(|f| f.id).collect()),
        user_refs(store, families.iter().filter_map(|f| f.created_by)),
    )?;
    Ok(families
        .into_iter()
        .map(|family| FamilyView {
            total_members: counts.get(&family.id).copied().unwrap_or(0),
            creator: family.created_by.and_then(|id| creators.get(&id).cloned()),
            family,
        })
        .collect())
}

pub async fn student_views(store: &dyn Store, students: Vec<Student>) -> Result<Vec<StudentView>, StoreError> {
    let (families, creators) = futures::try_join!(
        families_by_id(store, students.iter().map(|s| s.family_id)),
        user_refs(store, students.iter().filter_map(|s| s.created_by)),
    )?;
    Ok(students
        .into_iter()
        .map(|student| StudentView {
            family: families.get(&student.family_id).map(FamilyRef::from),
            creator: student.created_by.and_then(|id| creators.get(&id).cloned()),
            student,
        })
        .collect())
}

pub async fn woman_views(store: &dyn Store, women: Vec<Woman>) -> Result<Vec<WomanView>, StoreError> {
    let (families, creators) = futures::try_join!(
        families_by_id(store, women.iter().map(|w| w.family_id)),
        user_refs(store, women.iter().filter_map(|w| w.created_by)),
    )?;
    Ok(women
        .into_iter()
        .map(|woman| WomanView {
            training_duration: woman.training_duration_days(),
            family: families.get(&woman.family_id).map(FamilyRef::from),
            creator: woman.created_by.and_then(|id| creators.get(&id).cloned()),
            woman,
        })
        .collect())
}

pub async fn attendance_views(store: &dyn Store, records: Vec<Attendance>) -> Result<Vec<AttendanceView>, StoreError> {
    let (students, markers) = futures::try_join!(
        students_by_id(store, records.iter().map(|r| r.student_id)),
        user_refs(store, records.iter().map(|r| r.marked_by)),
    )?;
    Ok(records
        .into_iter()
        .map(|attendance| AttendanceView {
            student: students.get(&attendance.student_id).map(StudentRef::from),
            marker: markers.get(&attendance.marked_by).cloned(),
            attendance,
        })
        .collect())
}

pub fn test_score_view(test_score: TestScore, student: Option<StudentRef>, marker: Option<UserRef>) -> TestScoreView {
    TestScoreView {
        percentage: test_score.percentage(),
        grade: test_score.grade(),
        test_score,
        student,
        marker,
    }
}

pub async fn test_score_views(store: &dyn Store, scores: Vec<TestScore>) -> Result<Vec<TestScoreView>, StoreError> {
    let (students, markers) = futures::try_join!(
        students_by_id(store, scores.iter().map(|s| s.student_id)),
        user_refs(store, scores.iter().map(|s| s.marked_by)),
    )?;
    Ok(scores
        .into_iter()
        .map(|score| {
            let student = students.get(&score.student_id).map(StudentRef::from);
            let marker = markers.get(&score.marked_by).cloned();
            test_score_view(score, student, marker)
        })
        .collect())
}
