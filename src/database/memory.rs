use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Attendance, Family, Student, TestScore, User, Woman};
use super::record::Record;
use super::store::{Store, StoreError, Table};
use crate::filter::filter_match::FilterMatch;
use crate::filter::{Filter, FilterRecord};

/// In-process table with the same filter and uniqueness semantics as Postgres
pub struct MemTable<T: Record> {
    rows: RwLock<Vec<T>>,
}

impl<T: Record> Default for MemTable<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> MemTable<T> {
    fn check_unique(rows: &[T], record: &T) -> Result<(), StoreError> {
        for (constraint, columns) in T::UNIQUE {
            let clash = rows.iter().any(|existing| {
                existing.id() != record.id()
                    && columns.iter().all(|column| {
                        let value = record.field(column);
                        !value.is_null() && existing.field(column) == value
                    })
            });
            if clash {
                return Err(StoreError::UniqueViolation {
                    constraint: constraint.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Table<T> for MemTable<T> {
    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        filter.validate(T::COLUMNS)?;
        let rows = self.rows.read().await;
        Ok(FilterMatch::apply(&rows, filter))
    }

    async fn count(&self, filter: &Filter) -> Result<i64, StoreError> {
        filter.validate(T::COLUMNS)?;
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| FilterMatch::matches(*r, &filter.conditions)).count() as i64)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::UniqueViolation {
                constraint: format!("{}_pkey", T::TABLE),
            });
        }
        Self::check_unique(&rows, record)?;
        rows.push(record.clone());
        Ok(())
    }

    async fn update(&self, record: &T) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        Self::check_unique(&rows, record)?;
        match rows.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{} {}", T::TABLE, record.id()))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        Ok(rows.len() < before)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, StoreError> {
        filter.validate(T::COLUMNS)?;
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !FilterMatch::matches(r, &filter.conditions));
        Ok((before - rows.len()) as u64)
    }
}

/// Store used by tests and by development servers without a database
#[derive(Default)]
pub struct MemoryStore {
    users: MemTable<User>,
    families: MemTable<Family>,
    students: MemTable<Student>,
    women: MemTable<Woman>,
    attendance: MemTable<Attendance>,
    test_scores: MemTable<TestScore>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn users(&self) -> &dyn Table<User> {
        &self.users
    }

    fn families(&self) -> &dyn Table<Family> {
        &self.families
    }

    fn students(&self) -> &dyn Table<Student> {
        &self.students
    }

    fn women(&self) -> &dyn Table<Woman> {
        &self.women
    }

    fn attendance(&self) -> &dyn Table<Attendance> {
        &self.attendance
    }

    fn test_scores(&self) -> &dyn Table<TestScore> {
        &self.test_scores
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
