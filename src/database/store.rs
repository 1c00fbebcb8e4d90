use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Attendance, Family, Student, TestScore, User, Woman};
use super::record::Record;
use crate::filter::{Filter, FilterError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // 23505 = unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unique").to_string(),
                };
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Sqlx(other),
        }
    }
}

/// One persisted collection
#[async_trait]
pub trait Table<T: Record>: Send + Sync {
    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<i64, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    async fn insert(&self, record: &T) -> Result<(), StoreError>;

    /// Replace the stored row with the same id
    async fn update(&self, record: &T) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_where(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        let mut rows = self.find(&filter.clone().limit(1)).await?;
        Ok(rows.pop())
    }
}

/// Explicitly constructed record store handed to the router at startup
#[async_trait]
pub trait Store: Send + Sync {
    fn users(&self) -> &dyn Table<User>;

    fn families(&self) -> &dyn Table<Family>;

    fn students(&self) -> &dyn Table<Student>;

    fn women(&self) -> &dyn Table<Woman>;

    fn attendance(&self) -> &dyn Table<Attendance>;

    fn test_scores(&self) -> &dyn Table<TestScore>;

    /// Liveness probe
    async fn ping(&self) -> Result<(), StoreError>;
}
