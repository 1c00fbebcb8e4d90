use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::models::{Attendance, Family, Student, TestScore, User, Woman};
use super::record::Record;
use super::store::{Store, StoreError, Table};
use crate::config::DatabaseConfig;
use crate::filter::filter_order::FilterOrder;
use crate::filter::filter_where::{bind_value, FilterWhere};
use crate::filter::Filter;

/// Postgres-backed table for one record type
pub struct PgTable<T: Record> {
    pool: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> PgTable<T> {
    fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    fn select(filter: &Filter) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        filter.validate(T::COLUMNS)?;
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE));
        FilterWhere::push(&mut qb, &filter.conditions);
        FilterOrder::push(&mut qb, &filter.order, filter.limit, filter.offset);
        Ok(qb)
    }
}

#[async_trait]
impl<T: Record> Table<T> for PgTable<T> {
    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let mut qb = Self::select(filter)?;
        let rows = qb.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, filter: &Filter) -> Result<i64, StoreError> {
        filter.validate(T::COLUMNS)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
        FilterWhere::push(&mut qb, &filter.conditions);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let mut qb = Self::select(&Filter::new().eq("id", id))?;
        let row = qb.build_query_as::<T>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn insert(&self, record: &T) -> Result<(), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        for (i, value) in record.values().iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            bind_value(&mut qb, value);
        }
        qb.push(")");
        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, record: &T) -> Result<(), StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", T::TABLE));
        let values = record.values();
        // Skip id, it is the first column
        for (i, (column, value)) in T::COLUMNS.iter().zip(values.iter()).skip(1).enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(format!("\"{column}\" = "));
            bind_value(&mut qb, value);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(record.id());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} {}", T::TABLE, record.id())));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", T::TABLE))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, StoreError> {
        filter.validate(T::COLUMNS)?;
        let mut qb = QueryBuilder::<Postgres>::new(format!("DELETE FROM {}", T::TABLE));
        FilterWhere::push(&mut qb, &filter.conditions);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct PgStore {
    pool: PgPool,
    users: PgTable<User>,
    families: PgTable<Family>,
    students: PgTable<Student>,
    women: PgTable<Woman>,
    attendance: PgTable<Attendance>,
    test_scores: PgTable<TestScore>,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await?;
        info!("Connected to Postgres (max_connections={})", config.max_connections);
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            users: PgTable::new(pool.clone()),
            families: PgTable::new(pool.clone()),
            students: PgTable::new(pool.clone()),
            women: PgTable::new(pool.clone()),
            attendance: PgTable::new(pool.clone()),
            test_scores: PgTable::new(pool.clone()),
            pool,
        }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
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
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
