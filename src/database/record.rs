use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::filter::{FieldValue, FilterRecord};

/// A row type persisted in one table.
///
/// `COLUMNS` lists every persisted column, `id` first; `values` returns the
/// row's values in that same order. Both stores build on these two.
pub trait Record: Clone + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Named unique constraints over column sets
    const UNIQUE: &'static [(&'static str, &'static [&'static str])] = &[];

    fn id(&self) -> Uuid;

    fn values(&self) -> Vec<FieldValue>;
}

impl<T: Record> FilterRecord for T {
    fn field(&self, column: &str) -> FieldValue {
        match T::COLUMNS.iter().position(|c| *c == column) {
            Some(index) => self.values().swap_remove(index),
            None => FieldValue::Null,
        }
    }
}
