use sqlx::{Postgres, QueryBuilder};

use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    }

    /// Append ORDER BY, LIMIT and OFFSET
    pub fn push(qb: &mut QueryBuilder<'_, Postgres>, infos: &[FilterOrderInfo], limit: Option<i64>, offset: Option<i64>) {
        qb.push(Self::generate(infos));
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        if let Some(offset) = offset {
            qb.push(" OFFSET ");
            qb.push_bind(offset);
        }
    }
}
