use std::cmp::Ordering;

use super::filter::Filter;
use super::types::{Condition, FieldValue, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

/// Column access for records evaluated in memory
pub trait FilterRecord {
    /// Value of `column`, `FieldValue::Null` when absent
    fn field(&self, column: &str) -> FieldValue;
}

/// Evaluates a `Filter` against in-memory records with the same semantics as the SQL rendering
pub struct FilterMatch;

impl FilterMatch {
    pub fn matches<R: FilterRecord>(record: &R, conditions: &[Condition]) -> bool {
        conditions.iter().all(|c| Self::matches_condition(record, c))
    }

    fn matches_condition<R: FilterRecord>(record: &R, condition: &Condition) -> bool {
        match condition {
            Condition::Where(info) => Self::matches_where(record, info),
            Condition::Any(inner) => inner.iter().any(|c| Self::matches_condition(record, c)),
        }
    }

    fn matches_where<R: FilterRecord>(record: &R, info: &FilterWhereInfo) -> bool {
        let value = record.field(&info.column);
        match info.operator {
            FilterOp::Eq if info.data.is_null() => value.is_null(),
            FilterOp::Neq if info.data.is_null() => !value.is_null(),
            // SQL comparisons against NULL are never true
            _ if value.is_null() => false,
            FilterOp::Eq => value.compare(&info.data) == Some(Ordering::Equal),
            FilterOp::Neq => matches!(value.compare(&info.data), Some(o) if o != Ordering::Equal),
            FilterOp::Gt => value.compare(&info.data) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(value.compare(&info.data), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => value.compare(&info.data) == Some(Ordering::Less),
            FilterOp::Lte => matches!(value.compare(&info.data), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::In => match &info.data {
                FieldValue::List(values) => values.iter().any(|v| value.compare(v) == Some(Ordering::Equal)),
                _ => false,
            },
            FilterOp::Contains => match (&value, &info.data) {
                (FieldValue::Text(haystack), FieldValue::Text(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
        }
    }

    /// Stable sort by the order columns; nulls sort last ascending, first descending
    pub fn sort<R: FilterRecord>(records: &mut [R], order: &[FilterOrderInfo]) {
        if order.is_empty() {
            return;
        }
        records.sort_by(|a, b| {
            for info in order {
                let left = a.field(&info.column);
                let right = b.field(&info.column);
                let ordering = match (left.is_null(), right.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
                };
                let ordering = match info.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Filter, order and window a record set
    pub fn apply<R: FilterRecord + Clone>(records: &[R], filter: &Filter) -> Vec<R> {
        let mut matched: Vec<R> = records
            .iter()
            .filter(|r| Self::matches(*r, &filter.conditions))
            .cloned()
            .collect();
        Self::sort(&mut matched, &filter.order);

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        matched.into_iter().skip(offset).take(limit).collect()
    }
}
