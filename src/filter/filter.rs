use super::error::FilterError;
use super::types::{Condition, FieldValue, FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};

/// Backend-neutral description of a collection query.
///
/// The Postgres store renders it to SQL (`filter_where`, `filter_order`), the
/// in-memory store evaluates it directly (`filter_match`). Both must agree.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    pub order: Vec<FilterOrderInfo>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, column: &str, operator: FilterOp, data: FieldValue) -> Self {
        self.conditions.push(Condition::Where(FilterWhereInfo {
            column: column.to_string(),
            operator,
            data,
        }));
        self
    }

    pub fn eq(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Eq, value.into())
    }

    /// Equality only when a value is supplied
    pub fn eq_opt<V: Into<FieldValue>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn neq(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Neq, value.into())
    }

    pub fn gt(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Gt, value.into())
    }

    pub fn gte(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Gte, value.into())
    }

    pub fn lt(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Lt, value.into())
    }

    pub fn lte(self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.push(column, FilterOp::Lte, value.into())
    }

    pub fn is_in<V: Into<FieldValue>>(self, column: &str, values: Vec<V>) -> Self {
        self.push(column, FilterOp::In, FieldValue::from(values))
    }

    /// Half-open range `[from, to)` where either bound is optional
    pub fn range<V: Into<FieldValue>>(self, column: &str, from: Option<V>, to: Option<V>) -> Self {
        let filter = match from {
            Some(v) => self.gte(column, v),
            None => self,
        };
        match to {
            Some(v) => filter.lt(column, v),
            None => filter,
        }
    }

    /// Case-insensitive substring match against any of `columns`
    pub fn search(mut self, columns: &[&str], term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return self;
        }
        let any = columns
            .iter()
            .map(|column| {
                Condition::Where(FilterWhereInfo {
                    column: column.to_string(),
                    operator: FilterOp::Contains,
                    data: FieldValue::Text(term.to_string()),
                })
            })
            .collect();
        self.conditions.push(Condition::Any(any));
        self
    }

    pub fn search_opt(self, columns: &[&str], term: Option<&str>) -> Self {
        match term {
            Some(term) => self.search(columns, term),
            None => self,
        }
    }

    pub fn order_by(mut self, column: &str, sort: SortDirection) -> Self {
        self.order.push(FilterOrderInfo {
            column: column.to_string(),
            sort,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset.max(0));
        self
    }

    /// 1-based page window
    pub fn page(self, page: u32, per_page: u32) -> Self {
        let page = page.max(1) as i64;
        let per_page = per_page as i64;
        self.limit(per_page).offset((page - 1) * per_page)
    }

    /// Same conditions without ordering or windowing, for counting
    pub fn unpaged(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            order: vec![],
            limit: None,
            offset: None,
        }
    }

    /// Check every referenced column against the table's column list
    pub fn validate(&self, columns: &[&str]) -> Result<(), FilterError> {
        fn walk(conditions: &[Condition], columns: &[&str]) -> Result<(), FilterError> {
            for condition in conditions {
                match condition {
                    Condition::Where(info) => {
                        if !columns.contains(&info.column.as_str()) {
                            return Err(FilterError::InvalidColumn(info.column.clone()));
                        }
                        if info.operator == FilterOp::In && !matches!(info.data, FieldValue::List(_)) {
                            return Err(FilterError::InvalidOperatorData(format!(
                                "IN on '{}' requires a list",
                                info.column
                            )));
                        }
                    }
                    Condition::Any(inner) => walk(inner, columns)?,
                }
            }
            Ok(())
        }

        walk(&self.conditions, columns)?;
        for info in &self.order {
            if !columns.contains(&info.column.as_str()) {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
        }
        Ok(())
    }
}
