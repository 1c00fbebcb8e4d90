use sqlx::{Postgres, QueryBuilder};

use super::types::{Condition, FieldValue, FilterOp, FilterWhereInfo};

/// Renders filter conditions into a Postgres `WHERE` clause with bound parameters
pub struct FilterWhere;

impl FilterWhere {
    /// Append ` WHERE ...` when there is at least one condition
    pub fn push(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition]) {
        if conditions.is_empty() {
            return;
        }
        qb.push(" WHERE ");
        Self::push_joined(qb, conditions, " AND ");
    }

    fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition], joiner: &str) {
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                qb.push(joiner);
            }
            match condition {
                Condition::Where(info) => Self::push_condition(qb, info),
                Condition::Any(inner) if inner.is_empty() => {
                    qb.push("FALSE");
                }
                Condition::Any(inner) => {
                    qb.push("(");
                    Self::push_joined(qb, inner, " OR ");
                    qb.push(")");
                }
            }
        }
    }

    fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, info: &FilterWhereInfo) {
        let column = format!("\"{}\"", info.column);
        match (info.operator, &info.data) {
            (FilterOp::Eq, FieldValue::Null) => {
                qb.push(format!("{column} IS NULL"));
            }
            (FilterOp::Neq, FieldValue::Null) => {
                qb.push(format!("{column} IS NOT NULL"));
            }
            (FilterOp::In, FieldValue::List(values)) if values.is_empty() => {
                qb.push("FALSE");
            }
            (FilterOp::In, FieldValue::List(values)) => {
                qb.push(format!("{column} IN ("));
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    bind_value(qb, value);
                }
                qb.push(")");
            }
            (FilterOp::Contains, data) => {
                let term = match data {
                    FieldValue::Text(s) => s.clone(),
                    _ => String::new(),
                };
                qb.push(format!("{column}::text ILIKE "));
                qb.push_bind(format!("%{}%", escape_like(&term)));
            }
            (operator, data) => {
                qb.push(format!("{column} {} ", operator_sql(operator)));
                bind_value(qb, data);
            }
        }
    }
}

fn operator_sql(operator: FilterOp) -> &'static str {
    match operator {
        FilterOp::Eq | FilterOp::In => "=",
        FilterOp::Neq => "<>",
        FilterOp::Gt => ">",
        FilterOp::Gte => ">=",
        FilterOp::Lt => "<",
        FilterOp::Lte => "<=",
        FilterOp::Contains => "ILIKE",
    }
}

/// Bind a single value as a query parameter
pub fn bind_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Null | FieldValue::List(_) => {
            qb.push("NULL");
        }
        FieldValue::Text(v) => {
            qb.push_bind(v.clone());
        }
        FieldValue::Int(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Float(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Bool(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Uuid(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Timestamp(v) => {
            qb.push_bind(*v);
        }
        FieldValue::Date(v) => {
            qb.push_bind(*v);
        }
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn render(filter: &Filter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM families");
        FilterWhere::push(&mut qb, &filter.conditions);
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_filter_has_no_where() {
        assert_eq!(render(&Filter::new()), "SELECT * FROM families");
    }

    #[test]
    fn test_conditions_are_bound() {
        let filter = Filter::new().eq("center", "Delhi Center").eq("is_active", true);
        assert_eq!(
            render(&filter),
            "SELECT * FROM families WHERE \"center\" = $1 AND \"is_active\" = $2"
        );
    }

    #[test]
    fn test_search_renders_or_group() {
        let filter = Filter::new().search(&["name", "contact"], "sha");
        assert_eq!(
            render(&filter),
            "SELECT * FROM families WHERE (\"name\"::text ILIKE $1 OR \"contact\"::text ILIKE $2)"
        );
    }

    #[test]
    fn test_null_and_empty_list() {
        let filter = Filter::new()
            .eq("created_by", FieldValue::Null)
            .is_in::<&str>("center", vec![]);
        assert_eq!(
            render(&filter),
            "SELECT * FROM families WHERE \"created_by\" IS NULL AND FALSE"
        );
    }

    #[test]
    fn test_like_escape() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
