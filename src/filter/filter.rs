use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

/// Assembles a parameterized SELECT statement from structured filter data.
///
/// List handlers translate their query parameters into [`FilterData`] and
/// hand it here; nothing outside this module concatenates SQL fragments.
pub struct Filter {
    table_name: String,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let order_info = FilterOrder::validate_and_parse(&order_spec)?;
        self.order_data = order_info;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.api.max_list_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = if let Some(ref where_data) = self.where_data {
            FilterWhere::generate(where_data, 0)?
        } else {
            (String::new(), vec![])
        };
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = if let Some(ref where_data) = self.where_data {
            FilterWhere::generate(where_data, 0)?
        } else {
            (String::new(), vec![])
        };
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_clause)
        };
        Ok(SqlResult { query, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        let first = name.chars().next().unwrap();
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_')
            || (!first.is_alphabetic() && first != '_')
        {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_filter_selects_everything() {
        let filter = Filter::new("characters").unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT * FROM \"characters\"");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn full_filter_composes_clauses_in_order() {
        let mut filter = Filter::new("characters").unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({ "sexo": "Femenino", "nombre": { "$ilike": "dra" } })),
                order: Some(json!("-edad")),
                limit: Some(10),
                offset: Some(5),
            })
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert!(sql.query.starts_with("SELECT * FROM \"characters\" WHERE "));
        assert!(sql.query.contains("ORDER BY \"edad\" DESC"));
        assert!(sql.query.ends_with("LIMIT 10 OFFSET 5"));
        assert_eq!(sql.params.len(), 2);
    }

    #[test]
    fn count_sql_keeps_where_params() {
        let mut filter = Filter::new("pets").unwrap();
        filter.where_clause(json!({ "tipo": { "$ilike": "gato" } })).unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) as count FROM \"pets\" WHERE \"tipo\" ILIKE $1");
        assert_eq!(sql.params.len(), 1);
    }

    #[test]
    fn rejects_bad_table_name() {
        assert!(Filter::new("characters; DROP TABLE users").is_err());
        assert!(Filter::new("").is_err());
        assert!(Filter::new("1characters").is_err());
    }
}
