use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Builds a conjunctive, fully parameterized WHERE clause from a JSON object.
///
/// Conditions come in two forms: implicit equality `{ "nombre": "Draculaura" }`
/// and explicit operators `{ "edad": { "$gte": 15 } }`. Conditions are always
/// combined with AND.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        if where_data.is_null() {
            return Ok(());
        }
        match where_data {
            Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.param_values.clear();
        self.conditions.clear();

        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = self.conditions.clone();
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        let where_clause = if sql_conditions.is_empty() {
            String::new()
        } else {
            sql_conditions.join(" AND ")
        };
        Ok((where_clause, self.param_values.clone()))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Object(obj) => {
                for (key, value) in obj {
                    self.parse_field_condition(key, value)?;
                }
                Ok(())
            }
            Value::Null => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        Self::validate_column(field)?;
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                self.conditions.push(FilterWhereInfo {
                    column: field.to_string(),
                    operator,
                    data: op_val.clone(),
                });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            });
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)))
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NULL", quoted_column))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Ne => {
                if condition.data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted_column))
                } else {
                    Ok(format!("{} <> {}", quoted_column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::ILike => {
                // Containment match: wrap the needle in wildcards before binding
                let needle = condition
                    .data
                    .as_str()
                    .map(|s| Value::String(format!("%{}%", escape_like(s))))
                    .unwrap_or_else(|| condition.data.clone());
                Ok(format!("{} ILIKE {}", quoted_column, self.param(needle)))
            }
            FilterOp::In => {
                if let Value::Array(values) = &condition.data {
                    if values.is_empty() {
                        return Ok("1=0".to_string());
                    }
                    let params: Vec<String> =
                        values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(condition.data.clone())))
                }
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE wildcards in user input so a literal `%` or `_` matches itself
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
