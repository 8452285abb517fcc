use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Array of strings like ["fecha_de_lanzamiento desc", "nombre"]
                let mut out = Vec::new();
                for v in arr {
                    if let Value::String(s) = v {
                        out.extend(Self::parse_order_string(s)?);
                    }
                }
                Ok(out)
            }
            _ => Ok(vec![]),
        }
    }

    /// Parse a comma-separated ordering spec. Each token is a column name with
    /// either a leading `-` (Django convention) or a trailing `desc` keyword
    /// for descending order.
    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let (token, mut sort) = match trimmed.strip_prefix('-') {
                Some(rest) => (rest, SortDirection::Desc),
                None => (trimmed, SortDirection::Asc),
            };
            let mut it = token.split_whitespace();
            let col = match it.next() {
                Some(c) => c,
                None => continue,
            };
            if let Some(dir) = it.next() {
                sort = if dir.eq_ignore_ascii_case("desc") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
            }
            Self::validate_column(col)?;
            out.push(FilterOrderInfo { column: col.to_string(), sort });
        }
        Ok(out)
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
            Err(FilterError::InvalidOrderingField(column.to_string()))
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dash_prefix_means_descending() {
        let infos = FilterOrder::validate_and_parse(&json!("-edad,nombre")).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].column, "edad");
        assert_eq!(infos[0].sort, SortDirection::Desc);
        assert_eq!(infos[1].column, "nombre");
        assert_eq!(infos[1].sort, SortDirection::Asc);
    }

    #[test]
    fn desc_keyword_also_accepted() {
        let infos = FilterOrder::validate_and_parse(&json!("serie desc")).unwrap();
        assert_eq!(infos[0].column, "serie");
        assert_eq!(infos[0].sort, SortDirection::Desc);
    }

    #[test]
    fn generates_quoted_order_by() {
        let infos = FilterOrder::validate_and_parse(&json!("-edad,nombre")).unwrap();
        let sql = FilterOrder::generate(&infos).unwrap();
        assert_eq!(sql, "ORDER BY \"edad\" DESC, \"nombre\" ASC");
    }

    #[test]
    fn rejects_injection_in_column() {
        let err = FilterOrder::validate_and_parse(&json!("nombre;--")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOrderingField(_)));
    }

    #[test]
    fn empty_spec_yields_no_clause() {
        let infos = FilterOrder::validate_and_parse(&json!("")).unwrap();
        assert!(infos.is_empty());
        assert_eq!(FilterOrder::generate(&infos).unwrap(), "");
    }
}
