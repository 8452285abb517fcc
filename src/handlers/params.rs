//! Query-parameter to filter translation shared by the list handlers.
//!
//! Each list endpoint owns a fixed map from its wire parameter names to
//! database columns; everything funnels through [`WhereBuilder`] and
//! [`translate_ordering`] so handlers never touch SQL.

use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::filter::FilterData;

/// Accumulates conjunctive WHERE conditions keyed by database column
#[derive(Debug, Default)]
pub struct WhereBuilder(Map<String, Value>);

impl WhereBuilder {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Case-insensitive containment match when the parameter is present
    pub fn contains(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(v) = value {
            self.0.insert(column.to_string(), json!({ "$ilike": v }));
        }
        self
    }

    /// Exact match when the parameter is present
    pub fn eq(mut self, column: &str, value: Option<Value>) -> Self {
        if let Some(v) = value {
            self.0.insert(column.to_string(), v);
        }
        self
    }

    /// Membership in a pre-resolved id set (join filters go through here)
    pub fn id_in(mut self, column: &str, ids: Option<Vec<i32>>) -> Self {
        if let Some(ids) = ids {
            self.0.insert(column.to_string(), json!({ "$in": ids }));
        }
        self
    }

    pub fn into_where(self) -> Option<Value> {
        if self.0.is_empty() {
            None
        } else {
            Some(Value::Object(self.0))
        }
    }
}

/// Build the [`FilterData`] for a list query from its parts
pub fn filter_data(where_clause: Option<Value>, order: Option<Value>) -> FilterData {
    FilterData { where_clause, order, limit: None, offset: None }
}

/// Parse an integer query parameter, mapping failure to a 400 with the
/// given client message.
pub fn parse_int_param(raw: &str, message: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::validation_error(message, None))
}

/// Parse a boolean query parameter. Accepts true/false and 1/0.
pub fn parse_bool_param(raw: &str, message: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ApiError::validation_error(message, None)),
    }
}

/// Translate a comma-separated `ordering` parameter into the filter module's
/// order spec. Tokens are the resource's wire field names (a leading `-`
/// means descending); unknown fields are rejected with a 400.
///
/// `fields` maps wire name to database column. Column names themselves are
/// also accepted, so `-Edad` and `-edad` both work.
pub fn translate_ordering(
    raw: Option<&str>,
    fields: &[(&str, &str)],
) -> Result<Option<Value>, ApiError> {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(None),
    };

    let mut specs = Vec::new();
    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (token, descending) = match trimmed.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };
        let column = fields
            .iter()
            .find(|(wire, column)| *wire == token || *column == token)
            .map(|(_, column)| *column)
            .ok_or_else(|| {
                ApiError::validation_error(
                    "Error de validación en los datos enviados",
                    Some(json!(format!("Campo de ordenación desconocido: {}", token))),
                )
            })?;
        if descending {
            specs.push(json!(format!("{} desc", column)));
        } else {
            specs.push(json!(column));
        }
    }

    if specs.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Array(specs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, &str)] = &[
        ("Id", "id"),
        ("Nombre", "nombre"),
        ("Edad", "edad"),
        ("FechaDeLanzamiento", "fecha_de_lanzamiento"),
    ];

    #[test]
    fn where_builder_combines_present_params() {
        let clause = WhereBuilder::new()
            .contains("nombre", Some("dra"))
            .contains("frase", None)
            .eq("edad", Some(json!(1599)))
            .into_where()
            .unwrap();
        assert_eq!(clause["nombre"], json!({ "$ilike": "dra" }));
        assert_eq!(clause["edad"], json!(1599));
        assert!(clause.get("frase").is_none());
    }

    #[test]
    fn empty_builder_yields_none() {
        assert!(WhereBuilder::new().contains("nombre", None).into_where().is_none());
    }

    #[test]
    fn ordering_translates_wire_names_and_dashes() {
        let order = translate_ordering(Some("-Edad,Nombre"), FIELDS).unwrap().unwrap();
        assert_eq!(order, json!(["edad desc", "nombre"]));
    }

    #[test]
    fn ordering_accepts_column_names_too() {
        let order = translate_ordering(Some("-fecha_de_lanzamiento"), FIELDS).unwrap().unwrap();
        assert_eq!(order, json!(["fecha_de_lanzamiento desc"]));
    }

    #[test]
    fn ordering_rejects_unknown_fields() {
        let err = translate_ordering(Some("Password"), FIELDS).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn int_and_bool_parsing() {
        assert_eq!(parse_int_param("15", "err").unwrap(), 15);
        assert!(parse_int_param("quince", "err").is_err());
        assert!(parse_bool_param("true", "err").unwrap());
        assert!(!parse_bool_param("0", "err").unwrap());
        assert!(parse_bool_param("maybe", "err").is_err());
    }
}
