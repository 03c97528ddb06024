//! Dimension and number codec.
//!
//! Units are not stored on import; on export they are re-derived from the
//! token's path (`spacing/*` and `typography/font-size/*` become `px` dimensions).

use crate::lexer::dimension;
use dtm_core::{split_path, DimensionError, TokenType};
use serde_json::{json, Number, Value};

/// Unit attached to exported dimensions.
pub const EXPORT_UNIT: &str = "px";

/// Parse the `$value` of a dimension token.
///
/// Accepts a bare number, a string whose leading numeric run is used (`"12px"`),
/// or an object `{ "value": 12, "unit": "px" }` whose unit is ignored.
pub fn parse_dimension(value: &Value) -> Result<f64, DimensionError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(value)),
        Value::String(s) => dimension(s.trim())
            .map(|(_, (number, _unit))| number)
            .map_err(|_| invalid(value)),
        Value::Object(map) => match map.get("value") {
            Some(inner @ (Value::Number(_) | Value::String(_))) => parse_dimension(inner),
            _ => Err(invalid(value)),
        },
        _ => Err(invalid(value)),
    }
}

/// Parse the `$value` of a number token. Only JSON numbers are accepted.
pub fn parse_number(value: &Value) -> Result<f64, DimensionError> {
    value.as_f64().ok_or_else(|| invalid(value))
}

fn invalid(value: &Value) -> DimensionError {
    DimensionError::InvalidDimensionFormat {
        value: value.to_string(),
    }
}

/// Whether a numeric variable at this path exports as a `px` dimension.
pub fn is_dimension_path(name: &str) -> bool {
    let parts = split_path(name);
    match parts.as_slice() {
        ["spacing", ..] => true,
        ["typography", "font-size", ..] => true,
        _ => false,
    }
}

/// Export type tag for a numeric variable at this path.
pub fn numeric_export_type(name: &str) -> TokenType {
    if is_dimension_path(name) {
        TokenType::Dimension
    } else {
        TokenType::Number
    }
}

/// Export a numeric variable: `(type, $value)`.
pub fn export_numeric(name: &str, value: f64) -> (TokenType, Value) {
    match numeric_export_type(name) {
        TokenType::Dimension => (
            TokenType::Dimension,
            json!({ "value": json_number(value), "unit": EXPORT_UNIT }),
        ),
        other => (other, json_number(value)),
    }
}

/// JSON number for `value`; whole numbers are written as integers.
pub fn json_number(value: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}
