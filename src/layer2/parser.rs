// Message Parser - shared normalization helpers for venue REST payloads
// Venues encode numbers as strings or floats and timestamps as ms, s or ISO-8601;
// everything funnels through here before reaching the engine

use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;

use crate::core::types::DepthLevel;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Invalid number in {field}: '{value}'")]
    InvalidNumber { field: String, value: String },
}

/// Parse a string field as f64, returning ParseError on failure
pub fn parse_f64_field(value: &str, field_name: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            field: field_name.to_string(),
            value: value.to_string(),
        })
}

/// Read a number that may arrive as a JSON number or a numeric string
pub fn value_f64(value: &Value, field_name: &str) -> Result<f64, ParseError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| ParseError::InvalidNumber {
            field: field_name.to_string(),
            value: n.to_string(),
        }),
        Value::String(s) => parse_f64_field(s, field_name),
        Value::Null => Err(ParseError::MissingField(field_name.to_string())),
        other => Err(ParseError::InvalidNumber {
            field: field_name.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Read an integer that may arrive as a JSON number or a numeric string
pub fn value_i64(value: &Value, field_name: &str) -> Result<i64, ParseError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| ParseError::InvalidNumber {
                field: field_name.to_string(),
                value: n.to_string(),
            }),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| ParseError::InvalidNumber {
            field: field_name.to_string(),
            value: s.clone(),
        }),
        Value::Null => Err(ParseError::MissingField(field_name.to_string())),
        other => Err(ParseError::InvalidNumber {
            field: field_name.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Fetch `obj[key]`, failing with MissingField when absent or null
pub fn field<'a>(obj: &'a Value, key: &str) -> Result<&'a Value, ParseError> {
    match obj.get(key) {
        Some(Value::Null) | None => Err(ParseError::MissingField(key.to_string())),
        Some(v) => Ok(v),
    }
}

/// Fetch `obj[key]` as an array
pub fn array_field<'a>(obj: &'a Value, key: &str) -> Result<&'a Vec<Value>, ParseError> {
    field(obj, key)?
        .as_array()
        .ok_or_else(|| ParseError::InvalidJson(format!("'{}' is not an array", key)))
}

/// Fetch `obj[key]` as a string
pub fn str_field<'a>(obj: &'a Value, key: &str) -> Result<&'a str, ParseError> {
    field(obj, key)?
        .as_str()
        .ok_or_else(|| ParseError::InvalidJson(format!("'{}' is not a string", key)))
}

/// Interpret a value as a top-level array
pub fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, ParseError> {
    value
        .as_array()
        .ok_or_else(|| ParseError::InvalidJson(format!("{} is not an array", what)))
}

/// Parse one `[price, quantity, ...]` level. Extra trailing elements
/// (order counts, ids) are ignored.
pub fn parse_level(raw: &Value) -> Result<DepthLevel, ParseError> {
    let pair = raw
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| ParseError::InvalidJson(format!("Invalid book level: {}", raw)))?;

    Ok(DepthLevel {
        price: value_f64(&pair[0], "price")?,
        volume: value_f64(&pair[1], "quantity")?,
    })
}

/// Parse a list of `[price, quantity]` levels
pub fn parse_levels(raw: &[Value]) -> Result<Vec<DepthLevel>, ParseError> {
    raw.iter().map(parse_level).collect()
}

/// Convert epoch milliseconds to float seconds
pub fn millis_to_secs(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Parse an RFC 3339 / ISO-8601 timestamp into float seconds since epoch
pub fn parse_iso8601_secs(value: &str) -> Result<f64, ParseError> {
    let dt = DateTime::parse_from_rfc3339(value)
        .map_err(|_| ParseError::InvalidJson(format!("Invalid timestamp: '{}'", value)))?;
    Ok(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1e9)
}

/// Candle timeframe length in seconds (`1m`, `5m`, `15m`, `1h`, `4h`, `1d`, ...)
pub fn timeframe_seconds(timeframe: &str) -> Option<u64> {
    let tf = timeframe.trim();
    let unit = tf.chars().last()?;
    let count = &tf[..tf.len() - unit.len_utf8()];
    let count: u64 = count.parse().ok().filter(|c| *c > 0)?;
    let unit_secs = match unit {
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        _ => return None,
    };
    count.checked_mul(unit_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_f64_accepts_strings_and_numbers() {
        assert_eq!(value_f64(&json!("101.5"), "p").unwrap(), 101.5);
        assert_eq!(value_f64(&json!(2), "q").unwrap(), 2.0);
        assert!(matches!(value_f64(&json!(null), "q"), Err(ParseError::MissingField(_))));
        assert!(matches!(value_f64(&json!("abc"), "q"), Err(ParseError::InvalidNumber { .. })));
        assert!(value_f64(&json!("NaN"), "q").is_err());
    }

    #[test]
    fn test_value_i64() {
        assert_eq!(value_i64(&json!("1700000000000"), "t").unwrap(), 1_700_000_000_000);
        assert_eq!(value_i64(&json!(42), "t").unwrap(), 42);
        assert!(value_i64(&json!(true), "t").is_err());
    }

    #[test]
    fn test_parse_levels_ignores_extra_columns() {
        let raw = json!([["100.5", "1.25", 3], [99, 2]]);
        let levels = parse_levels(raw.as_array().unwrap()).unwrap();
        assert_eq!(levels, vec![DepthLevel::new(100.5, 1.25), DepthLevel::new(99.0, 2.0)]);
    }

    #[test]
    fn test_parse_level_rejects_short_rows() {
        assert!(parse_level(&json!(["100"])).is_err());
        assert!(parse_level(&json!({"px": "1"})).is_err());
    }

    #[test]
    fn test_field_helpers() {
        let obj = json!({"a": [1], "s": "x", "n": null});
        assert_eq!(array_field(&obj, "a").unwrap().len(), 1);
        assert_eq!(str_field(&obj, "s").unwrap(), "x");
        assert!(matches!(field(&obj, "n"), Err(ParseError::MissingField(_))));
        assert!(str_field(&obj, "a").is_err());
    }

    #[test]
    fn test_parse_iso8601() {
        let secs = parse_iso8601_secs("2024-01-01T00:00:01.500Z").unwrap();
        assert!((secs - 1_704_067_201.5).abs() < 1e-6);
        assert!(parse_iso8601_secs("yesterday").is_err());
    }

    #[test]
    fn test_timeframe_seconds() {
        assert_eq!(timeframe_seconds("1m"), Some(60));
        assert_eq!(timeframe_seconds("15m"), Some(900));
        assert_eq!(timeframe_seconds("4h"), Some(14_400));
        assert_eq!(timeframe_seconds("1d"), Some(86_400));
        assert_eq!(timeframe_seconds("0m"), None);
        assert_eq!(timeframe_seconds("1y"), None);
        assert_eq!(timeframe_seconds("m"), None);
        assert_eq!(timeframe_seconds(""), None);
    }

    #[test]
    fn test_timeframe_seconds_multibyte_unit() {
        assert_eq!(timeframe_seconds("1µ"), None);
        assert_eq!(timeframe_seconds("µ"), None);
        assert_eq!(timeframe_seconds("5分"), None);
    }

    #[test]
    fn test_millis_to_secs() {
        assert_eq!(millis_to_secs(1_500), 1.5);
    }
}
