//! Deserializers for the loosely typed numbers ad-platform APIs return.
//!
//! Both platforms encode int64 and decimal values as JSON strings. Missing,
//! malformed or non-finite values become `0.0` instead of failing the whole
//! payload.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(to_f64).unwrap_or(0.0))
}

pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Null => None,
        other => Some(to_f64(other)),
    }))
}

/// Identifiers arrive as either strings or bare numbers.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn to_f64(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "number")]
        value: f64,
        #[serde(default, deserialize_with = "optional_number")]
        maybe: Option<f64>,
        #[serde(default, deserialize_with = "string")]
        id: String,
    }

    #[test]
    fn test_string_encoded_numbers() {
        let row: Row =
            serde_json::from_str(r#"{"value": "42.5", "maybe": "7", "id": 123}"#).unwrap();
        assert_eq!(row.value, 42.5);
        assert_eq!(row.maybe, Some(7.0));
        assert_eq!(row.id, "123");
    }

    #[test]
    fn test_malformed_values_become_zero() {
        let row: Row = serde_json::from_str(r#"{"value": "n/a", "maybe": "NaN"}"#).unwrap();
        assert_eq!(row.value, 0.0);
        assert_eq!(row.maybe, Some(0.0));
        assert_eq!(row.id, "");
    }

    #[test]
    fn test_missing_and_null() {
        let row: Row = serde_json::from_str(r#"{"value": null, "maybe": null}"#).unwrap();
        assert_eq!(row.value, 0.0);
        assert_eq!(row.maybe, None);
    }
}
