use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::error::ApiError;

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    // Rfc3339 only fails outside years 0..=9999
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// Copies every field of `patch` onto `target`; fields absent from the patch
/// are left untouched.
pub fn shallow_merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Renders a free-form field for display: strings as-is, other scalars via
/// their JSON text, `null` as absent.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Absent, `null` and whitespace-only strings count as "not provided".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// `value` unless it is blank, in which case `fallback` as a string.
pub fn or_default_text(value: Option<Value>, fallback: &str) -> Value {
    match value {
        Some(v) if !is_blank(Some(&v)) => v,
        _ => Value::from(fallback),
    }
}

pub fn validate_amount(amount: Option<f64>) -> Result<f64, ApiError> {
    match amount {
        Some(value) if value.is_finite() => Ok(value),
        Some(_) => Err(ApiError::Validation(
            "Amount must be a valid finite number".to_string(),
        )),
        None => Err(ApiError::Validation("Amount is required".to_string())),
    }
}

pub fn require_id(value: Option<i64>, field_name: &str) -> Result<i64, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("{} is required", field_name)))
}

/// Numeric body fields arrive either as JSON numbers or as strings taken
/// straight from form inputs; both are accepted.
pub mod lenient {
    use super::*;

    pub fn int_from_value(value: &Value) -> Result<Option<i64>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Some(i))
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
                        _ => Err(format!("expected an integer, got {}", n)),
                    }
                }
            }
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("expected an integer, got '{}'", s)),
            other => Err(format!("expected an integer, got {}", other)),
        }
    }

    pub fn float_from_value(value: &Value) -> Result<Option<f64>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("expected a number, got '{}'", s)),
            other => Err(format!("expected a number, got {}", other)),
        }
    }

    pub fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
        int_from_value(&value).map_err(D::Error::custom)
    }

    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
        float_from_value(&value).map_err(D::Error::custom)
    }

    /// Cached counters are recomputed from their source list, so an
    /// unreadable stored value is treated as zero rather than failing the load.
    pub fn count<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
        Ok(int_from_value(&value)
            .ok()
            .flatten()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0))
    }

    pub fn ids<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(int_list(deserializer)?.unwrap_or_default())
    }

    pub fn int_list<'de, D>(deserializer: D) -> Result<Option<Vec<i64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(values) = Option::<Vec<Value>>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let mut ids = Vec::with_capacity(values.len());
        for value in &values {
            if let Some(id) = int_from_value(value).map_err(D::Error::custom)? {
                ids.push(id);
            }
        }
        Ok(Some(ids))
    }
}

#[cfg(test)]
mod tests {
    use super::lenient::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn ints_accept_numbers_and_numeric_strings() {
        assert_eq!(int_from_value(&json!(42)).unwrap(), Some(42));
        assert_eq!(int_from_value(&json!("42")).unwrap(), Some(42));
        assert_eq!(int_from_value(&json!(7.0)).unwrap(), Some(7));
        assert_eq!(int_from_value(&json!("")).unwrap(), None);
        assert_eq!(int_from_value(&json!(null)).unwrap(), None);
        assert!(int_from_value(&json!("abc")).is_err());
        assert!(int_from_value(&json!(1.5)).is_err());
    }

    #[test]
    fn floats_accept_numbers_and_numeric_strings() {
        assert_eq!(float_from_value(&json!(1.5)).unwrap(), Some(1.5));
        assert_eq!(float_from_value(&json!("300000")).unwrap(), Some(300000.0));
        assert!(float_from_value(&json!(true)).is_err());
    }

    #[test]
    fn shallow_merge_keeps_absent_fields() {
        let mut target = json!({"name": "Ali", "phone": "123"})
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({"phone": "456", "status": "inactive"})
            .as_object()
            .cloned()
            .unwrap();
        shallow_merge(&mut target, patch);
        assert_eq!(
            Value::Object(target),
            json!({"name": "Ali", "phone": "456", "status": "inactive"})
        );
    }

    #[test]
    fn free_form_fields_render_as_text() {
        assert_eq!(text(Some(&json!("Ali"))).as_deref(), Some("Ali"));
        assert_eq!(text(Some(&json!(998901234567_i64))).as_deref(), Some("998901234567"));
        assert_eq!(text(Some(&Value::Null)), None);
        assert_eq!(text(None), None);
    }

    #[test]
    fn blank_values_fall_back() {
        assert!(is_blank(Some(&json!("  "))));
        assert!(!is_blank(Some(&json!(0))));
        assert_eq!(or_default_text(Some(json!("")), "cash"), json!("cash"));
        assert_eq!(or_default_text(None, "cash"), json!("cash"));
        assert_eq!(or_default_text(Some(json!("card")), "cash"), json!("card"));
    }

    #[test]
    fn amount_must_be_finite() {
        assert_eq!(validate_amount(Some(10.0)).unwrap(), 10.0);
        assert!(validate_amount(Some(f64::NAN)).is_err());
        assert!(validate_amount(None).is_err());
    }
}
