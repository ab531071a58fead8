//! Forgiving field decoders for request bodies.
//!
//! A field that is present but cannot be read as a number (wrong JSON type,
//! unparseable string) decodes to [`Field::Malformed`] instead of failing the
//! whole request; the mapper then substitutes the configured default.
//! Keyed change maps get the same treatment per entry.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// One decoded request field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Malformed,
    Value(T),
}

impl<T: Copy> Field<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Field::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Field::Malformed)
    }
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Decodes a JSON number or numeric string. `null` counts as absent.
pub fn number<'de, D>(deserializer: D) -> Result<Field<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Field::Absent,
        other => number_from(&other).map_or(Field::Malformed, Field::Value),
    })
}

/// Decodes a whole number (`3`, `3.0`, `"3"`). Fractions are malformed;
/// negatives are kept so validation can report them.
pub fn integer<'de, D>(deserializer: D) -> Result<Field<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Field::Absent,
        other => number_from(&other)
            .filter(|v| v.fract() == 0.0 && v.abs() < 1e15)
            .map_or(Field::Malformed, |v| Field::Value(v as i64)),
    })
}

/// Decodes a JSON object of entries keyed by string. Anything other than an
/// object is treated as empty; entries whose body is not an object or does
/// not decode as `T` are dropped.
pub fn entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(BTreeMap::new()),
        other => {
            warn!(found = %other, "expected an object of keyed entries, ignoring");
            return Ok(BTreeMap::new());
        }
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, entry)| {
            if !entry.is_object() {
                warn!(key = %key, "entry is not an object, ignoring");
                return None;
            }
            match T::deserialize(entry) {
                Ok(decoded) => Some((key, decoded)),
                Err(e) => {
                    warn!(key = %key, error = %e, "unreadable entry, ignoring");
                    None
                }
            }
        })
        .collect())
}
