//! Field readers for source records.
//!
//! Casualty and facility records come from hand-edited payloads and from the
//! CMOP map, and one badly typed field must not take the rest of the batch
//! down with it. These readers never fail on a JSON value: a wrong type is
//! mapped onto something `core::intake` rejects with a reason (empty id,
//! non-finite coordinate, unparseable timestamp).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use crate::models::domain::{FacilityRole, TriageColor};

fn raw<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null))
}

/// Text or numeric id; anything else reads as empty
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    })
}

pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

/// Degrees as a number or numeric text. Present but unreadable values
/// become NaN so validation reports them instead of calling them missing.
pub fn coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::Null => None,
        Value::Number(number) => Some(number.as_f64().unwrap_or(f64::NAN)),
        Value::String(text) => Some(text.trim().parse().unwrap_or(f64::NAN)),
        _ => Some(f64::NAN),
    })
}

/// Timestamp text; non-string values are kept as their JSON text so the
/// parse error shows what was sent
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// Case-insensitive colour name, UNKNOWN otherwise
pub fn triage<'de, D>(deserializer: D) -> Result<TriageColor, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::String(text) => {
            serde_json::from_value(Value::String(text.trim().to_ascii_uppercase())).unwrap_or_default()
        }
        _ => TriageColor::Unknown,
    })
}

pub fn role<'de, D>(deserializer: D) -> Result<FacilityRole, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::String(text) => serde_json::from_value(Value::String(text)).unwrap_or_default(),
        _ => FacilityRole::Unknown,
    })
}

/// Availability flag: absent means available, a non-boolean means not
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match raw(deserializer)? {
        Value::Bool(flag) => flag,
        Value::Null => true,
        _ => false,
    })
}

/// Nested object, falling back to its default when it has the wrong shape
pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match raw(deserializer)? {
        Value::Null => None,
        value => Some(serde_json::from_value(value).unwrap_or_default()),
    })
}

/// List of records; an entry that is not an object becomes a default
/// record, which fails validation like any other incomplete record
pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match raw(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}
