use serde::{de::IgnoredAny, Deserialize, Deserializer};

use crate::models::Attendance;

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    String(String),
    Other(IgnoredAny),
}

pub fn default_guest_count() -> i64 {
    1
}

// Guest counts arrive as integers, floats or form strings depending on who
// wrote the record. Anything that is not a positive number becomes 1.
pub fn guest_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Int(i)) => i,
        Some(Loose::Float(f)) => f as i64,
        Some(Loose::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Loose::Other(_)) | None => 0,
    };

    Ok(if count >= 1 { count } else { 1 })
}

// Unknown, missing or non-string attendance falls back to "yes".
pub fn attendance<'de, D>(deserializer: D) -> Result<Attendance, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::String(s)) => s.parse().unwrap_or_default(),
        _ => Attendance::default(),
    })
}

fn loose_text(value: Loose) -> Option<String> {
    match value {
        Loose::Int(i) => Some(i.to_string()),
        Loose::Float(f) => Some(f.to_string()),
        Loose::String(s) => Some(s),
        Loose::Other(_) => None,
    }
}

// PostgREST ids may be bigint or uuid columns.
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    loose_text(Loose::deserialize(deserializer)?)
        .ok_or_else(|| serde::de::Error::custom("id must be a string or a number"))
}

// Hand-edited local records may carry numeric ids, or ids of no usable type.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Loose>::deserialize(deserializer)?.and_then(loose_text))
}

// A null or non-text name reads as empty.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Loose>::deserialize(deserializer)?
        .and_then(loose_text)
        .unwrap_or_default())
}
