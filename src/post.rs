use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

// ---------------------------------------------------------------------------
// Post record
// ---------------------------------------------------------------------------

/// A single post as handed over by whatever collected it.
///
/// Only `text` is read by the rules; everything else is carried through to
/// the analysis result untouched. Fields of the wrong JSON type are treated
/// as missing rather than failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub datetime: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub replies: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub reposts: u64,
}

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Coerce an arbitrary JSON value into a post. Non-object values become
    /// an empty post so one bad record never drops out of the batch.
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            warn!(kind = json_kind(&value), "post record is not an object, using empty post");
            return Self::default();
        }
        match serde_json::from_value(value) {
            Ok(post) => post,
            Err(e) => {
                warn!(error = %e, "unreadable post record, using empty post");
                Self::default()
            }
        }
    }

    pub fn from_values(values: Vec<Value>) -> Vec<Self> {
        values.into_iter().map(Self::from_value).collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().replace(',', "").parse().unwrap_or(0),
        _ => 0,
    })
}
