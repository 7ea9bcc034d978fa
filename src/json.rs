use std::io::Read;

use crate::error::Result;
use crate::value::Value;

/// Convert a parsed JSON document into an interpreter value. Numbers all
/// become doubles; objects become the unordered map variant.
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(els) => Value::Array(els.into_iter().map(from_json).collect()),
        serde_json::Value::Object(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, from_json(value)))
                .collect(),
        ),
    }
}

/// Parse a JSON document from a string
pub fn parse_document(source: &str) -> Result<Value> {
    Ok(from_json(serde_json::from_str(source)?))
}

/// Read a JSON document from a reader (the CLI reads standard input)
pub fn read_document<R: Read>(reader: R) -> Result<Value> {
    Ok(from_json(serde_json::from_reader(reader)?))
}
