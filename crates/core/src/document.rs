//! Schema-less documents.

use serde_json::{Map, Value};

use crate::DomainError;

/// A schema-less JSON object as stored in a collection.
///
/// The gateway never validates fields; whatever the client submits is stored.
pub type Document = Map<String, Value>;

/// Interpret an arbitrary JSON value as a document.
///
/// Only JSON objects are documents; arrays, scalars and `null` are rejected.
pub fn document_from_value(value: Value) -> Result<Document, DomainError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DomainError::invalid_document(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Apply `$set`-style merge semantics: overwrite the named fields, keep the rest.
///
/// Returns `true` if any field actually changed.
pub fn merge_set(target: &mut Document, set: &Document) -> bool {
    let mut modified = false;
    for (key, value) in set {
        if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
            modified = true;
        }
    }
    modified
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
