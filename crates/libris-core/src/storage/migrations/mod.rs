//! Load-time schema upgrades for the library file.
//!
//! Version 0 is the original bare JSON array. Every later version wraps the
//! records in a `{"version": N, "books": [...]}` envelope. Each migration
//! consumes the document and hands back an upgraded one.

mod v1_publish_year;
mod v2_record_ids;

use serde_json::Value;
use thiserror::Error;

/// Schema version written by [`crate::JsonStore::save`].
pub const CURRENT_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{0}")]
    Malformed(String),

    #[error("schema version {found} is newer than {supported}")]
    TooNew { found: u32, supported: u32 },
}

pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

pub trait Migration {
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up(&self, doc: Value) -> SchemaResult<Value>;
}

/// Outcome of [`upgrade`].
#[derive(Debug, Clone)]
pub struct Upgraded {
    pub document: Value,
    pub from_version: u32,
    pub applied: Vec<u32>,
}

fn migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(v1_publish_year::V1PublishYear),
        Box::new(v2_record_ids::V2RecordIds),
    ]
}

/// Version of a parsed library document.
pub fn detect_version(doc: &Value) -> SchemaResult<u32> {
    match doc {
        Value::Array(_) => Ok(0),
        Value::Object(map) => map
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| SchemaError::Malformed("missing or invalid \"version\" field".into())),
        other => Err(SchemaError::Malformed(format!(
            "expected an array or object at top level, found {}",
            json_type(other)
        ))),
    }
}

/// Bring `doc` up to [`CURRENT_VERSION`].
pub fn upgrade(doc: Value) -> SchemaResult<Upgraded> {
    let from_version = detect_version(&doc)?;
    if from_version > CURRENT_VERSION {
        return Err(SchemaError::TooNew {
            found: from_version,
            supported: CURRENT_VERSION,
        });
    }

    let mut document = doc;
    let mut applied = Vec::new();
    for migration in migrations() {
        if migration.version() > from_version {
            document = migration.up(document)?;
            tracing::info!(
                version = migration.version(),
                "applied library schema upgrade: {}",
                migration.description()
            );
            applied.push(migration.version());
        }
    }

    Ok(Upgraded {
        document,
        from_version,
        applied,
    })
}

/// Take the `books` array out of an enveloped document.
fn take_books(doc: Value) -> SchemaResult<Vec<Value>> {
    let Value::Object(mut map) = doc else {
        return Err(SchemaError::Malformed("expected an object envelope".into()));
    };
    match map.remove("books") {
        Some(Value::Array(books)) => Ok(books),
        Some(other) => Err(SchemaError::Malformed(format!(
            "\"books\" must be an array, found {}",
            json_type(&other)
        ))),
        None => Err(SchemaError::Malformed("missing \"books\" field".into())),
    }
}

fn envelope(version: u32, books: Vec<Value>) -> Value {
    serde_json::json!({ "version": version, "books": books })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_version() {
        assert_eq!(detect_version(&json!([])).unwrap(), 0);
        assert_eq!(detect_version(&json!({"version": 2, "books": []})).unwrap(), 2);
        assert!(detect_version(&json!({"books": []})).is_err());
        assert!(detect_version(&json!("library")).is_err());
    }

    #[test]
    fn test_upgrade_legacy_array() {
        let legacy = json!([
            {"title": "Old", "author": "A", "link": "l", "category": "Poetry"},
            {
                "title": "Dated", "author": "B", "link": "l", "category": "Coding",
                "publish_year": 1987
            }
        ]);

        let upgraded = upgrade(legacy).unwrap();
        assert_eq!(upgraded.from_version, 0);
        assert_eq!(upgraded.applied, vec![1, 2]);

        let doc = upgraded.document;
        assert_eq!(doc["version"], CURRENT_VERSION);
        let books = doc["books"].as_array().unwrap();
        assert_eq!(books[0]["publish_year"], 2000);
        assert_eq!(books[1]["publish_year"], 1987);
        assert!(books.iter().all(|b| b["id"].is_string()));
    }

    #[test]
    fn test_upgrade_current_is_noop() {
        let doc = json!({"version": CURRENT_VERSION, "books": []});
        let upgraded = upgrade(doc.clone()).unwrap();
        assert!(upgraded.applied.is_empty());
        assert_eq!(upgraded.document, doc);
    }

    #[test]
    fn test_upgrade_rejects_newer_version() {
        let doc = json!({"version": CURRENT_VERSION + 1, "books": []});
        assert!(matches!(upgrade(doc), Err(SchemaError::TooNew { .. })));
    }

    #[test]
    fn test_upgrade_rejects_non_object_records() {
        let doc = json!(["just a string"]);
        assert!(matches!(upgrade(doc), Err(SchemaError::Malformed(_))));
    }
}
