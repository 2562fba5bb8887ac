use serde_json::Value;

use super::{envelope, json_type, Migration, SchemaError, SchemaResult};
use crate::models::{Category, DEFAULT_PUBLISH_YEAR};

/// Wraps the bare array in an envelope and backfills `publish_year`.
///
/// Early files could also lack `category`; those records are filed under
/// [`Category::FALLBACK`].
pub struct V1PublishYear;

impl Migration for V1PublishYear {
    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "backfill publish_year"
    }

    fn up(&self, doc: Value) -> SchemaResult<Value> {
        let Value::Array(records) = doc else {
            return Err(SchemaError::Malformed("expected a bare array of books".into()));
        };

        let books = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| match record {
                Value::Object(mut book) => {
                    book.entry("publish_year")
                        .or_insert_with(|| Value::from(DEFAULT_PUBLISH_YEAR));
                    book.entry("category")
                        .or_insert_with(|| Value::from(Category::FALLBACK.as_str()));
                    Ok(Value::Object(book))
                }
                other => Err(SchemaError::Malformed(format!(
                    "record {i} is {}, expected an object",
                    json_type(&other)
                ))),
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(envelope(self.version(), books))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backfills_only_missing_year() {
        let doc = json!([
            {"title": "A"},
            {"title": "B", "publish_year": 1850}
        ]);
        let out = V1PublishYear.up(doc).unwrap();
        assert_eq!(out["version"], 1);
        assert_eq!(out["books"][0]["publish_year"], 2000);
        assert_eq!(out["books"][1]["publish_year"], 1850);
    }

    #[test]
    fn test_backfills_only_missing_category() {
        let doc = json!([
            {"title": "A"},
            {"title": "B", "category": "Grammar"},
            {"title": "C", "category": "poetry"}
        ]);
        let out = V1PublishYear.up(doc).unwrap();
        assert_eq!(out["books"][0]["category"], "Software Engineering");
        assert_eq!(out["books"][1]["category"], "Grammar");
        assert_eq!(out["books"][2]["category"], "poetry");
    }

    #[test]
    fn test_rejects_non_object_record() {
        let err = V1PublishYear.up(json!([{"title": "A"}, 7])).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(msg) if msg.contains("record 1")));
    }
}
