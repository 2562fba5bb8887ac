use serde_json::Value;
use uuid::Uuid;

use super::{envelope, json_type, take_books, Migration, SchemaError, SchemaResult};

/// Gives every record a stable `id`.
pub struct V2RecordIds;

impl Migration for V2RecordIds {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "assign record ids"
    }

    fn up(&self, doc: Value) -> SchemaResult<Value> {
        let books = take_books(doc)?
            .into_iter()
            .enumerate()
            .map(|(i, record)| match record {
                Value::Object(mut book) => {
                    book.entry("id")
                        .or_insert_with(|| Value::from(Uuid::now_v7().to_string()));
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
