//! Records: schemaless documents stored in named collections

use crate::core::field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use uuid::Uuid;

/// Field holding the creation timestamp of every record
pub const CREATED_AT: &str = "createdAt";

/// Field holding the last modification timestamp (absent until first update)
pub const UPDATED_AT: &str = "updatedAt";

/// Document fields, in insertion order
pub type Fields = Map<String, Value>;

/// One persisted item in a collection (an exam, a note, a paper, ...)
///
/// A record is an opaque mapping from field name to JSON value plus a unique
/// identifier. Field names follow the camelCase convention of the stored
/// documents (`examDate`, `createdAt`, `correctIndex`, ...).
///
/// Records are never schema-validated on read: every accessor degrades to an
/// empty string or zero when a field is missing or has an unexpected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier within the collection
    pub id: Uuid,

    /// Document fields (including `createdAt` / `updatedAt`)
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create a record with a fresh identifier
    pub fn new(fields: Fields) -> Self {
        Self::with_id(Uuid::new_v4(), fields)
    }

    /// Create a record with a known identifier
    pub fn with_id(id: Uuid, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Raw value of a field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Textual value of a field, `""` when absent
    pub fn text(&self, name: &str) -> Cow<'_, str> {
        field::text(self.get(name))
    }

    /// Boolean value of a field, `false` when absent or not a boolean
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Creation time in epoch milliseconds (0 when missing or unparseable)
    pub fn created_millis(&self) -> i64 {
        field::epoch_millis(self.get(CREATED_AT))
    }

    /// Creation time, if the record carries a readable one
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self.created_millis() {
            0 => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }

    /// Set or replace a field
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Merge fields into the record, overwriting existing keys
    pub fn merge(&mut self, fields: Fields) {
        for (key, value) in fields {
            self.fields.insert(key, value);
        }
    }

    /// Serialize the record as a flat JSON object
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
