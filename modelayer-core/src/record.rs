//! Native record handles returned by the accessors.
//!
//! A [`Record`] pairs the backend-assigned identifier with the stored field
//! values. The document store identifies records by UUID and the relational
//! backend by integer primary key; both share this one shape so that the
//! accessor contract reads the same on either side.
//!
//! Records convert to and from typed structs through serde:
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct User { name: String }
//!
//! let user: User = record.decode()?;
//! ```

use bson::{Bson, DateTime, Document, Uuid, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{ModelError, ModelResult};

/// A stored record: identifier plus field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<I> {
    id: I,
    fields: Document,
}

/// A document-store record.
pub type DocumentRecord = Record<Uuid>;

/// A relational row.
pub type Row = Record<i64>;

impl<I> Record<I> {
    pub fn new(id: I, fields: Document) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> &I {
        &self.id
    }

    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Document {
        &mut self.fields
    }

    pub fn into_fields(self) -> Document {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Bson> {
        self.fields.get(field)
    }

    /// Sets a field value on the in-memory record. Nothing is persisted until
    /// the record is saved through a backend.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Bson>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Overwrites fields with the values in `updates`, leaving other fields as they are.
    pub fn apply(&mut self, updates: Document) {
        for (field, value) in updates {
            self.fields.insert(field, value);
        }
    }

    /// Deserializes the field values into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Serialization`] if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> ModelResult<T> {
        Ok(deserialize_from_bson(Bson::Document(self.fields.clone()))?)
    }
}

/// Serializes a typed value into a field payload suitable for `create` or
/// as an update map.
///
/// # Errors
///
/// Returns [`ModelError::Serialization`] if serialization fails, and
/// [`ModelError::InvalidRecord`] if the value does not serialize to a document.
pub fn encode<T: Serialize>(value: &T) -> ModelResult<Document> {
    match serialize_to_bson(value)? {
        Bson::Document(document) => Ok(document),
        other => Err(ModelError::InvalidRecord(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Turns an RFC 3339 string into a BSON date. Any other value, including a
/// string that does not parse, is returned unchanged.
///
/// Every backend runs values bound for a date field through this before
/// validating them, so a date may be given either way.
pub fn normalize_date(value: Bson) -> Bson {
    match value {
        Bson::String(text) => match DateTime::parse_rfc3339_str(&text) {
            Ok(date) => Bson::DateTime(date),
            Err(_) => Bson::String(text),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_strings_become_dates() {
        assert_eq!(
            normalize_date(Bson::String("2023-11-14T22:13:20.123Z".into())),
            Bson::DateTime(DateTime::from_millis(1_700_000_000_123))
        );
    }

    #[test]
    fn other_values_pass_through() {
        assert_eq!(normalize_date(Bson::String("yesterday".into())), Bson::String("yesterday".into()));
        assert_eq!(normalize_date(Bson::Int32(3)), Bson::Int32(3));
        assert_eq!(normalize_date(Bson::Null), Bson::Null);
    }
}
