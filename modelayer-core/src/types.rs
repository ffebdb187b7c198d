//! Native type vocabularies and the type-mapping tables.
//!
//! Each backend has one table from abstract type tag to native type. The
//! tables are built on first use and shared, read-only, for the lifetime of the
//! process.
//!
//! | tag       | document store | relational   |
//! |-----------|----------------|--------------|
//! | `string`  | `String`       | `String`     |
//! | `text`    | `String`       | `Text`       |
//! | `number`  | `Number`       | `Real`       |
//! | `integer` | `Number`       | `Integer`    |
//! | `date`    | `Date`         | `Date`       |
//! | `boolean` | `Boolean`      | `Boolean`    |
//! | `now`     | `Date`         | `Date`       |
//! | `blob`    | `Buffer`       | `Blob`       |
//! | `enum`    | `String`       | `Enum`       |

use std::{collections::HashMap, fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// The tags recognized by the type grammar, in table order.
pub const TYPE_TAGS: [&str; 9] = [
    "string", "text", "number", "integer", "date", "boolean", "now", "blob", "enum",
];

/// Native field types of the document-store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    String,
    Number,
    Date,
    Boolean,
    Buffer,
}

/// Native column types of the relational backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationalType {
    /// Variable-length string, optionally bounded.
    String(Option<u32>),
    /// Unbounded text.
    Text,
    Real,
    Integer,
    Date,
    Boolean,
    Blob,
    /// Enumeration over the listed values, in declaration order.
    Enum(Vec<String>),
}

impl RelationalType {
    /// The unparametrized type name, as a relational engine would key it.
    pub fn key(&self) -> &'static str {
        match self {
            RelationalType::String(_) => "STRING",
            RelationalType::Text => "TEXT",
            RelationalType::Real => "REAL",
            RelationalType::Integer => "INTEGER",
            RelationalType::Date => "DATE",
            RelationalType::Boolean => "BOOLEAN",
            RelationalType::Blob => "BLOB",
            RelationalType::Enum(_) => "ENUM",
        }
    }
}

impl fmt::Display for RelationalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationalType::String(Some(length)) => write!(f, "STRING({length})"),
            RelationalType::Enum(values) => write!(f, "ENUM({})", values.join(", ")),
            other => f.write_str(other.key()),
        }
    }
}

static DOCUMENT_TYPES: LazyLock<HashMap<&'static str, DocumentType>> = LazyLock::new(|| {
    log::trace!("building document-store type table");

    HashMap::from([
        ("string", DocumentType::String),
        ("text", DocumentType::String),
        ("number", DocumentType::Number),
        ("integer", DocumentType::Number),
        ("date", DocumentType::Date),
        ("boolean", DocumentType::Boolean),
        ("now", DocumentType::Date),
        ("blob", DocumentType::Buffer),
        ("enum", DocumentType::String),
    ])
});

static RELATIONAL_TYPES: LazyLock<HashMap<&'static str, RelationalType>> = LazyLock::new(|| {
    log::trace!("building relational type table");

    HashMap::from([
        ("string", RelationalType::String(None)),
        ("text", RelationalType::Text),
        ("number", RelationalType::Real),
        ("integer", RelationalType::Integer),
        ("date", RelationalType::Date),
        ("boolean", RelationalType::Boolean),
        ("now", RelationalType::Date),
        ("blob", RelationalType::Blob),
        ("enum", RelationalType::Enum(Vec::new())),
    ])
});

/// Looks up the document-store type for a tag.
///
/// # Errors
///
/// Returns [`ModelError::UnsupportedType`] naming the tag on a table miss.
pub fn document_type(tag: &str) -> ModelResult<DocumentType> {
    DOCUMENT_TYPES
        .get(tag)
        .copied()
        .ok_or_else(|| ModelError::UnsupportedType(tag.to_string()))
}

/// Looks up the unnarrowed relational type for a tag.
///
/// # Errors
///
/// Returns [`ModelError::UnsupportedType`] naming the tag on a table miss.
pub fn relational_type(tag: &str) -> ModelResult<RelationalType> {
    RELATIONAL_TYPES
        .get(tag)
        .cloned()
        .ok_or_else(|| ModelError::UnsupportedType(tag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_tables_cover_every_tag() {
        for tag in TYPE_TAGS {
            assert!(document_type(tag).is_ok(), "document table misses {tag}");
            assert!(relational_type(tag).is_ok(), "relational table misses {tag}");
        }
    }

    #[test]
    fn lookup_miss_names_the_tag() {
        assert!(matches!(document_type("currency"), Err(ModelError::UnsupportedType(tag)) if tag == "currency"));
        assert!(matches!(relational_type("String"), Err(ModelError::UnsupportedType(tag)) if tag == "String"));
    }

    #[test]
    fn relational_type_display_includes_parameters() {
        assert_eq!(RelationalType::String(Some(123)).to_string(), "STRING(123)");
        assert_eq!(RelationalType::String(None).to_string(), "STRING");
        assert_eq!(
            RelationalType::Enum(vec!["a".into(), "b".into()]).to_string(),
            "ENUM(a, b)"
        );
    }
}
