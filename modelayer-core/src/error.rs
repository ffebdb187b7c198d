//! Error types and result types for schema conversion and model operations.
//!
//! Setup-time failures (an unknown type tag, an unknown backend, a malformed
//! type parameter) are returned directly from the conversion call. Failures of
//! record operations are returned from the accessor futures; variants raised by
//! a backend are propagated as the backend produced them.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors produced by the model layer and its backends.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A field declares a type tag that has no entry in the type-mapping table.
    #[error("Unsupported type {0}")]
    UnsupportedType(String),
    /// The requested backend identifier is not one of the recognized values.
    #[error("{0} is not a supported database backend")]
    UnsupportedBackend(String),
    /// A type tag received a parameter it cannot accept.
    #[error("Invalid parameter {parameter:?} for type {tag}")]
    InvalidTypeParameter {
        /// The type tag being parsed.
        tag: String,
        /// The offending parameter, or an empty string when a required one is missing.
        parameter: String,
    },
    /// A model named in a conversion subset is not part of the collection.
    #[error("Model not found: {0}")]
    UnknownModel(String),
    /// The target of a find-and-update operation does not exist.
    #[error("{model} instance not found: {target}")]
    NotFound {
        /// The model the lookup ran against.
        model: String,
        /// A rendering of the identifier or filter that matched nothing.
        target: String,
    },
    /// Serialization/deserialization error when converting between value formats.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A record with the given identifier already exists.
    /// The first argument is the identifier, the second is the collection or table name.
    #[error("Record {0} already exists in {1}")]
    RecordAlreadyExists(String, String),
    /// A record violates a constraint declared by its schema descriptor.
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The field whose constraint failed.
        field: String,
        /// What the constraint rejected.
        message: String,
    },
    /// The record has an invalid structure.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// An error occurred in the underlying storage engine.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ModelError {
    /// Returns `true` when this error reports a missing find-and-update target.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }

    pub(crate) fn invalid_parameter(tag: &str, parameter: impl Into<String>) -> Self {
        ModelError::InvalidTypeParameter {
            tag: tag.to_string(),
            parameter: parameter.into(),
        }
    }
}

/// A specialized `Result` type for model layer operations.
pub type ModelResult<T> = Result<T, ModelError>;

impl From<BsonError> for ModelError {
    fn from(err: BsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ModelError {
    fn from(err: SerdeJsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
