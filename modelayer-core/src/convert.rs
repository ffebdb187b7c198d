//! The conversion entry point.
//!
//! [`convert`] turns a [`ModelCollection`] into backend schema descriptors for
//! one of the two supported backends. The caller's declarations are never
//! modified. Each converted model pairs a clone of its declaration with the
//! generated descriptor, and becomes a bound model once it is given a native
//! backend handle:
//!
//! ```ignore
//! let converted = convert(&models, "document", None)?;
//! let users = converted
//!     .into_document()?
//!     .shift_remove("user")
//!     .ok_or_else(|| ModelError::UnknownModel("user".into()))?
//!     .bind(Collection::new("users", store.clone()));
//! ```
//!
//! Conversion is synchronous. A bad backend identifier is rejected before any
//! model is looked at, and the first unconvertible field aborts the whole call.

use indexmap::IndexMap;
use std::{fmt, str::FromStr};

use crate::{
    backend::{DocumentBackend, RelationalBackend},
    collection::{Collection, Table},
    document::DocumentModel,
    error::{ModelError, ModelResult},
    model::{ModelCollection, ModelDeclaration},
    relational::RelationalModel,
    schema::{DocumentSchema, RelationalSchema},
};

/// The two supported persistence engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// A document store such as MongoDB.
    Document,
    /// A relational engine such as SQLite.
    Relational,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Document => "document",
            BackendKind::Relational => "relational",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "document" => Ok(BackendKind::Document),
            "relational" => Ok(BackendKind::Relational),
            other => Err(ModelError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// A declaration together with its generated descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedModel<S> {
    pub declaration: ModelDeclaration,
    pub schema: S,
}

impl<S> ConvertedModel<S> {
    pub fn name(&self) -> &str {
        &self.declaration.name
    }
}

impl ConvertedModel<DocumentSchema> {
    /// Binds the accessors to a document collection.
    pub fn bind<B: DocumentBackend>(self, collection: Collection<B>) -> DocumentModel<B> {
        DocumentModel::new(self.declaration, self.schema, collection)
    }
}

impl ConvertedModel<RelationalSchema> {
    /// Binds the accessors to a relational table.
    pub fn bind<B: RelationalBackend>(self, table: Table<B>) -> RelationalModel<B> {
        RelationalModel::new(self.declaration, self.schema, table)
    }
}

/// The result of a conversion call, keyed by model name in collection order.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Document(IndexMap<String, ConvertedModel<DocumentSchema>>),
    Relational(IndexMap<String, ConvertedModel<RelationalSchema>>),
}

impl Converted {
    pub fn backend(&self) -> BackendKind {
        match self {
            Converted::Document(_) => BackendKind::Document,
            Converted::Relational(_) => BackendKind::Relational,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Converted::Document(models) => models.len(),
            Converted::Relational(models) => models.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the converted models, in collection order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Converted::Document(models) => models.keys().map(String::as_str).collect(),
            Converted::Relational(models) => models.keys().map(String::as_str).collect(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedBackend`] when the conversion targeted
    /// the relational backend.
    pub fn into_document(self) -> ModelResult<IndexMap<String, ConvertedModel<DocumentSchema>>> {
        match self {
            Converted::Document(models) => Ok(models),
            other => Err(ModelError::UnsupportedBackend(format!(
                "{} (expected document)",
                other.backend()
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedBackend`] when the conversion targeted
    /// the document backend.
    pub fn into_relational(self) -> ModelResult<IndexMap<String, ConvertedModel<RelationalSchema>>> {
        match self {
            Converted::Relational(models) => Ok(models),
            other => Err(ModelError::UnsupportedBackend(format!(
                "{} (expected relational)",
                other.backend()
            ))),
        }
    }
}

/// Converts the models of `collection` for the named backend.
///
/// # Arguments
///
/// * `collection` - The model declarations to convert.
/// * `backend` - `"document"` or `"relational"`.
/// * `subset` - When given, only these models are converted, in collection order.
///
/// # Returns
///
/// A [`Converted`] map holding one [`ConvertedModel`] per converted model.
///
/// # Errors
///
/// * [`ModelError::UnsupportedBackend`] for any other backend identifier.
/// * [`ModelError::UnknownModel`] when `subset` names a model not in `collection`.
/// * [`ModelError::UnsupportedType`] or [`ModelError::InvalidTypeParameter`] when
///   a field cannot be converted. Nothing is returned for any model in that case.
pub fn convert(
    collection: &ModelCollection,
    backend: &str,
    subset: Option<&[&str]>,
) -> ModelResult<Converted> {
    let kind = backend.parse::<BackendKind>()?;
    let models = select(collection, subset)?;

    let converted = match kind {
        BackendKind::Document => Converted::Document(convert_each(&models, DocumentSchema::convert)?),
        BackendKind::Relational => {
            Converted::Relational(convert_each(&models, RelationalSchema::convert)?)
        }
    };

    log::debug!("converted {:?} for the {} backend", converted.names(), kind);

    Ok(converted)
}

fn select<'a>(
    collection: &'a ModelCollection,
    subset: Option<&[&str]>,
) -> ModelResult<Vec<&'a ModelDeclaration>> {
    match subset {
        None => Ok(collection.iter().collect()),
        Some(names) => {
            for name in names {
                collection.require(name)?;
            }

            Ok(collection
                .iter()
                .filter(|model| names.contains(&model.name.as_str()))
                .collect())
        }
    }
}

fn convert_each<S>(
    models: &[&ModelDeclaration],
    schema: impl Fn(&ModelDeclaration) -> ModelResult<S>,
) -> ModelResult<IndexMap<String, ConvertedModel<S>>> {
    models
        .iter()
        .map(|model| {
            let converted = ConvertedModel {
                declaration: (*model).clone(),
                schema: schema(model)?,
            };
            Ok((model.name.clone(), converted))
        })
        .collect()
}
