//! Model declarations and collections of them.
//!
//! A model is a named, ordered mapping from field name to
//! [`FieldDeclaration`]. Collections are typically authored as JSON:
//!
//! ```ignore
//! use modelayer_core::model::ModelCollection;
//!
//! let models = ModelCollection::from_json_str(r#"{
//!     "user": {
//!         "description": "A user",
//!         "definition": {
//!             "name": { "type": "string" },
//!             "password": { "type": "string", "private": true },
//!             "url": { "type": "string 2083", "required": false }
//!         }
//!     }
//! }"#)?;
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, ModelResult},
    field::FieldDeclaration,
};

/// A named mapping from field name to field declaration.
///
/// Field order is the declaration order and is preserved through conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDeclaration {
    /// The model name. Filled from the collection key when deserialized.
    #[serde(skip)]
    pub name: String,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The declared fields.
    #[serde(default)]
    pub definition: IndexMap<String, FieldDeclaration>,
}

impl ModelDeclaration {
    /// Creates an empty declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            definition: IndexMap::new(),
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a field. Redeclaring a name replaces the earlier declaration in place.
    pub fn field(mut self, name: impl Into<String>, field: FieldDeclaration) -> Self {
        self.definition.insert(name.into(), field);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDeclaration)> {
        self.definition
            .iter()
            .map(|(name, field)| (name.as_str(), field))
    }
}

/// The set of model declarations an application hands to the converter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, ModelDeclaration>", into = "IndexMap<String, ModelDeclaration>")]
pub struct ModelCollection {
    models: IndexMap<String, ModelDeclaration>,
}

impl ModelCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a collection from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Serialization`] when the JSON is malformed or does
    /// not match the declaration shape.
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds a collection from an already-parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> ModelResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Adds a model, keyed by its name.
    pub fn insert(&mut self, model: ModelDeclaration) {
        self.models.insert(model.name.clone(), model);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, model: ModelDeclaration) -> Self {
        self.insert(model);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModelDeclaration> {
        self.models.get(name)
    }

    /// Looks a model up, failing with [`ModelError::UnknownModel`] when absent.
    pub fn require(&self, name: &str) -> ModelResult<&ModelDeclaration> {
        self.get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelDeclaration> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl From<IndexMap<String, ModelDeclaration>> for ModelCollection {
    fn from(models: IndexMap<String, ModelDeclaration>) -> Self {
        Self {
            models: models
                .into_iter()
                .map(|(name, mut model)| {
                    model.name = name.clone();
                    (name, model)
                })
                .collect(),
        }
    }
}

impl From<ModelCollection> for IndexMap<String, ModelDeclaration> {
    fn from(collection: ModelCollection) -> Self {
        collection.models
    }
}

impl FromIterator<ModelDeclaration> for ModelCollection {
    fn from_iter<T: IntoIterator<Item = ModelDeclaration>>(iter: T) -> Self {
        Self {
            models: iter
                .into_iter()
                .map(|model| (model.name.clone(), model))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_collection_names_models_after_their_keys() {
        let models = ModelCollection::from_json_str(
            r#"{
                "user": {
                    "description": "A user",
                    "definition": {
                        "name": { "type": "string" },
                        "password": { "type": "string", "private": true }
                    }
                }
            }"#,
        )
        .unwrap();

        let user = models.require("user").unwrap();
        assert_eq!(user.name, "user");
        assert_eq!(user.description.as_deref(), Some("A user"));
        assert_eq!(
            user.fields().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["name", "password"]
        );
        assert!(matches!(models.require("post"), Err(ModelError::UnknownModel(name)) if name == "post"));
    }
}
