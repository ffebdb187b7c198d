//! Backend schema descriptors and the schema converter.
//!
//! Converting a [`ModelDeclaration`] produces one descriptor entry per declared
//! field, in declaration order. The two backends receive differently shaped
//! descriptors:
//!
//! - [`DocumentSchema`] keeps constraints as flat attributes (`max_length`,
//!   `enum_values`, `min`, `max`) on a field whose type is one of the coarse
//!   [`DocumentType`]s.
//! - [`RelationalSchema`] narrows the column type itself (`STRING(n)`,
//!   `ENUM(...)`), expresses optionality as `allow_null`, and nests `min`/`max`
//!   under a [`Validation`] object.
//!
//! Both carry the `private` and `readonly` flags verbatim; those flags drive the
//! update filter in [`crate::update`].
//!
//! A descriptor is always rebuilt from scratch, so converting the same
//! declaration twice yields equal descriptors. When a field fails to convert no
//! descriptor is returned at all.

use bson::Bson;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelResult,
    field::FieldDeclaration,
    model::ModelDeclaration,
    types::{self, DocumentType, RelationalType},
};

/// A default applied by the backend when a value is not supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// The current timestamp at the moment the record is created.
    /// Derived from the `now` type tag.
    CurrentTimestamp,
    /// An explicitly declared value.
    Value(Bson),
}

/// Access-control flags shared by every backend's field descriptor.
pub trait FieldFlags {
    fn is_private(&self) -> bool;
    fn is_readonly(&self) -> bool;
}

/// A backend schema descriptor: an ordered mapping from field name to a
/// backend-native field descriptor.
pub trait SchemaDescriptor {
    type Field: FieldFlags;

    fn fields(&self) -> &IndexMap<String, Self::Field>;

    fn get(&self, name: &str) -> Option<&Self::Field> {
        self.fields().get(name)
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields().keys().map(String::as_str).collect()
    }
}

/// Document-store descriptor for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentField {
    pub ty: DocumentType,
    pub required: bool,
    pub private: bool,
    pub readonly: bool,
    /// Maximum string length, from a `string <n>` declaration.
    pub max_length: Option<u32>,
    pub default: Option<DefaultValue>,
    /// Permitted values, from an `enum` declaration.
    pub enum_values: Option<Vec<String>>,
    pub min: Option<Bson>,
    pub max: Option<Bson>,
    pub unique: Option<bool>,
}

impl DocumentField {
    /// Builds the descriptor for a single declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnsupportedType`](crate::error::ModelError::UnsupportedType)
    /// for an unknown tag and
    /// [`ModelError::InvalidTypeParameter`](crate::error::ModelError::InvalidTypeParameter)
    /// for a malformed `string` length or an empty `enum`.
    pub fn convert(declaration: &FieldDeclaration) -> ModelResult<Self> {
        let field_type = declaration.field_type();
        let mut field = DocumentField {
            ty: types::document_type(field_type.tag())?,
            required: declaration.is_required(),
            private: declaration.private,
            readonly: declaration.readonly,
            max_length: None,
            default: None,
            enum_values: None,
            min: declaration.min.clone(),
            max: declaration.max.clone(),
            unique: declaration.unique,
        };

        match field_type.tag() {
            "string" => field.max_length = field_type.max_length()?,
            "now" => field.default = Some(DefaultValue::CurrentTimestamp),
            "enum" => field.enum_values = Some(field_type.enum_values()?),
            _ => {}
        }

        if let Some(value) = &declaration.default {
            field.default = Some(DefaultValue::Value(value.clone()));
        }

        Ok(field)
    }
}

impl FieldFlags for DocumentField {
    fn is_private(&self) -> bool {
        self.private
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }
}

/// The document-store schema descriptor of one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentSchema {
    fields: IndexMap<String, DocumentField>,
}

impl DocumentSchema {
    /// Converts every field of `model`, in declaration order.
    ///
    /// # Errors
    ///
    /// Fails on the first field that cannot be converted; see
    /// [`DocumentField::convert`].
    pub fn convert(model: &ModelDeclaration) -> ModelResult<Self> {
        let mut fields = IndexMap::with_capacity(model.definition.len());

        for (name, declaration) in model.fields() {
            let field = DocumentField::convert(declaration)?;
            log::trace!("{}.{}: {:?}", model.name, name, field);
            fields.insert(name.to_string(), field);
        }

        Ok(Self { fields })
    }
}

impl SchemaDescriptor for DocumentSchema {
    type Field = DocumentField;

    fn fields(&self) -> &IndexMap<String, DocumentField> {
        &self.fields
    }
}

/// Nested validation constraints of a relational column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub min: Option<Bson>,
    pub max: Option<Bson>,
}

/// Relational descriptor for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalColumn {
    pub ty: RelationalType,
    pub required: bool,
    /// Always the negation of `required`.
    pub allow_null: bool,
    pub private: bool,
    pub readonly: bool,
    pub default_value: Option<DefaultValue>,
    pub unique: Option<bool>,
    /// Present only when `min` or `max` was declared.
    pub validate: Option<Validation>,
}

impl RelationalColumn {
    /// Builds the descriptor for a single declaration.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DocumentField::convert`].
    pub fn convert(declaration: &FieldDeclaration) -> ModelResult<Self> {
        let field_type = declaration.field_type();
        let required = declaration.is_required();
        let mut column = RelationalColumn {
            ty: types::relational_type(field_type.tag())?,
            required,
            allow_null: !required,
            private: declaration.private,
            readonly: declaration.readonly,
            default_value: None,
            unique: declaration.unique,
            validate: None,
        };

        match field_type.tag() {
            "string" => {
                if let Some(length) = field_type.max_length()? {
                    column.ty = RelationalType::String(Some(length));
                }
            }
            "now" => column.default_value = Some(DefaultValue::CurrentTimestamp),
            "enum" => column.ty = RelationalType::Enum(field_type.enum_values()?),
            _ => {}
        }

        if let Some(value) = &declaration.default {
            column.default_value = Some(DefaultValue::Value(value.clone()));
        }

        if declaration.min.is_some() || declaration.max.is_some() {
            column.validate = Some(Validation {
                min: declaration.min.clone(),
                max: declaration.max.clone(),
            });
        }

        Ok(column)
    }
}

impl FieldFlags for RelationalColumn {
    fn is_private(&self) -> bool {
        self.private
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }
}

/// The relational schema descriptor of one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationalSchema {
    fields: IndexMap<String, RelationalColumn>,
}

impl RelationalSchema {
    /// Converts every field of `model`, in declaration order.
    ///
    /// # Errors
    ///
    /// Fails on the first field that cannot be converted; see
    /// [`RelationalColumn::convert`].
    pub fn convert(model: &ModelDeclaration) -> ModelResult<Self> {
        let mut fields = IndexMap::with_capacity(model.definition.len());

        for (name, declaration) in model.fields() {
            let column = RelationalColumn::convert(declaration)?;
            log::trace!("{}.{}: {}", model.name, name, column.ty);
            fields.insert(name.to_string(), column);
        }

        Ok(Self { fields })
    }
}

impl SchemaDescriptor for RelationalSchema {
    type Field = RelationalColumn;

    fn fields(&self) -> &IndexMap<String, RelationalColumn> {
        &self.fields
    }
}
