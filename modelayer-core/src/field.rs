//! Field declarations and the per-field type grammar.
//!
//! A field is declared with a type string of the form `"<tag> [param...]"`,
//! for example `"string 2083"` or `"enum draft published archived"`, plus a set
//! of modifiers. Declarations deserialize from the JSON shape applications
//! author by hand:
//!
//! ```ignore
//! use modelayer_core::field::FieldDeclaration;
//!
//! let field: FieldDeclaration = serde_json::from_str(
//!     r#"{ "type": "string 64", "required": false, "private": true }"#,
//! )?;
//! assert!(!field.is_required());
//! ```

use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ModelError, ModelResult};

/// An application-authored description of one model field.
///
/// Absent modifiers keep their defaults: a field is required unless it says
/// otherwise, and is neither private nor readonly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// The type string, `"<tag> [param...]"`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether a value must be present. `None` means required; an explicit
    /// `null` means not required.
    #[serde(
        default,
        deserialize_with = "null_is_not_required",
        skip_serializing_if = "Option::is_none"
    )]
    pub required: Option<bool>,
    /// Excludes the field from update payloads unless explicitly allowed.
    #[serde(default, deserialize_with = "null_is_false")]
    pub private: bool,
    /// Excludes the field from update payloads unless explicitly allowed.
    #[serde(default, deserialize_with = "null_is_false")]
    pub readonly: bool,
    /// Passed through as a uniqueness constraint when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    /// Explicit default value. Takes precedence over the `now` timestamp default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Bson>,
    /// Lower bound passed through to the backend's validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Bson>,
    /// Upper bound passed through to the backend's validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Bson>,
    /// Free-text documentation for the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn null_is_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_is_not_required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    null_is_false(deserializer).map(Some)
}

impl FieldDeclaration {
    /// Creates a declaration with the given type string and default modifiers.
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            required: None,
            private: false,
            readonly: false,
            unique: None,
            default: None,
            min: None,
            max: None,
            description: None,
        }
    }

    /// Sets the `required` modifier explicitly.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Shorthand for `required(false)`.
    pub fn optional(self) -> Self {
        self.required(false)
    }

    /// Marks the field private.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Marks the field readonly.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Sets the `unique` modifier.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Sets an explicit default value.
    pub fn default_value(mut self, value: impl Into<Bson>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the lower bound.
    pub fn min(mut self, value: impl Into<Bson>) -> Self {
        self.min = Some(value.into());
        self
    }

    /// Sets the upper bound.
    pub fn max(mut self, value: impl Into<Bson>) -> Self {
        self.max = Some(value.into());
        self
    }

    /// Attaches a description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Resolves the `required` modifier. A missing key means required.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(true)
    }

    /// Splits the type string into its tag and parameters.
    pub fn field_type(&self) -> FieldType {
        FieldType::parse(&self.ty)
    }
}

/// A parsed type string: the tag plus its tag-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    tag: String,
    params: Vec<String>,
}

impl FieldType {
    /// Parses a whitespace-delimited type string. The first token is the tag.
    ///
    /// Parsing never fails; whether the tag is recognized is decided by the
    /// type-mapping tables.
    pub fn parse(declared: &str) -> Self {
        let mut tokens = declared.split_whitespace().map(str::to_string);

        Self {
            tag: tokens.next().unwrap_or_default(),
            params: tokens.collect(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Reads the optional length bound of a `string` type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTypeParameter`] when the parameter is not a
    /// non-negative integer or more than one parameter is given.
    pub fn max_length(&self) -> ModelResult<Option<u32>> {
        match self.params.as_slice() {
            [] => Ok(None),
            [length] => length
                .parse::<u32>()
                .map(Some)
                .map_err(|_| ModelError::invalid_parameter(&self.tag, length.as_str())),
            [_, extra, ..] => Err(ModelError::invalid_parameter(&self.tag, extra.as_str())),
        }
    }

    /// Reads the permitted values of an `enum` type, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidTypeParameter`] when no values are declared.
    pub fn enum_values(&self) -> ModelResult<Vec<String>> {
        if self.params.is_empty() {
            return Err(ModelError::invalid_parameter(&self.tag, ""));
        }

        Ok(self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_tag_and_params() {
        let ty = FieldType::parse("  enum a b  c d ");

        assert_eq!(ty.tag(), "enum");
        assert_eq!(ty.params(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn empty_type_string_has_empty_tag() {
        assert_eq!(FieldType::parse("").tag(), "");
    }

    #[test]
    fn string_length_must_be_an_integer() {
        assert_eq!(FieldType::parse("string 123").max_length().unwrap(), Some(123));
        assert_eq!(FieldType::parse("string").max_length().unwrap(), None);
        assert!(matches!(
            FieldType::parse("string long").max_length(),
            Err(ModelError::InvalidTypeParameter { parameter, .. }) if parameter == "long"
        ));
        assert!(FieldType::parse("string 1 2").max_length().is_err());
    }

    #[test]
    fn enum_requires_values() {
        assert!(FieldType::parse("enum").enum_values().is_err());
    }

    #[test]
    fn missing_required_key_means_required() {
        let field: FieldDeclaration = serde_json::from_str(r#"{ "type": "string" }"#).unwrap();
        assert!(field.is_required());
        assert!(!field.private);
        assert!(!field.readonly);

        let field: FieldDeclaration =
            serde_json::from_str(r#"{ "type": "string", "required": false }"#).unwrap();
        assert!(!field.is_required());
    }

    #[test]
    fn null_modifiers_are_false() {
        let field: FieldDeclaration = serde_json::from_str(
            r#"{ "type": "string", "required": null, "private": null, "readonly": null }"#,
        )
        .unwrap();

        assert!(!field.is_required());
        assert!(!field.private);
        assert!(!field.readonly);
    }
}
