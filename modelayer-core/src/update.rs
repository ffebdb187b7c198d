//! The field-visibility policy applied to update payloads.
//!
//! Every update accessor, on every backend, runs its payload through
//! [`filter_updates`] before anything reaches storage. A field survives when it
//! is declared in the schema, present in the payload, and not hidden by its
//! `private`/`readonly` flags. Anything else is dropped silently.
//!
//! The option flags are permissive: `allow_readonly_updates = true` lets
//! readonly fields through, and the same for private fields. Both default to
//! `false`, so an update made with default options never touches a protected
//! field.

use bson::Document;

use crate::schema::{FieldFlags, SchemaDescriptor};

/// Per-call overrides of the visibility policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Let fields marked `readonly` be updated.
    pub allow_readonly_updates: bool,
    /// Let fields marked `private` be updated.
    pub allow_private_updates: bool,
}

impl UpdateOptions {
    /// Options that let every declared field through.
    pub fn unrestricted() -> Self {
        Self {
            allow_readonly_updates: true,
            allow_private_updates: true,
        }
    }

    pub fn allow_readonly(mut self, allow: bool) -> Self {
        self.allow_readonly_updates = allow;
        self
    }

    pub fn allow_private(mut self, allow: bool) -> Self {
        self.allow_private_updates = allow;
        self
    }

    /// Whether a field with the given flags may be updated under these options.
    pub fn permits<F: FieldFlags>(&self, field: &F) -> bool {
        if field.is_readonly() && !self.allow_readonly_updates {
            return false;
        }
        if field.is_private() && !self.allow_private_updates {
            return false;
        }

        true
    }
}

/// Returns the subset of `updates` the schema allows under `options`.
///
/// Surviving fields keep schema declaration order.
pub fn filter_updates<S: SchemaDescriptor>(
    schema: &S,
    updates: &Document,
    options: &UpdateOptions,
) -> Document {
    let mut permitted = Document::new();

    for (name, field) in schema.fields() {
        if !options.permits(field) {
            continue;
        }
        if let Some(value) = updates.get(name) {
            permitted.insert(name.clone(), value.clone());
        }
    }

    if permitted.len() < updates.len() {
        log::debug!(
            "update filter dropped {:?}",
            updates
                .keys()
                .filter(|key| !permitted.contains_key(key.as_str()))
                .collect::<Vec<_>>()
        );
    }

    permitted
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        field::FieldDeclaration,
        model::ModelDeclaration,
        schema::{DocumentSchema, RelationalSchema},
    };

    fn account() -> ModelDeclaration {
        ModelDeclaration::new("account")
            .field("name", FieldDeclaration::new("string"))
            .field("password", FieldDeclaration::new("string").private())
            .field("created", FieldDeclaration::new("date").readonly())
            .field("token", FieldDeclaration::new("string").private().readonly())
    }

    fn payload() -> Document {
        doc! {
            "name": "bob",
            "password": "hunter2",
            "created": 0,
            "token": "t",
            "undeclared": true,
        }
    }

    #[test]
    fn default_options_keep_only_unprotected_fields() {
        let schema = DocumentSchema::convert(&account()).unwrap();

        assert_eq!(
            filter_updates(&schema, &payload(), &UpdateOptions::default()),
            doc! { "name": "bob" }
        );
    }

    #[test]
    fn each_flag_unlocks_only_its_own_fields() {
        let schema = DocumentSchema::convert(&account()).unwrap();

        assert_eq!(
            filter_updates(&schema, &payload(), &UpdateOptions::default().allow_private(true)),
            doc! { "name": "bob", "password": "hunter2" }
        );
        assert_eq!(
            filter_updates(&schema, &payload(), &UpdateOptions::default().allow_readonly(true)),
            doc! { "name": "bob", "created": 0 }
        );
        assert_eq!(
            filter_updates(&schema, &payload(), &UpdateOptions::unrestricted()),
            doc! { "name": "bob", "password": "hunter2", "created": 0, "token": "t" }
        );
    }

    #[test]
    fn both_backends_share_the_same_polarity() {
        let model = account();
        let document = DocumentSchema::convert(&model).unwrap();
        let relational = RelationalSchema::convert(&model).unwrap();

        for options in [
            UpdateOptions::default(),
            UpdateOptions::default().allow_private(true),
            UpdateOptions::default().allow_readonly(true),
            UpdateOptions::unrestricted(),
        ] {
            assert_eq!(
                filter_updates(&document, &payload(), &options),
                filter_updates(&relational, &payload(), &options),
            );
        }
    }

    #[test]
    fn fields_absent_from_the_payload_are_not_invented() {
        let schema = RelationalSchema::convert(&account()).unwrap();

        assert_eq!(
            filter_updates(&schema, &doc! { "password": "x" }, &UpdateOptions::default()),
            doc! {}
        );
    }
}
