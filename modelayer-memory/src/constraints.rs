//! Enforcement of declared schemas by the in-memory stores.
//!
//! Document fields and relational columns describe the same constraints in
//! different shapes. Both are flattened into a [`Constraint`] and checked by one
//! routine, so the two stores reject the same records.

use std::cmp::Ordering;

use bson::{Bson, DateTime, Document};

use modelayer_core::{
    error::{ModelError, ModelResult},
    record::normalize_date,
    schema::{DefaultValue, DocumentSchema, RelationalSchema, SchemaDescriptor},
    types::{DocumentType, RelationalType},
};

use crate::evaluator::Comparable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueClass {
    String,
    Number,
    Integer,
    Date,
    Boolean,
    Binary,
}

impl ValueClass {
    fn admits(&self, value: &Bson) -> bool {
        match self {
            ValueClass::String => matches!(value, Bson::String(_)),
            ValueClass::Number => matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)),
            ValueClass::Integer => matches!(value, Bson::Int32(_) | Bson::Int64(_)),
            ValueClass::Date => matches!(value, Bson::DateTime(_)),
            ValueClass::Boolean => matches!(value, Bson::Boolean(_)),
            ValueClass::Binary => matches!(value, Bson::Binary(_)),
        }
    }
}

/// The enforceable constraints of one field.
#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    pub field: String,
    pub class: ValueClass,
    pub required: bool,
    pub max_length: Option<u32>,
    pub enum_values: Option<Vec<String>>,
    pub min: Option<Bson>,
    pub max: Option<Bson>,
    pub unique: bool,
    pub default: Option<DefaultValue>,
}

impl Constraint {
    fn violation(&self, message: impl Into<String>) -> ModelError {
        ModelError::Validation {
            field: self.field.clone(),
            message: message.into(),
        }
    }

    fn check(&self, value: &Bson) -> ModelResult<()> {
        if !self.class.admits(value) {
            return Err(self.violation(format!("expected {:?}, got {:?}", self.class, value.element_type())));
        }

        if let (Some(limit), Bson::String(text)) = (self.max_length, value) {
            if text.chars().count() > limit as usize {
                return Err(self.violation(format!("longer than {limit} characters")));
            }
        }

        if let (Some(values), Bson::String(text)) = (&self.enum_values, value) {
            if !values.contains(text) {
                return Err(self.violation(format!("{text:?} is not one of {values:?}")));
            }
        }

        let value = Comparable::from(value);
        if let Some(min) = &self.min {
            if value.partial_cmp(&Comparable::from(min)) == Some(Ordering::Less) {
                return Err(self.violation(format!("less than minimum {min}")));
            }
        }
        if let Some(max) = &self.max {
            if value.partial_cmp(&Comparable::from(max)) == Some(Ordering::Greater) {
                return Err(self.violation(format!("greater than maximum {max}")));
            }
        }

        Ok(())
    }
}

/// The constraints of every declared field, in declaration order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Constraints(Vec<Constraint>);

impl From<&DocumentSchema> for Constraints {
    fn from(schema: &DocumentSchema) -> Self {
        Constraints(
            schema
                .fields()
                .iter()
                .map(|(name, field)| Constraint {
                    field: name.clone(),
                    class: match field.ty {
                        DocumentType::String => ValueClass::String,
                        DocumentType::Number => ValueClass::Number,
                        DocumentType::Date => ValueClass::Date,
                        DocumentType::Boolean => ValueClass::Boolean,
                        DocumentType::Buffer => ValueClass::Binary,
                    },
                    required: field.required,
                    max_length: field.max_length,
                    enum_values: field.enum_values.clone(),
                    min: field.min.clone(),
                    max: field.max.clone(),
                    unique: field.unique.unwrap_or(false),
                    default: field.default.clone(),
                })
                .collect(),
        )
    }
}

impl From<&RelationalSchema> for Constraints {
    fn from(schema: &RelationalSchema) -> Self {
        Constraints(
            schema
                .fields()
                .iter()
                .map(|(name, column)| {
                    let (class, max_length, enum_values) = match &column.ty {
                        RelationalType::String(length) => (ValueClass::String, *length, None),
                        RelationalType::Text => (ValueClass::String, None, None),
                        RelationalType::Real => (ValueClass::Number, None, None),
                        RelationalType::Integer => (ValueClass::Integer, None, None),
                        RelationalType::Date => (ValueClass::Date, None, None),
                        RelationalType::Boolean => (ValueClass::Boolean, None, None),
                        RelationalType::Blob => (ValueClass::Binary, None, None),
                        RelationalType::Enum(values) => (ValueClass::String, None, Some(values.clone())),
                    };
                    let validate = column.validate.clone().unwrap_or_default();

                    Constraint {
                        field: name.clone(),
                        class,
                        required: !column.allow_null,
                        max_length,
                        enum_values,
                        min: validate.min,
                        max: validate.max,
                        unique: column.unique.unwrap_or(false),
                        default: column.default_value.clone(),
                    }
                })
                .collect(),
        )
    }
}

impl Constraints {
    /// Drops undeclared fields and fills declared defaults for absent ones.
    pub fn prepare_new(&self, fields: Document) -> Document {
        let mut prepared = self.retain_declared(fields);

        for constraint in &self.0 {
            if is_absent(prepared.get(&constraint.field)) {
                match &constraint.default {
                    Some(DefaultValue::CurrentTimestamp) => {
                        prepared.insert(constraint.field.clone(), DateTime::now());
                    }
                    Some(DefaultValue::Value(value)) => {
                        prepared.insert(constraint.field.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }

        prepared
    }

    /// Keeps only declared fields, in declaration order. Date strings are
    /// parsed into dates.
    pub fn retain_declared(&self, mut fields: Document) -> Document {
        let mut retained = Document::new();

        for constraint in &self.0 {
            if let Some(value) = fields.remove(&constraint.field) {
                let value = match constraint.class {
                    ValueClass::Date => normalize_date(value),
                    _ => value,
                };
                retained.insert(constraint.field.clone(), value);
            }
        }

        if !fields.is_empty() {
            log::trace!("ignoring undeclared fields {:?}", fields.keys().collect::<Vec<_>>());
        }

        retained
    }

    /// Checks `fields` against every constraint. `others` are the other stored
    /// records, consulted for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] naming the first offending field.
    pub fn check<'a>(
        &self,
        fields: &Document,
        others: impl Iterator<Item = &'a Document> + Clone,
    ) -> ModelResult<()> {
        for constraint in &self.0 {
            let value = fields.get(&constraint.field);

            if is_absent(value) {
                if constraint.required {
                    return Err(constraint.violation("is required"));
                }
                continue;
            }

            let Some(value) = value else { continue };
            constraint.check(value)?;

            if constraint.unique {
                let taken = others.clone().any(|other| {
                    other
                        .get(&constraint.field)
                        .is_some_and(|existing| Comparable::from(existing) == Comparable::from(value))
                });
                if taken {
                    return Err(constraint.violation(format!("{value} is already taken")));
                }
            }
        }

        Ok(())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|constraint| constraint.field.as_str())
    }
}

fn is_absent(value: Option<&Bson>) -> bool {
    matches!(value, None | Some(Bson::Null))
}
