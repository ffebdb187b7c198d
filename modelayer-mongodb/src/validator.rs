//! `$jsonSchema` validators derived from document schemas.

use bson::{Bson, Document, doc};

use modelayer_core::{
    schema::{DocumentField, DocumentSchema, SchemaDescriptor},
    types::DocumentType,
};

fn bson_types(ty: DocumentType) -> Vec<&'static str> {
    match ty {
        DocumentType::String => vec!["string"],
        DocumentType::Number => vec!["int", "long", "double", "decimal"],
        DocumentType::Date => vec!["date"],
        DocumentType::Boolean => vec!["bool"],
        DocumentType::Buffer => vec!["binData"],
    }
}

fn property(field: &DocumentField) -> Document {
    let mut types = bson_types(field.ty);
    if !field.required {
        types.push("null");
    }

    let mut property = doc! { "bsonType": types };

    if let Some(length) = field.max_length {
        property.insert("maxLength", i64::from(length));
    }
    if let Some(values) = &field.enum_values {
        let mut allowed: Vec<Bson> = values.iter().cloned().map(Bson::String).collect();
        if !field.required {
            allowed.push(Bson::Null);
        }
        property.insert("enum", allowed);
    }
    if let Some(min) = &field.min {
        property.insert("minimum", min.clone());
    }
    if let Some(max) = &field.max {
        property.insert("maximum", max.clone());
    }

    property
}

/// The `$jsonSchema` body for a collection holding records of `schema`.
pub fn json_schema(schema: &DocumentSchema) -> Document {
    let mut properties = Document::new();
    let mut required = Vec::new();

    for (name, field) in schema.fields() {
        properties.insert(name.clone(), property(field));
        if field.required {
            required.push(Bson::String(name.clone()));
        }
    }

    let mut json_schema = doc! {
        "bsonType": "object",
        "properties": properties,
    };
    // An empty `required` array is rejected by the server.
    if !required.is_empty() {
        json_schema.insert("required", required);
    }

    json_schema
}

/// The unique fields of `schema`, in declaration order.
pub fn unique_fields(schema: &DocumentSchema) -> Vec<&str> {
    schema
        .fields()
        .iter()
        .filter(|(_, field)| field.unique == Some(true))
        .map(|(name, _)| name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use modelayer_core::{field::FieldDeclaration, model::ModelDeclaration};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn validator_mirrors_the_descriptor() {
        let model = ModelDeclaration::new("user")
            .field("name", FieldDeclaration::new("string 16").unique(true))
            .field("role", FieldDeclaration::new("enum a b").optional())
            .field("age", FieldDeclaration::new("integer").optional().min(0));
        let schema = DocumentSchema::convert(&model).unwrap();

        assert_eq!(
            json_schema(&schema),
            doc! {
                "bsonType": "object",
                "properties": {
                    "name": { "bsonType": ["string"], "maxLength": 16_i64 },
                    "role": { "bsonType": ["string", "null"], "enum": ["a", "b", Bson::Null] },
                    "age": { "bsonType": ["int", "long", "double", "decimal", "null"], "minimum": 0 },
                },
                "required": ["name"],
            }
        );
        assert_eq!(unique_fields(&schema), vec!["name"]);
    }

    #[test]
    fn optional_only_models_omit_required() {
        let model = ModelDeclaration::new("note").field("body", FieldDeclaration::new("text").optional());
        let schema = DocumentSchema::convert(&model).unwrap();

        assert!(!json_schema(&schema).contains_key("required"));
    }
}
