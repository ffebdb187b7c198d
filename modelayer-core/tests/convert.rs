use bson::Bson;
use modelayer_core::{
    convert::{BackendKind, Converted, convert},
    error::ModelError,
    field::FieldDeclaration,
    model::{ModelCollection, ModelDeclaration},
    schema::{DefaultValue, DocumentSchema, RelationalSchema, SchemaDescriptor, Validation},
    types::{DocumentType, RelationalType, TYPE_TAGS},
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn test_models() -> ModelCollection {
    ModelCollection::from_json_value(json!({
        "testModel": {
            "definition": {
                "string": { "type": "string" },
                "stringLen": { "type": "string 123" },
                "text": { "type": "text" },
                "number": { "type": "number" },
                "integer": { "type": "integer" },
                "date": { "type": "date" },
                "bool": { "type": "boolean" },
                "now": { "type": "now" },
                "blob": { "type": "blob" },
                "enum": { "type": "enum a b c d " },

                "req": { "type": "string", "required": true },
                "nreq": { "type": "string", "required": false },
                "dreq": { "type": "string" },

                "minmax": { "type": "number", "min": -3, "max": 5.4 }
            }
        }
    }))
    .unwrap()
}

fn document_schema(models: &ModelCollection) -> DocumentSchema {
    convert(models, "document", None)
        .unwrap()
        .into_document()
        .unwrap()
        .shift_remove("testModel")
        .unwrap()
        .schema
}

fn relational_schema(models: &ModelCollection) -> RelationalSchema {
    convert(models, "relational", None)
        .unwrap()
        .into_relational()
        .unwrap()
        .shift_remove("testModel")
        .unwrap()
        .schema
}

fn is_minus_three(value: &Bson) -> bool {
    matches!(value, Bson::Int32(-3) | Bson::Int64(-3))
}

#[test]
fn document_types_follow_the_mapping_table() {
    let schema = document_schema(&test_models());
    let ty = |name: &str| schema.get(name).unwrap().ty;

    assert_eq!(ty("string"), DocumentType::String);
    assert_eq!(ty("stringLen"), DocumentType::String);
    assert_eq!(ty("text"), DocumentType::String);
    assert_eq!(ty("number"), DocumentType::Number);
    assert_eq!(ty("integer"), DocumentType::Number);
    assert_eq!(ty("date"), DocumentType::Date);
    assert_eq!(ty("bool"), DocumentType::Boolean);
    assert_eq!(ty("now"), DocumentType::Date);
    assert_eq!(ty("blob"), DocumentType::Buffer);
    assert_eq!(ty("enum"), DocumentType::String);
}

#[test]
fn relational_types_follow_the_mapping_table() {
    let schema = relational_schema(&test_models());
    let ty = |name: &str| schema.get(name).unwrap().ty.clone();

    assert_eq!(ty("string"), RelationalType::String(None));
    assert_eq!(ty("text"), RelationalType::Text);
    assert_eq!(ty("number"), RelationalType::Real);
    assert_eq!(ty("integer"), RelationalType::Integer);
    assert_eq!(ty("date"), RelationalType::Date);
    assert_eq!(ty("bool"), RelationalType::Boolean);
    assert_eq!(ty("now"), RelationalType::Date);
    assert_eq!(ty("blob"), RelationalType::Blob);
}

#[test]
fn string_length_bound() {
    let models = test_models();

    let document = document_schema(&models);
    assert_eq!(document.get("stringLen").unwrap().max_length, Some(123));
    assert_eq!(document.get("string").unwrap().max_length, None);

    let relational = relational_schema(&models);
    assert_eq!(relational.get("stringLen").unwrap().ty, RelationalType::String(Some(123)));
    assert_eq!(relational.get("stringLen").unwrap().ty.to_string(), "STRING(123)");
}

#[test]
fn enum_values_keep_declared_order() {
    let models = test_models();
    let expected: Vec<String> = ["a", "b", "c", "d"].map(String::from).to_vec();

    let document = document_schema(&models);
    assert_eq!(document.get("enum").unwrap().enum_values, Some(expected.clone()));

    let relational = relational_schema(&models);
    assert_eq!(relational.get("enum").unwrap().ty, RelationalType::Enum(expected));
}

#[test]
fn required_defaults_to_true() {
    let models = test_models();

    let document = document_schema(&models);
    assert!(document.get("req").unwrap().required);
    assert!(!document.get("nreq").unwrap().required);
    assert!(document.get("dreq").unwrap().required);

    let relational = relational_schema(&models);
    assert!(!relational.get("req").unwrap().allow_null);
    assert!(relational.get("nreq").unwrap().allow_null);
    assert!(!relational.get("dreq").unwrap().allow_null);
}

#[test]
fn min_and_max_are_flat_in_documents_and_nested_in_columns() {
    let models = test_models();

    let field = document_schema(&models).get("minmax").cloned().unwrap();
    assert!(is_minus_three(field.min.as_ref().unwrap()));
    assert_eq!(field.max, Some(Bson::Double(5.4)));

    let column = relational_schema(&models).get("minmax").cloned().unwrap();
    let Some(Validation { min: Some(min), max }) = column.validate else {
        panic!("expected nested validation, got {:?}", column.validate);
    };
    assert!(is_minus_three(&min));
    assert_eq!(max, Some(Bson::Double(5.4)));

    assert_eq!(relational_schema(&models).get("number").unwrap().validate, None);
}

#[test]
fn now_is_a_timestamp_default_and_explicit_defaults_win() {
    let models = ModelCollection::new().with(
        ModelDeclaration::new("event")
            .field("at", FieldDeclaration::new("now"))
            .field("fixed", FieldDeclaration::new("now").default_value("2020-01-01"))
            .field("label", FieldDeclaration::new("string").default_value("none")),
    );

    let document = convert(&models, "document", None).unwrap().into_document().unwrap();
    let schema = &document["event"].schema;
    assert_eq!(schema.get("at").unwrap().default, Some(DefaultValue::CurrentTimestamp));
    assert_eq!(
        schema.get("fixed").unwrap().default,
        Some(DefaultValue::Value(Bson::String("2020-01-01".into())))
    );
    assert_eq!(
        schema.get("label").unwrap().default,
        Some(DefaultValue::Value(Bson::String("none".into())))
    );

    let relational = convert(&models, "relational", None).unwrap().into_relational().unwrap();
    let schema = &relational["event"].schema;
    assert_eq!(schema.get("at").unwrap().default_value, Some(DefaultValue::CurrentTimestamp));
    assert_eq!(
        schema.get("fixed").unwrap().default_value,
        Some(DefaultValue::Value(Bson::String("2020-01-01".into())))
    );
}

#[test]
fn flags_are_copied_verbatim() {
    let models = ModelCollection::new().with(
        ModelDeclaration::new("account")
            .field("password", FieldDeclaration::new("string").private())
            .field("created", FieldDeclaration::new("now").readonly())
            .field("email", FieldDeclaration::new("string").unique(true)),
    );

    let document = convert(&models, "document", None).unwrap().into_document().unwrap();
    let schema = &document["account"].schema;
    assert!(schema.get("password").unwrap().private);
    assert!(!schema.get("password").unwrap().readonly);
    assert!(schema.get("created").unwrap().readonly);
    assert_eq!(schema.get("email").unwrap().unique, Some(true));

    let relational = convert(&models, "relational", None).unwrap().into_relational().unwrap();
    let schema = &relational["account"].schema;
    assert!(schema.get("password").unwrap().private);
    assert!(schema.get("created").unwrap().readonly);
    assert!(!schema.get("created").unwrap().private);
    assert_eq!(schema.get("email").unwrap().unique, Some(true));
}

#[test]
fn every_declared_field_has_exactly_one_descriptor() {
    let models = test_models();
    let declared: Vec<&str> = models
        .get("testModel")
        .unwrap()
        .fields()
        .map(|(name, _)| name)
        .collect();

    assert_eq!(document_schema(&models).field_names(), declared);
    assert_eq!(relational_schema(&models).field_names(), declared);
}

#[test]
fn every_recognized_tag_converts_on_both_backends() {
    for tag in TYPE_TAGS {
        let declared = if tag == "enum" { "enum x".to_string() } else { tag.to_string() };
        let models = ModelCollection::new()
            .with(ModelDeclaration::new("m").field("f", FieldDeclaration::new(declared)));

        assert!(convert(&models, "document", None).is_ok(), "document: {tag}");
        assert!(convert(&models, "relational", None).is_ok(), "relational: {tag}");
    }
}

#[test]
fn unrecognized_tag_fails_without_a_descriptor() {
    let models = ModelCollection::new().with(
        ModelDeclaration::new("price")
            .field("label", FieldDeclaration::new("string"))
            .field("amount", FieldDeclaration::new("currency")),
    );

    for backend in ["document", "relational"] {
        match convert(&models, backend, None) {
            Err(ModelError::UnsupportedType(tag)) => assert_eq!(tag, "currency"),
            other => panic!("{backend}: expected UnsupportedType, got {other:?}"),
        }
    }
}

#[test]
fn malformed_type_parameters_are_rejected() {
    for declared in ["string abc", "string 12 34", "enum"] {
        let models = ModelCollection::new()
            .with(ModelDeclaration::new("m").field("f", FieldDeclaration::new(declared)));

        assert!(
            matches!(
                convert(&models, "relational", None),
                Err(ModelError::InvalidTypeParameter { .. })
            ),
            "{declared}"
        );
    }
}

#[test]
fn unrecognized_backend_fails_without_touching_models() {
    let models = test_models();
    let before = models.clone();

    match convert(&models, "couchdb", None) {
        Err(err @ ModelError::UnsupportedBackend(_)) => {
            assert_eq!(err.to_string(), "couchdb is not a supported database backend");
        }
        other => panic!("expected UnsupportedBackend, got {other:?}"),
    }

    assert_eq!(models, before);
}

#[test]
fn backend_is_checked_before_models() {
    let models = ModelCollection::new()
        .with(ModelDeclaration::new("m").field("f", FieldDeclaration::new("currency")));

    assert!(matches!(
        convert(&models, "graph", Some(&["missing"])),
        Err(ModelError::UnsupportedBackend(_))
    ));
}

#[test]
fn conversion_is_idempotent() {
    let models = test_models();

    assert_eq!(convert(&models, "document", None).unwrap(), convert(&models, "document", None).unwrap());
    assert_eq!(
        convert(&models, "relational", None).unwrap(),
        convert(&models, "relational", None).unwrap()
    );
}

#[test]
fn conversion_leaves_declarations_untouched() {
    let models = test_models();
    let before = models.clone();

    let converted = convert(&models, "document", None).unwrap();

    assert_eq!(models, before);
    assert_eq!(converted.backend(), BackendKind::Document);
    let Converted::Document(converted) = converted else {
        unreachable!();
    };
    assert_eq!(&converted["testModel"].declaration, models.get("testModel").unwrap());
}
