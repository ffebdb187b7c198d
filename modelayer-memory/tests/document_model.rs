use bson::{Bson, doc};
use modelayer_core::{
    accessor::ModelAccessors,
    backend::BackendBuilder,
    collection::Collection,
    convert::convert,
    document::DocumentModel,
    error::ModelError,
    field::FieldDeclaration,
    model::{ModelCollection, ModelDeclaration},
    query::{Filter, FindOptions, SortDirection},
    update::UpdateOptions,
};
use modelayer_memory::InMemoryDocumentStore;
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn models() -> ModelCollection {
    ModelCollection::new().with(
        ModelDeclaration::new("user")
            .description("An account holder")
            .field("name", FieldDeclaration::new("string 32"))
            .field("password", FieldDeclaration::new("string").private())
            .field("created", FieldDeclaration::new("now").readonly())
            .field("role", FieldDeclaration::new("enum admin member").default_value("member"))
            .field("age", FieldDeclaration::new("integer").optional().min(0)),
    )
}

async fn users() -> DocumentModel<InMemoryDocumentStore> {
    init_logger();

    let store = InMemoryDocumentStore::builder().build().await.unwrap();
    let model = convert(&models(), "document", None)
        .unwrap()
        .into_document()
        .unwrap()
        .shift_remove("user")
        .unwrap()
        .bind(Collection::new("users", store));

    model.declare_schema().await.unwrap();
    model
}

#[tokio::test]
async fn create_applies_defaults_and_passes_protected_fields_through() {
    let users = users().await;

    let user = users
        .create(doc! { "name": "ann", "password": "secret" })
        .await
        .unwrap();

    assert_eq!(user.get("name"), Some(&Bson::String("ann".into())));
    assert_eq!(user.get("password"), Some(&Bson::String("secret".into())));
    assert_eq!(user.get("role"), Some(&Bson::String("member".into())));
    assert!(matches!(user.get("created"), Some(Bson::DateTime(_))));

    let found = users.find_by_id(user.id()).await.unwrap();
    assert_eq!(found, Some(user));
}

#[tokio::test]
async fn create_surfaces_backend_validation_errors() {
    let users = users().await;

    let err = users.create(doc! { "password": "secret" }).await.unwrap_err();
    assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "name"));
    assert!(!err.is_not_found());

    let err = users.create(doc! { "name": "ann", "role": "owner" }).await.unwrap_err();
    assert!(matches!(err, ModelError::Validation { ref field, .. } if field == "role"));
}

#[tokio::test]
async fn update_instance_with_default_options_skips_protected_fields() {
    let users = users().await;
    let mut user = users
        .create(doc! { "name": "ann", "password": "secret" })
        .await
        .unwrap();
    let created = user.get("created").cloned();

    users
        .update_instance(
            &mut user,
            &doc! { "name": "bea", "password": "changed", "created": 0 },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(user.get("name"), Some(&Bson::String("bea".into())));
    assert_eq!(user.get("password"), Some(&Bson::String("secret".into())));
    assert_eq!(user.get("created").cloned(), created);

    let stored = users.find_by_id(user.id()).await.unwrap().unwrap();
    assert_eq!(stored, user);
}

#[tokio::test]
async fn update_instance_changes_nothing_beyond_the_payload() {
    let users = users().await;
    let mut user = users
        .create(doc! { "name": "ann", "password": "secret", "age": 30 })
        .await
        .unwrap();
    let before = user.clone();

    users
        .update_instance(&mut user, &doc! { "age": 31 }, UpdateOptions::default())
        .await
        .unwrap();

    let mut expected = before.into_fields();
    expected.insert("age", 31);
    assert_eq!(user.fields(), &expected);
}

#[tokio::test]
async fn override_flags_allow_protected_updates() {
    let users = users().await;
    let user = users
        .create(doc! { "name": "ann", "password": "secret" })
        .await
        .unwrap();

    let updated = users
        .find_by_id_and_update(
            user.id(),
            &doc! { "password": "changed" },
            UpdateOptions::default().allow_private(true),
        )
        .await
        .unwrap();

    assert_eq!(updated.get("password"), Some(&Bson::String("changed".into())));
}

#[tokio::test]
async fn find_and_update_report_missing_targets_as_not_found() {
    let users = users().await;

    let err = users
        .find_by_id_and_update(&bson::Uuid::new(), &doc! { "name": "x" }, UpdateOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("not found"));

    let err = users
        .find_one_and_update(doc! { "name": "nobody" }.into(), &doc! { "name": "x" }, UpdateOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn find_one_and_update_locates_by_filter() {
    let users = users().await;
    users.create(doc! { "name": "ann", "password": "a" }).await.unwrap();
    users.create(doc! { "name": "bea", "password": "b" }).await.unwrap();

    let updated = users
        .find_one_and_update(
            doc! { "name": "bea" }.into(),
            &doc! { "age": 40, "password": "ignored" },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(updated.get("age"), Some(&Bson::Int32(40)));
    assert_eq!(updated.get("password"), Some(&Bson::String("b".into())));
}

#[tokio::test]
async fn find_forwards_options_to_the_backend() {
    let users = users().await;
    for (name, age) in [("ann", 30), ("bea", 20), ("cat", 40)] {
        users
            .create(doc! { "name": name, "password": "p", "age": age })
            .await
            .unwrap();
    }

    let names = |records: Vec<modelayer_core::record::DocumentRecord>| {
        records
            .iter()
            .map(|record| record.get("name").and_then(Bson::as_str).unwrap_or_default().to_string())
            .collect::<Vec<_>>()
    };

    let all = users.find(Filter::all(), FindOptions::new()).await.unwrap();
    assert_eq!(names(all), vec!["ann", "bea", "cat"]);

    let sorted = users
        .find(Filter::eq("role", "member"), FindOptions::new().sort("age", SortDirection::Desc))
        .await
        .unwrap();
    assert_eq!(names(sorted), vec!["cat", "ann", "bea"]);

    let page = users
        .find(Filter::all(), FindOptions::new().offset(1).limit(1))
        .await
        .unwrap();
    assert_eq!(names(page), vec!["bea"]);

    let first = users.find_one(doc! { "age": 40 }.into()).await.unwrap().unwrap();
    assert_eq!(first.get("name"), Some(&Bson::String("cat".into())));
}

#[tokio::test]
async fn delete_and_delete_instance_empty_the_scope() {
    let users = users().await;
    let ann = users.create(doc! { "name": "ann", "password": "p" }).await.unwrap();
    users.create(doc! { "name": "bea", "password": "p", "age": 1 }).await.unwrap();
    users.create(doc! { "name": "cat", "password": "p", "age": 1 }).await.unwrap();

    assert_eq!(users.delete(doc! { "age": 1 }.into()).await.unwrap(), 2);
    assert!(users.find(doc! { "age": 1 }.into(), FindOptions::new()).await.unwrap().is_empty());

    users.delete_instance(ann).await.unwrap();
    assert!(users.find(doc! {}.into(), FindOptions::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn declaring_a_schema_twice_is_harmless() {
    let users = users().await;
    users.declare_schema().await.unwrap();

    users.create(doc! { "name": "ann", "password": "p" }).await.unwrap();
    assert_eq!(users.collection().backend().count("users").await, 1);
}
