#![cfg(feature = "sqlite")]

use modelayer::{bson::{Bson, doc}, prelude::*, sqlite::SqliteStore};
use pretty_assertions::assert_eq;

async fn tasks() -> RelationalModel<SqliteStore> {
    let _ = env_logger::builder().is_test(true).try_init();

    let models = ModelCollection::new().with(
        ModelDeclaration::new("task")
            .field("title", FieldDeclaration::new("string 32"))
            .field("done", FieldDeclaration::new("boolean").default_value(false))
            .field("owner", FieldDeclaration::new("string").readonly()),
    );
    let store = SqliteStore::builder().in_memory().build().await.unwrap();
    let tasks = convert(&models, "relational", None)
        .unwrap()
        .into_relational()
        .unwrap()
        .shift_remove("task")
        .unwrap()
        .bind(Table::new("tasks", store));

    tasks.define_table().await.unwrap();
    tasks
}

#[tokio::test]
async fn sqlite_rows_follow_the_update_policy() {
    let tasks = tasks().await;

    let task = tasks
        .create(doc! { "title": "write docs", "owner": "ann" })
        .await
        .unwrap();
    assert_eq!(task.get("done"), Some(&Bson::Boolean(false)));

    let task = tasks
        .find_by_id_and_update(task.id(), &doc! { "done": true, "owner": "bea" }, UpdateOptions::default())
        .await
        .unwrap();
    assert_eq!(task.get("done"), Some(&Bson::Boolean(true)));
    assert_eq!(task.get("owner"), Some(&Bson::String("ann".into())));

    let open = tasks
        .find(Filter::eq("done", false), FindOptions::default())
        .await
        .unwrap();
    assert!(open.is_empty());
}
