//! Database-agnostic models built from primitive fields.
//!
//! modelayer takes a set of model declarations, each a mapping from field name
//! to a small type grammar (`string`, `string 64`, `enum a b c`, `now`, ...) with
//! modifiers (`required`, `private`, `readonly`, `unique`, `default`, `min`,
//! `max`), and turns them into either a document-store schema or a relational
//! table definition. Each converted model is then bound to a native backend
//! handle and exposes the same CRUD accessors on either backend.
//!
//! # Quick Start
//!
//! ```ignore
//! use modelayer::{prelude::*, memory::InMemoryDocumentStore};
//! use modelayer::bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> ModelResult<()> {
//!     let models = ModelCollection::from_json_str(r#"{
//!         "user": {
//!             "definition": {
//!                 "name": { "type": "string 64" },
//!                 "password": { "type": "string", "private": true },
//!                 "created": { "type": "now", "readonly": true }
//!             }
//!         }
//!     }"#)?;
//!
//!     let store = InMemoryDocumentStore::builder().build().await?;
//!     let users = convert(&models, "document", None)?
//!         .into_document()?
//!         .shift_remove("user")
//!         .ok_or_else(|| ModelError::UnknownModel("user".into()))?
//!         .bind(Collection::new("users", store));
//!     users.declare_schema().await?;
//!
//!     let mut user = users.create(doc! { "name": "ann", "password": "hunter2" }).await?;
//!
//!     // `password` is private and `created` is readonly, so only `name` changes.
//!     users
//!         .update_instance(
//!             &mut user,
//!             &doc! { "name": "bea", "password": "x", "created": 0 },
//!             UpdateOptions::default(),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Update Visibility
//!
//! Update accessors drop any field marked `private` or `readonly` unless the
//! matching [`UpdateOptions`](update::UpdateOptions) flag is set. `create` is
//! never filtered.
//!
//! # Backends
//!
//! - [`memory`]: in-process document and relational stores
//! - `mongodb`: MongoDB document store (requires the `mongodb` feature)
//! - `sqlite`: SQLite relational store (requires the `sqlite` feature)

pub mod prelude;

pub use modelayer_core::{
    accessor, backend, collection, convert, document, error, field, model, query, record,
    relational, schema, types, update,
};

pub use bson;

/// In-memory backends.
pub mod memory {
    pub use modelayer_memory::{
        InMemoryDocumentStore, InMemoryDocumentStoreBuilder, InMemoryRelationalStore,
        InMemoryRelationalStoreBuilder,
    };
}

/// MongoDB document store.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use modelayer_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}

/// SQLite relational store.
///
/// This module is only available when the `sqlite` feature is enabled.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use modelayer_sqlite::{SqliteStore, SqliteStoreBuilder};
}
