//! MongoDB backend for modelayer.
//!
//! [`MongoDbStore`] implements the document backend on top of the official
//! async driver. Declaring a schema creates the collection with a
//! `$jsonSchema` validator derived from the descriptor, so MongoDB itself
//! rejects documents that break the declared types, lengths, enum values, and
//! bounds. Unique fields get a unique index.
//!
//! Enable it through the facade crate:
//!
//! ```toml
//! [dependencies]
//! modelayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! ```ignore
//! use modelayer::{backend::BackendBuilder, mongodb::MongoDbStore};
//!
//! let store = MongoDbStore::builder("mongodb://localhost:27017", "app")
//!     .build()
//!     .await?;
//! ```

pub mod query;
pub mod store;
pub mod validator;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
