//! SQLite backend for modelayer.
//!
//! [`SqliteStore`] implements the relational backend on a single `rusqlite`
//! connection behind an async mutex. `define_table` turns a relational schema
//! into a `CREATE TABLE IF NOT EXISTS` statement, and filters become
//! parameterized `WHERE` clauses.
//!
//! ```ignore
//! use modelayer::{backend::BackendBuilder, sqlite::SqliteStore};
//!
//! let store = SqliteStore::builder().path("app.db").build().await?;
//! let posts = converted.bind(Table::new("posts", store.clone()));
//! posts.define_table().await?;
//! ```

pub mod ddl;
pub mod query;
pub mod store;
pub(crate) mod value;

pub use store::{SqliteStore, SqliteStoreBuilder};
