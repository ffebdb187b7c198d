//! In-memory backends for modelayer.
//!
//! Two stores live here, one per backend kind:
//!
//! - [`InMemoryDocumentStore`] implements
//!   [`DocumentBackend`](modelayer_core::backend::DocumentBackend), keyed by UUID.
//! - [`InMemoryRelationalStore`] implements
//!   [`RelationalBackend`](modelayer_core::backend::RelationalBackend), keyed by an
//!   auto-incrementing integer.
//!
//! Both enforce the schema they are given: required fields, type classes,
//! string lengths, enum membership, min/max bounds, uniqueness, and defaults.
//! They are meant for development and tests.
//!
//! ```ignore
//! use modelayer_memory::InMemoryRelationalStore;
//!
//! let store = InMemoryRelationalStore::builder().build().await?;
//! let posts = converted.bind(Table::new("posts", store.clone()));
//! posts.define_table().await?;
//! ```

mod constraints;
pub mod document;
pub(crate) mod evaluator;
pub mod relational;

pub use document::{InMemoryDocumentStore, InMemoryDocumentStoreBuilder};
pub use relational::{InMemoryRelationalStore, InMemoryRelationalStoreBuilder};
