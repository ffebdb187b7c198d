//! # modelayer-core
//!
//! Core abstractions for modelayer: a database-agnostic description of models
//! built from primitive fields, and the machinery that turns those descriptions
//! into a document-store schema or a relational table definition with a uniform
//! set of CRUD accessors on top.
//!
//! ## Modules
//!
//! - [`field`] and [`model`]: the application-authored declarations
//! - [`types`]: the type-tag mapping tables for both backends
//! - [`schema`]: backend schema descriptors and the schema converter
//! - [`convert`]: the conversion entry point
//! - [`update`]: the field-visibility policy for update payloads
//! - [`accessor`], [`document`], [`relational`]: accessors bound to a backend
//! - [`backend`] and [`collection`]: the persistence-engine seam and its handles
//! - [`query`] and [`record`]: filters, find options, and native records
//! - [`error`]: the error type shared by every crate in the workspace

pub mod accessor;
pub mod backend;
pub mod collection;
pub mod convert;
pub mod document;
pub mod error;
pub mod field;
pub mod model;
pub mod query;
pub mod record;
pub mod relational;
pub mod schema;
pub mod types;
pub mod update;
