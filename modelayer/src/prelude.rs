//! Commonly used types and traits.
//!
//! ```ignore
//! use modelayer::prelude::*;
//! ```

pub use modelayer_core::{
    accessor::ModelAccessors,
    backend::{BackendBuilder, DocumentBackend, RelationalBackend},
    collection::{Collection, Table},
    convert::{BackendKind, Converted, ConvertedModel, convert},
    document::DocumentModel,
    error::{ModelError, ModelResult},
    field::{FieldDeclaration, FieldType},
    model::{ModelCollection, ModelDeclaration},
    query::{Filter, FindOptions, Query, Sort, SortDirection},
    record::{DocumentRecord, Record, Row, encode},
    relational::RelationalModel,
    schema::{DefaultValue, DocumentSchema, RelationalSchema, SchemaDescriptor},
    update::{UpdateOptions, filter_updates},
};
