//! Persistence-engine collaborator traits.
//!
//! The model layer does not store anything itself. It needs each engine to
//! declare a schema from a generated descriptor and to perform basic
//! create/read/update/delete operations. The two traits here capture those
//! capabilities in the shape each kind of engine natively offers:
//!
//! - [`DocumentBackend`] mirrors a document store. Records are keyed by UUID and
//!   updates by identifier or filter are a single `$set`-style call.
//! - [`RelationalBackend`] mirrors a relational engine. Rows are keyed by an
//!   integer primary key and updates go through load-then-save.
//!
//! Errors returned by a backend reach the caller unchanged; the accessors
//! propagate them with `?`.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`. The layer adds no locking or version
//! checks of its own, so concurrent writes to the same record are ordered only
//! by the backend.

use async_trait::async_trait;
use bson::{Document, Uuid};
use std::fmt::Debug;

use crate::{
    error::ModelResult,
    query::{Filter, Query},
    record::{DocumentRecord, Row},
    schema::{DocumentSchema, RelationalSchema},
};

/// Document-store collaborator.
#[async_trait]
pub trait DocumentBackend: Send + Sync + Debug {
    /// Installs the schema descriptor for a collection, replacing any previous one.
    async fn declare_schema(&self, collection: &str, schema: &DocumentSchema) -> ModelResult<()>;

    /// Fetches one record by identifier. A miss is `Ok(None)`.
    async fn find_by_id(&self, collection: &str, id: &Uuid) -> ModelResult<Option<DocumentRecord>>;

    /// Fetches the first record matching the filter.
    async fn find_one(&self, collection: &str, filter: &Filter) -> ModelResult<Option<DocumentRecord>>;

    /// Fetches all records matching the query.
    async fn find(&self, collection: &str, query: Query) -> ModelResult<Vec<DocumentRecord>>;

    /// Persists a new record, returning it with its assigned identifier and
    /// any backend-applied defaults.
    async fn create(&self, collection: &str, fields: Document) -> ModelResult<DocumentRecord>;

    /// Persists the full state of an existing record.
    async fn save(&self, collection: &str, record: &DocumentRecord) -> ModelResult<()>;

    /// Applies `set` to the record with the given identifier and returns the
    /// updated record, or `Ok(None)` when no record has that identifier.
    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &Uuid,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>>;

    /// Applies `set` to the first record matching the filter.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>>;

    /// Removes every record matching the filter, returning how many were removed.
    async fn remove(&self, collection: &str, filter: &Filter) -> ModelResult<u64>;

    /// Removes exactly one record.
    async fn remove_record(&self, collection: &str, id: &Uuid) -> ModelResult<()>;
}

/// Relational collaborator.
#[async_trait]
pub trait RelationalBackend: Send + Sync + Debug {
    /// Declares a table from the schema descriptor.
    async fn define_table(&self, table: &str, schema: &RelationalSchema) -> ModelResult<()>;

    /// Fetches one row by primary key. A miss is `Ok(None)`.
    async fn find_by_pk(&self, table: &str, id: i64) -> ModelResult<Option<Row>>;

    /// Fetches the first row matching the filter.
    async fn find_one(&self, table: &str, filter: &Filter) -> ModelResult<Option<Row>>;

    /// Fetches all rows matching the query.
    async fn find_all(&self, table: &str, query: Query) -> ModelResult<Vec<Row>>;

    /// Inserts a new row, returning it as stored.
    async fn create(&self, table: &str, values: Document) -> ModelResult<Row>;

    /// Writes the row's current values and returns the row as stored.
    async fn save(&self, table: &str, row: &Row) -> ModelResult<Row>;

    /// Deletes every row matching the filter, returning how many were deleted.
    async fn destroy(&self, table: &str, filter: &Filter) -> ModelResult<u64>;

    /// Deletes exactly one row.
    async fn destroy_row(&self, table: &str, id: i64) -> ModelResult<()>;
}

#[async_trait]
impl<B> DocumentBackend for &B
where
    B: DocumentBackend,
{
    async fn declare_schema(&self, collection: &str, schema: &DocumentSchema) -> ModelResult<()> {
        (*self).declare_schema(collection, schema).await
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> ModelResult<Option<DocumentRecord>> {
        (*self).find_by_id(collection, id).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> ModelResult<Option<DocumentRecord>> {
        (*self).find_one(collection, filter).await
    }

    async fn find(&self, collection: &str, query: Query) -> ModelResult<Vec<DocumentRecord>> {
        (*self).find(collection, query).await
    }

    async fn create(&self, collection: &str, fields: Document) -> ModelResult<DocumentRecord> {
        (*self).create(collection, fields).await
    }

    async fn save(&self, collection: &str, record: &DocumentRecord) -> ModelResult<()> {
        (*self).save(collection, record).await
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &Uuid,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        (*self)
            .find_by_id_and_update(collection, id, set)
            .await
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        (*self)
            .find_one_and_update(collection, filter, set)
            .await
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> ModelResult<u64> {
        (*self).remove(collection, filter).await
    }

    async fn remove_record(&self, collection: &str, id: &Uuid) -> ModelResult<()> {
        (*self).remove_record(collection, id).await
    }
}

#[async_trait]
impl<B> RelationalBackend for &B
where
    B: RelationalBackend,
{
    async fn define_table(&self, table: &str, schema: &RelationalSchema) -> ModelResult<()> {
        (*self).define_table(table, schema).await
    }

    async fn find_by_pk(&self, table: &str, id: i64) -> ModelResult<Option<Row>> {
        (*self).find_by_pk(table, id).await
    }

    async fn find_one(&self, table: &str, filter: &Filter) -> ModelResult<Option<Row>> {
        (*self).find_one(table, filter).await
    }

    async fn find_all(&self, table: &str, query: Query) -> ModelResult<Vec<Row>> {
        (*self).find_all(table, query).await
    }

    async fn create(&self, table: &str, values: Document) -> ModelResult<Row> {
        (*self).create(table, values).await
    }

    async fn save(&self, table: &str, row: &Row) -> ModelResult<Row> {
        (*self).save(table, row).await
    }

    async fn destroy(&self, table: &str, filter: &Filter) -> ModelResult<u64> {
        (*self).destroy(table, filter).await
    }

    async fn destroy_row(&self, table: &str, id: i64) -> ModelResult<()> {
        (*self).destroy_row(table, id).await
    }
}

/// Factory for backend instances, typically carrying connection settings.
#[async_trait]
pub trait BackendBuilder {
    type Backend;

    async fn build(self) -> ModelResult<Self::Backend>;
}
