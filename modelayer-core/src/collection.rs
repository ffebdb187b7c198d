//! Native backend handles.
//!
//! A handle names one collection (document store) or table (relational
//! engine) on a concrete backend. Bound models require a handle at
//! construction, so a model cannot exist without the storage it talks to.
//!
//! ```ignore
//! let backend = InMemoryDocumentStore::new();
//! let users = Collection::new("users", backend.clone());
//! let model = converted.bind(users);
//! ```

use bson::{Document, Uuid};

use crate::{
    backend::{DocumentBackend, RelationalBackend},
    error::ModelResult,
    query::{Filter, Query},
    record::{DocumentRecord, Row},
    schema::{DocumentSchema, RelationalSchema},
};

/// A named collection on a document backend.
#[derive(Debug, Clone)]
pub struct Collection<B: DocumentBackend> {
    name: String,
    backend: B,
}

impl<B: DocumentBackend> Collection<B> {
    pub fn new(name: impl Into<String>, backend: B) -> Self {
        Self { name: name.into(), backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn declare_schema(&self, schema: &DocumentSchema) -> ModelResult<()> {
        self.backend
            .declare_schema(&self.name, schema)
            .await
    }

    pub async fn find_by_id(&self, id: &Uuid) -> ModelResult<Option<DocumentRecord>> {
        self.backend.find_by_id(&self.name, id).await
    }

    pub async fn find_one(&self, filter: &Filter) -> ModelResult<Option<DocumentRecord>> {
        self.backend.find_one(&self.name, filter).await
    }

    pub async fn find(&self, query: Query) -> ModelResult<Vec<DocumentRecord>> {
        self.backend.find(&self.name, query).await
    }

    pub async fn create(&self, fields: Document) -> ModelResult<DocumentRecord> {
        self.backend.create(&self.name, fields).await
    }

    pub async fn save(&self, record: &DocumentRecord) -> ModelResult<()> {
        self.backend.save(&self.name, record).await
    }

    pub async fn find_by_id_and_update(
        &self,
        id: &Uuid,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        self.backend
            .find_by_id_and_update(&self.name, id, set)
            .await
    }

    pub async fn find_one_and_update(
        &self,
        filter: &Filter,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        self.backend
            .find_one_and_update(&self.name, filter, set)
            .await
    }

    pub async fn remove(&self, filter: &Filter) -> ModelResult<u64> {
        self.backend.remove(&self.name, filter).await
    }

    pub async fn remove_record(&self, id: &Uuid) -> ModelResult<()> {
        self.backend.remove_record(&self.name, id).await
    }
}

/// A named table on a relational backend.
#[derive(Debug, Clone)]
pub struct Table<B: RelationalBackend> {
    name: String,
    backend: B,
}

impl<B: RelationalBackend> Table<B> {
    pub fn new(name: impl Into<String>, backend: B) -> Self {
        Self { name: name.into(), backend }
    }

    /// Returns the name of this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn define(&self, schema: &RelationalSchema) -> ModelResult<()> {
        self.backend.define_table(&self.name, schema).await
    }

    pub async fn find_by_pk(&self, id: i64) -> ModelResult<Option<Row>> {
        self.backend.find_by_pk(&self.name, id).await
    }

    pub async fn find_one(&self, filter: &Filter) -> ModelResult<Option<Row>> {
        self.backend.find_one(&self.name, filter).await
    }

    pub async fn find_all(&self, query: Query) -> ModelResult<Vec<Row>> {
        self.backend.find_all(&self.name, query).await
    }

    pub async fn create(&self, values: Document) -> ModelResult<Row> {
        self.backend.create(&self.name, values).await
    }

    pub async fn save(&self, row: &Row) -> ModelResult<Row> {
        self.backend.save(&self.name, row).await
    }

    pub async fn destroy(&self, filter: &Filter) -> ModelResult<u64> {
        self.backend.destroy(&self.name, filter).await
    }

    pub async fn destroy_row(&self, id: i64) -> ModelResult<()> {
        self.backend.destroy_row(&self.name, id).await
    }
}
