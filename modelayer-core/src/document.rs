//! Accessors bound to a document-store collection.
//!
//! Updates located by identifier or filter are issued as a single native
//! find-and-update with a `$set` of the permitted fields, so the stored record
//! is modified in place by the backend. `update_instance` applies the permitted
//! fields to the loaded record and saves the whole record back.

use async_trait::async_trait;
use bson::{Document, Uuid};

use crate::{
    accessor::ModelAccessors,
    backend::DocumentBackend,
    collection::Collection,
    error::{ModelError, ModelResult},
    model::ModelDeclaration,
    query::{Filter, FindOptions, Query},
    record::DocumentRecord,
    schema::DocumentSchema,
    update::{UpdateOptions, filter_updates},
};

/// A model declaration bound to a document collection.
#[derive(Debug, Clone)]
pub struct DocumentModel<B: DocumentBackend> {
    declaration: ModelDeclaration,
    schema: DocumentSchema,
    collection: Collection<B>,
}

impl<B: DocumentBackend> DocumentModel<B> {
    pub fn new(declaration: ModelDeclaration, schema: DocumentSchema, collection: Collection<B>) -> Self {
        Self {
            declaration,
            schema,
            collection,
        }
    }

    pub fn declaration(&self) -> &ModelDeclaration {
        &self.declaration
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn collection(&self) -> &Collection<B> {
        &self.collection
    }

    /// Registers this model's schema with the collection.
    ///
    /// Safe to call more than once.
    pub async fn declare_schema(&self) -> ModelResult<()> {
        log::debug!("declaring schema for {} on {}", self.declaration.name, self.collection.name());
        self.collection.declare_schema(&self.schema).await
    }

    fn not_found(&self, target: impl Into<String>) -> ModelError {
        let err = ModelError::NotFound {
            model: self.declaration.name.clone(),
            target: target.into(),
        };
        log::debug!("{err}");
        err
    }
}

#[async_trait]
impl<B: DocumentBackend> ModelAccessors for DocumentModel<B> {
    type Id = Uuid;

    fn name(&self) -> &str {
        &self.declaration.name
    }

    async fn find_by_id(&self, id: &Uuid) -> ModelResult<Option<DocumentRecord>> {
        self.collection.find_by_id(id).await
    }

    async fn find_one(&self, filter: Filter) -> ModelResult<Option<DocumentRecord>> {
        self.collection.find_one(&filter).await
    }

    async fn find(&self, filter: Filter, options: FindOptions) -> ModelResult<Vec<DocumentRecord>> {
        self.collection.find(Query::new(filter, options)).await
    }

    async fn create(&self, payload: Document) -> ModelResult<DocumentRecord> {
        self.collection.create(payload).await
    }

    async fn update_instance(
        &self,
        instance: &mut DocumentRecord,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<()> {
        let permitted = filter_updates(&self.schema, updates, &options);
        let mut updated = instance.clone();
        updated.apply(permitted);

        self.collection.save(&updated).await?;
        *instance = updated;

        Ok(())
    }

    async fn find_by_id_and_update(
        &self,
        id: &Uuid,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<DocumentRecord> {
        let permitted = filter_updates(&self.schema, updates, &options);

        self.collection
            .find_by_id_and_update(id, permitted)
            .await?
            .ok_or_else(|| self.not_found(id.to_string()))
    }

    async fn find_one_and_update(
        &self,
        filter: Filter,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<DocumentRecord> {
        let permitted = filter_updates(&self.schema, updates, &options);

        self.collection
            .find_one_and_update(&filter, permitted)
            .await?
            .ok_or_else(|| self.not_found(format!("{filter:?}")))
    }

    async fn delete(&self, filter: Filter) -> ModelResult<u64> {
        self.collection.remove(&filter).await
    }

    async fn delete_instance(&self, instance: DocumentRecord) -> ModelResult<()> {
        self.collection.remove_record(instance.id()).await
    }
}
