//! Accessors bound to a relational table.
//!
//! Relational engines have no native find-and-update, so every update is a
//! load, an in-memory assignment of the permitted fields, and a save.

use async_trait::async_trait;
use bson::Document;

use crate::{
    accessor::ModelAccessors,
    backend::RelationalBackend,
    collection::Table,
    error::{ModelError, ModelResult},
    model::ModelDeclaration,
    query::{Filter, FindOptions, Query},
    record::Row,
    schema::RelationalSchema,
    update::{UpdateOptions, filter_updates},
};

/// A model declaration bound to a relational table.
#[derive(Debug, Clone)]
pub struct RelationalModel<B: RelationalBackend> {
    declaration: ModelDeclaration,
    schema: RelationalSchema,
    table: Table<B>,
}

impl<B: RelationalBackend> RelationalModel<B> {
    pub fn new(declaration: ModelDeclaration, schema: RelationalSchema, table: Table<B>) -> Self {
        Self {
            declaration,
            schema,
            table,
        }
    }

    pub fn declaration(&self) -> &ModelDeclaration {
        &self.declaration
    }

    pub fn schema(&self) -> &RelationalSchema {
        &self.schema
    }

    pub fn table(&self) -> &Table<B> {
        &self.table
    }

    /// Creates the backing table if it does not exist yet.
    pub async fn define_table(&self) -> ModelResult<()> {
        log::debug!("defining table {} for {}", self.table.name(), self.declaration.name);
        self.table.define(&self.schema).await
    }

    async fn apply_and_save(&self, mut row: Row, updates: &Document, options: UpdateOptions) -> ModelResult<Row> {
        row.apply(filter_updates(&self.schema, updates, &options));
        self.table.save(&row).await
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
impl<B: RelationalBackend> ModelAccessors for RelationalModel<B> {
    type Id = i64;

    fn name(&self) -> &str {
        &self.declaration.name
    }

    async fn find_by_id(&self, id: &i64) -> ModelResult<Option<Row>> {
        self.table.find_by_pk(*id).await
    }

    async fn find_one(&self, filter: Filter) -> ModelResult<Option<Row>> {
        self.table.find_one(&filter).await
    }

    async fn find(&self, filter: Filter, options: FindOptions) -> ModelResult<Vec<Row>> {
        self.table.find_all(Query::new(filter, options)).await
    }

    async fn create(&self, payload: Document) -> ModelResult<Row> {
        self.table.create(payload).await
    }

    async fn update_instance(
        &self,
        instance: &mut Row,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<()> {
        *instance = self
            .apply_and_save(instance.clone(), updates, options)
            .await?;

        Ok(())
    }

    async fn find_by_id_and_update(
        &self,
        id: &i64,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<Row> {
        let row = self
            .table
            .find_by_pk(*id)
            .await?
            .ok_or_else(|| self.not_found(id.to_string()))?;

        self.apply_and_save(row, updates, options).await
    }

    async fn find_one_and_update(
        &self,
        filter: Filter,
        updates: &Document,
        options: UpdateOptions,
    ) -> ModelResult<Row> {
        let row = self
            .table
            .find_one(&filter)
            .await?
            .ok_or_else(|| self.not_found(format!("{filter:?}")))?;

        self.apply_and_save(row, updates, options).await
    }

    async fn delete(&self, filter: Filter) -> ModelResult<u64> {
        self.table.destroy(&filter).await
    }

    async fn delete_instance(&self, instance: Row) -> ModelResult<()> {
        self.table.destroy_row(*instance.id()).await
    }
}
