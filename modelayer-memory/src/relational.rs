//! In-memory relational store.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document};
use indexmap::IndexMap;
use mea::rwlock::RwLock;

use modelayer_core::{
    backend::{BackendBuilder, RelationalBackend},
    error::{ModelError, ModelResult},
    query::{Filter, Query},
    record::Row,
    schema::RelationalSchema,
};

use crate::{
    constraints::Constraints,
    evaluator::{compare, matches},
};

#[derive(Debug)]
struct StoredTable {
    constraints: Constraints,
    next_id: i64,
    rows: IndexMap<i64, Document>,
}

impl StoredTable {
    fn others(&self, id: Option<i64>) -> impl Iterator<Item = &Document> + Clone {
        self.rows
            .iter()
            .filter(move |(key, _)| Some(**key) != id)
            .map(|(_, values)| values)
    }

    /// Every declared column, with null for those not given.
    fn complete(&self, values: Document) -> Document {
        let mut values = self.constraints.retain_declared(values);

        for column in self.constraints.fields() {
            if !values.contains_key(column) {
                values.insert(column, Bson::Null);
            }
        }

        values
    }

    fn row(&self, id: i64) -> Option<Row> {
        self.rows.get(&id).map(|values| Row::new(id, values.clone()))
    }
}

type Tables = HashMap<String, StoredTable>;

fn no_such_table(table: &str) -> ModelError {
    ModelError::Backend(format!("no such table: {table}"))
}

/// A relational store that keeps every table in process memory.
///
/// Tables exist once [`define_table`](RelationalBackend::define_table) has run
/// for them; any other operation on an undefined table fails the way a real
/// engine would. Primary keys start at 1 and are never reused.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRelationalStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryRelationalStoreBuilder {
        InMemoryRelationalStoreBuilder
    }

    /// Number of rows currently stored in `table`.
    pub async fn count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |stored| stored.rows.len())
    }
}

#[async_trait]
impl RelationalBackend for InMemoryRelationalStore {
    async fn define_table(&self, table: &str, schema: &RelationalSchema) -> ModelResult<()> {
        let mut tables = self.tables.write().await;

        if tables.contains_key(table) {
            log::debug!("table {table} already defined");
        } else {
            log::trace!("creating table {table}");
            tables.insert(
                table.to_string(),
                StoredTable {
                    constraints: Constraints::from(schema),
                    next_id: 1,
                    rows: IndexMap::new(),
                },
            );
        }

        Ok(())
    }

    async fn find_by_pk(&self, table: &str, id: i64) -> ModelResult<Option<Row>> {
        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| no_such_table(table))?;

        Ok(stored.row(id))
    }

    async fn find_one(&self, table: &str, filter: &Filter) -> ModelResult<Option<Row>> {
        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| no_such_table(table))?;

        Ok(stored
            .rows
            .iter()
            .find(|(_, values)| matches(values, filter))
            .map(|(id, values)| Row::new(*id, values.clone())))
    }

    async fn find_all(&self, table: &str, query: Query) -> ModelResult<Vec<Row>> {
        let tables = self.tables.read().await;
        let stored = tables.get(table).ok_or_else(|| no_such_table(table))?;

        let mut found: Vec<(&i64, &Document)> = stored
            .rows
            .iter()
            .filter(|(_, values)| matches(values, &query.filter))
            .collect();

        if let Some(sort) = &query.sort {
            found.sort_by(|(_, left), (_, right)| compare(left, right, sort));
        }

        Ok(found
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(id, values)| Row::new(*id, values.clone()))
            .collect())
    }

    async fn create(&self, table: &str, values: Document) -> ModelResult<Row> {
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| no_such_table(table))?;

        let values = stored.complete(stored.constraints.prepare_new(values));
        stored.constraints.check(&values, stored.others(None))?;

        let id = stored.next_id;
        stored.next_id += 1;
        stored.rows.insert(id, values.clone());
        log::trace!("inserted {table}#{id}");

        Ok(Row::new(id, values))
    }

    async fn save(&self, table: &str, row: &Row) -> ModelResult<Row> {
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| no_such_table(table))?;
        let id = *row.id();

        if !stored.rows.contains_key(&id) {
            return Err(ModelError::NotFound {
                model: table.to_string(),
                target: id.to_string(),
            });
        }

        let values = stored.complete(row.fields().clone());
        stored.constraints.check(&values, stored.others(Some(id)))?;
        stored.rows.insert(id, values.clone());

        Ok(Row::new(id, values))
    }

    async fn destroy(&self, table: &str, filter: &Filter) -> ModelResult<u64> {
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| no_such_table(table))?;

        let before = stored.rows.len();
        stored
            .rows
            .retain(|_, values| !matches(values, filter));

        Ok((before - stored.rows.len()) as u64)
    }

    async fn destroy_row(&self, table: &str, id: i64) -> ModelResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables.get_mut(table).ok_or_else(|| no_such_table(table))?;
        stored.rows.shift_remove(&id);

        Ok(())
    }
}

/// Builds an empty [`InMemoryRelationalStore`].
#[derive(Debug, Default)]
pub struct InMemoryRelationalStoreBuilder;

#[async_trait]
impl BackendBuilder for InMemoryRelationalStoreBuilder {
    type Backend = InMemoryRelationalStore;

    async fn build(self) -> ModelResult<Self::Backend> {
        Ok(InMemoryRelationalStore::new())
    }
}
