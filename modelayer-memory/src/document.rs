//! In-memory document store.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Document, Uuid};
use indexmap::IndexMap;
use mea::rwlock::RwLock;

use modelayer_core::{
    backend::{BackendBuilder, DocumentBackend},
    error::{ModelError, ModelResult},
    query::{Filter, Query},
    record::DocumentRecord,
    schema::{DocumentSchema, SchemaDescriptor},
};

use crate::{
    constraints::Constraints,
    evaluator::{compare, matches},
};

#[derive(Debug, Default)]
struct StoredCollection {
    constraints: Option<Constraints>,
    records: IndexMap<Uuid, Document>,
}

impl StoredCollection {
    fn others(&self, id: Option<&Uuid>) -> impl Iterator<Item = &Document> + Clone {
        self.records
            .iter()
            .filter(move |(key, _)| Some(*key) != id)
            .map(|(_, fields)| fields)
    }

    fn first_match(&self, filter: &Filter) -> Option<Uuid> {
        self.records
            .iter()
            .find(|(_, fields)| matches(fields, filter))
            .map(|(id, _)| *id)
    }

    /// Validates and stores `fields` under an existing id.
    fn replace(&mut self, id: Uuid, fields: Document) -> ModelResult<Document> {
        let fields = match &self.constraints {
            Some(constraints) => {
                let fields = constraints.retain_declared(fields);
                constraints.check(&fields, self.others(Some(&id)))?;
                fields
            }
            None => fields,
        };

        self.records.insert(id, fields.clone());
        Ok(fields)
    }
}

/// A document store that keeps every collection in process memory.
///
/// Records are keyed by UUID and kept in insertion order. Once a schema has
/// been declared for a collection, every write is checked against it and
/// undeclared fields are discarded. Clones share the same data.
///
/// ```ignore
/// let store = InMemoryDocumentStore::builder().build().await?;
/// let users = converted.bind(Collection::new("users", store.clone()));
/// users.declare_schema().await?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, StoredCollection>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryDocumentStoreBuilder {
        InMemoryDocumentStoreBuilder
    }

    /// Number of records currently stored in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |stored| stored.records.len())
    }

    async fn update_where(
        &self,
        collection: &str,
        locate: impl FnOnce(&StoredCollection) -> Option<Uuid> + Send,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(id) = locate(stored) else {
            return Ok(None);
        };

        let mut fields = stored.records.get(&id).cloned().unwrap_or_default();
        for (field, value) in set {
            fields.insert(field, value);
        }

        let fields = stored.replace(id, fields)?;
        Ok(Some(DocumentRecord::new(id, fields)))
    }
}

#[async_trait]
impl DocumentBackend for InMemoryDocumentStore {
    async fn declare_schema(&self, collection: &str, schema: &DocumentSchema) -> ModelResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();
        stored.constraints = Some(Constraints::from(schema));

        log::trace!("declared {collection}: {:?}", schema.fields().keys().collect::<Vec<_>>());
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> ModelResult<Option<DocumentRecord>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|stored| stored.records.get(id))
            .map(|fields| DocumentRecord::new(*id, fields.clone())))
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> ModelResult<Option<DocumentRecord>> {
        let collections = self.collections.read().await;

        Ok(collections.get(collection).and_then(|stored| {
            stored
                .first_match(filter)
                .and_then(|id| stored.records.get(&id).map(|fields| DocumentRecord::new(id, fields.clone())))
        }))
    }

    async fn find(&self, collection: &str, query: Query) -> ModelResult<Vec<DocumentRecord>> {
        let collections = self.collections.read().await;
        let Some(stored) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<(&Uuid, &Document)> = stored
            .records
            .iter()
            .filter(|(_, fields)| matches(fields, &query.filter))
            .collect();

        if let Some(sort) = &query.sort {
            found.sort_by(|(_, left), (_, right)| compare(left, right, sort));
        }

        Ok(found
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(id, fields)| DocumentRecord::new(*id, fields.clone()))
            .collect())
    }

    async fn create(&self, collection: &str, fields: Document) -> ModelResult<DocumentRecord> {
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();

        let fields = match &stored.constraints {
            Some(constraints) => {
                let fields = constraints.prepare_new(fields);
                constraints.check(&fields, stored.others(None))?;
                fields
            }
            None => fields,
        };

        let id = Uuid::new();
        stored.records.insert(id, fields.clone());
        log::trace!("created {collection}/{id}");

        Ok(DocumentRecord::new(id, fields))
    }

    async fn save(&self, collection: &str, record: &DocumentRecord) -> ModelResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .filter(|stored| stored.records.contains_key(record.id()))
            .ok_or_else(|| ModelError::NotFound {
                model: collection.to_string(),
                target: record.id().to_string(),
            })?;

        stored.replace(*record.id(), record.fields().clone())?;
        Ok(())
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &Uuid,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        let id = *id;
        self.update_where(
            collection,
            move |stored| stored.records.contains_key(&id).then_some(id),
            set,
        )
        .await
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        self.update_where(collection, |stored| stored.first_match(filter), set)
            .await
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> ModelResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = stored.records.len();
        stored
            .records
            .retain(|_, fields| !matches(fields, filter));

        Ok((before - stored.records.len()) as u64)
    }

    async fn remove_record(&self, collection: &str, id: &Uuid) -> ModelResult<()> {
        if let Some(stored) = self.collections.write().await.get_mut(collection) {
            stored.records.shift_remove(id);
        }

        Ok(())
    }
}

/// Builds an empty [`InMemoryDocumentStore`].
#[derive(Debug, Default)]
pub struct InMemoryDocumentStoreBuilder;

#[async_trait]
impl BackendBuilder for InMemoryDocumentStoreBuilder {
    type Backend = InMemoryDocumentStore;

    async fn build(self) -> ModelResult<Self::Backend> {
        Ok(InMemoryDocumentStore::new())
    }
}
