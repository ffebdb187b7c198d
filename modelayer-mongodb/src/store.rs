use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, DateTime, Document, Uuid, doc};
use futures::TryStreamExt;
use mea::rwlock::RwLock;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions, IndexOptions, ReturnDocument},
};

use modelayer_core::{
    backend::{BackendBuilder, DocumentBackend},
    error::{ModelError, ModelResult},
    query::{Filter, Query, SortDirection},
    record::{DocumentRecord, normalize_date},
    schema::{DefaultValue, DocumentSchema, SchemaDescriptor},
    types::DocumentType,
};

use crate::{query::filter_document, validator};

fn backend_error(err: mongodb::error::Error) -> ModelError {
    ModelError::Backend(err.to_string())
}

fn with_id(id: Uuid, fields: &Document) -> Document {
    let mut stored = doc! { "_id": id };
    for (name, value) in fields {
        stored.insert(name.clone(), value.clone());
    }

    stored
}

/// Splits a stored document back into its UUID `_id` and the record fields.
fn restore(mut document: Document) -> ModelResult<DocumentRecord> {
    let id = match document.remove("_id") {
        Some(Bson::Binary(binary)) => binary
            .to_uuid()
            .map_err(|e| ModelError::InvalidRecord(e.to_string()))?,
        other => {
            return Err(ModelError::InvalidRecord(format!(
                "expected a UUID _id, got {other:?}"
            )));
        }
    };

    Ok(DocumentRecord::new(id, document))
}

/// Keeps the declared fields of `fields`, in declaration order, with date
/// strings parsed into dates.
fn prepare(schema: &DocumentSchema, mut fields: Document) -> Document {
    let mut prepared = Document::new();

    for (name, field) in schema.fields() {
        if let Some(value) = fields.remove(name) {
            let value = match field.ty {
                DocumentType::Date => normalize_date(value),
                _ => value,
            };
            prepared.insert(name.clone(), value);
        }
    }

    if !fields.is_empty() {
        log::trace!("ignoring undeclared fields {:?}", fields.keys().collect::<Vec<_>>());
    }

    prepared
}

/// Fills declared defaults for absent or null fields. MongoDB has no
/// server-side defaults.
fn with_defaults(schema: &DocumentSchema, mut fields: Document) -> Document {
    for (name, field) in schema.fields() {
        if matches!(fields.get(name), None | Some(Bson::Null)) {
            match &field.default {
                Some(DefaultValue::CurrentTimestamp) => {
                    fields.insert(name.clone(), DateTime::now());
                }
                Some(DefaultValue::Value(value)) => {
                    fields.insert(name.clone(), value.clone());
                }
                None => {}
            }
        }
    }

    fields
}

/// The update document for a set of field values. An empty `$set` is rejected
/// by the server, so there is none when nothing is set.
fn update_document(set: Document) -> Option<Document> {
    (!set.is_empty()).then(|| doc! { "$set": set })
}

fn sort_document(query: &Query) -> Option<Document> {
    query.sort.as_ref().map(|sort| {
        doc! {
            sort.field.clone(): match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }
        }
    })
}

fn ensure_matched(matched_count: u64, collection: &str, id: &Uuid) -> ModelResult<()> {
    if matched_count == 0 {
        return Err(ModelError::NotFound {
            model: collection.to_string(),
            target: id.to_string(),
        });
    }

    Ok(())
}

/// A document backend over one MongoDB database.
///
/// Records are stored with their UUID as `_id`. Once a schema is declared for
/// a collection, the store drops undeclared fields, parses date strings, and
/// fills defaults on create before the server validator sees the document.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
    schemas: Arc<RwLock<HashMap<String, DocumentSchema>>>,
}

impl MongoDbStore {
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
            schemas: Arc::default(),
        }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn collection(&self, name: &str) -> MongoCollection<Document> {
        self.client.database(&self.database).collection(name)
    }

    async fn schema(&self, collection: &str) -> Option<DocumentSchema> {
        self.schemas.read().await.get(collection).cloned()
    }

    async fn prepare(&self, collection: &str, fields: Document) -> Document {
        match self.schema(collection).await {
            Some(schema) => prepare(&schema, fields),
            None => fields,
        }
    }

    async fn set_one(&self, collection: &str, filter: Document, set: Document) -> ModelResult<Option<DocumentRecord>> {
        let update = update_document(self.prepare(collection, set).await);
        let collection = self.collection(collection);

        let found = match update {
            Some(update) => collection
                .find_one_and_update(filter, update)
                .return_document(ReturnDocument::After)
                .await
                .map_err(backend_error)?,
            None => collection.find_one(filter).await.map_err(backend_error)?,
        };

        found.map(restore).transpose()
    }

    pub async fn shutdown(self) -> ModelResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl DocumentBackend for MongoDbStore {
    async fn declare_schema(&self, collection: &str, schema: &DocumentSchema) -> ModelResult<()> {
        let database = self.client.database(&self.database);
        let validator = doc! { "$jsonSchema": validator::json_schema(schema) };

        let exists = database
            .list_collection_names()
            .await
            .map_err(backend_error)?
            .iter()
            .any(|name| name == collection);

        if exists {
            database
                .run_command(doc! { "collMod": collection, "validator": validator })
                .await
                .map_err(backend_error)?;
        } else {
            database
                .create_collection(collection)
                .validator(validator)
                .await
                .map_err(backend_error)?;
        }

        let indexes = validator::unique_fields(schema)
            .into_iter()
            .map(|field| {
                IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .name(format!("{field}_unique"))
                            .build(),
                    )
                    .build()
            })
            .collect::<Vec<_>>();

        if !indexes.is_empty() {
            self.collection(collection)
                .create_indexes(indexes)
                .await
                .map_err(backend_error)?;
        }

        self.schemas
            .write()
            .await
            .insert(collection.to_string(), schema.clone());

        log::debug!("declared {collection} (existing: {exists})");
        Ok(())
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> ModelResult<Option<DocumentRecord>> {
        self.collection(collection)
            .find_one(doc! { "_id": *id })
            .await
            .map_err(backend_error)?
            .map(restore)
            .transpose()
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> ModelResult<Option<DocumentRecord>> {
        self.collection(collection)
            .find_one(filter_document(filter))
            .await
            .map_err(backend_error)?
            .map(restore)
            .transpose()
    }

    async fn find(&self, collection: &str, query: Query) -> ModelResult<Vec<DocumentRecord>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip as u64);
        }
        options.sort = sort_document(&query);

        self.collection(collection)
            .find(filter_document(&query.filter))
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(restore)
            .collect()
    }

    async fn create(&self, collection: &str, fields: Document) -> ModelResult<DocumentRecord> {
        let fields = match self.schema(collection).await {
            Some(schema) => with_defaults(&schema, prepare(&schema, fields)),
            None => fields,
        };
        let id = Uuid::new();

        self.collection(collection)
            .insert_one(with_id(id, &fields))
            .await
            .map_err(backend_error)?;

        Ok(DocumentRecord::new(id, fields))
    }

    async fn save(&self, collection: &str, record: &DocumentRecord) -> ModelResult<()> {
        let fields = self.prepare(collection, record.fields().clone()).await;
        let replacement = with_id(*record.id(), &fields);

        let result = self
            .collection(collection)
            .replace_one(doc! { "_id": *record.id() }, replacement)
            .await
            .map_err(backend_error)?;

        ensure_matched(result.matched_count, collection, record.id())
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: &Uuid,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        self.set_one(collection, doc! { "_id": *id }, set).await
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> ModelResult<Option<DocumentRecord>> {
        self.set_one(collection, filter_document(filter), set)
            .await
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> ModelResult<u64> {
        Ok(self
            .collection(collection)
            .delete_many(filter_document(filter))
            .await
            .map_err(backend_error)?
            .deleted_count)
    }

    async fn remove_record(&self, collection: &str, id: &Uuid) -> ModelResult<()> {
        self.collection(collection)
            .delete_one(doc! { "_id": *id })
            .await
            .map_err(backend_error)?;

        Ok(())
    }
}

/// Connects a [`MongoDbStore`] from a connection string and database name.
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl BackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> ModelResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| ModelError::Initialization(e.to_string()))?;
        let client = Client::with_options(options).map_err(|e| ModelError::Initialization(e.to_string()))?;

        Ok(MongoDbStore::new(client, self.database))
    }
}
