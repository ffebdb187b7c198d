use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use bson::{Bson, Document};
use mea::{mutex::Mutex, rwlock::RwLock};
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};

use modelayer_core::{
    backend::{BackendBuilder, RelationalBackend},
    error::{ModelError, ModelResult},
    query::{Filter, Query},
    record::{Row, normalize_date},
    schema::{RelationalSchema, SchemaDescriptor},
    types::RelationalType,
};

use crate::{
    ddl::{self, PRIMARY_KEY, quote_ident},
    query::{select_tail, where_clause},
    value::{from_sql, to_sql},
};

fn backend_error(err: rusqlite::Error) -> ModelError {
    ModelError::Backend(err.to_string())
}

/// Runs a select over `id` plus every declared column and decodes the rows.
fn select(
    connection: &Connection,
    table: &str,
    schema: &RelationalSchema,
    tail: &str,
    params: Vec<SqlValue>,
) -> ModelResult<Vec<Row>> {
    let columns: Vec<String> = std::iter::once(PRIMARY_KEY)
        .chain(schema.fields().keys().map(String::as_str))
        .map(quote_ident)
        .collect();
    let sql = format!("SELECT {} FROM {}{tail}", columns.join(", "), quote_ident(table));
    log::trace!("{sql}");

    let mut statement = connection.prepare_cached(&sql).map_err(backend_error)?;
    let mut rows = statement.query(params_from_iter(params.iter())).map_err(backend_error)?;
    let mut decoded = Vec::new();

    while let Some(row) = rows.next().map_err(backend_error)? {
        let id: i64 = row.get(0).map_err(backend_error)?;
        let mut values = Document::new();

        for (index, (name, column)) in schema.fields().iter().enumerate() {
            let value: SqlValue = row.get(index + 1).map_err(backend_error)?;
            values.insert(name.clone(), from_sql(value, &column.ty));
        }

        decoded.push(Row::new(id, values));
    }

    Ok(decoded)
}

fn select_by_pk(connection: &Connection, table: &str, schema: &RelationalSchema, id: i64) -> ModelResult<Option<Row>> {
    let tail = format!(" WHERE {} = ?", quote_ident(PRIMARY_KEY));

    Ok(select(connection, table, schema, &tail, vec![SqlValue::Integer(id)])?
        .into_iter()
        .next())
}

/// Declared columns present in `values`, with their SQL values.
///
/// Date columns take dates or RFC 3339 strings; any other string is a
/// [`ModelError::Validation`] error.
fn assignments(schema: &RelationalSchema, values: &Document) -> ModelResult<Vec<(String, SqlValue)>> {
    schema
        .fields()
        .iter()
        .filter_map(|(name, column)| values.get(name).map(|value| (name, column, value)))
        .map(|(name, column, value)| {
            let value = match column.ty {
                RelationalType::Date => match normalize_date(value.clone()) {
                    Bson::String(_) => {
                        return Err(ModelError::Validation {
                            field: name.clone(),
                            message: "expected a date".to_string(),
                        });
                    }
                    date => date,
                },
                _ => value.clone(),
            };

            Ok((quote_ident(name), to_sql(&value)?))
        })
        .collect()
}

/// A relational backend over one SQLite database.
///
/// Every table gets an `id INTEGER PRIMARY KEY AUTOINCREMENT` column; the
/// declared columns carry `NOT NULL`, `UNIQUE`, `DEFAULT`, and `CHECK`
/// constraints, so SQLite enforces the schema itself. Constraint failures come
/// back as [`ModelError::Backend`] with SQLite's message.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
    schemas: Arc<RwLock<HashMap<String, RelationalSchema>>>,
}

impl SqliteStore {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
            schemas: Arc::default(),
        }
    }

    pub fn builder() -> SqliteStoreBuilder {
        SqliteStoreBuilder::default()
    }

    async fn schema(&self, table: &str) -> ModelResult<RelationalSchema> {
        self.schemas
            .read()
            .await
            .get(table)
            .cloned()
            .ok_or_else(|| ModelError::Backend(format!("no such table: {table}")))
    }
}

#[async_trait]
impl RelationalBackend for SqliteStore {
    /// Creates the table if it does not exist yet. A table already defined
    /// through this store keeps its first schema, matching the unchanged
    /// physical table.
    async fn define_table(&self, table: &str, schema: &RelationalSchema) -> ModelResult<()> {
        let mut schemas = self.schemas.write().await;
        if schemas.contains_key(table) {
            log::debug!("table {table} already defined");
            return Ok(());
        }

        let sql = ddl::create_table(table, schema)?;
        log::debug!("{sql}");

        self.connection
            .lock()
            .await
            .execute_batch(&sql)
            .map_err(backend_error)?;
        schemas.insert(table.to_string(), schema.clone());

        Ok(())
    }

    async fn find_by_pk(&self, table: &str, id: i64) -> ModelResult<Option<Row>> {
        let schema = self.schema(table).await?;
        let connection = self.connection.lock().await;

        select_by_pk(&connection, table, &schema, id)
    }

    async fn find_one(&self, table: &str, filter: &Filter) -> ModelResult<Option<Row>> {
        let schema = self.schema(table).await?;
        let (clause, params) = where_clause(filter)?;
        let tail = format!("{clause} ORDER BY {} LIMIT 1", quote_ident(PRIMARY_KEY));
        let connection = self.connection.lock().await;

        Ok(select(&connection, table, &schema, &tail, params)?
            .into_iter()
            .next())
    }

    async fn find_all(&self, table: &str, query: Query) -> ModelResult<Vec<Row>> {
        let schema = self.schema(table).await?;
        let (clause, params) = where_clause(&query.filter)?;
        let tail = format!("{clause}{}", select_tail(&query));
        let connection = self.connection.lock().await;

        select(&connection, table, &schema, &tail, params)
    }

    async fn create(&self, table: &str, values: Document) -> ModelResult<Row> {
        let schema = self.schema(table).await?;
        let (columns, params): (Vec<String>, Vec<SqlValue>) =
            assignments(&schema, &values)?.into_iter().unzip();

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };
        log::trace!("{sql}");

        let connection = self.connection.lock().await;
        connection
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(backend_error)?;
        let id = connection.last_insert_rowid();

        select_by_pk(&connection, table, &schema, id)?
            .ok_or_else(|| ModelError::Backend(format!("inserted row {id} missing from {table}")))
    }

    async fn save(&self, table: &str, row: &Row) -> ModelResult<Row> {
        let schema = self.schema(table).await?;
        let id = *row.id();
        let (columns, mut params): (Vec<String>, Vec<SqlValue>) =
            assignments(&schema, row.fields())?.into_iter().unzip();

        let connection = self.connection.lock().await;

        if !columns.is_empty() {
            let sql = format!(
                "UPDATE {} SET {} WHERE {} = ?",
                quote_ident(table),
                columns
                    .iter()
                    .map(|column| format!("{column} = ?"))
                    .collect::<Vec<_>>()
                    .join(", "),
                quote_ident(PRIMARY_KEY)
            );
            log::trace!("{sql}");
            params.push(SqlValue::Integer(id));

            connection
                .execute(&sql, params_from_iter(params.iter()))
                .map_err(backend_error)?;
        }

        select_by_pk(&connection, table, &schema, id)?.ok_or_else(|| ModelError::NotFound {
            model: table.to_string(),
            target: id.to_string(),
        })
    }

    async fn destroy(&self, table: &str, filter: &Filter) -> ModelResult<u64> {
        self.schema(table).await?;
        let (clause, params) = where_clause(filter)?;
        let sql = format!("DELETE FROM {}{clause}", quote_ident(table));
        log::trace!("{sql}");

        let deleted = self
            .connection
            .lock()
            .await
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(backend_error)?;

        Ok(deleted as u64)
    }

    async fn destroy_row(&self, table: &str, id: i64) -> ModelResult<()> {
        self.schema(table).await?;
        let sql = format!("DELETE FROM {} WHERE {} = ?", quote_ident(table), quote_ident(PRIMARY_KEY));

        self.connection
            .lock()
            .await
            .execute(&sql, [id])
            .map_err(backend_error)?;

        Ok(())
    }
}

/// Opens a [`SqliteStore`] on a database file, or in memory.
#[derive(Debug, Default)]
pub struct SqliteStoreBuilder {
    path: Option<PathBuf>,
}

impl SqliteStoreBuilder {
    /// Uses a private in-memory database. This is the default.
    pub fn in_memory(mut self) -> Self {
        self.path = None;
        self
    }

    /// Uses the database file at `path`, creating it if needed.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }
}

#[async_trait]
impl BackendBuilder for SqliteStoreBuilder {
    type Backend = SqliteStore;

    async fn build(self) -> ModelResult<Self::Backend> {
        let connection = match &self.path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| ModelError::Initialization(e.to_string()))?;

        Ok(SqliteStore::new(connection))
    }
}
