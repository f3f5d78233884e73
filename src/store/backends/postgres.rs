//! PostgreSQL backend storing documents as `JSONB` rows.
//!
//! One table holds every collection, keyed by the collection path and the
//! document id:
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT  NOT NULL,
//!     id         TEXT  NOT NULL,
//!     data       JSONB NOT NULL,
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! # Example
//!
//! ```ignore
//! use catalog_store::store::backends::postgres::PostgresStore;
//!
//! let store = PostgresStore::connect("postgresql://localhost/catalog", 16).await?;
//! store.ensure_schema().await?;
//! ```
//!
//! # Security
//!
//! Field names and values are always bound as parameters; nothing from a
//! query is interpolated into the SQL text.

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use futures::TryStreamExt;
use serde_json::Value as JsonValue;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;

use crate::error::AppError;
use crate::store::document::{Document, DocumentStream, Fields};
use crate::store::filter::{Filter, FilterOp, StructuredQuery};
use crate::store::path::DocumentPath;
use crate::store::traits::DocumentStore;

const TABLE: &str = "documents";

type SqlParam = Box<dyn ToSql + Sync + Send>;

/// Pooled PostgreSQL document store.
///
/// This type is cheap to clone - the underlying connection pool is `Arc`-based.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
    table: Arc<str>,
}

impl PostgresStore {
    /// Creates a store with a connection pool of at most `pool_size` connections.
    pub async fn connect(connection_string: &str, pool_size: usize) -> Result<Self, AppError> {
        let pg_config: tokio_postgres::Config = connection_string.parse().map_err(|e| {
            AppError::Connection(format!("Invalid PostgreSQL connection string: {}", e))
        })?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(pool_size.max(1))
            .build()
            .map_err(|e| AppError::Connection(format!("Failed to create connection pool: {}", e)))?;

        Ok(Self {
            pool,
            table: Arc::from(TABLE),
        })
    }

    /// Creates the documents table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let conn = self.get_connection().await?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                 collection TEXT  NOT NULL,
                 id         TEXT  NOT NULL,
                 data       JSONB NOT NULL,
                 PRIMARY KEY (collection, id)
             );",
            table = self.table
        );
        conn.batch_execute(&sql)
            .await
            .map_err(|e| query_error(e, "<schema>"))?;
        Ok(())
    }

    async fn get_connection(&self) -> Result<Object, AppError> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::Connection(format!("Failed to get connection from pool: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, AppError> {
        let conn = self.get_connection().await?;
        let collection = path.collection().to_string();
        let sql = format!(
            "SELECT data FROM {} WHERE collection = $1 AND id = $2",
            self.table
        );
        let row = conn
            .query_opt(&sql, &[&collection, &path.id()])
            .await
            .map_err(|e| query_error(e, &collection))?;

        match row {
            Some(row) => {
                let data: JsonValue = row.try_get(0).map_err(|e| query_error(e, &collection))?;
                Ok(Some(Document::new(path.clone(), into_fields(data, path)?)))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError> {
        tracing::debug!(path = %path, "set");
        let conn = self.get_connection().await?;
        let collection = path.collection().to_string();
        let sql = format!(
            "INSERT INTO {} (collection, id, data) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data",
            self.table
        );
        let data = JsonValue::Object(fields);
        conn.execute(&sql, &[&collection, &path.id(), &data])
            .await
            .map_err(|e| query_error(e, &collection))?;
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError> {
        tracing::debug!(path = %path, fields = fields.len(), "update");
        let conn = self.get_connection().await?;
        let collection = path.collection().to_string();
        let sql = format!(
            "UPDATE {} SET data = data || $3 WHERE collection = $1 AND id = $2",
            self.table
        );
        let data = JsonValue::Object(fields);
        let updated = conn
            .execute(&sql, &[&collection, &path.id(), &data])
            .await
            .map_err(|e| query_error(e, &collection))?;

        if updated == 0 {
            return Err(AppError::DocumentNotFound(path.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), AppError> {
        tracing::debug!(path = %path, "delete");
        let conn = self.get_connection().await?;
        let collection = path.collection().to_string();
        let sql = format!("DELETE FROM {} WHERE collection = $1 AND id = $2", self.table);
        conn.execute(&sql, &[&collection, &path.id()])
            .await
            .map_err(|e| query_error(e, &collection))?;
        Ok(())
    }

    async fn run_query(&self, query: StructuredQuery) -> Result<DocumentStream<'_>, AppError> {
        let conn = self.get_connection().await?;
        let (sql, params) = build_select(&self.table, &query);
        Ok(stream_documents(conn, sql, params, query))
    }
}

/// Translates a [`StructuredQuery`] into SQL plus bound parameters.
fn build_select(table: &str, query: &StructuredQuery) -> (String, Vec<SqlParam>) {
    let mut params: Vec<SqlParam> = vec![Box::new(query.collection.to_string())];
    let mut clauses = vec!["collection = $1".to_string()];

    for filter in &query.filters {
        clauses.push(filter_clause(filter, &mut params));
    }

    let mut sql = format!(
        "SELECT id, data FROM {} WHERE {} ORDER BY id COLLATE \"C\"",
        table,
        clauses.join(" AND ")
    );
    if let Some(limit) = query.limit {
        params.push(Box::new(limit as i64));
        sql.push_str(&format!(" LIMIT ${}", params.len()));
    }
    if let Some(offset) = query.offset {
        params.push(Box::new(offset as i64));
        sql.push_str(&format!(" OFFSET ${}", params.len()));
    }
    (sql, params)
}

fn filter_clause(filter: &Filter, params: &mut Vec<SqlParam>) -> String {
    params.push(Box::new(filter.field.clone()));
    let field = params.len();

    match (&filter.op, &filter.value) {
        (FilterOp::Equal, value) => {
            params.push(Box::new(value.clone()));
            format!("data -> ${}::text = ${}::jsonb", field, params.len())
        }
        // Strings compare by code point, matching the in-memory backend.
        (op, JsonValue::String(bound)) => {
            params.push(Box::new(bound.clone()));
            format!(
                "jsonb_typeof(data -> ${f}::text) = 'string' AND (data ->> ${f}::text) COLLATE \"C\" {op} ${v}::text COLLATE \"C\"",
                f = field,
                op = sql_operator(*op),
                v = params.len()
            )
        }
        (op, value) => {
            params.push(Box::new(value.clone()));
            format!(
                "jsonb_typeof(data -> ${f}::text) = jsonb_typeof(${v}::jsonb) AND data -> ${f}::text {op} ${v}::jsonb",
                f = field,
                op = sql_operator(*op),
                v = params.len()
            )
        }
    }
}

fn sql_operator(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Equal => "=",
        FilterOp::GreaterOrEqual => ">=",
        FilterOp::LessThan => "<",
    }
}

/// Streams rows on an owned connection.
///
/// The connection is captured by the generator and kept alive for the
/// stream's lifetime.
fn stream_documents(
    conn: Object,
    sql: String,
    params: Vec<SqlParam>,
    query: StructuredQuery,
) -> DocumentStream<'static> {
    use async_stream::try_stream;

    Box::pin(try_stream! {
        let collection = query.collection.to_string();
        let rows = conn
            .query_raw(&sql, params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)))
            .await
            .map_err(|e| query_error(e, &collection))?;

        futures::pin_mut!(rows);
        while let Some(row) = rows.try_next().await.map_err(|e| query_error(e, &collection))? {
            let id: String = row.try_get(0).map_err(|e| query_error(e, &collection))?;
            let data: JsonValue = row.try_get(1).map_err(|e| query_error(e, &collection))?;
            let path = query.collection.doc(&id);
            let fields = into_fields(data, &path)?;
            yield Document::new(path, fields);
        }
    })
}

fn into_fields(data: JsonValue, path: &DocumentPath) -> Result<Fields, AppError> {
    match data {
        JsonValue::Object(fields) => Ok(fields),
        other => Err(AppError::MalformedDocument {
            path: path.to_string(),
            message: format!("expected an object, found {}", other),
        }),
    }
}

fn query_error(e: tokio_postgres::Error, collection: &str) -> AppError {
    // Extract detailed error message from PostgreSQL
    let detail = e
        .as_db_error()
        .map(|db_err| {
            format!(
                "{}: {} ({})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            )
        })
        .unwrap_or_else(|| e.to_string());
    AppError::Query {
        message: detail,
        collection: collection.to_string(),
    }
}
