//! SQLite database service
//!
//! Embedded backend for local deployments. A file database is created on
//! first use and opened in WAL mode; `:memory:` keeps everything on a single
//! connection so every query sees the same database.

pub mod error;

pub use error::SqliteError;
pub use sqlx::SqlitePool;

use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, ConnectOptions, Row as _, TypeInfo, ValueRef};
use tracing::log::LevelFilter;

use crate::core::config::SqliteConfig;
use crate::core::constants::{SQLITE_BUSY_TIMEOUT_SECS, SQLITE_MAX_CONNECTIONS, SQLITE_MEMORY_PATH};
use crate::data::Row;
use crate::data::query::{SqlQuery, SqlValue};
use crate::utils::file::expand_path;

/// SQLite database service
///
/// Should be created once at server startup and shared across all handlers.
pub struct SqliteService {
    pool: SqlitePool,
}

impl SqliteService {
    /// Open the configured database, creating the file if it doesn't exist
    pub async fn init(config: &SqliteConfig) -> Result<Self, SqliteError> {
        let in_memory = config.path == SQLITE_MEMORY_PATH;

        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            let db_path = expand_path(&config.path);
            if let Some(parent) = db_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS))
        };
        let options = options.log_statements(LevelFilter::Trace);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(SQLITE_MAX_CONNECTIONS)
        };
        let pool = pool_options.connect_with(options).await?;

        tracing::debug!(path = %config.path, "SqliteService initialized");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a SqliteService from an existing pool (primarily for testing)
    #[cfg(test)]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Execute a rendered query and decode every row
    pub async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Row>, SqliteError> {
        let rows = bind_params(sqlx::query(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(decode_row)
            .collect::<Result<_, _>>()
            .map_err(SqliteError::from)
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Decode a row by the storage class of each value
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => row
                    .try_get_unchecked::<f64, _>(index)
                    .map(|v| serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number))?,
                "BLOB" => Value::String(BASE64.encode(row.try_get_unchecked::<Vec<u8>, _>(index)?)),
                _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::query::QueryBuilder;
    use crate::data::sql::SqliteDialect;
    use serde_json::json;

    async fn memory_service() -> SqliteService {
        let service = SqliteService::init(&SqliteConfig {
            path: SQLITE_MEMORY_PATH.to_string(),
        })
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, score REAL, data BLOB, note TEXT)",
        )
        .execute(service.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO posts VALUES (1, 'first', 1.5, x'0102', NULL), (2, 'second', 3.0, NULL, 'n')",
        )
        .execute(service.pool())
        .await
        .unwrap();
        service
    }

    #[tokio::test]
    async fn test_fetch_all_decodes_columns() {
        let service = memory_service().await;
        let mut qb = QueryBuilder::new("posts", "p");
        qb.order_by(["id"]);

        let rows = service.fetch_all(&qb.build(&SqliteDialect)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            serde_json::Value::Object(rows[0].clone()),
            json!({"id": 1, "title": "first", "score": 1.5, "data": "AQI=", "note": null})
        );
        let keys: Vec<&str> = rows[1].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "title", "score", "data", "note"]);
    }

    #[tokio::test]
    async fn test_fetch_all_binds_params() {
        let service = memory_service().await;
        let mut qb = QueryBuilder::new("posts", "p");
        qb.select(["title"])
            .and_where(crate::data::query::Predicate::in_list(
                "p.id",
                vec![SqlValue::Int(2), SqlValue::from("3")],
            ))
            .set_max_results(SqlValue::Int(10));

        let rows = service.fetch_all(&qb.build(&SqliteDialect)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("second"));
    }

    #[tokio::test]
    async fn test_non_numeric_limit_is_rejected_by_driver() {
        let service = memory_service().await;
        let mut qb = QueryBuilder::new("posts", "p");
        qb.set_max_results(SqlValue::from("ten"));

        let err = service.fetch_all(&qb.build(&SqliteDialect)).await.unwrap_err();
        assert!(matches!(err, SqliteError::Database(sqlx::Error::Database(_))));
    }

    #[tokio::test]
    async fn test_unknown_column_is_driver_error() {
        let service = memory_service().await;
        let mut qb = QueryBuilder::new("posts", "p");
        qb.select(["p.missing"]);

        let err = service.fetch_all(&qb.build(&SqliteDialect)).await.unwrap_err();
        assert!(matches!(err, SqliteError::Database(sqlx::Error::Database(_))));
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");
        let service = SqliteService::init(&SqliteConfig {
            path: path.to_string_lossy().to_string(),
        })
        .await
        .unwrap();
        assert!(path.exists());
        service.close().await;
    }
}
