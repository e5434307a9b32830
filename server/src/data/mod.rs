//! Data storage layer
//!
//! - `query` - SELECT construction with bound parameters
//! - `sql` - SQL dialects of the supported backends
//! - `resources` - Resource configuration, request translation and result shaping
//! - `sqlite` / `postgres` - Backend services executing rendered queries
//! - `traits` - Query execution trait implemented by every backend
//! - `error` - Unified error type for all backends

pub mod error;
pub mod postgres;
pub mod query;
pub mod resources;
pub mod sql;
pub mod sqlite;
pub mod traits;

pub use error::{DataError, ErrorKind};
pub use postgres::PostgresService;
pub use sqlite::SqliteService;
pub use traits::QueryExecutor;

use async_trait::async_trait;

use crate::core::config::DatabaseConfig;
use query::SqlQuery;
use sql::Backend;

/// Result row: column name to JSON value, in column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Database service (SQLite or PostgreSQL)
pub enum DatabaseService {
    /// SQLite backend (default, embedded)
    Sqlite(SqliteService),
    /// PostgreSQL backend
    Postgres(PostgresService),
}

impl DatabaseService {
    /// Initialize the configured backend
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DataError> {
        match config.backend {
            Backend::Sqlite => {
                let service = SqliteService::init(&config.sqlite).await?;
                Ok(Self::Sqlite(service))
            }
            Backend::Postgres => {
                let pg = config.postgres.as_ref().ok_or_else(|| {
                    DataError::Config("PostgreSQL configuration required".to_string())
                })?;
                let service = PostgresService::init(pg).await?;
                Ok(Self::Postgres(service))
            }
        }
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        match self {
            Self::Sqlite(s) => s.close().await,
            Self::Postgres(p) => p.close().await,
        }
    }
}

#[async_trait]
impl QueryExecutor for DatabaseService {
    fn backend(&self) -> Backend {
        match self {
            Self::Sqlite(_) => Backend::Sqlite,
            Self::Postgres(_) => Backend::Postgres,
        }
    }

    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Row>, DataError> {
        tracing::debug!(
            backend = %self.backend(),
            sql = %query.sql,
            params = query.params.len(),
            "Executing query"
        );
        match self {
            Self::Sqlite(s) => Ok(s.fetch_all(query).await?),
            Self::Postgres(p) => Ok(p.fetch_all(query).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SqliteConfig;
    use crate::core::constants::SQLITE_MEMORY_PATH;

    fn sqlite_memory() -> DatabaseConfig {
        DatabaseConfig {
            backend: Backend::Sqlite,
            sqlite: SqliteConfig {
                path: SQLITE_MEMORY_PATH.to_string(),
            },
            postgres: None,
        }
    }

    #[tokio::test]
    async fn test_init_sqlite_memory() {
        let db = DatabaseService::init(&sqlite_memory()).await.unwrap();
        assert_eq!(db.backend(), Backend::Sqlite);

        let rows = db
            .fetch_all(&SqlQuery {
                sql: "SELECT 1 AS one, 'a' AS letter".to_string(),
                params: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["one"], serde_json::json!(1));
        db.close().await;
    }

    #[tokio::test]
    async fn test_init_postgres_requires_config() {
        let config = DatabaseConfig {
            backend: Backend::Postgres,
            ..sqlite_memory()
        };
        let err = DatabaseService::init(&config).await.err().unwrap();
        assert!(matches!(err, DataError::Config(_)));
    }

    #[tokio::test]
    async fn test_driver_error_kind() {
        let db = DatabaseService::init(&sqlite_memory()).await.unwrap();
        let err = db
            .fetch_all(&SqlQuery {
                sql: "SELECT * FROM nope".to_string(),
                params: Vec::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Driver);
        assert_eq!(err.backend(), "sqlite");
        assert!(err.message().contains("no such table"));
    }
}
