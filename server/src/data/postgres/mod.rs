//! PostgreSQL database service
//!
//! Backend for shared deployments:
//! - Connection pooling with min/max bounds
//! - Idle connection cleanup
//! - Connection lifetime cycling
//! - Query timeout protection

pub mod error;

pub use error::PostgresError;
pub use sqlx::PgPool;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Row as _, TypeInfo};
use tracing::log::LevelFilter;

use crate::core::config::PostgresConfig;
use crate::data::Row;
use crate::data::query::{SqlQuery, SqlValue};

/// PostgreSQL database service
///
/// Should be created once at server startup and shared across all handlers.
pub struct PostgresService {
    pool: PgPool,
}

impl PostgresService {
    /// Initialize the database service from configuration
    ///
    /// - Min connections kept warm for low latency
    /// - Idle timeout to release unused connections
    /// - Max lifetime to cycle connections and prevent stale state
    /// - Statement timeout to prevent runaway queries
    pub async fn init(config: &PostgresConfig) -> Result<Self, PostgresError> {
        let url = config.url.as_str();
        if url.is_empty() {
            return Err(PostgresError::Config("PostgreSQL URL is required".into()));
        }

        let mut options: PgConnectOptions = url
            .parse()
            .map_err(|e| PostgresError::Config(format!("Invalid PostgreSQL URL: {}", e)))?;

        options = options.log_statements(LevelFilter::Trace);

        // Set statement timeout at connection level for query protection
        if config.statement_timeout_secs > 0 {
            options = options.options([(
                "statement_timeout",
                format!("{}s", config.statement_timeout_secs),
            )]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect_with(options)
            .await?;

        tracing::debug!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            acquire_timeout_secs = config.acquire_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            statement_timeout_secs = config.statement_timeout_secs,
            "PostgresService initialized"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Execute a rendered query and decode every row
    pub async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Row>, PostgresError> {
        let rows = bind_params(sqlx::query(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(decode_row)
            .collect::<Result<_, _>>()
            .map_err(PostgresError::from)
    }

    /// Close the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
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

fn json_or_null<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    value.map_or(Value::Null, f)
}

/// Decode a row by the declared type of each column
fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = match type_name {
            "BOOL" => json_or_null(row.try_get::<Option<bool>, _>(index)?, Value::Bool),
            "INT2" => json_or_null(row.try_get::<Option<i16>, _>(index)?, Value::from),
            "INT4" => json_or_null(row.try_get::<Option<i32>, _>(index)?, Value::from),
            "INT8" => json_or_null(row.try_get::<Option<i64>, _>(index)?, Value::from),
            "FLOAT4" => json_or_null(row.try_get::<Option<f32>, _>(index)?, |v| {
                Value::from(f64::from(v))
            }),
            "FLOAT8" => json_or_null(row.try_get::<Option<f64>, _>(index)?, Value::from),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
                json_or_null(row.try_get_unchecked::<Option<String>, _>(index)?, Value::String)
            }
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?.unwrap_or(Value::Null),
            "UUID" => json_or_null(row.try_get::<Option<uuid::Uuid>, _>(index)?, |v| {
                Value::String(v.to_string())
            }),
            "TIMESTAMPTZ" => json_or_null(row.try_get::<Option<DateTime<Utc>>, _>(index)?, |v| {
                Value::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }),
            "TIMESTAMP" => json_or_null(row.try_get::<Option<NaiveDateTime>, _>(index)?, |v| {
                Value::String(v.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }),
            "DATE" => json_or_null(row.try_get::<Option<NaiveDate>, _>(index)?, |v| {
                Value::String(v.format("%Y-%m-%d").to_string())
            }),
            "TIME" => json_or_null(row.try_get::<Option<NaiveTime>, _>(index)?, |v| {
                Value::String(v.to_string())
            }),
            "BYTEA" => json_or_null(row.try_get::<Option<Vec<u8>>, _>(index)?, |v| {
                Value::String(BASE64.encode(v))
            }),
            other => {
                tracing::warn!(column = %column.name(), pg_type = %other, "Unsupported column type, returning null");
                Value::Null
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
