//! Unified error type for data layer
//!
//! Wraps backend-specific errors while preserving which backend produced
//! them, and classifies every failure into an [`ErrorKind`].

use thiserror::Error;

use crate::data::postgres::PostgresError;
use crate::data::resources::ConversionError;
use crate::data::sqlite::SqliteError;

/// Failure classification used to pick the HTTP status of a query error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The access library failed on the statement or its results
    Library,
    /// The database engine rejected the statement
    Driver,
    /// Anything else (pool, I/O, TLS, configuration)
    Other,
}

impl ErrorKind {
    /// Library and driver failures are caused by the request
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Library | Self::Driver)
    }
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(sqlx::Error),

    /// Declared field type conversion failed on a result row
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub fn from_sqlite(e: sqlx::Error) -> Self {
        Self::Sqlite(e)
    }

    pub fn from_postgres(e: sqlx::Error) -> Self {
        Self::Postgres(e)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(e) | Self::Postgres(e) => sqlx_error_kind(e),
            Self::Conversion(_) => ErrorKind::Library,
            Self::Config(_) | Self::Io(_) => ErrorKind::Other,
        }
    }

    /// Message of the underlying failure, without the backend prefix
    pub fn message(&self) -> String {
        match self {
            Self::Sqlite(sqlx::Error::Database(e)) | Self::Postgres(sqlx::Error::Database(e)) => {
                e.message().to_string()
            }
            Self::Sqlite(e) | Self::Postgres(e) => e.to_string(),
            Self::Conversion(e) => e.to_string(),
            Self::Config(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }

    /// Get the backend name that generated this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
            Self::Conversion(_) | Self::Config(_) | Self::Io(_) => "unknown",
        }
    }
}

fn sqlx_error_kind(e: &sqlx::Error) -> ErrorKind {
    match e {
        sqlx::Error::Database(_) => ErrorKind::Driver,
        sqlx::Error::RowNotFound
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Encode(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::InvalidArgument(_) => ErrorKind::Library,
        _ => ErrorKind::Other,
    }
}

impl From<SqliteError> for DataError {
    fn from(e: SqliteError) -> Self {
        match e {
            SqliteError::Database(e) => Self::Sqlite(e),
            SqliteError::Io(e) => Self::Io(e),
        }
    }
}

impl From<PostgresError> for DataError {
    fn from(e: PostgresError) -> Self {
        match e {
            PostgresError::Database(e) => Self::Postgres(e),
            PostgresError::Config(msg) => Self::Config(msg),
        }
    }
}
