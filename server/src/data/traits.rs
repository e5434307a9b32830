//! Query execution trait
//!
//! Handlers execute built queries through [`QueryExecutor`] so they stay
//! independent of the configured backend.

use async_trait::async_trait;

use crate::data::Row;
use crate::data::error::DataError;
use crate::data::query::SqlQuery;
use crate::data::sql::Backend;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Backend the queries are rendered for
    fn backend(&self) -> Backend;

    /// Execute a rendered SELECT and return its rows in order
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Row>, DataError>;
}
