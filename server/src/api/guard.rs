//! Execution guard
//!
//! Maps the outcome of a data operation to an HTTP outcome: library and
//! driver failures become 400 with the underlying message, anything else
//! becomes 500.

use std::future::Future;

use super::types::ApiError;
use crate::data::DataError;

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        let kind = e.kind();
        if kind.is_client_error() {
            tracing::warn!(backend = e.backend(), kind = ?kind, error = %e, "Query rejected");
            ApiError::bad_request(e.message())
        } else {
            tracing::error!(backend = e.backend(), error = %e, "Query failed");
            ApiError::internal(e.message())
        }
    }
}

/// Run `operation`, classifying its failure
pub async fn execute_guarded<T, F>(operation: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, DataError>>,
{
    operation.await.map_err(ApiError::from)
}
