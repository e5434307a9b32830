//! Resource API endpoints
//!
//! Read-only endpoints generated from the configured resources:
//! - `GET /resources` lists the resource names
//! - `GET /{resource}` lists records matching the query parameters
//! - `GET /{resource}/{id}` fetches one record by integer id

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use types::{ListResponse, RecordResponse, ResourceNamesResponse};

use crate::api::extractors::{QueryParams, RecordPath, ResourcePath};
use crate::api::guard::execute_guarded;
use crate::api::types::ApiError;
use crate::data::{DataError, QueryExecutor};
use crate::data::resources::{ListQueryTranslator, ResourceConfig, ResourceRegistry, ResultShaper};

/// Shared state for Resource API endpoints
#[derive(Clone)]
pub struct ResourcesApiState {
    pub registry: Arc<ResourceRegistry>,
    pub executor: Arc<dyn QueryExecutor>,
}

impl ResourcesApiState {
    fn resource(&self, name: &str) -> Result<Arc<ResourceConfig>, ApiError> {
        self.registry
            .get(name)
            .ok_or_else(|| ApiError::resource_not_found(name))
    }
}

/// Build Resource API routes
pub fn routes(registry: Arc<ResourceRegistry>, executor: Arc<dyn QueryExecutor>) -> Router<()> {
    let state = ResourcesApiState { registry, executor };

    Router::new()
        .route("/resources", get(list_resources))
        .route("/{resource}", get(list_records))
        .route("/{resource}/{id}", get(get_record))
        .with_state(state)
}

/// List configured resource names
pub async fn list_resources(State(state): State<ResourcesApiState>) -> Json<ResourceNamesResponse> {
    Json(ResourceNamesResponse {
        data: state.registry.names().map(str::to_string).collect(),
    })
}

/// List records of a resource
pub async fn list_records(
    State(state): State<ResourcesApiState>,
    ResourcePath { resource }: ResourcePath,
    QueryParams(params): QueryParams,
) -> Result<Json<ListResponse>, ApiError> {
    let config = state.resource(&resource)?;
    let query = ListQueryTranslator::new(&config)
        .list_query(&params)
        .build(state.executor.backend().dialect());

    let rows = execute_guarded(async {
        let rows = state.executor.fetch_all(&query).await?;
        Ok::<_, DataError>(ResultShaper::new(&config).shape(rows)?)
    })
    .await?;

    Ok(Json(ListResponse::new(rows)))
}

/// Fetch one record of a resource by id
pub async fn get_record(
    State(state): State<ResourcesApiState>,
    RecordPath { resource, id }: RecordPath,
    QueryParams(params): QueryParams,
) -> Result<Json<RecordResponse>, ApiError> {
    let config = state.resource(&resource)?;
    let query = ListQueryTranslator::new(&config)
        .single_query(id, &params)
        .build(state.executor.backend().dialect());

    let row = execute_guarded(async {
        let rows = state.executor.fetch_all(&query).await?;
        let shaped = match rows.into_iter().next() {
            Some(row) => Some(ResultShaper::new(&config).shape_row(row)?),
            None => None,
        };
        Ok::<_, DataError>(shaped)
    })
    .await?;

    let data =
        row.ok_or_else(|| ApiError::not_found(format!("Record not found: {}/{}", resource, id)))?;
    Ok(Json(RecordResponse { data }))
}
