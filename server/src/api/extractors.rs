//! Path and query extractors for resource routes

use std::ops::Deref;

use axum::extract::{FromRequestParts, Path, Query};
use axum::http::Uri;
use axum::http::request::Parts;
use serde::Deserialize;

use super::types::ApiError;
use crate::data::resources::{RequestParams, is_valid_resource_name};

/// Raw path extractor for record routes (internal use)
#[derive(Debug, Deserialize)]
struct RecordPathRaw {
    resource: String,
    id: String,
}

/// Validated resource path extractor.
///
/// A name outside the resource-name alphabet can never be registered, so it
/// is rejected as an unknown resource.
#[derive(Debug)]
pub struct ResourcePath {
    pub resource: String,
}

impl<S> FromRequestParts<S> for ResourcePath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(resource) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        if !is_valid_resource_name(&resource) {
            return Err(ApiError::resource_not_found(&resource));
        }

        Ok(Self { resource })
    }
}

/// Validated record path extractor: resource name plus integer id
#[derive(Debug)]
pub struct RecordPath {
    pub resource: String,
    pub id: i64,
}

impl<S> FromRequestParts<S> for RecordPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<RecordPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        if !is_valid_resource_name(&raw.resource) {
            return Err(ApiError::resource_not_found(&raw.resource));
        }

        Ok(Self {
            resource: raw.resource,
            id: parse_record_id(&raw.id)?,
        })
    }
}

/// Parse a record id path segment
pub fn parse_record_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid record id '{}': expected an integer", raw)))
}

/// Ordered request parameters taken from the query string.
///
/// Repeated keys keep their first position and their last value.
#[derive(Debug, Default)]
pub struct QueryParams(pub RequestParams);

impl Deref for QueryParams {
    type Target = RequestParams;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        params_from_uri(&parts.uri).map(Self)
    }
}

fn params_from_uri(uri: &Uri) -> Result<RequestParams, ApiError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    Ok(pairs.into_iter().collect())
}

/// Parse a bare query string (with or without a leading `?`)
pub fn parse_query_string(query: &str) -> Result<RequestParams, ApiError> {
    let query = query.trim_start_matches('?');
    if query.is_empty() {
        return Ok(RequestParams::new());
    }
    let uri = format!("/?{}", query)
        .parse::<Uri>()
        .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?;
    params_from_uri(&uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract_params(uri: &str) -> Result<QueryParams, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        QueryParams::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_query_params_keep_order() {
        let params = extract_params("/api/v1/posts?sort=title&fields=id,title&limit=5")
            .await
            .unwrap();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["sort", "fields", "limit"]);
        assert_eq!(params.get("fields"), Some("id,title"));
    }

    #[tokio::test]
    async fn test_query_params_decode_percent_encoding() {
        let params = extract_params("/posts?title=hello%20world&tag=a%2Cb")
            .await
            .unwrap();
        assert_eq!(params.get("title"), Some("hello world"));
        assert_eq!(params.get("tag"), Some("a,b"));
    }

    #[tokio::test]
    async fn test_query_params_without_query() {
        let params = extract_params("/posts").await.unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_parse_record_id() {
        assert_eq!(parse_record_id("42"), Ok(42));
        assert_eq!(parse_record_id("-1"), Ok(-1));
        let err = parse_record_id("abc").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("abc"));
    }

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("?fields=id&limit=2").unwrap();
        assert_eq!(params.get("fields"), Some("id"));
        assert_eq!(params.get("limit"), Some("2"));
        assert!(parse_query_string("").unwrap().is_empty());
    }
}
