//! Resource API response types

use serde::Serialize;

use crate::data::Row;

/// Configured resource names
#[derive(Debug, Serialize)]
pub struct ResourceNamesResponse {
    pub data: Vec<String>,
}

/// List metadata
#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub count: usize,
}

/// List endpoint response
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<Row>,
    pub meta: ListMeta,
}

impl ListResponse {
    pub fn new(data: Vec<Row>) -> Self {
        let count = data.len();
        Self {
            data,
            meta: ListMeta { count },
        }
    }
}

/// Single-record endpoint response
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub data: Row,
}
