//! Result shaping: column exclusion and declared type coercion

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use thiserror::Error;

use super::config::ResourceConfig;
use super::types::FieldType;
use crate::data::Row;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot convert field '{field}' value {value} to {field_type}")]
pub struct ConversionError {
    pub field: String,
    pub field_type: FieldType,
    pub value: Value,
}

/// Remove excluded columns from a row
///
/// An `alias.field` exclusion removes both the `alias.field` key and the
/// bare `field` key, since drivers report joined columns unqualified.
pub fn exclude_row_columns(row: Row, exclusions: &BTreeSet<String>) -> Row {
    if exclusions.is_empty() {
        return row;
    }
    row.into_iter()
        .filter(|(key, _)| !is_excluded(key, exclusions))
        .collect()
}

/// Remove excluded columns from every row
pub fn exclude_columns(rows: Vec<Row>, exclusions: &BTreeSet<String>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| exclude_row_columns(row, exclusions))
        .collect()
}

fn is_excluded(key: &str, exclusions: &BTreeSet<String>) -> bool {
    exclusions.iter().any(|entry| {
        entry == key
            || entry
                .split_once('.')
                .is_some_and(|(_, field)| field == key)
    })
}

/// Convert declared fields of a row in place
///
/// Declarations may be bare or `alias.field`; the field part is matched
/// against the row keys. Missing fields are skipped.
pub fn convert_types(
    row: &mut Row,
    types: &BTreeMap<FieldType, BTreeSet<String>>,
) -> Result<(), ConversionError> {
    for (field_type, fields) in types {
        for declared in fields {
            let key = declared
                .split_once('.')
                .map_or(declared.as_str(), |(_, field)| field);
            let Some(value) = row.get_mut(key) else {
                continue;
            };
            match field_type.convert(value) {
                Some(converted) => *value = converted,
                None => {
                    return Err(ConversionError {
                        field: key.to_string(),
                        field_type: *field_type,
                        value: value.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Applies a resource's exclusions and declared types to query results
pub struct ResultShaper<'a> {
    config: &'a ResourceConfig,
}

impl<'a> ResultShaper<'a> {
    pub fn new(config: &'a ResourceConfig) -> Self {
        Self { config }
    }

    pub fn shape_row(&self, row: Row) -> Result<Row, ConversionError> {
        let mut row = exclude_row_columns(row, &self.config.exclusions);
        convert_types(&mut row, &self.config.types)?;
        Ok(row)
    }

    pub fn shape(&self, rows: Vec<Row>) -> Result<Vec<Row>, ConversionError> {
        rows.into_iter().map(|row| self.shape_row(row)).collect()
    }
}
