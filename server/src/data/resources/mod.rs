//! REST resources
//!
//! Configuration of the resources exposed over HTTP, translation of request
//! parameters into queries and shaping of the returned rows.

mod config;
mod params;
mod registry;
mod shaper;
mod translator;
mod types;

pub use config::{RelationSpec, ResourceConfig, ResourceConfigError, is_valid_resource_name};
pub use params::RequestParams;
pub use registry::ResourceRegistry;
pub use shaper::{ConversionError, ResultShaper, convert_types, exclude_columns, exclude_row_columns};
pub use translator::{
    FilterColumn, ListQueryTranslator, PARAM_FIELDS, PARAM_INCLUDE, PARAM_LIMIT, PARAM_OFFSET,
    PARAM_SORT,
};
pub use types::FieldType;
