//! Resource configuration
//!
//! Typed, validated description of a REST resource: the table it reads,
//! the fields a request may filter on, the relations it may join and the
//! columns stripped from its results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::FieldType;
use crate::core::constants::DEFAULT_MAX_RESULTS;
use crate::data::query::JoinKind;
use crate::utils::sql::is_valid_identifier;

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

/// Relation a request can activate with `include=<name>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelationSpec {
    /// Table to join; defaults to the relation name
    #[serde(default)]
    pub table: Option<String>,
    /// Alias of the joined table
    pub alias: String,
    /// Alias the join attaches to; defaults to the resource's primary alias
    #[serde(default)]
    pub from_alias: Option<String>,
    /// Join condition (literal SQL fragment)
    pub on: String,
    #[serde(default)]
    pub kind: JoinKind,
    /// Fields of the joined table exposed as `<alias>_<field>` filters
    #[serde(default)]
    pub filters: Vec<String>,
}

impl RelationSpec {
    pub fn new(alias: impl Into<String>, on: impl Into<String>) -> Self {
        Self {
            table: None,
            alias: alias.into(),
            from_alias: None,
            on: on.into(),
            kind: JoinKind::default(),
            filters: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_from_alias(mut self, alias: impl Into<String>) -> Self {
        self.from_alias = Some(alias.into());
        self
    }

    pub fn with_kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Table to join for a relation registered under `name`
    pub fn table_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.table.as_deref().unwrap_or(name)
    }

    /// Alias the join attaches to, falling back to `primary`
    pub fn from_alias_or<'a>(&'a self, primary: &'a str) -> &'a str {
        self.from_alias.as_deref().unwrap_or(primary)
    }
}

/// Static per-resource configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Resource name (URL segment); taken from the configuration key
    #[serde(skip)]
    pub name: String,
    pub table: String,
    pub alias: String,
    /// Allowed filter fields of the primary table, in order
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationSpec>,
    /// Columns removed from results (`field` or `alias.field`)
    #[serde(default)]
    pub exclusions: BTreeSet<String>,
    /// Default page size when the request has no `limit`
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Declared field types, used to coerce results and type filter values
    #[serde(default)]
    pub types: BTreeMap<FieldType, BTreeSet<String>>,
}

impl ResourceConfig {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            alias: alias.into(),
            filters: Vec::new(),
            relations: BTreeMap::new(),
            exclusions: BTreeSet::new(),
            max_results: DEFAULT_MAX_RESULTS,
            types: BTreeMap::new(),
        }
    }

    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Register a relation under `name`, replacing any previous one
    pub fn add_relation(&mut self, name: impl Into<String>, spec: RelationSpec) -> &mut Self {
        self.relations.insert(name.into(), spec);
        self
    }

    /// Exclude `fields` from results, qualified with `table_alias` when given
    pub fn add_exclusion<I, S>(&mut self, fields: I, table_alias: Option<&str>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            let field = field.as_ref();
            let entry = match table_alias {
                Some(alias) => format!("{}.{}", alias, field),
                None => field.to_string(),
            };
            self.exclusions.insert(entry);
        }
        self
    }

    /// Declare `fields` as holding values of `field_type`
    pub fn declare_type<I, S>(&mut self, field_type: FieldType, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types
            .entry(field_type)
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Declared type of a field
    ///
    /// An `alias.field` declaration wins over a bare `field` declaration.
    pub fn field_type(&self, qualifier: Option<&str>, field: &str) -> Option<FieldType> {
        if let Some(qualifier) = qualifier {
            let qualified = format!("{}.{}", qualifier, field);
            if let Some(found) = self.lookup_type(&qualified) {
                return Some(found);
            }
        }
        self.lookup_type(field)
    }

    fn lookup_type(&self, key: &str) -> Option<FieldType> {
        self.types
            .iter()
            .find(|(_, fields)| fields.contains(key))
            .map(|(field_type, _)| *field_type)
    }

    /// Validate names and limits before the resource is served
    pub fn validate(&self) -> Result<(), ResourceConfigError> {
        if !is_valid_resource_name(&self.name) {
            return Err(self.invalid("resource name", &self.name));
        }
        if !is_valid_identifier(&self.table) {
            return Err(self.invalid("table", &self.table));
        }
        if !is_valid_identifier(&self.alias) {
            return Err(self.invalid("alias", &self.alias));
        }
        if self.max_results == 0 {
            return Err(ResourceConfigError::ZeroMaxResults {
                resource: self.name.clone(),
            });
        }
        if let Some(field) = self.filters.iter().find(|f| !is_valid_identifier(f)) {
            return Err(self.invalid("filter field", field));
        }

        let mut aliases: BTreeSet<&str> = BTreeSet::from([self.alias.as_str()]);
        for (name, relation) in &self.relations {
            if !is_valid_identifier(relation.table_or(name)) {
                return Err(self.invalid("relation table", relation.table_or(name)));
            }
            if !is_valid_identifier(&relation.alias) {
                return Err(self.invalid("relation alias", &relation.alias));
            }
            if !aliases.insert(relation.alias.as_str()) {
                return Err(ResourceConfigError::DuplicateAlias {
                    resource: self.name.clone(),
                    relation: name.clone(),
                    alias: relation.alias.clone(),
                });
            }
            if relation.on.trim().is_empty() {
                return Err(ResourceConfigError::EmptyCondition {
                    resource: self.name.clone(),
                    relation: name.clone(),
                });
            }
            if let Some(field) = relation.filters.iter().find(|f| !is_valid_identifier(f)) {
                return Err(self.invalid("relation filter field", field));
            }
        }

        for (name, relation) in &self.relations {
            let from = relation.from_alias_or(&self.alias);
            if !aliases.contains(from) {
                return Err(ResourceConfigError::UnknownFromAlias {
                    resource: self.name.clone(),
                    relation: name.clone(),
                    alias: from.to_string(),
                });
            }
        }

        // With `include`, every filter is addressed as `<alias>_<field>`
        let mut keys: BTreeMap<String, (&str, &str)> = BTreeMap::new();
        let primary = self.filters.iter().map(|f| (self.alias.as_str(), f.as_str()));
        let related = self
            .relations
            .values()
            .flat_map(|r| r.filters.iter().map(move |f| (r.alias.as_str(), f.as_str())));
        for (alias, field) in primary.chain(related) {
            let key = format!("{}_{}", alias, field);
            if let Some(&existing) = keys.get(&key)
                && existing != (alias, field)
            {
                return Err(ResourceConfigError::FilterKeyCollision {
                    resource: self.name.clone(),
                    key,
                });
            }
            keys.insert(key, (alias, field));
        }

        let declared = self.types.values().flatten();
        if let Some(field) = self
            .exclusions
            .iter()
            .chain(declared)
            .find(|f| !is_valid_column_ref(f))
        {
            return Err(self.invalid("column", field));
        }

        Ok(())
    }

    fn invalid(&self, what: &'static str, value: &str) -> ResourceConfigError {
        ResourceConfigError::InvalidName {
            resource: self.name.clone(),
            what,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.name, self.table, self.alias)
    }
}

/// Resource names are URL segments: 1-64 chars, alphanumeric plus dash/underscore
pub fn is_valid_resource_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `field` or `alias.field`
fn is_valid_column_ref(column: &str) -> bool {
    match column.split_once('.') {
        Some((alias, field)) => is_valid_identifier(alias) && is_valid_identifier(field),
        None => is_valid_identifier(column),
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResourceConfigError {
    #[error("Resource '{resource}': invalid {what} '{value}'")]
    InvalidName {
        resource: String,
        what: &'static str,
        value: String,
    },

    #[error("Resource '{resource}': max_results must be greater than zero")]
    ZeroMaxResults { resource: String },

    #[error("Resource '{resource}': relation '{relation}' reuses alias '{alias}'")]
    DuplicateAlias {
        resource: String,
        relation: String,
        alias: String,
    },

    #[error("Resource '{resource}': relation '{relation}' joins from unknown alias '{alias}'")]
    UnknownFromAlias {
        resource: String,
        relation: String,
        alias: String,
    },

    #[error("Resource '{resource}': relation '{relation}' has an empty join condition")]
    EmptyCondition { resource: String, relation: String },

    #[error("Resource '{resource}': filter key '{key}' names two different columns")]
    FilterKeyCollision { resource: String, key: String },

    #[error("Duplicate resource '{0}'")]
    DuplicateResource(String),
}
