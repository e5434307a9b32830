//! Query type definitions

use serde::{Deserialize, Serialize};

/// Value bound to a statement placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Join kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// Join attached to an alias already present in the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub from_alias: String,
    pub table: String,
    pub alias: String,
    /// Literal SQL fragment taken from trusted configuration
    pub condition: String,
}

/// WHERE predicate over a (possibly alias-qualified) column
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { column: String, value: SqlValue },
    In { column: String, values: Vec<SqlValue> },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: SqlValue) -> Self {
        Self::Eq {
            column: column.into(),
            value,
        }
    }

    pub fn in_list(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } => column,
        }
    }
}

/// Rendered statement with its bound parameters in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_serialize() {
        let values = vec![SqlValue::Int(1), SqlValue::from("a"), SqlValue::Null];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[1,"a",null]"#);
    }

    #[test]
    fn test_join_kind_serde() {
        let kind: JoinKind = serde_json::from_str(r#""left""#).unwrap();
        assert_eq!(kind, JoinKind::Left);
        assert_eq!(JoinKind::default().keyword(), "INNER JOIN");
    }

    #[test]
    fn test_predicate_column() {
        assert_eq!(Predicate::eq("p.id", SqlValue::Int(1)).column(), "p.id");
        assert_eq!(Predicate::in_list("status", vec![]).column(), "status");
    }
}
