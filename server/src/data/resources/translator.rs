//! Request parameters to query builder translation

use std::collections::HashMap;

use super::config::ResourceConfig;
use super::params::RequestParams;
use crate::data::query::{Predicate, QueryBuilder, SqlValue};
use crate::utils::sql::{is_list_value, split_list};

pub const PARAM_FIELDS: &str = "fields";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_LIMIT: &str = "limit";
pub const PARAM_OFFSET: &str = "offset";
pub const PARAM_INCLUDE: &str = "include";

/// Column a filter key resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterColumn {
    pub qualifier: Option<String>,
    pub field: String,
}

impl FilterColumn {
    /// Resolve an allow-listed key: its first underscore separates the
    /// table qualifier from the field (`author_name` is `author.name`)
    pub fn from_key(key: &str) -> Self {
        match key.split_once('_') {
            Some((qualifier, field)) if !qualifier.is_empty() && !field.is_empty() => Self {
                qualifier: Some(qualifier.to_string()),
                field: field.to_string(),
            },
            _ => Self {
                qualifier: None,
                field: key.to_string(),
            },
        }
    }

    /// `alias.field`, or the bare field
    pub fn column(&self) -> String {
        match &self.qualifier {
            Some(alias) => format!("{}.{}", alias, self.field),
            None => self.field.clone(),
        }
    }
}

/// Translates request parameters into a query over one resource
pub struct ListQueryTranslator<'a> {
    config: &'a ResourceConfig,
}

impl<'a> ListQueryTranslator<'a> {
    pub fn new(config: &'a ResourceConfig) -> Self {
        Self { config }
    }

    /// Build the list query for `params`
    pub fn list_query(&self, params: &RequestParams) -> QueryBuilder {
        let config = self.config;
        let mut qb = QueryBuilder::new(&config.table, &config.alias);

        if let Some(fields) = params.non_empty(PARAM_FIELDS) {
            qb.select(split_list(fields));
        }
        if let Some(sort) = params.non_empty(PARAM_SORT) {
            qb.order_by(split_list(sort));
        }

        let limit = match params.non_empty(PARAM_LIMIT) {
            Some(raw) => bound_integer(raw),
            None => SqlValue::Int(i64::from(config.max_results)),
        };
        qb.set_max_results(limit);
        if let Some(raw) = params.non_empty(PARAM_OFFSET) {
            qb.set_first_result(bound_integer(raw));
        }

        let allowed = self.apply_includes(&mut qb, params);
        for (key, value) in params.iter() {
            if let Some(target) = allowed.get(key) {
                qb.and_where(self.predicate(key, target, value));
            }
        }

        tracing::trace!(
            resource = %config.name,
            joins = qb.joins().len(),
            predicates = qb.predicates().len(),
            "Translated list query"
        );
        qb
    }

    /// Build the single-record query: the list query plus `<alias>.id = ?`
    pub fn single_query(&self, id: i64, params: &RequestParams) -> QueryBuilder {
        let mut qb = self.list_query(params);
        qb.and_where(Predicate::eq(
            format!("{}.id", self.config.alias),
            SqlValue::Int(id),
        ));
        qb
    }

    /// Add the joins named by `include` and return the effective allow-list
    ///
    /// Without includes, filter keys are the configured field names. With
    /// includes, every key is `<alias>_<field>`. Either way the first
    /// underscore of a key becomes the table qualifier.
    fn apply_includes(
        &self,
        qb: &mut QueryBuilder,
        params: &RequestParams,
    ) -> HashMap<String, FilterColumn> {
        let config = self.config;
        let Some(include) = params.non_empty(PARAM_INCLUDE) else {
            return config
                .filters
                .iter()
                .map(|field| (field.clone(), FilterColumn::from_key(field)))
                .collect();
        };

        let mut allowed: HashMap<String, FilterColumn> = config
            .filters
            .iter()
            .map(|field| {
                let key = format!("{}_{}", config.alias, field);
                let column = FilterColumn::from_key(&key);
                (key, column)
            })
            .collect();

        for name in split_list(include) {
            let Some(relation) = config.relations.get(name) else {
                tracing::debug!(resource = %config.name, relation = %name, "Ignoring unknown include");
                continue;
            };
            if qb.has_alias(&relation.alias) {
                continue;
            }
            qb.join(
                relation.kind,
                relation.from_alias_or(&config.alias),
                relation.table_or(name),
                &relation.alias,
                &relation.on,
            );
            for field in &relation.filters {
                let key = format!("{}_{}", relation.alias, field);
                let column = FilterColumn::from_key(&key);
                allowed.insert(key, column);
            }
        }

        allowed
    }

    fn predicate(&self, key: &str, target: &FilterColumn, value: &str) -> Predicate {
        let field_type = self
            .config
            .field_type(target.qualifier.as_deref(), &target.field)
            .or_else(|| self.config.field_type(None, key));
        let bind = |raw: &str| match field_type {
            Some(field_type) => field_type.bind(raw),
            None => SqlValue::from(raw),
        };

        if is_list_value(value) {
            let values = split_list(value).into_iter().map(bind).collect();
            Predicate::in_list(target.column(), values)
        } else {
            Predicate::eq(target.column(), bind(value))
        }
    }
}

/// Integer when the value parses, text otherwise (left to the database to reject)
fn bound_integer(raw: &str) -> SqlValue {
    raw.trim()
        .parse::<i64>()
        .map(SqlValue::Int)
        .unwrap_or_else(|_| SqlValue::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::query::JoinKind;
    use crate::data::resources::{FieldType, RelationSpec};
    use crate::data::sql::Backend;

    fn posts() -> ResourceConfig {
        let mut config =
            ResourceConfig::new("posts", "posts", "t").with_filters(["id", "status", "author_id"]);
        config.add_relation(
            "comments",
            RelationSpec::new("c", "c.post_id = t.id").with_filters(["author", "approved"]),
        );
        config.add_relation(
            "authors",
            RelationSpec::new("a", "a.id = t.author_id")
                .with_table("users")
                .with_kind(JoinKind::Left),
        );
        config
    }

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_fields_and_limit() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("fields", "a,b"),
            ("limit", "5"),
        ]));

        assert_eq!(qb.selection(), &["a".to_string(), "b".to_string()]);
        assert_eq!(qb.max_results(), Some(&SqlValue::Int(5)));
        assert_eq!(qb.first_result(), None);
        assert!(qb.predicates().is_empty());
    }

    #[test]
    fn test_default_limit_and_selection() {
        let config = posts().with_max_results(50);
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[("fields", "")]));

        assert_eq!(qb.selection(), &["*".to_string()]);
        assert_eq!(qb.max_results(), Some(&SqlValue::Int(50)));
    }

    #[test]
    fn test_fields_trims_commas() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[("fields", ",id, title,")]));
        assert_eq!(qb.selection(), &["id".to_string(), "title".to_string()]);
    }

    #[test]
    fn test_sort_and_offset() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("sort", "status,id"),
            ("offset", "40"),
        ]));
        assert_eq!(qb.order_by_columns(), &["status".to_string(), "id".to_string()]);
        assert_eq!(qb.first_result(), Some(&SqlValue::Int(40)));
    }

    #[test]
    fn test_non_numeric_limit_is_bound_as_text() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("limit", "ten"),
            ("offset", "x"),
        ]));
        assert_eq!(qb.max_results(), Some(&SqlValue::from("ten")));
        assert_eq!(qb.first_result(), Some(&SqlValue::from("x")));
    }

    #[test]
    fn test_equality_and_in_filters() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("id", "1,2,3"),
            ("status", "draft"),
        ]));

        assert_eq!(
            qb.predicates(),
            &[
                Predicate::in_list(
                    "id",
                    vec![SqlValue::from("1"), SqlValue::from("2"), SqlValue::from("3")]
                ),
                Predicate::eq("status", SqlValue::from("draft")),
            ]
        );
    }

    #[test]
    fn test_trailing_comma_is_not_a_list() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[("status", "draft,")]));
        assert_eq!(
            qb.predicates(),
            &[Predicate::eq("status", SqlValue::from("draft,"))]
        );
    }

    #[test]
    fn test_predicates_follow_request_order() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("status", "draft"),
            ("author_id", "9"),
            ("id", "1"),
        ]));
        let columns: Vec<&str> = qb.predicates().iter().map(Predicate::column).collect();
        assert_eq!(columns, vec!["status", "author.id", "id"]);
    }

    #[test]
    fn test_first_underscore_qualifies_filter_keys() {
        let config =
            ResourceConfig::new("posts", "posts", "t").with_filters(["author_name", "t_status"]);
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("author_name", "bob"),
            ("t_status", "live"),
        ]));
        assert_eq!(
            qb.predicates(),
            &[
                Predicate::eq("author.name", SqlValue::from("bob")),
                Predicate::eq("t.status", SqlValue::from("live")),
            ]
        );

        let query = qb.build(Backend::Sqlite.dialect());
        assert!(query.sql.contains(r#"WHERE "author"."name" = ? AND "t"."status" = ?"#));
    }

    #[test]
    fn test_underscored_field_keeps_remainder_under_include() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("include", "authors"),
            ("t_author_id", "3"),
        ]));
        assert_eq!(
            qb.predicates(),
            &[Predicate::eq("t.author_id", SqlValue::from("3"))]
        );
    }

    #[test]
    fn test_key_declared_type_applies_to_rewritten_column() {
        let mut config = posts();
        config.declare_type(FieldType::Integer, ["author_id"]);
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[("author_id", "9")]));
        assert_eq!(
            qb.predicates(),
            &[Predicate::eq("author.id", SqlValue::Int(9))]
        );
    }

    #[test]
    fn test_unknown_params_never_filter() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("password", "x"),
            ("1=1; --", "y"),
            ("c_author", "z"),
            ("status", "live"),
        ]));
        assert_eq!(qb.predicates(), &[Predicate::eq("status", SqlValue::from("live"))]);
    }

    #[test]
    fn test_include_adds_join_and_relation_filters() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("include", "comments"),
            ("c_author", "bob"),
            ("t_status", "live"),
            ("status", "ignored"),
        ]));

        assert_eq!(qb.joins().len(), 1);
        let join = &qb.joins()[0];
        assert_eq!(join.table, "comments");
        assert_eq!(join.alias, "c");
        assert_eq!(join.from_alias, "t");
        assert_eq!(join.condition, "c.post_id = t.id");
        assert_eq!(
            qb.predicates(),
            &[
                Predicate::eq("c.author", SqlValue::from("bob")),
                Predicate::eq("t.status", SqlValue::from("live")),
            ]
        );
    }

    #[test]
    fn test_include_ignores_unknown_and_duplicate_relations() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config)
            .list_query(&params(&[("include", "comments, tags,comments,authors")]));

        let joined: Vec<(&str, JoinKind)> = qb
            .joins()
            .iter()
            .map(|j| (j.table.as_str(), j.kind))
            .collect();
        assert_eq!(
            joined,
            vec![("comments", JoinKind::Inner), ("users", JoinKind::Left)]
        );
    }

    #[test]
    fn test_filter_values_use_declared_types() {
        let mut config = posts();
        config.declare_type(FieldType::Integer, ["id"]);
        config.declare_type(FieldType::Boolean, ["c.approved"]);

        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("include", "comments"),
            ("t_id", "4,5,x"),
            ("c_approved", "true"),
        ]));
        assert_eq!(
            qb.predicates(),
            &[
                Predicate::in_list(
                    "t.id",
                    vec![SqlValue::Int(4), SqlValue::Int(5), SqlValue::from("x")]
                ),
                Predicate::eq("c.approved", SqlValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn test_single_query_adds_id_predicate() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).single_query(7, &params(&[("status", "live")]));
        assert_eq!(
            qb.predicates(),
            &[
                Predicate::eq("status", SqlValue::from("live")),
                Predicate::eq("t.id", SqlValue::Int(7)),
            ]
        );
    }

    #[test]
    fn test_rendered_sql_binds_every_value() {
        let config = posts();
        let qb = ListQueryTranslator::new(&config).list_query(&params(&[
            ("include", "comments"),
            ("t_status", "x' OR '1'='1"),
            ("c_author", "a,b"),
            ("sort", "id"),
            ("offset", "10"),
        ]));

        let query = qb.build(Backend::Postgres.dialect());
        assert_eq!(
            query.sql,
            concat!(
                r#"SELECT * FROM "posts" "t" INNER JOIN "comments" "c" ON c.post_id = t.id "#,
                r#"WHERE "t"."status"::text = $1 AND "c"."author"::text IN ($2, $3) "#,
                r#"ORDER BY "id" LIMIT $4 OFFSET $5"#
            )
        );
        assert_eq!(
            query.params,
            vec![
                SqlValue::from("x' OR '1'='1"),
                SqlValue::from("a"),
                SqlValue::from("b"),
                SqlValue::Int(20),
                SqlValue::Int(10),
            ]
        );
    }
}
