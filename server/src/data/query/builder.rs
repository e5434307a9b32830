//! SELECT statement builder

use super::types::{Join, JoinKind, Predicate, SqlQuery, SqlValue};
use crate::data::sql::SqlDialect;

/// Incrementally configured SELECT statement
///
/// Setters return `&mut Self` so calls can be chained. [`build`](Self::build)
/// renders the statement for a dialect without consuming the builder, so the
/// same builder can be rendered for several backends.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    table: String,
    alias: String,
    select: Vec<String>,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    order_by: Vec<String>,
    max_results: Option<SqlValue>,
    first_result: Option<SqlValue>,
}

impl QueryBuilder {
    /// Start a query selecting `*` from `table` under `alias`
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            select: vec!["*".to_string()],
            joins: Vec::new(),
            predicates: Vec::new(),
            order_by: Vec::new(),
            max_results: None,
            first_result: None,
        }
    }

    /// Replace the selection. An empty list selects `*`.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        if self.select.is_empty() {
            self.select.push("*".to_string());
        }
        self
    }

    pub fn join(
        &mut self,
        kind: JoinKind,
        from_alias: impl Into<String>,
        table: impl Into<String>,
        alias: impl Into<String>,
        condition: impl Into<String>,
    ) -> &mut Self {
        self.joins.push(Join {
            kind,
            from_alias: from_alias.into(),
            table: table.into(),
            alias: alias.into(),
            condition: condition.into(),
        });
        self
    }

    /// Add a predicate, conjoined with the existing ones
    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Replace the ordering columns (ascending)
    pub fn order_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the LIMIT value.
    ///
    /// The value is bound as-is: a non-integer value is left for the
    /// database to reject at execution time.
    pub fn set_max_results(&mut self, value: SqlValue) -> &mut Self {
        self.max_results = Some(value);
        self
    }

    /// Set the OFFSET value (bound as-is, like the limit)
    pub fn set_first_result(&mut self, value: SqlValue) -> &mut Self {
        self.first_result = Some(value);
        self
    }

    pub fn selection(&self) -> &[String] {
        &self.select
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn order_by_columns(&self) -> &[String] {
        &self.order_by
    }

    pub fn max_results(&self) -> Option<&SqlValue> {
        self.max_results.as_ref()
    }

    pub fn first_result(&self) -> Option<&SqlValue> {
        self.first_result.as_ref()
    }

    /// Whether `alias` is the primary alias or the alias of a join
    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias == alias || self.joins.iter().any(|j| j.alias == alias)
    }

    /// Render the statement for `dialect`
    ///
    /// Placeholders are numbered in rendering order: WHERE values first,
    /// then LIMIT, then OFFSET.
    pub fn build(&self, dialect: &dyn SqlDialect) -> SqlQuery {
        let mut params = Vec::new();

        let columns: Vec<String> = self
            .select
            .iter()
            .map(|c| dialect.quote_column(c))
            .collect();

        let mut sql = format!(
            "SELECT {} FROM {} {}",
            columns.join(", "),
            dialect.quote_identifier(&self.table),
            dialect.quote_identifier(&self.alias)
        );

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} {} ON {}",
                join.kind.keyword(),
                dialect.quote_identifier(&join.table),
                dialect.quote_identifier(&join.alias),
                join.condition
            ));
        }

        if !self.predicates.is_empty() {
            let clauses: Vec<String> = self
                .predicates
                .iter()
                .map(|p| render_predicate(p, dialect, &mut params))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let columns: Vec<String> = self
                .order_by
                .iter()
                .map(|c| dialect.quote_column(c))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&columns.join(", "));
        }

        match (&self.max_results, &self.first_result) {
            (Some(limit), _) => {
                params.push(limit.clone());
                sql.push_str(&format!(" LIMIT {}", dialect.placeholder(params.len())));
            }
            (None, Some(_)) => {
                if let Some(unbounded) = dialect.unbounded_limit() {
                    sql.push(' ');
                    sql.push_str(unbounded);
                }
            }
            (None, None) => {}
        }

        if let Some(offset) = &self.first_result {
            params.push(offset.clone());
            sql.push_str(&format!(" OFFSET {}", dialect.placeholder(params.len())));
        }

        SqlQuery { sql, params }
    }
}

fn render_predicate(
    predicate: &Predicate,
    dialect: &dyn SqlDialect,
    params: &mut Vec<SqlValue>,
) -> String {
    match predicate {
        Predicate::Eq { column, value } => {
            params.push(value.clone());
            format!(
                "{} = {}",
                comparand(column, std::slice::from_ref(value), dialect),
                dialect.placeholder(params.len())
            )
        }
        Predicate::In { column, values } => {
            if values.is_empty() {
                return "1 = 0".to_string();
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| {
                    params.push(v.clone());
                    dialect.placeholder(params.len())
                })
                .collect();
            format!(
                "{} IN ({})",
                comparand(column, values, dialect),
                placeholders.join(", ")
            )
        }
    }
}

/// Left-hand side of a predicate; text form only when every value is text
fn comparand(column: &str, values: &[SqlValue], dialect: &dyn SqlDialect) -> String {
    if values.iter().all(|v| matches!(v, SqlValue::Text(_))) {
        dialect.text_comparand(column)
    } else {
        dialect.quote_column(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sql::{PostgresDialect, SqliteDialect};

    #[test]
    fn test_default_selects_everything() {
        let qb = QueryBuilder::new("posts", "p");
        let query = qb.build(&SqliteDialect);
        assert_eq!(query.sql, r#"SELECT * FROM "posts" "p""#);
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_empty_selection_falls_back_to_star() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.select(Vec::<String>::new());
        assert_eq!(qb.selection(), ["*"]);
    }

    #[test]
    fn test_full_statement_sqlite() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.select(["p.id", "c.body"])
            .join(JoinKind::Inner, "p", "comments", "c", "c.post_id = p.id")
            .and_where(Predicate::eq("p.status", SqlValue::from("published")))
            .and_where(Predicate::in_list(
                "c.author",
                vec![SqlValue::from("ann"), SqlValue::from("bob")],
            ))
            .order_by(["p.created_at"])
            .set_max_results(SqlValue::Int(5))
            .set_first_result(SqlValue::Int(10));

        let query = qb.build(&SqliteDialect);
        assert_eq!(
            query.sql,
            concat!(
                r#"SELECT "p"."id", "c"."body" FROM "posts" "p" "#,
                r#"INNER JOIN "comments" "c" ON c.post_id = p.id "#,
                r#"WHERE "p"."status" = ? AND "c"."author" IN (?, ?) "#,
                r#"ORDER BY "p"."created_at" LIMIT ? OFFSET ?"#
            )
        );
        assert_eq!(
            query.params,
            vec![
                SqlValue::from("published"),
                SqlValue::from("ann"),
                SqlValue::from("bob"),
                SqlValue::Int(5),
                SqlValue::Int(10),
            ]
        );
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.and_where(Predicate::in_list(
            "id",
            vec![SqlValue::Int(1), SqlValue::Int(2)],
        ))
        .set_max_results(SqlValue::Int(20));

        let query = qb.build(&PostgresDialect);
        assert_eq!(
            query.sql,
            r#"SELECT * FROM "posts" "p" WHERE "id" IN ($1, $2) LIMIT $3"#
        );
    }

    #[test]
    fn test_postgres_compares_text_values_as_text() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.and_where(Predicate::eq("p.id", SqlValue::from("1")))
            .and_where(Predicate::in_list(
                "p.author_id",
                vec![SqlValue::from("4"), SqlValue::from("5")],
            ))
            .and_where(Predicate::in_list(
                "p.rank",
                vec![SqlValue::Int(1), SqlValue::from("x")],
            ))
            .and_where(Predicate::eq("p.draft", SqlValue::Bool(true)));

        let query = qb.build(&PostgresDialect);
        assert_eq!(
            query.sql,
            concat!(
                r#"SELECT * FROM "posts" "p" WHERE "p"."id"::text = $1 "#,
                r#"AND "p"."author_id"::text IN ($2, $3) "#,
                r#"AND "p"."rank" IN ($4, $5) AND "p"."draft" = $6"#
            )
        );
        assert_eq!(query.params[0], SqlValue::from("1"));

        let sqlite = qb.build(&SqliteDialect);
        assert!(sqlite.sql.contains(r#"WHERE "p"."id" = ? AND "p"."author_id" IN (?, ?)"#));
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.and_where(Predicate::in_list("id", vec![]));
        let query = qb.build(&SqliteDialect);
        assert_eq!(query.sql, r#"SELECT * FROM "posts" "p" WHERE 1 = 0"#);
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_offset_without_limit() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.set_first_result(SqlValue::Int(3));

        let sqlite = qb.build(&SqliteDialect);
        assert_eq!(sqlite.sql, r#"SELECT * FROM "posts" "p" LIMIT -1 OFFSET ?"#);

        let postgres = qb.build(&PostgresDialect);
        assert_eq!(postgres.sql, r#"SELECT * FROM "posts" "p" OFFSET $1"#);
    }

    #[test]
    fn test_left_join_and_aliases() {
        let mut qb = QueryBuilder::new("posts", "p");
        qb.join(JoinKind::Left, "p", "users", "u", "u.id = p.author_id");
        assert!(qb.has_alias("p"));
        assert!(qb.has_alias("u"));
        assert!(!qb.has_alias("c"));
        assert!(
            qb.build(&SqliteDialect)
                .sql
                .contains(r#"LEFT JOIN "users" "u" ON u.id = p.author_id"#)
        );
    }
}
