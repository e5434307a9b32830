//! PostgreSQL SQL dialect implementation

use super::SqlDialect;

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    // Text parameters are typed TEXT on the wire and never coerced to the
    // column's type, so `integer = text` would not resolve
    fn text_comparand(&self, column: &str) -> String {
        format!("{}::text", self.quote_column(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(5), "$5");
    }

    #[test]
    fn test_quote_column() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.quote_column("author_id"), "\"author_id\"");
        assert_eq!(dialect.quote_column("c.body"), "\"c\".\"body\"");
    }

    #[test]
    fn test_text_comparand() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.text_comparand("t.id"), "\"t\".\"id\"::text");
    }
}
