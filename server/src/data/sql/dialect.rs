//! SQL dialect trait for multi-database support
//!
//! This trait defines the interface for generating database-specific SQL syntax.

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - Identifier quoting
/// - Comparing columns against text parameters
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// LIMIT clause meaning "no limit", for dialects that cannot render
    /// OFFSET on its own
    ///
    /// - SQLite: `LIMIT -1`
    /// - PostgreSQL: none (OFFSET is valid without LIMIT)
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    /// Quote a single identifier (table, alias or column name)
    ///
    /// Both supported backends follow the SQL standard: the identifier is
    /// wrapped in double quotes and embedded double quotes are doubled.
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Quote a possibly qualified column reference (`alias.column`)
    ///
    /// `*` is kept verbatim, in both bare and qualified positions.
    fn quote_column(&self, column: &str) -> String {
        column
            .split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.quote_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Column expression compared against values bound as text
    ///
    /// - SQLite: the quoted column (affinity converts the value)
    /// - PostgreSQL: the column's text form, `"c"."id"::text`
    fn text_comparand(&self, column: &str) -> String {
        self.quote_column(column)
    }
}
