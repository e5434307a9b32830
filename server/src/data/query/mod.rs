//! Query builder
//!
//! Incremental construction of SELECT statements (from, select, join,
//! where, order by, limit/offset) rendered into SQL with positional
//! placeholders for a [`SqlDialect`](crate::data::sql::SqlDialect).
//!
//! ## Usage
//!
//! ```
//! use restquery_server::data::query::{Predicate, QueryBuilder, SqlValue};
//! use restquery_server::data::sql::Backend;
//!
//! let mut qb = QueryBuilder::new("posts", "p");
//! qb.select(["id", "title"])
//!     .and_where(Predicate::eq("p.status", SqlValue::from("draft")))
//!     .set_max_results(SqlValue::Int(10));
//!
//! let query = qb.build(Backend::Sqlite.dialect());
//! assert_eq!(
//!     query.sql,
//!     r#"SELECT "id", "title" FROM "posts" "p" WHERE "p"."status" = ? LIMIT ?"#
//! );
//! assert_eq!(query.params.len(), 2);
//! ```

mod builder;
mod types;

pub use builder::QueryBuilder;
pub use types::{Join, JoinKind, Predicate, SqlQuery, SqlValue};
