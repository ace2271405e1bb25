//! This crate translates OData v4 `$filter` expressions into parameterized
//!  SQL `WHERE` clauses on an ORM-style query builder.
//!
//! Translation is accomplished by parsing the filter to a syntax tree
//!  (modules [lex] and [parser]), optionally validating it against a model
//!  whitelist ([valid_query]), then recursively emitting dialect-specific
//!  predicates into a [QueryBuilder]. Plain predicates become `?`-bound SQL
//!  fragments; navigation paths (`metadata/tag/value`) become nested filter
//!  maps that render as correlated `IN (SELECT ...)` subqueries.
//!
//! Every value operand is bound as a parameter. Only column names (checked
//!  against the model when validation is on), function names, and
//!  structural SQL are ever inlined.
//!
//! ## Translation
//! To translate a filter for SQLite:
//! ```
//! # fn main() -> Result<(), odata_sql::Error> {
//! use std::sync::Arc;
//! use odata_sql::{build_query, Dialect, Model, QueryBuilder};
//!
//! let model = Arc::new(
//!     Model::new("products").with_columns(["id", "name", "test_value"]),
//! );
//! let db = build_query(
//!     "name eq 'gadget' and length(testValue) gt 3",
//!     QueryBuilder::new(model),
//!     Dialect::Sqlite,
//! )?;
//! let (sql, params) = db.to_sql()?;
//! assert_eq!(sql, "WHERE name = ? AND LENGTH(test_value) > ?");
//! assert_eq!(params.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//! The four [Dialect]s produce identical SQL except for the unary
//!  date/time/string functions, where PostgreSQL uses `EXTRACT`/`CAST`
//!  forms and the rest share one plain function-name table.

pub mod builder;
pub mod dialect;
pub mod lex;
pub mod model;
pub mod parser;
pub mod prefix;

mod deep;
mod emit;
mod error;
mod query;
mod validate;

#[cfg(test)]
mod tests;

pub use builder::{FilterMap, FilterValue, QueryBuilder, Value};
pub use dialect::Dialect;
pub use error::Error;
pub use model::{Model, NamingFn, Relation};
pub use prefix::{PrefixConfig, PrefixOp};
pub use query::{build_query, build_query_with_validation, parse, print_tree, valid_query};
