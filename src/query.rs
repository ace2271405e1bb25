use std::sync::Arc;

use crate::builder::QueryBuilder;
use crate::dialect::Dialect;
use crate::emit::Emitter;
use crate::error::Error;
use crate::model::Model;
use crate::parser::{self, ExprId, ParseTree, TreePrinter};
use crate::prefix::{self, PrefixConfig, PrefixTables};
use crate::validate::validate_tree;

/// Parses a filter into its syntax tree without emitting anything.
pub fn parse(query: &str) -> Result<(ParseTree<'_>, ExprId), Error> {
    Ok(parser::parse(query)?)
}

/// Parses a filter and renders a parenthesized view of its tree.
pub fn print_tree(query: &str) -> Result<String, Error> {
    let (tree, root) = parser::parse(query)?;
    Ok(TreePrinter(tree, root).to_string())
}

/// Translates [query] into predicates on [db]. No identifier whitelisting
///  happens here; use [build_query_with_validation] for untrusted input.
pub fn build_query(
    query: &str,
    db: QueryBuilder,
    dialect: Dialect,
) -> Result<QueryBuilder, Error> {
    tracing::trace!(query, ?dialect, "building filter query");
    let mut db = db;
    let prefixes = bootstrap(&mut db);
    let (tree, root) = parser::parse(query)?;
    Emitter {
        tree: &tree,
        dialect,
        prefixes,
    }
    .emit(root, db, false)
}

/// Like [build_query], but first validates the tree against the builder's
///  model and the complexity cap. `max_depth == 0` disables the depth check.
pub fn build_query_with_validation(
    query: &str,
    db: QueryBuilder,
    dialect: Dialect,
    max_depth: usize,
) -> Result<QueryBuilder, Error> {
    tracing::trace!(query, ?dialect, max_depth, "building validated filter query");
    let mut db = db;
    let prefixes = bootstrap(&mut db);
    let (tree, root) = parser::parse(query)?;
    validate_tree(&tree, root, db.model(), max_depth)?;
    Emitter {
        tree: &tree,
        dialect,
        prefixes,
    }
    .emit(root, db, false)
}

/// Standalone validation without emission.
pub fn valid_query(query: &str, model: &Model, max_depth: usize) -> Result<(), Error> {
    let (tree, root) = parser::parse(query)?;
    validate_tree(&tree, root, model, max_depth)
}

/// Registers the collaborators a build depends on (when absent) and
///  snapshots the prefix tables for the emitter.
fn bootstrap(db: &mut QueryBuilder) -> Arc<PrefixTables> {
    if !db.plugins.deep_filtering {
        db.plugins.deep_filtering = true;
    }
    let cfg = db
        .plugins
        .query_convert
        .get_or_insert_with(PrefixConfig::default)
        .clone();
    prefix::snapshot(&cfg)
}
