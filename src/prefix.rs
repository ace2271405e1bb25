use std::sync::Arc;

use parking_lot::RwLock;

use crate::parser::BinaryOp;

/// Prefix tokens the value-rewriting collaborator understands. A leaf value
///  like `">=5"` or `"~%acc%"` smuggles a non-equality comparison through a
///  nested filter map; this record is the single source of truth for which
///  token means which operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixConfig {
    pub greater_than: String,
    pub greater_or_equal: String,
    pub less_than: String,
    pub less_or_equal: String,
    pub not_equal: String,
    pub like: String,
    pub not_like: String,
}

impl Default for PrefixConfig {
    fn default() -> Self {
        Self {
            greater_than: ">".to_string(),
            greater_or_equal: ">=".to_string(),
            less_than: "<".to_string(),
            less_or_equal: "<=".to_string(),
            not_equal: "!=".to_string(),
            like: "~".to_string(),
            not_like: "!~".to_string(),
        }
    }
}

/// Operator decoded from a prefix-encoded leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
}

impl PrefixOp {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            PrefixOp::Eq => "=",
            PrefixOp::Ne => "!=",
            PrefixOp::Gt => ">",
            PrefixOp::Ge => ">=",
            PrefixOp::Lt => "<",
            PrefixOp::Le => "<=",
            PrefixOp::Like => "LIKE",
            PrefixOp::NotLike => "NOT LIKE",
        }
    }
}

impl PrefixConfig {
    /// Splits a leaf value into its encoded operator and the raw remainder.
    ///  The longest configured token wins, so `>=` is never read as `>`
    ///  followed by a value starting with `=`. A value without any
    ///  configured prefix is a plain equality.
    pub fn rewrite<'v>(&self, value: &'v str) -> (PrefixOp, &'v str) {
        let mut table: [(&str, PrefixOp); 7] = [
            (&self.greater_than, PrefixOp::Gt),
            (&self.greater_or_equal, PrefixOp::Ge),
            (&self.less_than, PrefixOp::Lt),
            (&self.less_or_equal, PrefixOp::Le),
            (&self.not_equal, PrefixOp::Ne),
            (&self.like, PrefixOp::Like),
            (&self.not_like, PrefixOp::NotLike),
        ];
        table.sort_by_key(|(token, _)| std::cmp::Reverse(token.len()));

        for (token, op) in table {
            if !token.is_empty()
                && let Some(rest) = value.strip_prefix(token)
            {
                return (op, rest);
            }
        }
        (PrefixOp::Eq, value)
    }
}

/// Immutable snapshot of the prefix translation, consulted on every emitted
///  navigation predicate.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct PrefixTables {
    cfg: PrefixConfig,
}

impl PrefixTables {
    /// Token prepended to a nested-filter leaf for a comparison; empty for
    ///  the plain equality form. Under negation the table is reversed:
    ///  greater becomes less-or-equal, equality becomes not-equal, and the
    ///  reverse of `ne` is the bare equality form again.
    pub(crate) fn comparison_prefix(&self, op: BinaryOp, negated: bool) -> &str {
        match (op, negated) {
            (BinaryOp::Eq, false) | (BinaryOp::Ne, true) => "",
            (BinaryOp::Eq, true) | (BinaryOp::Ne, false) => &self.cfg.not_equal,
            (BinaryOp::Gt, false) | (BinaryOp::Le, true) => &self.cfg.greater_than,
            (BinaryOp::Ge, false) | (BinaryOp::Lt, true) => &self.cfg.greater_or_equal,
            (BinaryOp::Lt, false) | (BinaryOp::Ge, true) => &self.cfg.less_than,
            (BinaryOp::Le, false) | (BinaryOp::Gt, true) => &self.cfg.less_or_equal,
            // Connectives and functions never reach a map leaf
            _ => "",
        }
    }

    pub(crate) fn like_prefix(&self, negated: bool) -> &str {
        if negated {
            &self.cfg.not_like
        } else {
            &self.cfg.like
        }
    }
}

static CACHE: RwLock<Option<Arc<PrefixTables>>> = RwLock::new(None);

/// Returns the process-wide table snapshot for [cfg]. The snapshot is taken
///  on first use and refreshed only when a differently-configured builder
///  comes along, so concurrent builds see consistent tables without
///  re-deriving them per call.
pub(crate) fn snapshot(cfg: &PrefixConfig) -> Arc<PrefixTables> {
    if let Some(tables) = CACHE.read().as_ref()
        && tables.cfg == *cfg
    {
        return tables.clone();
    }

    let tables = Arc::new(PrefixTables { cfg: cfg.clone() });
    *CACHE.write() = Some(tables.clone());
    tables
}
