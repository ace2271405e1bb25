use std::collections::BTreeMap;
use std::sync::Arc;

use crate::deep;
use crate::error::Error;
use crate::model::Model;
use crate::prefix::PrefixConfig;

/// A bound SQL parameter. Integers keep their type so the driver can bind
///  them natively instead of round-tripping through text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// A nested filter: keys are storage column or relation names, values are
///  (possibly prefix-encoded) leaf literals or deeper maps. Interpreted by
///  the deep-filter collaborator as correlated subqueries.
pub type FilterMap = BTreeMap<String, FilterValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Leaf(String),
    Nested(FilterMap),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone)]
enum Predicate {
    Sql {
        fragment: String,
        params: Vec<Value>,
    },
    Map(FilterMap),
    Group(Vec<Clause>),
}

#[derive(Debug, Clone)]
struct Clause {
    connective: Connective,
    predicate: Predicate,
}

/// The collaborators registered on a builder. The deep-filter plugin has no
///  configuration; the value-convert plugin carries its prefix tokens.
#[derive(Debug, Clone, Default)]
pub(crate) struct Plugins {
    pub(crate) deep_filtering: bool,
    pub(crate) query_convert: Option<PrefixConfig>,
}

/// An ORM-style predicate accumulator. The emitter attaches parameterized
///  fragments and nested filter maps to it; nothing is executed — rendering
///  produces a `WHERE` clause with `?` placeholders plus the bound
///  parameters, in attachment order.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    model: Arc<Model>,
    pub(crate) plugins: Plugins,
    clauses: Vec<Clause>,
}

impl QueryBuilder {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            plugins: Plugins::default(),
            clauses: Vec::new(),
        }
    }

    /// A detached builder for composing subexpressions: it shares the model
    ///  and plugin registry but starts without predicates, so grouping in
    ///  the parent cannot leak into the child.
    pub fn session(&self) -> Self {
        Self {
            model: self.model.clone(),
            plugins: self.plugins.clone(),
            clauses: Vec::new(),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Registers the deep-filter collaborator. Build calls do this on their
    ///  own when it is missing.
    pub fn use_deep_filtering(mut self) -> Self {
        self.plugins.deep_filtering = true;
        self
    }

    /// Registers the value-convert collaborator with [config] as its prefix
    ///  tokens. When absent, build calls register the default tokens.
    pub fn use_query_convert(mut self, config: PrefixConfig) -> Self {
        self.plugins.query_convert = Some(config);
        self
    }

    pub fn where_sql(mut self, fragment: impl Into<String>, params: Vec<Value>) -> Self {
        self.clauses.push(Clause {
            connective: Connective::And,
            predicate: Predicate::Sql {
                fragment: fragment.into(),
                params,
            },
        });
        self
    }

    pub fn where_map(mut self, map: FilterMap) -> Self {
        self.clauses.push(Clause {
            connective: Connective::And,
            predicate: Predicate::Map(map),
        });
        self
    }

    /// AND-attaches the predicates of [sub] as one group.
    pub fn where_group(mut self, sub: QueryBuilder) -> Self {
        self.clauses.push(Clause {
            connective: Connective::And,
            predicate: Predicate::Group(sub.clauses),
        });
        self
    }

    /// OR-attaches the predicates of [sub] as one group.
    pub fn or_group(mut self, sub: QueryBuilder) -> Self {
        self.clauses.push(Clause {
            connective: Connective::Or,
            predicate: Predicate::Group(sub.clauses),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Renders the accumulated predicates as `WHERE ...` with `?`
    ///  placeholders and the parameters in clause order. An empty builder
    ///  renders as an empty string.
    pub fn to_sql(&self) -> Result<(String, Vec<Value>), Error> {
        if self.clauses.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        if !self.plugins.deep_filtering && has_map(&self.clauses) {
            return Err(Error::invalid(
                "deep filtering is not registered on this builder",
            ));
        }

        let cfg = self.plugins.query_convert.clone().unwrap_or_default();
        let mut sql = String::from("WHERE ");
        let mut params = Vec::new();
        render_clauses(&self.clauses, &self.model, &cfg, &mut sql, &mut params)?;
        Ok((sql, params))
    }
}

fn has_map(clauses: &[Clause]) -> bool {
    clauses.iter().any(|clause| match &clause.predicate {
        Predicate::Map(_) => true,
        Predicate::Group(inner) => has_map(inner),
        Predicate::Sql { .. } => false,
    })
}

fn render_clauses(
    clauses: &[Clause],
    model: &Model,
    cfg: &PrefixConfig,
    out: &mut String,
    params: &mut Vec<Value>,
) -> Result<(), Error> {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            out.push_str(match clause.connective {
                Connective::And => " AND ",
                Connective::Or => " OR ",
            });
        }
        match &clause.predicate {
            Predicate::Sql { fragment, params: bound } => {
                out.push_str(fragment);
                params.extend(bound.iter().cloned());
            }
            Predicate::Map(map) => deep::render(map, model, cfg, out, params)?,
            Predicate::Group(inner) => {
                // A single predicate attaches bare; anything longer needs
                //  parentheses to keep its internal grouping
                if inner.len() > 1 {
                    out.push('(');
                    render_clauses(inner, model, cfg, out, params)?;
                    out.push(')');
                } else {
                    render_clauses(inner, model, cfg, out, params)?;
                }
            }
        }
    }
    Ok(())
}
