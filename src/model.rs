use std::collections::BTreeMap;
use std::sync::Arc;

use heck::ToSnakeCase;

/// Maps a filter identifier to its storage column name.
pub type NamingFn = fn(&str) -> String;

/// The default naming strategy: OData camelCase to snake_case.
pub fn snake_case(identifier: &str) -> String {
    identifier.to_snake_case()
}

/// A foreign-key association to another model, addressable from a filter as
///  a navigation-path segment.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Column on the owning table, e.g. `metadata_id`.
    pub(crate) foreign_key: String,
    /// Key selected from the child table, typically `id`.
    pub(crate) references: String,
    pub(crate) model: Arc<Model>,
}

impl Relation {
    pub fn new(
        foreign_key: impl Into<String>,
        references: impl Into<String>,
        model: Arc<Model>,
    ) -> Self {
        Self {
            foreign_key: foreign_key.into(),
            references: references.into(),
            model,
        }
    }
}

/// Description of a filterable entity: its table, the storage names of its
///  scalar columns, and its navigable relations. This is the whitelist the
///  validator checks identifiers against — column names end up inlined in
///  SQL, so nothing outside this set may pass through.
#[derive(Debug, Clone)]
pub struct Model {
    table: String,
    columns: Vec<String>,
    relations: BTreeMap<String, Relation>,
    naming: NamingFn,
}

impl Model {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            relations: BTreeMap::new(),
            naming: snake_case,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Registers [relation] under its storage name (the naming strategy is
    ///  applied to path segments before lookup).
    pub fn with_relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    /// Replaces the default snake-case naming strategy, preserving the
    ///  column-override behavior ORMs expose through field metadata.
    pub fn with_naming(mut self, naming: NamingFn) -> Self {
        self.naming = naming;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolves a filter identifier to its storage column name.
    pub fn column_name(&self, identifier: &str) -> String {
        (self.naming)(identifier)
    }

    pub(crate) fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Whether [column] (a storage name) may appear in a filter.
    pub(crate) fn is_queryable(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column) || self.relations.contains_key(column)
    }
}
