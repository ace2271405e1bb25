use std::fmt::Write;

use crate::builder::{FilterMap, FilterValue, Value};
use crate::error::Error;
use crate::model::Model;
use crate::prefix::{PrefixConfig, PrefixOp};

/// Renders a nested filter map against [model] as correlated subqueries:
///  every nested key must name a relation and becomes
///  `<fk> IN (SELECT <ref> FROM <child> WHERE ...)`, every leaf becomes a
///  parameterized comparison after the prefix collaborator has decoded the
///  operator out of the value.
pub(crate) fn render(
    map: &FilterMap,
    model: &Model,
    cfg: &PrefixConfig,
    out: &mut String,
    params: &mut Vec<Value>,
) -> Result<(), Error> {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(" AND ");
        }
        match value {
            FilterValue::Nested(inner) => {
                let Some(relation) = model.relation(key) else {
                    return Err(Error::invalid(format!("unknown relation '{key}'")));
                };
                // write! to a String is infallible
                let _ = write!(
                    out,
                    "{} IN (SELECT {} FROM {} WHERE ",
                    relation.foreign_key,
                    relation.references,
                    relation.model.table()
                );
                render(inner, &relation.model, cfg, out, params)?;
                out.push(')');
            }
            FilterValue::Leaf(raw) => {
                let (op, rest) = cfg.rewrite(raw);
                let _ = write!(out, "{} {} ?", key, op.sql());
                match op {
                    PrefixOp::Like | PrefixOp::NotLike => {
                        if rest.contains("\\%") {
                            out.push_str(" ESCAPE '\\'");
                        }
                        params.push(Value::Str(rest.to_string()));
                    }
                    _ => params.push(bind(rest)),
                }
            }
        }
    }
    Ok(())
}

/// Literals that parse as integers bind as integers, everything else binds
///  as text.
pub(crate) fn bind(literal: &str) -> Value {
    match literal.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::Str(literal.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn model() -> Model {
        let tags = Arc::new(Model::new("tags").with_columns(["id", "value"]));
        let metadata = Arc::new(
            Model::new("metadata")
                .with_columns(["id", "name", "tag_id"])
                .with_relation("tag", crate::model::Relation::new("tag_id", "id", tags)),
        );
        Model::new("mock_models")
            .with_columns(["id", "name", "metadata_id"])
            .with_relation(
                "metadata",
                crate::model::Relation::new("metadata_id", "id", metadata),
            )
    }

    fn render_map(map: FilterMap) -> Result<(String, Vec<Value>), Error> {
        let mut out = String::new();
        let mut params = Vec::new();
        render(&map, &model(), &PrefixConfig::default(), &mut out, &mut params)?;
        Ok((out, params))
    }

    fn leaf(key: &str, value: &str) -> FilterMap {
        FilterMap::from([(key.to_string(), FilterValue::Leaf(value.to_string()))])
    }

    #[test]
    fn single_level_subquery() {
        let map = FilterMap::from([(
            "metadata".to_string(),
            FilterValue::Nested(leaf("name", "test-4-metadata")),
        )]);
        let (sql, params) = render_map(map).unwrap();
        assert_eq!(sql, "metadata_id IN (SELECT id FROM metadata WHERE name = ?)");
        assert_eq!(params, vec![Value::Str("test-4-metadata".to_string())]);
    }

    #[test]
    fn two_level_subquery_with_like() {
        let map = FilterMap::from([(
            "metadata".to_string(),
            FilterValue::Nested(FilterMap::from([(
                "tag".to_string(),
                FilterValue::Nested(leaf("value", "~test-3%")),
            )])),
        )]);
        let (sql, params) = render_map(map).unwrap();
        assert_eq!(
            sql,
            "metadata_id IN (SELECT id FROM metadata WHERE tag_id IN (SELECT id FROM tags WHERE value LIKE ?))"
        );
        assert_eq!(params, vec![Value::Str("test-3%".to_string())]);
    }

    #[test]
    fn prefixed_leaves_decode_comparisons() {
        let (sql, params) =
            render_map(FilterMap::from([(
                "metadata".to_string(),
                FilterValue::Nested(leaf("name", "!=prd")),
            )]))
            .unwrap();
        assert_eq!(sql, "metadata_id IN (SELECT id FROM metadata WHERE name != ?)");
        assert_eq!(params, vec![Value::Str("prd".to_string())]);
    }

    #[test]
    fn integer_leaves_bind_as_integers() {
        let (sql, params) = render_map(FilterMap::from([(
            "metadata".to_string(),
            FilterValue::Nested(leaf("name", ">=10")),
        )]))
        .unwrap();
        assert_eq!(sql, "metadata_id IN (SELECT id FROM metadata WHERE name >= ?)");
        assert_eq!(params, vec![Value::Int(10)]);
    }

    #[test]
    fn escaped_like_pattern_arms_escape_clause() {
        let (sql, params) = render_map(FilterMap::from([(
            "metadata".to_string(),
            FilterValue::Nested(leaf("name", "~%\\%%")),
        )]))
        .unwrap();
        assert_eq!(
            sql,
            "metadata_id IN (SELECT id FROM metadata WHERE name LIKE ? ESCAPE '\\')"
        );
        assert_eq!(params, vec![Value::Str("%\\%%".to_string())]);
    }

    #[test]
    fn unknown_relation_is_rejected() {
        let err = render_map(FilterMap::from([(
            "owner".to_string(),
            FilterValue::Nested(leaf("name", "x")),
        )]))
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid query: unknown relation 'owner'");
    }
}
