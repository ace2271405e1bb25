use std::sync::Arc;

use crate::{
    Dialect, Error, Model, PrefixConfig, QueryBuilder, Relation, Value, build_query,
    build_query_with_validation, print_tree, valid_query,
};

fn tags_model() -> Arc<Model> {
    Arc::new(Model::new("tags").with_columns(["id", "value"]))
}

fn metadata_model() -> Arc<Model> {
    Arc::new(
        Model::new("metadata")
            .with_columns(["id", "name", "tag_id"])
            .with_relation("tag", Relation::new("tag_id", "id", tags_model())),
    )
}

fn mock_model() -> Arc<Model> {
    Arc::new(
        Model::new("mock_models")
            .with_columns(["id", "name", "test_value", "created_at", "metadata_id"])
            .with_relation("metadata", Relation::new("metadata_id", "id", metadata_model())),
    )
}

fn build(query: &str, dialect: Dialect) -> Result<(String, Vec<Value>), Error> {
    build_query(query, QueryBuilder::new(mock_model()), dialect)?.to_sql()
}

fn s(v: &str) -> Value {
    Value::Str(v.to_string())
}

fn i(v: i64) -> Value {
    Value::Int(v)
}

#[test]
fn simple_query() {
    let (sql, params) = build(
        "name ne 'prd' and (contains(testValue,'testvalue') or endswith(testValue,'accvalue'))",
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(
        sql,
        "WHERE name != ? AND (test_value LIKE ? OR test_value LIKE ?)"
    );
    assert_eq!(params, vec![s("prd"), s("%testvalue%"), s("%accvalue")]);
}

#[test]
fn unary_function_chain() {
    let (sql, params) = build("length(trim(toupper(testValue))) gt 10", Dialect::Sqlite).unwrap();
    assert_eq!(sql, "WHERE LENGTH(TRIM(UPPER(test_value))) > ?");
    assert_eq!(params, vec![i(10)]);
}

#[test]
fn quoted_literals_bind_as_strings() {
    let (sql, params) = build("name eq '5'", Dialect::Sqlite).unwrap();
    assert_eq!(sql, "WHERE name = ?");
    assert_eq!(params, vec![s("5")]);
}

#[test]
fn postgres_datetime_functions() {
    let (sql, params) = build(
        "year(createdAt) gt 2025 and time(createdAt) lt '01:12:00'",
        Dialect::Postgres,
    )
    .unwrap();
    assert_eq!(
        sql,
        "WHERE EXTRACT(YEAR FROM created_at) > ? AND CAST(created_at::timestamp AS time) < ?"
    );
    assert_eq!(params, vec![i(2025), s("01:12:00")]);
}

#[test]
fn datetime_functions_match_on_the_shared_table() {
    for dialect in [Dialect::MySql, Dialect::Sqlite, Dialect::SqlServer] {
        let (sql, _) = build("year(createdAt) gt 2025", dialect).unwrap();
        assert_eq!(sql, "WHERE YEAR(created_at) > ?");
    }
}

#[test]
fn navigation_paths_become_correlated_subqueries() {
    let (sql, params) = build(
        "name eq 'test' and (metadata/name eq 'test-4-metadata' or startswith(metadata/tag/value,'test-3'))",
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(
        sql,
        "WHERE name = ? AND (metadata_id IN (SELECT id FROM metadata WHERE name = ?) OR \
         metadata_id IN (SELECT id FROM metadata WHERE tag_id IN (SELECT id FROM tags WHERE value LIKE ?)))"
    );
    assert_eq!(params, vec![s("test"), s("test-4-metadata"), s("test-3%")]);
}

#[test]
fn negation_applies_de_morgan() {
    let (sql, params) = build(
        "not(contains(tolower(testValue),' ') and endswith(metadata/name,'prd')) and not(name eq 'test' or startswith(name,'prd'))",
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(
        sql,
        "WHERE (LOWER(test_value) NOT LIKE ? OR metadata_id IN (SELECT id FROM metadata WHERE name NOT LIKE ?)) \
         AND (name != ? AND name NOT LIKE ?)"
    );
    assert_eq!(params, vec![s("% %"), s("%prd"), s("test"), s("prd%")]);
}

#[test]
fn negated_comparisons_reverse_polarity() {
    let (sql, params) = build("not(length(testValue) le 10)", Dialect::Sqlite).unwrap();
    assert_eq!(sql, "WHERE LENGTH(test_value) > ?");
    assert_eq!(params, vec![i(10)]);
}

#[test]
fn negated_navigation_equality_uses_the_not_equal_prefix() {
    let (sql, params) = build("not(metadata/name eq 'prd')", Dialect::Sqlite).unwrap();
    assert_eq!(sql, "WHERE metadata_id IN (SELECT id FROM metadata WHERE name != ?)");
    assert_eq!(params, vec![s("prd")]);
}

#[test]
fn navigation_comparison_rides_on_a_prefix() {
    let (sql, params) = build("metadata/tag/value ge 10", Dialect::Sqlite).unwrap();
    assert_eq!(
        sql,
        "WHERE metadata_id IN (SELECT id FROM metadata WHERE tag_id IN (SELECT id FROM tags WHERE value >= ?))"
    );
    assert_eq!(params, vec![i(10)]);
}

#[test]
fn concat_joins_with_sql_concatenation() {
    let (sql, params) = build(
        "concat(name,concat(' ',testValue)) eq 'a b'",
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(sql, "WHERE name || ' ' || test_value = ?");
    assert_eq!(params, vec![s("a b")]);
}

#[test]
fn unary_chain_over_concat() {
    let (sql, params) = build("toupper(concat(name,'x')) eq 'ABX'", Dialect::Sqlite).unwrap();
    assert_eq!(sql, "WHERE UPPER(name || 'x') = ?");
    assert_eq!(params, vec![s("ABX")]);
}

#[test]
fn missing_closing_bracket() {
    let err = build("length(name", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to parse query: missing closing bracket ')'"
    );
}

#[test]
fn missing_opening_bracket() {
    let err = build("name eq 'x')", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to parse query: missing opening bracket '('"
    );
}

#[test]
fn typo_diagnostic_carries_the_fragment() {
    let err = build("name qe 'test'", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to parse query: possible typo in \"qe 'test'\""
    );
}

#[test]
fn unary_function_cannot_be_the_root() {
    let err = build("length(name)", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: root level operators other then 'not' are not supported"
    );
}

#[test]
fn bare_operand_cannot_be_the_root() {
    let err = build("name", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: expression is not a boolean predicate"
    );
}

#[test]
fn literal_percent_is_escaped_exactly_once() {
    let (sql, params) = build("contains(name,'%')", Dialect::Sqlite).unwrap();
    assert_eq!(sql, r"WHERE name LIKE ? ESCAPE '\'");
    assert_eq!(params, vec![s(r"%\%%")]);
    // exactly one escaped wildcard and one ESCAPE clause
    let Value::Str(pattern) = &params[0] else {
        panic!("Expected a string parameter")
    };
    assert_eq!(pattern.matches(r"\%").count(), 1);
    assert_eq!(sql.matches("ESCAPE").count(), 1);
}

#[test]
fn unary_operator_as_right_operand_is_rejected() {
    let err = build("name eq length(testValue)", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: unary operators not supported as right operand of equality operators"
    );
}

#[test]
fn concat_as_right_operand_is_rejected() {
    let err = build("name eq concat(name,'x')", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: concat not supported as right operand of equality operators"
    );
}

#[test]
fn navigation_path_as_right_operand_is_rejected() {
    let err = build("name eq metadata/name", Dialect::Sqlite).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: right operand of a comparison must be a literal"
    );
}

#[test]
fn nested_not_is_rejected() {
    let err = build("not(not(name eq 'x'))", Dialect::Sqlite).unwrap_err();
    assert_eq!(err.to_string(), "invalid query: nested 'not' is not supported");
}

#[test]
fn builder_state_survives_prior_predicates() {
    // Predicates attached before the build stay in front of the filter
    let db = QueryBuilder::new(mock_model()).where_sql("id = ?", vec![i(7)]);
    let db = build_query("name eq 'x'", db, Dialect::Sqlite).unwrap();
    let (sql, params) = db.to_sql().unwrap();
    assert_eq!(sql, "WHERE id = ? AND name = ?");
    assert_eq!(params, vec![i(7), s("x")]);
}

#[test]
fn custom_prefix_config_reaches_the_leaves() {
    let cfg = PrefixConfig {
        like: "like:".to_string(),
        not_like: "notlike:".to_string(),
        ..PrefixConfig::default()
    };
    let db = QueryBuilder::new(mock_model()).use_query_convert(cfg);
    let db = build_query("startswith(metadata/name,'prd')", db, Dialect::Sqlite).unwrap();
    let (sql, params) = db.to_sql().unwrap();
    assert_eq!(sql, "WHERE metadata_id IN (SELECT id FROM metadata WHERE name LIKE ?)");
    assert_eq!(params, vec![s("prd%")]);
}

#[test]
fn build_with_validation_accepts_known_columns() {
    let db = build_query_with_validation(
        "name eq 'test' and metadata/name eq 'm'",
        QueryBuilder::new(mock_model()),
        Dialect::Sqlite,
        0,
    )
    .unwrap();
    let (sql, _) = db.to_sql().unwrap();
    assert_eq!(
        sql,
        "WHERE name = ? AND metadata_id IN (SELECT id FROM metadata WHERE name = ?)"
    );
}

#[test]
fn build_with_validation_rejects_unknown_columns() {
    let err = build_query_with_validation(
        "secretColumn eq 'x'",
        QueryBuilder::new(mock_model()),
        Dialect::Sqlite,
        0,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: unknown column name 'secret_column'"
    );
}

#[test]
fn build_with_validation_enforces_the_depth_cap() {
    let err = build_query_with_validation(
        "name eq 'a' and (name eq 'b' or name eq 'c')",
        QueryBuilder::new(mock_model()),
        Dialect::Sqlite,
        2,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid query: maximum query complexity exceeded: 3 > 2"
    );
}

#[test]
fn valid_query_is_parse_plus_whitelist() {
    valid_query("name eq 'x'", &mock_model(), 0).unwrap();

    let err = valid_query("length(name", &mock_model(), 0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to parse query: missing closing bracket ')'"
    );
}

#[test]
fn print_tree_renders_the_parenthesized_form() {
    let rendered = print_tree("name ne 'prd' and contains(testValue,'x')").unwrap();
    assert_eq!(rendered, "((name ne 'prd') and contains(testValue,'x'))");
}

// Every literal must end up in the parameter list, never in the SQL text
#[test]
fn parameter_isolation() {
    let queries = [
        "name eq 'sentinel-value'",
        "length(testValue) gt 12345",
        "contains(name,'sentinel-value')",
        "metadata/name eq 'sentinel-value'",
        "not(startswith(name,'sentinel-value'))",
    ];
    for query in queries {
        let (sql, params) = build(query, Dialect::Sqlite).unwrap();
        assert!(
            !sql.contains("sentinel") && !sql.contains("12345"),
            "literal leaked into SQL for {query:?}: {sql}"
        );
        assert!(!params.is_empty(), "no parameters bound for {query:?}");
    }
}

// A navigation predicate must go through the nested-filter form, never
//  through a direct comparison against a joined column
#[test]
fn navigation_locality() {
    let queries = [
        "metadata/name eq 'x'",
        "metadata/name gt 'x'",
        "contains(metadata/name,'x')",
        "not(endswith(metadata/tag/value,'x'))",
    ];
    for query in queries {
        let (sql, _) = build(query, Dialect::Sqlite).unwrap();
        assert!(
            sql.contains("IN (SELECT"),
            "expected a subselect for {query:?}: {sql}"
        );
        assert!(
            !sql.contains("metadata.") && !sql.contains("metadata/name"),
            "joined column leaked for {query:?}: {sql}"
        );
    }
}
