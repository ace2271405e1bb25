#![no_main]
use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use odata_sql::{Dialect, Model, QueryBuilder, Relation, build_query};

fuzz_target!(|data: &[u8]| {
    let Ok(query) = std::str::from_utf8(data) else {
        return;
    };

    let child = Arc::new(Model::new("metadata").with_columns(["id", "name"]));
    let model = Arc::new(
        Model::new("records")
            .with_columns(["id", "name", "value", "metadata_id"])
            .with_relation("metadata", Relation::new("metadata_id", "id", child)),
    );

    if let Ok(db) = build_query(query, QueryBuilder::new(model), Dialect::Sqlite) {
        _ = db.to_sql();
    }
});
