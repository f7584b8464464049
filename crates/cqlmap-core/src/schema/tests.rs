use super::*;
use crate::{
    config::SchemaConfig,
    error::ErrorClass,
    model::ClusteringOrder,
    session::memory::RecordingSession,
    test_fixtures::{event_meta, profile_meta, user_meta},
};

const EVENTS_DDL: &str = "CREATE TABLE events(id bigint, a int, b text, region text static, payload text, PRIMARY KEY(id, a, b)) WITH comment = 'Create table for entity \"app::model::Event\"' AND CLUSTERING ORDER BY (a DESC);";

fn reconciler(force_table_creation: bool, enable_schema_update: bool) -> SchemaReconciler {
    SchemaReconciler::new(&PersistenceConfig {
        keyspace: Some("app".to_string()),
        schema: SchemaConfig {
            force_table_creation,
            enable_schema_update,
        },
        ..PersistenceConfig::default()
    })
}

fn users_view() -> TableMetadataView {
    TableMetadataView::new("users")
        .partition_key("id", "bigint")
        .column("name", "text")
        .column("age", "bigint")
}

///
/// CREATOR
///

#[test]
fn create_table_renders_keys_and_clustering_order() {
    let meta = event_meta();

    let ddl = creator::create(meta.table_definition(), None).unwrap();

    assert_eq!(
        ddl,
        [
            EVENTS_DDL,
            "CREATE INDEX events_payload_idx ON events(payload);"
        ]
    );
}

#[test]
fn counter_table_ddl_has_composite_partition_key() {
    assert_eq!(
        creator::counter_table(None),
        "CREATE TABLE cqlmap_counter_table(fqcn text, primary_key text, property_name text, counter_value counter, PRIMARY KEY((fqcn, primary_key), property_name)) WITH comment = 'Create default counter table';"
    );
}

#[test]
fn create_refuses_an_existing_table() {
    let meta = user_meta();

    let err = creator::create(meta.table_definition(), Some(&users_view())).unwrap_err();

    assert_eq!(
        err,
        SchemaError::TableExists {
            table: "users".to_string()
        }
    );
}

#[test]
fn unclustered_table_has_no_order_clause() {
    let meta = profile_meta();
    let definition = meta.table_definition();

    let ddl = creator::create_table(definition, &creator::table_comment(definition));

    assert_eq!(
        ddl,
        "CREATE TABLE profiles(id bigint, version bigint, history list<text>, tags set<text>, prefs map<text, text>, PRIMARY KEY(id)) WITH comment = 'Create table for entity \"app::model::Profile\"';"
    );
}

///
/// VALIDATOR
///

#[test]
fn freshly_created_view_validates() {
    for definition in [
        event_meta().table_definition().clone(),
        profile_meta().table_definition().clone(),
    ] {
        let view = TableMetadataView::from_definition(&definition);
        let (definition_before, view_before) = (definition.clone(), view.clone());

        assert!(validator::diff(&definition, &view).is_empty());
        assert_eq!(validator::validate(&definition, &view), Ok(()));
        assert_eq!(validator::validate(&definition, &view), Ok(()));
        assert_eq!(definition, definition_before);
        assert_eq!(view, view_before);
    }
}

#[test]
fn validation_is_pure_and_repeatable() {
    let meta = user_meta();
    let view = users_view().column("age", "int");
    let before = view.clone();

    let first = validator::diff(meta.table_definition(), &view);
    let second = validator::diff(meta.table_definition(), &view);

    assert_eq!(first, second);
    assert_eq!(view, before);
    assert_eq!(
        first,
        [SchemaMismatch::ColumnTypeMismatch {
            column: "age".to_string(),
            expected: "bigint".to_string(),
            found: "int".to_string(),
        }]
    );
}

#[test]
fn live_type_spelling_is_normalized() {
    let meta = user_meta();
    let view = users_view().column("name", "VARCHAR");

    assert!(validator::validate(meta.table_definition(), &view).is_ok());
}

#[test]
fn clustering_names_order_and_direction_are_checked() {
    let meta = event_meta();
    let definition = meta.table_definition();
    let base = || {
        TableMetadataView::new("events")
            .partition_key("id", "bigint")
            .column("region", "text")
            .column("payload", "text")
            .index("payload", "events_payload_idx")
    };

    let swapped = base()
        .clustering_key("b", "text", ClusteringOrder::Asc)
        .clustering_key("a", "int", ClusteringOrder::Desc);
    assert_eq!(
        validator::diff(definition, &swapped),
        [SchemaMismatch::ClusteringKeyMismatch {
            expected: vec!["a".to_string(), "b".to_string()],
            found: vec!["b".to_string(), "a".to_string()],
        }]
    );

    let ascending = base()
        .clustering_key("a", "int", ClusteringOrder::Asc)
        .clustering_key("b", "text", ClusteringOrder::Asc);
    assert_eq!(
        validator::diff(definition, &ascending),
        [SchemaMismatch::ClusteringOrderMismatch {
            column: "a".to_string(),
            expected: ClusteringOrder::Desc,
            found: ClusteringOrder::Asc,
        }]
    );
}

#[test]
fn missing_columns_and_indexes_are_additive() {
    let meta = event_meta();
    let view = TableMetadataView::new("events")
        .partition_key("id", "bigint")
        .clustering_key("a", "int", ClusteringOrder::Desc)
        .clustering_key("b", "text", ClusteringOrder::Asc)
        .column("payload", "text");

    let mismatches = validator::diff(meta.table_definition(), &view);

    assert_eq!(
        mismatches,
        [
            SchemaMismatch::MissingColumn {
                column: "region".to_string()
            },
            SchemaMismatch::MissingIndex {
                column: "payload".to_string()
            },
        ]
    );
    assert!(mismatches.iter().all(SchemaMismatch::is_additive));
}

#[test]
fn counter_table_shape_is_validated() {
    let good = TableMetadataView::from_definition(&counter_table_definition(None));
    assert!(validator::validate_counter_table(&good).is_ok());

    let wrong_roles = TableMetadataView::new("cqlmap_counter_table")
        .partition_key("fqcn", "text")
        .clustering_key("primary_key", "text", ClusteringOrder::Asc)
        .clustering_key("property_name", "text", ClusteringOrder::Asc)
        .column("counter_value", "counter");
    let err = validator::validate_counter_table(&wrong_roles).unwrap_err();
    assert!(matches!(err, SchemaError::Drift { .. }));
}

///
/// UPDATER
///

#[test]
fn updater_adds_columns_and_indexes_only() {
    let meta = event_meta();
    let mismatches = [
        SchemaMismatch::MissingColumn {
            column: "region".to_string(),
        },
        SchemaMismatch::MissingColumn {
            column: "payload".to_string(),
        },
        SchemaMismatch::ColumnTypeMismatch {
            column: "b".to_string(),
            expected: "text".to_string(),
            found: "int".to_string(),
        },
    ];

    assert_eq!(
        updater::plan(meta.table_definition(), &mismatches),
        [
            "ALTER TABLE events ADD region text static;",
            "ALTER TABLE events ADD payload text;",
            "CREATE INDEX events_payload_idx ON events(payload);",
        ]
    );
}

///
/// RECONCILER
///

#[test]
fn missing_keyspace_is_fatal() {
    let session = RecordingSession::new();
    let meta = user_meta();

    let err = reconciler(true, true)
        .reconcile(&session, &[meta.table_definition()])
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::SchemaMismatch);
    assert!(session.schema_statements().is_empty());
}

#[test]
fn table_without_keyspace_is_invalid_metadata() {
    let session = RecordingSession::new();
    let meta = user_meta();

    let err = SchemaReconciler::default()
        .reconcile(&session, &[meta.table_definition()])
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::InvalidMetadata);
}

#[test]
fn missing_table_fails_without_forced_creation() {
    let session = RecordingSession::new().with_keyspace(KeyspaceSchema::new("app"));
    let meta = user_meta();

    let err = reconciler(false, true)
        .reconcile(&session, &[meta.table_definition()])
        .unwrap_err();

    assert!(err.is_schema_mismatch());
}

#[test]
fn forced_creation_includes_the_counter_table() {
    let session = RecordingSession::new().with_keyspace(KeyspaceSchema::new("app"));
    let profile = profile_meta();
    let user = user_meta();

    let report = reconciler(true, false)
        .reconcile(&session, &[profile.table_definition(), user.table_definition()])
        .unwrap();

    assert_eq!(
        report.created,
        ["profiles", "users", "cqlmap_counter_table"]
    );
    assert_eq!(session.schema_statements(), report.statements);
    assert_eq!(
        session.schema_statements().last(),
        Some(&creator::counter_table(None))
    );
}

#[test]
fn matching_tables_are_only_validated() {
    let session = RecordingSession::new();
    session.add_table("app", users_view());
    let meta = user_meta();

    let report = reconciler(false, false)
        .reconcile(&session, &[meta.table_definition()])
        .unwrap();

    assert_eq!(report.validated, ["users"]);
    assert!(session.schema_statements().is_empty());
}

#[test]
fn missing_column_needs_schema_update() {
    let session = RecordingSession::new();
    session.add_table(
        "app",
        TableMetadataView::new("users")
            .partition_key("id", "bigint")
            .column("name", "text"),
    );
    let meta = user_meta();

    let err = reconciler(false, false)
        .reconcile(&session, &[meta.table_definition()])
        .unwrap_err();
    assert!(err.is_schema_mismatch());

    let report = reconciler(false, true)
        .reconcile(&session, &[meta.table_definition()])
        .unwrap();
    assert_eq!(report.altered, ["users"]);
    assert_eq!(
        session.schema_statements(),
        ["ALTER TABLE users ADD age bigint;"]
    );
}

#[test]
fn type_drift_fails_even_with_schema_update() {
    let session = RecordingSession::new();
    session.add_table("app", users_view().column("age", "text"));
    let meta = user_meta();

    let err = reconciler(true, true)
        .reconcile(&session, &[meta.table_definition()])
        .unwrap_err();

    assert!(err.is_schema_mismatch());
    assert!(err.message.contains("column 'age' is text, declared bigint"));
    assert!(session.schema_statements().is_empty());
}
