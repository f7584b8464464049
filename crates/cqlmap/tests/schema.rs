use cqlmap::{
    core::{
        schema::{KeyspaceSchema, TableMetadataView},
        session::memory::RecordingSession,
        test_fixtures::{event_meta, page_hits_meta, profile_meta},
    },
    prelude::*,
};

const CONFIG: &str = r#"{
    "keyspace": "app",
    "schema": { "force_table_creation": true, "enable_schema_update": true }
}"#;

#[test]
fn fresh_keyspace_is_created_then_revalidated() -> Result<(), Error> {
    let config = PersistenceConfig::from_json(CONFIG)?;
    let session = RecordingSession::new().with_keyspace(KeyspaceSchema::new("app"));
    let (event, profile, hits) = (event_meta(), profile_meta(), page_hits_meta());
    let definitions = [
        event.table_definition(),
        profile.table_definition(),
        hits.table_definition(),
    ];
    let reconciler = SchemaReconciler::new(&config);

    let first = reconciler.reconcile(&session, &definitions)?;
    assert_eq!(
        first.created,
        ["events", "profiles", "page_hits", "cqlmap_counter_table"]
    );
    assert!(first.statements[0].starts_with("CREATE TABLE events("));
    assert!(first.statements[0].ends_with("AND CLUSTERING ORDER BY (a DESC);"));
    assert_eq!(
        first.statements[1],
        "CREATE INDEX events_payload_idx ON events(payload);"
    );

    // Simulate the cluster now holding what was just created.
    let mut keyspace = KeyspaceSchema::new("app");
    for definition in definitions {
        keyspace = keyspace.with_table(TableMetadataView::from_definition(definition));
    }
    let counter_table = cqlmap::core::statement::counter::counter_table_definition(None);
    keyspace = keyspace.with_table(TableMetadataView::from_definition(&counter_table));
    let session = RecordingSession::new().with_keyspace(keyspace);

    let second = reconciler.reconcile(&session, &definitions)?;
    assert!(second.created.is_empty());
    assert_eq!(second.validated.len(), 4);
    assert!(session.schema_statements().is_empty());

    Ok(())
}

#[test]
fn clustered_counter_entity_stores_its_counter_in_row() -> Result<(), Error> {
    let config = PersistenceConfig::from_json(CONFIG)?;
    let session = RecordingSession::new().with_keyspace(KeyspaceSchema::new("app"));
    let hits = page_hits_meta();

    let report = SchemaReconciler::new(&config).reconcile(&session, &[hits.table_definition()])?;

    assert_eq!(report.created, ["page_hits"]);
    assert_eq!(
        report.statements,
        [
            "CREATE TABLE page_hits(site text, page text, hits counter, PRIMARY KEY(site, page)) WITH comment = 'Create table for entity \"app::model::PageHits\"';"
        ]
    );

    Ok(())
}

#[test]
fn incompatible_live_table_maps_to_schema_kind() {
    let config = PersistenceConfig::from_json(CONFIG).unwrap();
    let session = RecordingSession::new().with_keyspace(
        KeyspaceSchema::new("app").with_table(
            TableMetadataView::new("profiles")
                .partition_key("id", "text")
                .column("version", "bigint"),
        ),
    );
    let profile = profile_meta();

    let err: Error = SchemaReconciler::new(&config)
        .reconcile(&session, &[profile.table_definition()])
        .unwrap_err()
        .into();

    assert_eq!(err.kind, ErrorKind::Schema);
    assert_eq!(err.origin, ErrorOrigin::Schema);
    assert!(err.message.contains("profiles"));
}

#[test]
fn invalid_configuration_documents_are_metadata_errors() {
    let err: Error = PersistenceConfig::from_json(r#"{ "consistency": { "serial": "QUORUM" } }"#)
        .unwrap_err()
        .into();

    assert_eq!(err.kind, ErrorKind::Metadata);
    assert_eq!(err.origin, ErrorOrigin::Consistency);
}
