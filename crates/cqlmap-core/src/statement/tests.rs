use super::*;
use crate::{
    changeset::{Assignment, NativeAssignment},
    config::EntityConfig,
    consistency::{ConsistencyLevel, ResolvedConsistency},
    model::{EntityMeta, KeyValues, PropertyMeta},
    statement::binder::{Bindings, CounterCell},
    test_fixtures::{User, event_meta, page_hits_meta, profile_meta, user_meta},
    value::{ColumnType, Value},
};

const ONE: ResolvedConsistency = ResolvedConsistency {
    level: ConsistencyLevel::One,
    serial: None,
};

fn prepared(template: StatementTemplate) -> PreparedStatement {
    PreparedStatement::new(1, template)
}

///
/// GENERATOR
///

#[test]
fn insert_lists_columns_then_keys() {
    let meta = user_meta();
    let properties: Vec<_> = meta.column_properties().collect();

    let template = generator::insert(&meta, &properties, false).unwrap();

    assert_eq!(
        template.text(),
        "INSERT INTO users(name,age,id) VALUES (?,?,?) USING TTL ?;"
    );
    assert_eq!(template.kind(), StatementKind::Insert);
    assert_eq!(template.placeholders(), 4);
}

#[test]
fn insert_and_update_list_columns_identically() {
    let meta = event_meta();
    let properties: Vec<_> = meta.column_properties().collect();

    let insert = generator::insert(&meta, &properties, true).unwrap();
    let update = generator::update(&meta, &properties, &[]).unwrap();

    assert_eq!(
        insert.text(),
        "INSERT INTO events(region,payload,id,a,b) VALUES (?,?,?,?,?) IF NOT EXISTS USING TTL ?;"
    );
    assert_eq!(
        update.text(),
        "UPDATE events USING TTL ? SET region=?,payload=? WHERE id=? AND a=? AND b=?;"
    );
}

#[test]
fn update_appends_cas_conditions() {
    let meta = user_meta();
    let age = meta.property("age").unwrap();

    let template = generator::update(&meta, &[age], &["name", "age"]).unwrap();

    assert_eq!(
        template.text(),
        "UPDATE users USING TTL ? SET age=? WHERE id=? IF name=? AND age=?;"
    );
    assert_eq!(template.placeholders(), 5);
}

#[test]
fn delete_row_keeps_empty_column_slot() {
    let meta = user_meta();

    assert_eq!(
        generator::delete_row(&meta, &[]).text(),
        "DELETE  FROM users WHERE id=?;"
    );
    assert_eq!(
        generator::delete_row(&meta, &["age"]).text(),
        "DELETE  FROM users WHERE id=? IF age=?;"
    );
}

#[test]
fn delete_columns_names_columns() {
    let meta = user_meta();
    let name = meta.property("name").unwrap();

    let template = generator::delete_columns(&meta, &[name], &[]).unwrap();

    assert_eq!(template.text(), "DELETE name FROM users WHERE id=?;");
}

#[test]
fn select_entity_reads_eager_columns() {
    assert_eq!(
        generator::select_entity(&event_meta()).text(),
        "SELECT region,payload FROM events WHERE id=? AND a=? AND b=?;"
    );
    assert_eq!(
        generator::select_entity(&profile_meta()).text(),
        "SELECT version,history,tags,prefs FROM profiles WHERE id=?;"
    );
}

#[test]
fn select_entity_falls_back_to_key_columns() {
    let meta = EntityMeta::builder("app::model::User")
        .config(EntityConfig::default().table("users"))
        .id(PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(User, id)))
        .property(
            PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)).lazy(),
        )
        .build()
        .unwrap();

    assert_eq!(
        generator::select_entity(&meta).text(),
        "SELECT id FROM users WHERE id=?;"
    );
}

#[test]
fn generic_statements_reject_counter_columns() {
    let meta = profile_meta();
    let likes = meta.property("likes").unwrap();

    for err in [
        generator::insert(&meta, &[likes], false).unwrap_err(),
        generator::update(&meta, &[likes], &[]).unwrap_err(),
        generator::select_columns(&meta, &[likes]).unwrap_err(),
        generator::delete_columns(&meta, &[likes], &[]).unwrap_err(),
    ] {
        assert_eq!(
            err,
            StatementError::CounterColumn {
                property: "likes".to_string()
            }
        );
    }
}

#[test]
fn empty_column_lists_are_rejected() {
    let meta = user_meta();

    let err = generator::update(&meta, &[], &[]).unwrap_err();

    assert_eq!(
        err,
        StatementError::EmptyColumns {
            kind: StatementKind::Update,
            table: "users".to_string()
        }
    );
    assert_eq!(
        InternalError::from(err).class,
        ErrorClass::InvalidArgument
    );
}

#[test]
fn keyspace_qualifies_table_references() {
    let meta = EntityMeta::builder("app::model::User")
        .config(EntityConfig::default().table("users").keyspace("app"))
        .id(PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(User, id)))
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .build()
        .unwrap();

    let template = generator::select_entity(&meta);

    assert_eq!(template.text(), "SELECT name FROM app.users WHERE id=?;");
    assert_eq!(template.table(), "app.users");
}

#[test]
fn changeset_fragments_render_in_order() {
    let meta = profile_meta();
    let assignments = [
        NativeAssignment::new("history", Assignment::Prepend),
        NativeAssignment::new("prefs", Assignment::PutEntry),
        NativeAssignment::new("version", Assignment::Tombstone),
    ];

    let template = generator::update_assignments(&meta, &assignments, &[], true).unwrap();

    assert_eq!(
        template.text(),
        "UPDATE profiles USING TTL ? SET history=?+history,prefs[?]=?,version=null WHERE id=?;"
    );
    assert_eq!(template.placeholders(), 5);
}

///
/// COUNTER
///

#[test]
fn counter_table_statements_have_fixed_shape() {
    assert_eq!(
        counter::increment().text(),
        "UPDATE cqlmap_counter_table SET counter_value=counter_value+? WHERE fqcn=? AND primary_key=? AND property_name=?;"
    );
    assert_eq!(
        counter::select().text(),
        "SELECT counter_value FROM cqlmap_counter_table WHERE fqcn=? AND primary_key=? AND property_name=?;"
    );
    assert_eq!(
        counter::delete().text(),
        "DELETE  FROM cqlmap_counter_table WHERE fqcn=? AND primary_key=? AND property_name=?;"
    );
    assert_eq!(counter::decrement().kind(), StatementKind::Counter);
}

#[test]
fn clustered_counter_update_has_no_ttl() {
    let meta = page_hits_meta();
    let hits = meta.property("hits").unwrap();

    let template = counter::clustered_update(&meta, hits, Assignment::Subtract);

    assert_eq!(
        template.text(),
        "UPDATE page_hits SET hits=hits-? WHERE site=? AND page=?;"
    );
}

#[test]
fn counter_table_definition_is_keyed_by_owner() {
    let definition = counter::counter_table_definition(Some("app"));

    assert_eq!(definition.qualified_name(), "app.cqlmap_counter_table");
    assert_eq!(definition.partition_keys.len(), 2);
    assert_eq!(definition.clustering_keys[0].column, "property_name");
    assert!(definition.columns[0].cql_type.is_counter());
}

///
/// BINDER
///

#[test]
fn insert_binds_ttl_last() {
    let meta = user_meta();
    let properties: Vec<_> = meta.column_properties().collect();
    let template = generator::insert(&meta, &properties, false).unwrap();

    let bound = binder::bind_insert(
        prepared(template),
        vec![Value::from("John"), Value::BigInt(33)],
        &KeyValues::single(10_i64),
        0,
        ONE,
    )
    .unwrap();

    assert_eq!(
        bound.values(),
        [
            Value::from("John"),
            Value::BigInt(33),
            Value::BigInt(10),
            Value::Int(0)
        ]
    );
    assert_eq!(bound.encoded(), ["'John'", "33", "10", "0"]);
}

#[test]
fn counter_binds_delta_then_cell() {
    let cell = CounterCell {
        fqcn: "app::model::Profile".to_string(),
        primary_key: "7".to_string(),
        property: "likes".to_string(),
    };

    let bound = binder::bind_counter(prepared(counter::increment()), Some(2), cell, ONE).unwrap();

    assert_eq!(
        bound.values(),
        [
            Value::BigInt(2),
            Value::from("app::model::Profile"),
            Value::from("7"),
            Value::from("likes")
        ]
    );
}

#[test]
fn placeholder_mismatch_is_an_invariant_violation() {
    let template = generator::delete_row(&user_meta(), &[]);

    let err = Bindings::new()
        .value(Value::BigInt(1))
        .value(Value::BigInt(2))
        .bind(prepared(template), ONE)
        .unwrap_err();

    assert!(matches!(
        err,
        StatementError::PlaceholderMismatch {
            expected: 1,
            found: 2,
            ..
        }
    ));
    let err = InternalError::from(err);
    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Binder);
}

#[test]
fn ttl_beyond_int_range_is_rejected() {
    let err = Bindings::new().ttl(u32::MAX).unwrap_err();

    assert_eq!(err, StatementError::TtlOutOfRange { ttl: u32::MAX });
}

#[test]
fn bound_statement_captures_consistency() {
    let conditional = ResolvedConsistency {
        level: ConsistencyLevel::Quorum,
        serial: Some(ConsistencyLevel::LocalSerial),
    };
    let template = generator::delete_row(&user_meta(), &["age"]);

    let bound = binder::bind_delete(
        prepared(template),
        &KeyValues::single(10_i64),
        vec![Value::BigInt(33)],
        conditional,
    )
    .unwrap();

    assert_eq!(bound.consistency(), ConsistencyLevel::Quorum);
    assert_eq!(
        bound.serial_consistency(),
        Some(ConsistencyLevel::LocalSerial)
    );
    assert_eq!(bound.kind(), StatementKind::Delete);
}
