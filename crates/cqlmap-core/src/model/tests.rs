use super::*;
use crate::{
    config::EntityConfig,
    consistency::{ConsistencyError, ConsistencyLevel, ConsistencyPair},
    test_fixtures::{
        Event, PageHits, Profile, User, event_meta, page_hits_meta, profile_meta, user_meta,
    },
    value::{ColumnType, Value},
};
use proptest::prelude::*;

fn user_builder() -> EntityMetaBuilder<User> {
    EntityMeta::builder("app::model::User")
        .id(PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(User, id)))
}

///
/// NAMING
///

#[test]
fn schema_names_follow_grammar() {
    assert!(validate_schema_name("users").is_ok());
    assert!(validate_schema_name("\"MixedCase\"").is_ok());
    assert!(validate_schema_name("a1").is_ok());
    assert!(validate_schema_name(&"x".repeat(MAX_SCHEMA_NAME_LEN)).is_ok());

    let too_long = "x".repeat(MAX_SCHEMA_NAME_LEN + 1);
    for bad in ["a", "_users", "user-table", "", too_long.as_str()] {
        let err = validate_schema_name(bad).unwrap_err();
        assert_eq!(
            err,
            MetadataError::InvalidSchemaName {
                name: bad.to_string()
            }
        );
    }
}

#[test]
fn column_names_may_be_one_character() {
    assert!(validate_column_name("a").is_ok());
    assert!(validate_column_name("\"B\"").is_ok());
    assert!(validate_column_name(&"x".repeat(MAX_SCHEMA_NAME_LEN)).is_ok());

    let too_long = "x".repeat(MAX_SCHEMA_NAME_LEN + 1);
    for bad in ["", "_a", "a-b", too_long.as_str()] {
        assert_eq!(
            validate_column_name(bad).unwrap_err(),
            MetadataError::InvalidColumnName {
                name: bad.to_string()
            }
        );
    }
}

#[test]
fn single_letter_columns_and_key_components_build() {
    let meta = event_meta();
    let key = meta.id().embedded_id_properties().unwrap();

    assert_eq!(
        key.components().map(KeyComponent::column_name).collect::<Vec<_>>(),
        ["id", "a", "b"]
    );
    assert_eq!(key.partition_components().len(), 1);

    let age = PropertyMeta::simple("age", ColumnType::BigInt, field_accessor!(User, age));
    let user = user_builder().property(age.column("a")).build().unwrap();
    assert_eq!(user.property_or_err("age").unwrap().column(), "a");
}

#[test]
fn naming_strategies_map_logical_names() {
    assert_eq!(NamingStrategy::SnakeCase.apply("createdAt"), "created_at");
    assert_eq!(NamingStrategy::LowerCase.apply("createdAt"), "createdat");
    assert_eq!(NamingStrategy::CaseSensitive.apply("createdAt"), "\"createdAt\"");

    assert_eq!(live_identifier("\"createdAt\""), "createdAt");
    assert_eq!(live_identifier("CreatedAt"), "createdat");
    assert_eq!(simple_name("app::model::User"), "User");
    assert_eq!(simple_name("com.example.User"), "User");
}

///
/// PROPERTY BUILD
///

#[test]
fn counter_requires_counter_value_type() {
    let err =
        PropertyMetaBuilder::new("likes", PropertyKind::<Profile>::Counter, ColumnType::BigInt)
            .accessor(field_accessor!(Profile, likes))
            .build()
            .unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

#[test]
fn collection_elements_must_be_scalar() {
    let err = PropertyMeta::list(
        "history",
        ColumnType::list(ColumnType::Text),
        field_accessor!(Profile, history),
    )
    .build()
    .unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

#[test]
fn map_keys_must_be_scalar() {
    let err = PropertyMeta::map(
        "prefs",
        ColumnType::set(ColumnType::Text),
        ColumnType::Text,
        field_accessor!(Profile, prefs),
    )
    .build()
    .unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

#[test]
fn id_cannot_be_static_or_indexed() {
    let static_id = PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(User, id))
        .static_column()
        .build();
    let indexed_id = PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(User, id))
        .indexed()
        .build();

    assert!(static_id.is_err());
    assert!(indexed_id.is_err());
}

#[test]
fn counter_cannot_be_a_key_component() {
    let key = EmbeddedIdProperties::new().partition(KeyComponent::new(
        "id",
        ColumnType::Counter,
        field_accessor!(Profile, id),
    ));
    let err = PropertyMeta::embedded_id("key", key).build().unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

#[test]
fn partition_component_cannot_be_reversed() {
    let key = EmbeddedIdProperties::new().partition(
        KeyComponent::new("id", ColumnType::BigInt, field_accessor!(Event, id)).reversed(),
    );
    let err = PropertyMeta::embedded_id("key", key).build().unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

#[test]
fn embedded_id_requires_partition_component() {
    let key = EmbeddedIdProperties::new()
        .clustering(KeyComponent::new("a", ColumnType::Int, field_accessor!(Event, a)));
    let err = PropertyMeta::embedded_id("key", key).build().unwrap_err();

    assert_eq!(
        err,
        MetadataError::MissingPartitionKey {
            property: "key".to_string()
        }
    );
}

#[test]
fn plain_property_requires_accessor() {
    let err = PropertyMetaBuilder::<User>::new("name", PropertyKind::Simple, ColumnType::Text)
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        MetadataError::MissingAccessor {
            property: "name".to_string()
        }
    );
}

#[test]
fn remove_cascade_is_rejected_on_references() {
    let err = PropertyMeta::join(
        "owner",
        ColumnType::BigInt,
        JoinProperties::new("app::model::User").cascade(CascadeType::Remove),
        field_accessor!(Profile, version),
    )
    .build()
    .unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

#[test]
fn property_column_defaults_to_naming_strategy() {
    let property = PropertyMeta::simple("createdAt", ColumnType::BigInt, field_accessor!(User, age))
        .build()
        .unwrap();
    let explicit = PropertyMeta::simple("createdAt", ColumnType::BigInt, field_accessor!(User, age))
        .column("created")
        .build()
        .unwrap();

    assert_eq!(property.column(), "created_at");
    assert_eq!(explicit.column(), "created");
    assert_eq!(property.cql_type(), Some(ColumnType::BigInt));
}

///
/// ENTITY BUILD
///

#[test]
fn missing_id_is_rejected() {
    let err = EntityMeta::<User>::builder("app::model::User")
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        MetadataError::MissingId {
            entity: "app::model::User".to_string()
        }
    );
}

#[test]
fn empty_property_set_is_rejected() {
    let err = user_builder().build().unwrap_err();

    assert!(matches!(err, MetadataError::EmptyProperties { .. }));
}

#[test]
fn table_name_defaults_to_simple_class_name() {
    let meta = user_builder()
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .build()
        .unwrap();

    assert_eq!(meta.table(), "user");
    assert_eq!(meta.qualified_table(), "user");
}

#[test]
fn invalid_table_name_is_rejected() {
    let err = user_builder()
        .config(EntityConfig::default().table("user-table"))
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        MetadataError::InvalidSchemaName {
            name: "user-table".to_string()
        }
    );
}

#[test]
fn keyspace_qualifies_table_reference() {
    let meta = user_builder()
        .config(EntityConfig::default().table("users").keyspace("app"))
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .build()
        .unwrap();

    assert_eq!(meta.qualified_table(), "app.users");
    assert_eq!(meta.table_definition().qualified_name(), "app.users");
}

#[test]
fn duplicate_columns_are_rejected() {
    let err = user_builder()
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .property(
            PropertyMeta::simple("alias", ColumnType::Text, field_accessor!(User, name))
                .column("NAME"),
        )
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        MetadataError::DuplicateColumn {
            column: "NAME".to_string()
        }
    );
}

#[test]
fn property_cannot_shadow_key_column() {
    let err = user_builder()
        .property(
            PropertyMeta::simple("other", ColumnType::BigInt, field_accessor!(User, age))
                .column("id"),
        )
        .build()
        .unwrap_err();

    assert!(matches!(err, MetadataError::DuplicateColumn { .. }));
}

#[test]
fn duplicate_property_names_are_rejected() {
    let err = user_builder()
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .property(
            PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name))
                .column("name2"),
        )
        .build()
        .unwrap_err();

    assert!(matches!(err, MetadataError::DuplicateProperty { .. }));
}

#[test]
fn static_column_requires_clustering() {
    let err = user_builder()
        .property(
            PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name))
                .static_column(),
        )
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        MetadataError::StaticOnUnclusteredEntity { .. }
    ));
}

#[test]
fn serial_consistency_must_be_serial() {
    let err = user_builder()
        .config(EntityConfig::default().serial_consistency(ConsistencyLevel::One))
        .property(PropertyMeta::simple("name", ColumnType::Text, field_accessor!(User, name)))
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        MetadataError::Consistency(ConsistencyError::SerialLevelExpected {
            level: ConsistencyLevel::One
        })
    );
}

#[test]
fn second_id_is_rejected() {
    let err = user_builder()
        .property(PropertyMeta::id("other", ColumnType::BigInt, field_accessor!(User, age)))
        .build()
        .unwrap_err();

    assert!(matches!(err, MetadataError::IncompatibleKind { .. }));
}

///
/// DERIVED VIEWS
///

#[test]
fn simple_entity_views() {
    let meta = user_meta();

    assert_eq!(meta.class_name(), "app::model::User");
    assert!(!meta.is_clustered());
    assert_eq!(meta.key_len(), 1);
    assert_eq!(meta.partition_keys()[0].column, "id");
    assert_eq!(
        meta.eager_properties().map(PropertyMeta::name).collect::<Vec<_>>(),
        ["name", "age"]
    );
    assert!(meta.property("id").is_some_and(|p| p.property_type().is_id()));
    assert!(meta.property_or_err("missing").is_err());
}

#[test]
fn compound_entity_views() {
    let meta = event_meta();

    assert!(meta.is_clustered());
    assert_eq!(meta.partition_keys().len(), 1);
    assert_eq!(
        meta.clustering_keys()
            .iter()
            .map(|k| (k.column.as_str(), k.order))
            .collect::<Vec<_>>(),
        [("a", ClusteringOrder::Desc), ("b", ClusteringOrder::Asc)]
    );
    assert_eq!(
        meta.static_properties().map(PropertyMeta::name).collect::<Vec<_>>(),
        ["region"]
    );

    let table = meta.table_definition();
    assert_eq!(table.columns.len(), 2);
    assert!(table.columns[0].is_static);
    assert_eq!(table.columns[1].index.as_deref(), Some("events_payload_idx"));
    assert!(!table.uses_counter_table);
}

#[test]
fn counters_are_lazy_and_outside_the_row() {
    let meta = profile_meta();

    assert_eq!(
        meta.counter_properties().map(PropertyMeta::name).collect::<Vec<_>>(),
        ["likes"]
    );
    assert_eq!(meta.simple_counters().count(), 1);
    assert!(meta.eager_properties().all(|p| !p.is_counter()));
    assert!(meta.table_definition().column("likes").is_none());
    assert!(meta.table_definition().uses_counter_table);
    assert_eq!(meta.ttl(), Some(3600));
}

#[test]
fn clustered_counter_lives_in_entity_table() {
    let meta = page_hits_meta();

    assert!(meta.is_clustered_counter());
    assert_eq!(meta.simple_counters().count(), 0);
    assert_eq!(
        meta.table_definition()
            .column("hits")
            .map(|c| c.cql_type.clone()),
        Some(ColumnType::Counter)
    );
    assert!(!meta.table_definition().uses_counter_table);
}

#[test]
fn property_consistency_override_is_kept() {
    let pair = ConsistencyPair::uniform(ConsistencyLevel::Quorum).unwrap();
    let meta = EntityMeta::<Profile>::builder("app::model::Profile")
        .id(PropertyMeta::id("id", ColumnType::BigInt, field_accessor!(Profile, id)))
        .property(PropertyMeta::counter("likes", field_accessor!(Profile, likes)).consistency(pair))
        .build()
        .unwrap();

    assert_eq!(meta.property("likes").and_then(PropertyMeta::consistency), Some(&pair));
}

///
/// KEY VALUES
///

#[test]
fn primary_key_round_trips_through_accessors() {
    let meta = event_meta();
    let event = Event {
        id: 7,
        a: 3,
        b: "x".to_string(),
        ..Event::default()
    };

    let key = meta.primary_key_of(&event).unwrap();
    assert_eq!(
        key,
        KeyValues::new(vec![Value::BigInt(7), Value::Int(3), Value::Text("x".into())])
    );

    let mut loaded = Event::default();
    meta.write_primary_key(&mut loaded, &key).unwrap();
    assert_eq!(loaded.id, 7);
    assert_eq!(loaded.a, 3);
    assert_eq!(loaded.b, "x");
}

#[test]
fn primary_key_validation() {
    let meta = event_meta();

    assert!(
        meta.validate_primary_key(&KeyValues::new(vec![
            Value::BigInt(1),
            Value::Int(2),
            Value::from("b"),
        ]))
        .is_ok()
    );
    assert!(matches!(
        meta.validate_primary_key(&KeyValues::single(1_i64)),
        Err(KeyValidationError::ArityMismatch {
            expected: 3,
            found: 1,
            ..
        })
    ));
    assert!(matches!(
        meta.validate_primary_key(&KeyValues::new(vec![
            Value::Null,
            Value::Int(2),
            Value::from("b")
        ])),
        Err(KeyValidationError::NullKeyComponent { .. })
    ));
    assert!(matches!(
        meta.validate_primary_key(&KeyValues::new(vec![
            Value::BigInt(1),
            Value::from("wrong"),
            Value::from("b"),
        ])),
        Err(KeyValidationError::ComponentTypeMismatch { .. })
    ));
}

#[test]
fn counter_primary_key_is_json() {
    let user = user_meta();
    let hits = page_hits_meta();

    assert_eq!(user.counter_primary_key(&KeyValues::single(10_i64)), "10");
    assert_eq!(
        hits.counter_primary_key(&KeyValues::new(vec![Value::from("a"), Value::from("b")])),
        r#"["a","b"]"#
    );
}

#[test]
fn clustering_hole_is_rejected() {
    let meta = event_meta();
    let err = meta
        .validate_clustering_values(&[Value::Null, Value::from("b")])
        .unwrap_err();

    assert_eq!(
        err,
        KeyValidationError::ClusteringHole {
            entity: "app::model::Event".to_string(),
            column: "b".to_string()
        }
    );
}

fn clustering_value(present: bool, index: usize) -> Value {
    match (present, index) {
        (false, _) => Value::Null,
        (true, 0) => Value::Int(1),
        (true, _) => Value::from("b"),
    }
}

proptest! {
    #[test]
    fn clustering_prefix_accepts_exactly_hole_free_lists(
        mask in proptest::collection::vec(any::<bool>(), 0..=2),
    ) {
        let meta = event_meta();
        let values: Vec<Value> = mask
            .iter()
            .enumerate()
            .map(|(i, &present)| clustering_value(present, i))
            .collect();
        let hole = mask.windows(2).any(|w| !w[0] && w[1]);

        prop_assert_eq!(meta.validate_clustering_values(&values).is_err(), hole);
    }

    #[test]
    fn trailing_nulls_are_accepted(present in 0_usize..=2) {
        let meta = event_meta();
        let values: Vec<Value> = (0..2)
            .map(|i| clustering_value(i < present, i))
            .collect();

        prop_assert!(meta.validate_clustering_values(&values).is_ok());
    }
}

#[test]
fn clustered_counter_requires_single_counter() {
    let key = EmbeddedIdProperties::new()
        .partition(KeyComponent::new("site", ColumnType::Text, field_accessor!(PageHits, site)))
        .clustering(KeyComponent::new("page", ColumnType::Text, field_accessor!(PageHits, page)));
    let meta = EntityMeta::<PageHits>::builder("app::model::PageHits")
        .id(PropertyMeta::embedded_id("key", key))
        .property(PropertyMeta::counter("hits", field_accessor!(PageHits, hits)))
        .property(PropertyMeta::simple(
            "label",
            ColumnType::Text,
            field_accessor!(PageHits, page),
        ))
        .build()
        .unwrap();

    assert!(!meta.is_clustered_counter());
    assert!(meta.table_definition().uses_counter_table);
}
