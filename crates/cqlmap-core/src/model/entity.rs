use crate::{
    config::{EntityConfig, InsertStrategy},
    consistency::{ConsistencyLevel, ConsistencyPair, validate_serial},
    error::{ErrorOrigin, InternalError},
    model::{
        ClusteringOrder, ColumnDefinition, FetchMode, KeyColumn, KeyValidationError, KeyValues,
        MetadataError, PropertyKind, PropertyMeta, PropertyMetaBuilder, TableDefinition,
        live_identifier, simple_name,
        table::qualify,
        validate::{validate_clustering_prefix, validate_full_key},
        validate_schema_name,
    },
    value::Value,
};
use std::collections::{HashMap, HashSet};

///
/// EntityMeta
///
/// Frozen metadata of one mapped type. Every derived view is computed by
/// `EntityMetaBuilder::build` and never changes afterwards.
///

#[derive(Debug)]
pub struct EntityMeta<E> {
    class_name: String,
    table: String,
    keyspace: Option<String>,
    id: PropertyMeta<E>,

    // all-but-id, declaration order
    properties: Vec<PropertyMeta<E>>,
    by_name: HashMap<String, usize>,

    partition_keys: Vec<KeyColumn>,
    clustering_keys: Vec<KeyColumn>,

    // indexes into `properties`
    row_columns: Vec<usize>,
    eager: Vec<usize>,
    statics: Vec<usize>,
    counters: Vec<usize>,

    clustered_counter: bool,
    consistency: Option<ConsistencyPair>,
    serial_consistency: Option<ConsistencyLevel>,
    ttl: Option<u32>,
    insert_strategy: Option<InsertStrategy>,
    table_definition: TableDefinition,
}

impl<E> EntityMeta<E> {
    #[must_use]
    pub fn builder(class_name: impl Into<String>) -> EntityMetaBuilder<E> {
        EntityMetaBuilder::new(class_name)
    }

    /// Fully-qualified owning type name; keys the shared counter table.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// Table reference used in statements.
    #[must_use]
    pub fn qualified_table(&self) -> String {
        qualify(self.keyspace.as_deref(), &self.table)
    }

    #[must_use]
    pub const fn id(&self) -> &PropertyMeta<E> {
        &self.id
    }

    /// Look up a property by logical name, the id included.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyMeta<E>> {
        if self.id.name() == name {
            return Some(&self.id);
        }

        self.by_name.get(name).map(|&i| &self.properties[i])
    }

    pub fn property_or_err(&self, name: &str) -> Result<&PropertyMeta<E>, InternalError> {
        self.property(name).ok_or_else(|| {
            InternalError::argument_invalid(
                ErrorOrigin::Metadata,
                format!("entity '{}' has no property '{name}'", self.class_name),
            )
        })
    }

    /// Every property except the id, in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyMeta<E>] {
        &self.properties
    }

    /// Non-key properties stored as columns of the entity table.
    pub fn column_properties(&self) -> impl Iterator<Item = &PropertyMeta<E>> {
        self.select(&self.row_columns)
    }

    /// Row columns loaded by a plain entity select.
    pub fn eager_properties(&self) -> impl Iterator<Item = &PropertyMeta<E>> {
        self.select(&self.eager)
    }

    pub fn static_properties(&self) -> impl Iterator<Item = &PropertyMeta<E>> {
        self.select(&self.statics)
    }

    pub fn counter_properties(&self) -> impl Iterator<Item = &PropertyMeta<E>> {
        self.select(&self.counters)
    }

    /// Counters kept in the shared counter table.
    pub fn simple_counters(&self) -> impl Iterator<Item = &PropertyMeta<E>> {
        let skip = self.clustered_counter;

        self.counter_properties().filter(move |_| !skip)
    }

    #[must_use]
    pub fn partition_keys(&self) -> &[KeyColumn] {
        &self.partition_keys
    }

    #[must_use]
    pub fn clustering_keys(&self) -> &[KeyColumn] {
        &self.clustering_keys
    }

    /// Partition columns followed by clustering columns.
    pub fn key_columns(&self) -> impl Iterator<Item = &KeyColumn> {
        self.partition_keys.iter().chain(self.clustering_keys.iter())
    }

    #[must_use]
    pub fn key_len(&self) -> usize {
        self.partition_keys.len() + self.clustering_keys.len()
    }

    #[must_use]
    pub fn is_clustered(&self) -> bool {
        !self.clustering_keys.is_empty()
    }

    /// Clustered entity whose only non-id property is a counter; that counter
    /// lives in the entity's own table.
    #[must_use]
    pub const fn is_clustered_counter(&self) -> bool {
        self.clustered_counter
    }

    #[must_use]
    pub const fn consistency(&self) -> Option<&ConsistencyPair> {
        self.consistency.as_ref()
    }

    #[must_use]
    pub const fn serial_consistency(&self) -> Option<ConsistencyLevel> {
        self.serial_consistency
    }

    #[must_use]
    pub const fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    #[must_use]
    pub const fn insert_strategy(&self) -> Option<InsertStrategy> {
        self.insert_strategy
    }

    #[must_use]
    pub const fn table_definition(&self) -> &TableDefinition {
        &self.table_definition
    }

    /// Read the primary-key values of `entity` in key order.
    pub fn primary_key_of(&self, entity: &E) -> Result<KeyValues, InternalError> {
        match self.id.kind() {
            PropertyKind::EmbeddedId(key) => Ok(key
                .components()
                .map(|component| component.accessor().read(entity))
                .collect::<Vec<_>>()
                .into()),
            _ => Ok(KeyValues::single(self.id.read(entity)?)),
        }
    }

    /// Write primary-key values back into `entity`.
    pub fn write_primary_key(&self, entity: &mut E, key: &KeyValues) -> Result<(), InternalError> {
        if key.len() != self.key_len() {
            return Err(self.arity_error(key.len()).into());
        }

        match self.id.kind() {
            PropertyKind::EmbeddedId(embedded) => {
                for (component, value) in embedded.components().zip(key.iter()) {
                    component.accessor().write(entity, value.clone())?;
                }
                Ok(())
            }
            _ => self.id.write(entity, key[0].clone()),
        }
    }

    /// Validate a complete primary key.
    pub fn validate_primary_key(&self, key: &KeyValues) -> Result<(), KeyValidationError> {
        let columns: Vec<KeyColumn> = self.key_columns().cloned().collect();

        validate_full_key(&self.class_name, &columns, key)
    }

    /// Validate a clustering prefix used by slice queries.
    pub fn validate_clustering_values(&self, values: &[Value]) -> Result<(), KeyValidationError> {
        validate_clustering_prefix(&self.class_name, &self.clustering_keys, values)
    }

    /// Textual primary key stored in the counter table: the JSON form of the
    /// single key value, or a JSON array for compound keys.
    #[must_use]
    pub fn counter_primary_key(&self, key: &KeyValues) -> String {
        match key.as_slice() {
            [single] => single.to_json().to_string(),
            values => serde_json::Value::Array(values.iter().map(Value::to_json).collect())
                .to_string(),
        }
    }

    fn select<'a>(&'a self, indexes: &'a [usize]) -> impl Iterator<Item = &'a PropertyMeta<E>> {
        indexes.iter().map(|&i| &self.properties[i])
    }

    fn arity_error(&self, found: usize) -> KeyValidationError {
        KeyValidationError::ArityMismatch {
            entity: self.class_name.clone(),
            expected: self.key_len(),
            found,
        }
    }
}

///
/// EntityMetaBuilder
///

#[derive(Debug)]
pub struct EntityMetaBuilder<E> {
    class_name: String,
    config: EntityConfig,
    id: Option<PropertyMetaBuilder<E>>,
    properties: Vec<PropertyMetaBuilder<E>>,
}

impl<E> EntityMetaBuilder<E> {
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            config: EntityConfig::default(),
            id: None,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: EntityConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn id(mut self, id: PropertyMetaBuilder<E>) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyMetaBuilder<E>) -> Self {
        self.properties.push(property);
        self
    }

    /// Validate the declaration and compute every derived view.
    pub fn build(self) -> Result<EntityMeta<E>, MetadataError> {
        let Self {
            class_name,
            config,
            id,
            properties: declared,
        } = self;
        let naming = config.naming.unwrap_or_default();

        let id = id
            .ok_or_else(|| MetadataError::MissingId {
                entity: class_name.clone(),
            })?
            .naming_or(naming)
            .build()?;
        if !id.property_type().is_id() {
            return Err(MetadataError::IncompatibleKind {
                property: id.name().to_string(),
                reason: format!(
                    "declared as the id but is a {} property",
                    id.property_type().as_str()
                ),
            });
        }
        if declared.is_empty() {
            return Err(MetadataError::EmptyProperties { entity: class_name });
        }

        let table = config
            .table
            .clone()
            .unwrap_or_else(|| naming.apply(simple_name(&class_name)));
        validate_schema_name(&table)?;
        if let Some(keyspace) = &config.keyspace {
            validate_schema_name(keyspace)?;
        }
        let serial_consistency = config.serial_consistency.map(validate_serial).transpose()?;

        let (partition_keys, clustering_keys) = match id.embedded_id_properties() {
            Some(key) => (
                key.partition_components().iter().map(|c| c.to_key_column()).collect(),
                key.clustering_components().iter().map(|c| c.to_key_column()).collect(),
            ),
            None => (
                vec![KeyColumn {
                    column: id.column().to_string(),
                    column_type: id.value_type().clone(),
                    order: ClusteringOrder::Asc,
                }],
                Vec::new(),
            ),
        };
        let clustered = !clustering_keys.is_empty();

        let mut names = HashSet::from([id.name().to_string()]);
        let mut columns: HashSet<String> = partition_keys
            .iter()
            .chain(clustering_keys.iter())
            .map(|key: &KeyColumn| live_identifier(&key.column))
            .collect();
        let mut properties = Vec::with_capacity(declared.len());

        for builder in declared {
            let property = builder.naming_or(naming).build()?;

            if property.property_type().is_id() {
                return Err(MetadataError::IncompatibleKind {
                    property: property.name().to_string(),
                    reason: "an entity declares exactly one id".to_string(),
                });
            }
            if !names.insert(property.name().to_string()) {
                return Err(MetadataError::DuplicateProperty {
                    property: property.name().to_string(),
                });
            }
            if !columns.insert(live_identifier(property.column())) {
                return Err(MetadataError::DuplicateColumn {
                    column: property.column().to_string(),
                });
            }
            if property.is_static() && !clustered {
                return Err(MetadataError::StaticOnUnclusteredEntity {
                    entity: class_name,
                    property: property.name().to_string(),
                });
            }

            properties.push(property);
        }

        let clustered_counter =
            clustered && properties.len() == 1 && properties[0].is_counter();

        let by_name = properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name().to_string(), i))
            .collect();
        let indexes_where = |keep: &dyn Fn(&PropertyMeta<E>) -> bool| -> Vec<usize> {
            properties
                .iter()
                .enumerate()
                .filter(|(_, p)| keep(p))
                .map(|(i, _)| i)
                .collect()
        };
        let row_columns = indexes_where(&|p| {
            p.external_table().is_none() && (!p.is_counter() || clustered_counter)
        });
        let eager = row_columns
            .iter()
            .copied()
            .filter(|&i| {
                properties[i].fetch() == FetchMode::Eager
                    || (clustered_counter && properties[i].is_counter())
            })
            .collect();
        let statics = indexes_where(&|p| p.is_static());
        let counters = indexes_where(&|p| p.is_counter());

        let table_definition = TableDefinition {
            class_name: class_name.clone(),
            keyspace: config.keyspace.clone(),
            table: table.clone(),
            partition_keys: partition_keys.clone(),
            clustering_keys: clustering_keys.clone(),
            columns: row_columns
                .iter()
                .filter_map(|&i| {
                    let property = &properties[i];

                    property.cql_type().map(|cql_type| ColumnDefinition {
                        column: property.column().to_string(),
                        cql_type,
                        is_static: property.is_static(),
                        index: property
                            .index()
                            .map(|index| index.name_for(&table, property.column())),
                    })
                })
                .collect(),
            uses_counter_table: !counters.is_empty() && !clustered_counter,
        };

        Ok(EntityMeta {
            class_name,
            table,
            keyspace: config.keyspace,
            id,
            properties,
            by_name,
            partition_keys,
            clustering_keys,
            row_columns,
            eager,
            statics,
            counters,
            clustered_counter,
            consistency: config.consistency,
            serial_consistency,
            ttl: config.ttl,
            insert_strategy: config.insert_strategy,
            table_definition,
        })
    }
}
