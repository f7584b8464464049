use crate::{
    consistency::ConsistencyPair,
    error::{ErrorOrigin, InternalError},
    model::{
        EmbeddedIdProperties, FieldAccessor, MetadataError, NamingStrategy,
        naming::{unquote, validate_column_name, validate_schema_name},
    },
    value::{ColumnType, Value},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// FetchMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FetchMode {
    #[default]
    Eager,
    Lazy,
}

///
/// PropertyType
///
/// Payload-free tag of a `PropertyKind`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PropertyType {
    Id,
    EmbeddedId,
    Simple,
    List,
    Set,
    Map,
    Counter,
    Join,
}

impl PropertyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::EmbeddedId => "embedded id",
            Self::Simple => "simple",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Counter => "counter",
            Self::Join => "join",
        }
    }

    #[must_use]
    pub const fn is_id(self) -> bool {
        matches!(self, Self::Id | Self::EmbeddedId)
    }
}

///
/// PropertyKind
///
/// Column kind of a property. Each variant owns the payload of its kind
/// family, so at most one family is ever populated.
///

#[derive(Debug)]
pub enum PropertyKind<E> {
    Id,
    EmbeddedId(EmbeddedIdProperties<E>),
    Simple,
    List,
    Set,
    Map { key: ColumnType },
    Counter,
    Join(JoinProperties),
}

impl<E> PropertyKind<E> {
    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        match self {
            Self::Id => PropertyType::Id,
            Self::EmbeddedId(_) => PropertyType::EmbeddedId,
            Self::Simple => PropertyType::Simple,
            Self::List => PropertyType::List,
            Self::Set => PropertyType::Set,
            Self::Map { .. } => PropertyType::Map,
            Self::Counter => PropertyType::Counter,
            Self::Join(_) => PropertyType::Join,
        }
    }
}

///
/// CascadeType
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum CascadeType {
    Persist,
    Merge,
    Refresh,
    Remove,
}

///
/// JoinProperties
///
/// Reference to another entity; the column stores the target's id.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinProperties {
    target: String,
    cascade: BTreeSet<CascadeType>,
}

impl JoinProperties {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            cascade: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn cascade(mut self, cascade: CascadeType) -> Self {
        self.cascade.insert(cascade);
        self
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn cascades(&self, cascade: CascadeType) -> bool {
        self.cascade.contains(&cascade)
    }
}

///
/// IndexProperties
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexProperties {
    name: Option<String>,
}

impl IndexProperties {
    /// Index name; defaults to `<table>_<column>_idx`.
    #[must_use]
    pub fn name_for(&self, table: &str, column: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_{}_idx", unquote(table), unquote(column)))
    }
}

///
/// PropertyMeta
///
/// Runtime metadata for one mapped field.
///

#[derive(Debug)]
pub struct PropertyMeta<E> {
    name: String,
    column: String,
    kind: PropertyKind<E>,
    value_type: ColumnType,
    accessor: Option<FieldAccessor<E>>,
    fetch: FetchMode,
    is_static: bool,
    index: Option<IndexProperties>,
    consistency: Option<ConsistencyPair>,
    external_table: Option<String>,
}

impl<E> PropertyMeta<E> {
    #[must_use]
    pub fn id(
        name: impl Into<String>,
        ty: ColumnType,
        accessor: FieldAccessor<E>,
    ) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::Id, ty).accessor(accessor)
    }

    #[must_use]
    pub fn embedded_id(
        name: impl Into<String>,
        key: EmbeddedIdProperties<E>,
    ) -> PropertyMetaBuilder<E> {
        // The value type of an embedded id is never rendered; text is a placeholder.
        PropertyMetaBuilder::new(name, PropertyKind::EmbeddedId(key), ColumnType::Text)
    }

    #[must_use]
    pub fn simple(
        name: impl Into<String>,
        ty: ColumnType,
        accessor: FieldAccessor<E>,
    ) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::Simple, ty).accessor(accessor)
    }

    #[must_use]
    pub fn list(
        name: impl Into<String>,
        element: ColumnType,
        accessor: FieldAccessor<E>,
    ) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::List, element).accessor(accessor)
    }

    #[must_use]
    pub fn set(
        name: impl Into<String>,
        element: ColumnType,
        accessor: FieldAccessor<E>,
    ) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::Set, element).accessor(accessor)
    }

    #[must_use]
    pub fn map(
        name: impl Into<String>,
        key: ColumnType,
        value: ColumnType,
        accessor: FieldAccessor<E>,
    ) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::Map { key }, value).accessor(accessor)
    }

    /// Counters are lazy: they are never part of the eager row select.
    #[must_use]
    pub fn counter(name: impl Into<String>, accessor: FieldAccessor<E>) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::Counter, ColumnType::Counter)
            .accessor(accessor)
            .lazy()
    }

    #[must_use]
    pub fn join(
        name: impl Into<String>,
        target_id: ColumnType,
        join: JoinProperties,
        accessor: FieldAccessor<E>,
    ) -> PropertyMetaBuilder<E> {
        PropertyMetaBuilder::new(name, PropertyKind::Join(join), target_id).accessor(accessor)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub const fn kind(&self) -> &PropertyKind<E> {
        &self.kind
    }

    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        self.kind.property_type()
    }

    /// Scalar type, or element/value type for collections and maps.
    #[must_use]
    pub const fn value_type(&self) -> &ColumnType {
        &self.value_type
    }

    #[must_use]
    pub const fn map_key_type(&self) -> Option<&ColumnType> {
        match &self.kind {
            PropertyKind::Map { key } => Some(key),
            _ => None,
        }
    }

    /// Full CQL type of the backing column; `None` for an embedded id,
    /// which spans several columns.
    #[must_use]
    pub fn cql_type(&self) -> Option<ColumnType> {
        let value = self.value_type.clone();

        match &self.kind {
            PropertyKind::EmbeddedId(_) => None,
            PropertyKind::Id | PropertyKind::Simple | PropertyKind::Join(_) => Some(value),
            PropertyKind::List => Some(ColumnType::list(value)),
            PropertyKind::Set => Some(ColumnType::set(value)),
            PropertyKind::Map { key } => Some(ColumnType::map(key.clone(), value)),
            PropertyKind::Counter => Some(ColumnType::Counter),
        }
    }

    #[must_use]
    pub const fn embedded_id_properties(&self) -> Option<&EmbeddedIdProperties<E>> {
        match &self.kind {
            PropertyKind::EmbeddedId(key) => Some(key),
            _ => None,
        }
    }

    #[must_use]
    pub const fn join_properties(&self) -> Option<&JoinProperties> {
        match &self.kind {
            PropertyKind::Join(join) => Some(join),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_counter(&self) -> bool {
        matches!(self.kind, PropertyKind::Counter)
    }

    #[must_use]
    pub const fn fetch(&self) -> FetchMode {
        self.fetch
    }

    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub const fn index(&self) -> Option<&IndexProperties> {
        self.index.as_ref()
    }

    #[must_use]
    pub const fn consistency(&self) -> Option<&ConsistencyPair> {
        self.consistency.as_ref()
    }

    #[must_use]
    pub fn external_table(&self) -> Option<&str> {
        self.external_table.as_deref()
    }

    pub fn accessor(&self) -> Result<&FieldAccessor<E>, InternalError> {
        self.accessor.as_ref().ok_or_else(|| {
            InternalError::unsupported(
                ErrorOrigin::Metadata,
                format!(
                    "property '{}' is an embedded id; access its components instead",
                    self.name
                ),
            )
        })
    }

    /// Read the field value from `entity`.
    pub fn read(&self, entity: &E) -> Result<Value, InternalError> {
        Ok(self.accessor()?.read(entity))
    }

    /// Write `value` into the field of `entity`.
    pub fn write(&self, entity: &mut E, value: Value) -> Result<(), InternalError> {
        self.accessor()?.write(entity, value)
    }
}

///
/// PropertyMetaBuilder
///

#[derive(Debug)]
pub struct PropertyMetaBuilder<E> {
    name: String,
    column: Option<String>,
    kind: PropertyKind<E>,
    value_type: ColumnType,
    accessor: Option<FieldAccessor<E>>,
    fetch: FetchMode,
    is_static: bool,
    index: Option<IndexProperties>,
    consistency: Option<ConsistencyPair>,
    external_table: Option<String>,
    naming: Option<NamingStrategy>,
}

impl<E> PropertyMetaBuilder<E> {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PropertyKind<E>, value_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind,
            value_type,
            accessor: None,
            fetch: FetchMode::Eager,
            is_static: false,
            index: None,
            consistency: None,
            external_table: None,
            naming: None,
        }
    }

    #[must_use]
    pub const fn accessor(mut self, accessor: FieldAccessor<E>) -> Self {
        self.accessor = Some(accessor);
        self
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub const fn lazy(mut self) -> Self {
        self.fetch = FetchMode::Lazy;
        self
    }

    #[must_use]
    pub const fn static_column(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.index = Some(IndexProperties::default());
        self
    }

    #[must_use]
    pub fn indexed_as(mut self, name: impl Into<String>) -> Self {
        self.index = Some(IndexProperties {
            name: Some(name.into()),
        });
        self
    }

    #[must_use]
    pub const fn consistency(mut self, pair: ConsistencyPair) -> Self {
        self.consistency = Some(pair);
        self
    }

    #[must_use]
    pub fn external_table(mut self, table: impl Into<String>) -> Self {
        self.external_table = Some(table.into());
        self
    }

    /// Naming strategy for this property; overrides the entity default.
    #[must_use]
    pub const fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = Some(naming);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn naming_or(mut self, naming: NamingStrategy) -> Self {
        self.naming.get_or_insert(naming);
        self
    }

    /// Validate the declaration and freeze it.
    pub fn build(self) -> Result<PropertyMeta<E>, MetadataError> {
        let Self {
            name,
            column,
            mut kind,
            value_type,
            accessor,
            fetch,
            is_static,
            index,
            consistency,
            external_table,
            naming,
        } = self;
        let naming = naming.unwrap_or_default();

        if name.is_empty() {
            return Err(MetadataError::EmptyPropertyName);
        }
        let incompatible = |reason: String| MetadataError::IncompatibleKind {
            property: name.clone(),
            reason,
        };
        let property_type = kind.property_type();

        match &mut kind {
            PropertyKind::EmbeddedId(key) => key.resolve_and_validate(&name, naming)?,
            _ if accessor.is_none() => {
                return Err(MetadataError::MissingAccessor {
                    property: name.clone(),
                });
            }
            PropertyKind::Counter => {
                if !value_type.is_counter() {
                    return Err(incompatible(format!(
                        "counter properties hold counter values, found {value_type}"
                    )));
                }
            }
            PropertyKind::Map { key } if !key.is_scalar() => {
                return Err(incompatible(format!("map keys must be scalar, found {key}")));
            }
            PropertyKind::Join(join) if join.cascades(CascadeType::Remove) => {
                return Err(incompatible(
                    "cascade remove is not supported on references".to_string(),
                ));
            }
            _ => {}
        }

        if property_type != PropertyType::EmbeddedId
            && property_type != PropertyType::Counter
            && !value_type.is_scalar()
        {
            return Err(incompatible(format!(
                "{} properties need a scalar value type, found {value_type}",
                property_type.as_str()
            )));
        }
        if property_type.is_id() {
            if is_static || index.is_some() || fetch == FetchMode::Lazy {
                return Err(incompatible(
                    "ids cannot be static, indexed or lazy".to_string(),
                ));
            }
            if external_table.is_some() {
                return Err(incompatible("ids cannot live in an external table".to_string()));
            }
        }
        if index.is_some() && !matches!(property_type, PropertyType::Simple | PropertyType::Join) {
            return Err(incompatible(format!(
                "only simple columns can be indexed, found {}",
                property_type.as_str()
            )));
        }

        let column = column.unwrap_or_else(|| naming.apply(&name));
        validate_column_name(&column)?;
        if let Some(table) = &external_table {
            validate_schema_name(table)?;
        }

        Ok(PropertyMeta {
            name,
            column,
            kind,
            value_type,
            accessor,
            fetch,
            is_static,
            index,
            consistency,
            external_table,
        })
    }
}
