use crate::{
    model::{FieldAccessor, MetadataError, NamingStrategy, naming::validate_column_name},
    value::{ColumnType, Value},
};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

///
/// ClusteringOrder
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ClusteringOrder {
    #[default]
    Asc,
    Desc,
}

impl ClusteringOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for ClusteringOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// KeyColumn
///
/// Resolved key column: name, type and clustering direction.
/// Partition columns always carry `Asc`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyColumn {
    pub column: String,
    pub column_type: ColumnType,
    pub order: ClusteringOrder,
}

///
/// KeyComponent
///
/// One component of an embedded (compound) id.
///

#[derive(Debug)]
pub struct KeyComponent<E> {
    name: String,
    column: Option<String>,
    column_type: ColumnType,
    accessor: FieldAccessor<E>,
    order: ClusteringOrder,
}

impl<E> KeyComponent<E> {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        column_type: ColumnType,
        accessor: FieldAccessor<E>,
    ) -> Self {
        Self {
            name: name.into(),
            column: None,
            column_type,
            accessor,
            order: ClusteringOrder::Asc,
        }
    }

    /// Declare an explicit column name instead of the naming strategy.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Mark the component as stored in descending clustering order.
    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.order = ClusteringOrder::Desc;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column name; resolved once the owning property is built.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub const fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    #[must_use]
    pub const fn accessor(&self) -> &FieldAccessor<E> {
        &self.accessor
    }

    #[must_use]
    pub const fn order(&self) -> ClusteringOrder {
        self.order
    }

    pub(crate) fn to_key_column(&self) -> KeyColumn {
        KeyColumn {
            column: self.column_name().to_string(),
            column_type: self.column_type.clone(),
            order: self.order,
        }
    }

    fn resolve(&mut self, naming: NamingStrategy) {
        if self.column.is_none() {
            self.column = Some(naming.apply(&self.name));
        }
    }
}

///
/// EmbeddedIdProperties
///
/// Ordered partition and clustering components of a compound id.
/// Declaration order is the key order and is never re-sorted.
///

#[derive(Debug)]
pub struct EmbeddedIdProperties<E> {
    partition: Vec<KeyComponent<E>>,
    clustering: Vec<KeyComponent<E>>,
}

impl<E> Default for EmbeddedIdProperties<E> {
    fn default() -> Self {
        Self {
            partition: Vec::new(),
            clustering: Vec::new(),
        }
    }
}

impl<E> EmbeddedIdProperties<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn partition(mut self, component: KeyComponent<E>) -> Self {
        self.partition.push(component);
        self
    }

    #[must_use]
    pub fn clustering(mut self, component: KeyComponent<E>) -> Self {
        self.clustering.push(component);
        self
    }

    #[must_use]
    pub fn partition_components(&self) -> &[KeyComponent<E>] {
        &self.partition
    }

    #[must_use]
    pub fn clustering_components(&self) -> &[KeyComponent<E>] {
        &self.clustering
    }

    /// Partition components followed by clustering components.
    pub fn components(&self) -> impl Iterator<Item = &KeyComponent<E>> {
        self.partition.iter().chain(self.clustering.iter())
    }

    #[must_use]
    pub fn is_clustered(&self) -> bool {
        !self.clustering.is_empty()
    }

    pub(crate) fn resolve_and_validate(
        &mut self,
        property: &str,
        naming: NamingStrategy,
    ) -> Result<(), MetadataError> {
        if self.partition.is_empty() {
            return Err(MetadataError::MissingPartitionKey {
                property: property.to_string(),
            });
        }

        for component in self.partition.iter_mut().chain(self.clustering.iter_mut()) {
            component.resolve(naming);
        }

        let mut seen = BTreeSet::new();
        for component in self.components() {
            if !component.column_type.is_scalar() {
                return Err(MetadataError::IncompatibleKind {
                    property: format!("{property}.{}", component.name),
                    reason: format!(
                        "key components must be scalar, found {}",
                        component.column_type
                    ),
                });
            }
            validate_column_name(component.column_name())?;
            if !seen.insert(component.column_name().to_string()) {
                return Err(MetadataError::DuplicateColumn {
                    column: component.column_name().to_string(),
                });
            }
        }

        if let Some(component) = self
            .partition
            .iter()
            .find(|component| component.order == ClusteringOrder::Desc)
        {
            return Err(MetadataError::IncompatibleKind {
                property: format!("{property}.{}", component.name),
                reason: "only clustering components may be reversed".to_string(),
            });
        }

        Ok(())
    }
}

///
/// KeyValues
///
/// Primary-key values in key order: partition components, then clustering
/// components.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct KeyValues(Vec<Value>);

impl KeyValues {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn single(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for KeyValues {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}
