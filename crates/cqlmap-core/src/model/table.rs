use crate::{
    model::{KeyColumn, live_identifier},
    value::ColumnType,
};

///
/// ColumnDefinition
///
/// One non-key column the entity table declares.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnDefinition {
    pub column: String,
    pub cql_type: ColumnType,
    pub is_static: bool,
    pub index: Option<String>,
}

///
/// TableDefinition
///
/// Declared table shape derived from an `EntityMeta` at build time.
/// Non-generic so that tables of different entity types can be reconciled
/// together.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableDefinition {
    pub class_name: String,
    pub keyspace: Option<String>,
    pub table: String,
    pub partition_keys: Vec<KeyColumn>,
    pub clustering_keys: Vec<KeyColumn>,
    pub columns: Vec<ColumnDefinition>,

    /// Whether some counter of this entity lives in the shared counter table.
    pub uses_counter_table: bool,
}

impl TableDefinition {
    /// `keyspace.table` when a keyspace is declared, else the bare table.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualify(self.keyspace.as_deref(), &self.table)
    }

    #[must_use]
    pub fn is_clustered(&self) -> bool {
        !self.clustering_keys.is_empty()
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &KeyColumn> {
        self.partition_keys.iter().chain(self.clustering_keys.iter())
    }

    /// Look up a non-key column by its live (case-folded) name.
    #[must_use]
    pub fn column(&self, live_name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|column| live_identifier(&column.column) == live_name)
    }
}

pub(crate) fn qualify(keyspace: Option<&str>, table: &str) -> String {
    match keyspace {
        Some(keyspace) => format!("{keyspace}.{table}"),
        None => table.to_string(),
    }
}
