use crate::model::{ClusteringOrder, TableDefinition, live_identifier};
use std::collections::BTreeMap;

///
/// KeyspaceSchema
///
/// Live tables of one keyspace as reported by the session.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyspaceSchema {
    pub name: String,
    pub tables: BTreeMap<String, TableMetadataView>,
}

impl KeyspaceSchema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: TableMetadataView) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Table by declared name, folded the way the cluster folds it.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableMetadataView> {
        self.tables.get(&live_identifier(name))
    }
}

///
/// ClusteringColumn
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusteringColumn {
    pub name: String,
    pub order: ClusteringOrder,
}

///
/// TableMetadataView
///
/// Read-only live shape of one table. Every name is a live identifier;
/// `columns` holds key columns too.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TableMetadataView {
    pub name: String,
    pub partition_keys: Vec<String>,
    pub clustering_keys: Vec<ClusteringColumn>,
    pub columns: BTreeMap<String, String>,
    pub indexes: BTreeMap<String, String>,
}

impl TableMetadataView {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: live_identifier(&name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn partition_key(mut self, name: &str, cql_type: impl Into<String>) -> Self {
        let name = live_identifier(name);
        self.columns.insert(name.clone(), cql_type.into());
        self.partition_keys.push(name);
        self
    }

    #[must_use]
    pub fn clustering_key(
        mut self,
        name: &str,
        cql_type: impl Into<String>,
        order: ClusteringOrder,
    ) -> Self {
        let name = live_identifier(name);
        self.columns.insert(name.clone(), cql_type.into());
        self.clustering_keys.push(ClusteringColumn { name, order });
        self
    }

    #[must_use]
    pub fn column(mut self, name: &str, cql_type: impl Into<String>) -> Self {
        self.columns.insert(live_identifier(name), cql_type.into());
        self
    }

    #[must_use]
    pub fn index(mut self, column: &str, name: impl Into<String>) -> Self {
        self.indexes.insert(live_identifier(column), name.into());
        self
    }

    #[must_use]
    pub fn column_type(&self, column: &str) -> Option<&str> {
        self.columns.get(&live_identifier(column)).map(String::as_str)
    }

    #[must_use]
    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexes.contains_key(&live_identifier(column))
    }

    /// The view a freshly created table for `definition` would report.
    #[must_use]
    pub fn from_definition(definition: &TableDefinition) -> Self {
        let mut view = Self::new(&definition.table);

        for key in &definition.partition_keys {
            view = view.partition_key(&key.column, key.column_type.to_string());
        }
        for key in &definition.clustering_keys {
            view = view.clustering_key(&key.column, key.column_type.to_string(), key.order);
        }
        for column in &definition.columns {
            view = view.column(&column.column, column.cql_type.to_string());
            if let Some(index) = &column.index {
                view = view.index(&column.column, index.clone());
            }
        }

        view
    }
}
