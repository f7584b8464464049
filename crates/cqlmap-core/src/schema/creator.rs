//! CREATE TABLE / CREATE INDEX rendering.

use crate::{
    model::{ClusteringOrder, ColumnDefinition, KeyColumn, TableDefinition},
    schema::{SchemaError, TableMetadataView},
    statement::counter::{COUNTER_TABLE, counter_table_definition},
};

pub const COUNTER_TABLE_COMMENT: &str = "Create default counter table";

/// DDL for a missing table plus its indexes. Refuses when the table exists.
pub fn create(
    definition: &TableDefinition,
    live: Option<&TableMetadataView>,
) -> Result<Vec<String>, SchemaError> {
    if live.is_some() {
        return Err(SchemaError::TableExists {
            table: definition.qualified_name(),
        });
    }

    let mut ddl = vec![create_table(definition, &table_comment(definition))];
    ddl.extend(
        definition
            .columns
            .iter()
            .filter_map(|column| create_index(definition, column)),
    );

    Ok(ddl)
}

#[must_use]
pub fn table_comment(definition: &TableDefinition) -> String {
    if definition.table == COUNTER_TABLE {
        COUNTER_TABLE_COMMENT.to_string()
    } else {
        format!("Create table for entity \"{}\"", definition.class_name)
    }
}

/// `CREATE TABLE t(k type, c type[ static], PRIMARY KEY(...)) WITH comment = '...'`,
/// followed by `AND CLUSTERING ORDER BY (...)` when a clustering column is descending.
#[must_use]
pub fn create_table(definition: &TableDefinition, comment: &str) -> String {
    let keys = definition
        .key_columns()
        .map(|key| format!("{} {}", key.column, key.column_type));
    let columns = definition.columns.iter().map(|column| {
        let suffix = if column.is_static { " static" } else { "" };
        format!("{} {}{suffix}", column.column, column.cql_type)
    });
    let columns: Vec<String> = keys.chain(columns).collect();

    format!(
        "CREATE TABLE {}({}, PRIMARY KEY({})) WITH comment = '{}'{};",
        definition.qualified_name(),
        columns.join(", "),
        primary_key(definition),
        comment.replace('\'', "''"),
        clustering_order(&definition.clustering_keys)
    )
}

/// DDL of the shared counter table.
#[must_use]
pub fn counter_table(keyspace: Option<&str>) -> String {
    create_table(&counter_table_definition(keyspace), COUNTER_TABLE_COMMENT)
}

/// `CREATE INDEX name ON t(c);` for an indexed column.
#[must_use]
pub fn create_index(definition: &TableDefinition, column: &ColumnDefinition) -> Option<String> {
    column.index.as_ref().map(|index| {
        format!(
            "CREATE INDEX {index} ON {}({});",
            definition.qualified_name(),
            column.column
        )
    })
}

// `(p1, p2), c1` for a composite partition key, `p, c1` otherwise
fn primary_key(definition: &TableDefinition) -> String {
    let partition: Vec<&str> = definition
        .partition_keys
        .iter()
        .map(|key| key.column.as_str())
        .collect();
    let partition = match partition.as_slice() {
        [single] => (*single).to_string(),
        keys => format!("({})", keys.join(", ")),
    };

    std::iter::once(partition)
        .chain(definition.clustering_keys.iter().map(|key| key.column.clone()))
        .collect::<Vec<_>>()
        .join(", ")
}

// lists clustering columns up to the last reversed one
fn clustering_order(clustering: &[KeyColumn]) -> String {
    let Some(last) = clustering
        .iter()
        .rposition(|key| key.order == ClusteringOrder::Desc)
    else {
        return String::new();
    };

    let orders: Vec<String> = clustering[..=last]
        .iter()
        .map(|key| format!("{} {}", key.column, key.order))
        .collect();

    format!(" AND CLUSTERING ORDER BY ({})", orders.join(", "))
}
