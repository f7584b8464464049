//! Counter statements.
//!
//! Simple counters live in one shared table keyed by owning type, textual
//! primary key and property name; its statements have a fixed shape
//! regardless of the entity key. Clustered counters use the entity's own
//! table and key.

use crate::{
    changeset::Assignment,
    model::{
        ClusteringOrder, ColumnDefinition, EntityMeta, KeyColumn, PropertyMeta, TableDefinition,
    },
    statement::{StatementKind, StatementTemplate, generator::key_predicate},
    value::ColumnType,
};

pub const COUNTER_TABLE: &str = "cqlmap_counter_table";
pub const COUNTER_FQCN: &str = "fqcn";
pub const COUNTER_PRIMARY_KEY: &str = "primary_key";
pub const COUNTER_PROPERTY_NAME: &str = "property_name";
pub const COUNTER_VALUE: &str = "counter_value";

const COUNTER_PREDICATE: &str = "fqcn=? AND primary_key=? AND property_name=?";

/// `UPDATE cqlmap_counter_table SET counter_value=counter_value+? WHERE ...;`
#[must_use]
pub fn increment() -> StatementTemplate {
    counter_update('+')
}

/// `UPDATE cqlmap_counter_table SET counter_value=counter_value-? WHERE ...;`
#[must_use]
pub fn decrement() -> StatementTemplate {
    counter_update('-')
}

#[must_use]
pub fn select() -> StatementTemplate {
    StatementTemplate::new(
        StatementKind::Select,
        COUNTER_TABLE,
        format!("SELECT {COUNTER_VALUE} FROM {COUNTER_TABLE} WHERE {COUNTER_PREDICATE};"),
    )
}

#[must_use]
pub fn delete() -> StatementTemplate {
    StatementTemplate::new(
        StatementKind::Delete,
        COUNTER_TABLE,
        format!("DELETE  FROM {COUNTER_TABLE} WHERE {COUNTER_PREDICATE};"),
    )
}

fn counter_update(sign: char) -> StatementTemplate {
    StatementTemplate::new(
        StatementKind::Counter,
        COUNTER_TABLE,
        format!(
            "UPDATE {COUNTER_TABLE} SET {COUNTER_VALUE}={COUNTER_VALUE}{sign}? WHERE {COUNTER_PREDICATE};"
        ),
    )
}

/// `UPDATE t SET c=c+? WHERE k1=? AND k2=?;` for a clustered counter.
///
/// Only `Append` (increment) and `Subtract` (decrement) are meaningful.
#[must_use]
pub fn clustered_update<E>(
    meta: &EntityMeta<E>,
    property: &PropertyMeta<E>,
    assignment: Assignment,
) -> StatementTemplate {
    let table = meta.qualified_table();
    let column = property.column();
    let sign = if assignment == Assignment::Subtract { '-' } else { '+' };

    StatementTemplate::new(
        StatementKind::Counter,
        &table,
        format!(
            "UPDATE {table} SET {column}={column}{sign}? WHERE {};",
            key_predicate(meta)
        ),
    )
}

/// Declared shape of the shared counter table.
#[must_use]
pub fn counter_table_definition(keyspace: Option<&str>) -> TableDefinition {
    let text_key = |column: &str| KeyColumn {
        column: column.to_string(),
        column_type: ColumnType::Text,
        order: ClusteringOrder::Asc,
    };

    TableDefinition {
        class_name: COUNTER_TABLE.to_string(),
        keyspace: keyspace.map(ToString::to_string),
        table: COUNTER_TABLE.to_string(),
        partition_keys: vec![text_key(COUNTER_FQCN), text_key(COUNTER_PRIMARY_KEY)],
        clustering_keys: vec![text_key(COUNTER_PROPERTY_NAME)],
        columns: vec![ColumnDefinition {
            column: COUNTER_VALUE.to_string(),
            cql_type: ColumnType::Counter,
            is_static: false,
            index: None,
        }],
        uses_counter_table: false,
    }
}
