//! Entity-table statement templates.
//!
//! Column lists follow the order of the property slice passed in, which the
//! callers take from declaration order, so INSERT and UPDATE list columns
//! identically. Key columns always come last, partition then clustering.

use crate::{
    changeset::NativeAssignment,
    model::{EntityMeta, PropertyMeta},
    statement::{StatementError, StatementKind, StatementTemplate},
};

/// `INSERT INTO t(c1,c2,k1) VALUES (?,?,?)[ IF NOT EXISTS] USING TTL ?;`
pub fn insert<E>(
    meta: &EntityMeta<E>,
    properties: &[&PropertyMeta<E>],
    if_not_exists: bool,
) -> Result<StatementTemplate, StatementError> {
    reject_counters(properties)?;

    let columns: Vec<&str> = properties
        .iter()
        .map(|p| p.column())
        .chain(meta.key_columns().map(|k| k.column.as_str()))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(",");
    let table = meta.qualified_table();
    let condition = if if_not_exists { " IF NOT EXISTS" } else { "" };

    Ok(StatementTemplate::new(
        StatementKind::Insert,
        &table,
        format!(
            "INSERT INTO {table}({}) VALUES ({placeholders}){condition} USING TTL ?;",
            columns.join(",")
        ),
    ))
}

/// `SELECT c1,c2 FROM t WHERE k1=? AND k2=?;` over the eager row columns.
///
/// An entity without eager columns selects its key columns, which still
/// tells whether the row exists.
#[must_use]
pub fn select_entity<E>(meta: &EntityMeta<E>) -> StatementTemplate {
    let mut columns: Vec<&str> = meta.eager_properties().map(PropertyMeta::column).collect();
    if columns.is_empty() {
        columns = meta.key_columns().map(|k| k.column.as_str()).collect();
    }

    select(meta, &columns)
}

/// Select specific non-counter columns by primary key.
pub fn select_columns<E>(
    meta: &EntityMeta<E>,
    properties: &[&PropertyMeta<E>],
) -> Result<StatementTemplate, StatementError> {
    reject_counters_unless_clustered(meta, properties)?;
    let columns: Vec<&str> = properties.iter().map(|p| p.column()).collect();
    if columns.is_empty() {
        return Err(empty(StatementKind::Select, meta));
    }

    Ok(select(meta, &columns))
}

/// `UPDATE t USING TTL ? SET a=?,b=? WHERE k1=?[ IF x=? AND y=?];`
pub fn update<E>(
    meta: &EntityMeta<E>,
    properties: &[&PropertyMeta<E>],
    conditions: &[&str],
) -> Result<StatementTemplate, StatementError> {
    reject_counters(properties)?;
    let assignments: Vec<String> = properties.iter().map(|p| format!("{}=?", p.column())).collect();

    render_update(meta, &assignments, conditions, true)
}

/// UPDATE built from translated changeset fragments.
///
/// Clustered counter updates pass `with_ttl = false`: counter columns
/// cannot carry a TTL.
pub fn update_assignments<E>(
    meta: &EntityMeta<E>,
    assignments: &[NativeAssignment],
    conditions: &[&str],
    with_ttl: bool,
) -> Result<StatementTemplate, StatementError> {
    let assignments: Vec<String> = assignments.iter().map(ToString::to_string).collect();

    render_update(meta, &assignments, conditions, with_ttl)
}

/// `DELETE  FROM t WHERE k1=?[ IF ...];`
///
/// The double space is the empty column-list slot of the DELETE grammar.
#[must_use]
pub fn delete_row<E>(meta: &EntityMeta<E>, conditions: &[&str]) -> StatementTemplate {
    render_delete(meta, "", conditions)
}

/// `DELETE a,b FROM t WHERE k1=?[ IF ...];`
pub fn delete_columns<E>(
    meta: &EntityMeta<E>,
    properties: &[&PropertyMeta<E>],
    conditions: &[&str],
) -> Result<StatementTemplate, StatementError> {
    reject_counters(properties)?;
    if properties.is_empty() {
        return Err(empty(StatementKind::Delete, meta));
    }
    let columns: Vec<&str> = properties.iter().map(|p| p.column()).collect();

    Ok(render_delete(meta, &columns.join(","), conditions))
}

/// `k1=? AND k2=?` over the key columns.
pub(crate) fn key_predicate<E>(meta: &EntityMeta<E>) -> String {
    meta.key_columns()
        .map(|k| format!("{}=?", k.column))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn select<E>(meta: &EntityMeta<E>, columns: &[&str]) -> StatementTemplate {
    let table = meta.qualified_table();

    StatementTemplate::new(
        StatementKind::Select,
        &table,
        format!(
            "SELECT {} FROM {table} WHERE {};",
            columns.join(","),
            key_predicate(meta)
        ),
    )
}

fn render_update<E>(
    meta: &EntityMeta<E>,
    assignments: &[String],
    conditions: &[&str],
    with_ttl: bool,
) -> Result<StatementTemplate, StatementError> {
    if assignments.is_empty() {
        return Err(empty(StatementKind::Update, meta));
    }
    let table = meta.qualified_table();
    let ttl = if with_ttl { " USING TTL ?" } else { "" };

    Ok(StatementTemplate::new(
        StatementKind::Update,
        &table,
        format!(
            "UPDATE {table}{ttl} SET {} WHERE {}{};",
            assignments.join(","),
            key_predicate(meta),
            cas_clause(conditions)
        ),
    ))
}

fn render_delete<E>(meta: &EntityMeta<E>, columns: &str, conditions: &[&str]) -> StatementTemplate {
    let table = meta.qualified_table();

    StatementTemplate::new(
        StatementKind::Delete,
        &table,
        format!(
            "DELETE {columns} FROM {table} WHERE {}{};",
            key_predicate(meta),
            cas_clause(conditions)
        ),
    )
}

fn cas_clause(conditions: &[&str]) -> String {
    if conditions.is_empty() {
        return String::new();
    }

    let predicates: Vec<String> = conditions.iter().map(|c| format!("{c}=?")).collect();
    format!(" IF {}", predicates.join(" AND "))
}

fn reject_counters<E>(properties: &[&PropertyMeta<E>]) -> Result<(), StatementError> {
    match properties.iter().find(|p| p.is_counter()) {
        Some(p) => Err(StatementError::CounterColumn {
            property: p.name().to_string(),
        }),
        None => Ok(()),
    }
}

// a clustered counter column lives in the entity row and may be selected
fn reject_counters_unless_clustered<E>(
    meta: &EntityMeta<E>,
    properties: &[&PropertyMeta<E>],
) -> Result<(), StatementError> {
    if meta.is_clustered_counter() {
        Ok(())
    } else {
        reject_counters(properties)
    }
}

fn empty<E>(kind: StatementKind, meta: &EntityMeta<E>) -> StatementError {
    StatementError::EmptyColumns {
        kind,
        table: meta.qualified_table(),
    }
}
