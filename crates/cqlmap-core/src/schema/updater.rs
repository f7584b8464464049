//! Additive schema updates. Columns and indexes are only ever added; types,
//! keys and clustering order are never altered.

use crate::{
    model::TableDefinition,
    schema::{SchemaMismatch, creator::create_index},
};

/// DDL resolving the additive mismatches of `definition`; other mismatches
/// are ignored.
#[must_use]
pub fn plan(definition: &TableDefinition, mismatches: &[SchemaMismatch]) -> Vec<String> {
    let table = definition.qualified_name();
    let mut ddl = Vec::new();

    for mismatch in mismatches {
        match mismatch {
            SchemaMismatch::MissingColumn { column } => {
                if let Some(declared) = definition.column(column) {
                    let suffix = if declared.is_static { " static" } else { "" };
                    ddl.push(format!(
                        "ALTER TABLE {table} ADD {} {}{suffix};",
                        declared.column, declared.cql_type
                    ));
                    ddl.extend(create_index(definition, declared));
                }
            }
            SchemaMismatch::MissingIndex { column } => {
                if let Some(declared) = definition.column(column) {
                    ddl.extend(create_index(definition, declared));
                }
            }
            _ => {}
        }
    }

    ddl
}
