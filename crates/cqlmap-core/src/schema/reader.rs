use crate::{
    error::InternalError,
    model::TableDefinition,
    schema::{KeyspaceSchema, SchemaError, TableMetadataView},
    session::Session,
};
use std::collections::{BTreeMap, btree_map::Entry};
use tracing::trace;

///
/// LiveTables
///
/// Live views of the declared tables that exist, keyed by qualified name.
///

pub type LiveTables = BTreeMap<String, TableMetadataView>;

/// Keyspace a definition lives in: its own, else the configured default.
pub fn resolve_keyspace<'a>(
    definition: &'a TableDefinition,
    default_keyspace: Option<&'a str>,
) -> Result<&'a str, SchemaError> {
    definition
        .keyspace
        .as_deref()
        .or(default_keyspace)
        .ok_or_else(|| SchemaError::NoKeyspace {
            table: definition.table.clone(),
        })
}

/// Fetch the live view of every declared table. A missing keyspace is an
/// error; a missing table simply has no entry.
pub fn read_tables<S: Session + ?Sized>(
    session: &S,
    default_keyspace: Option<&str>,
    definitions: &[&TableDefinition],
) -> Result<LiveTables, InternalError> {
    let mut keyspaces: BTreeMap<String, KeyspaceSchema> = BTreeMap::new();
    let mut live = LiveTables::new();

    for definition in definitions {
        let keyspace = resolve_keyspace(definition, default_keyspace)?;

        let schema = match keyspaces.entry(keyspace.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!(keyspace, "describing keyspace");
                let schema = session.describe_keyspace(keyspace)?.ok_or_else(|| {
                    SchemaError::MissingKeyspace {
                        keyspace: keyspace.to_string(),
                    }
                })?;
                entry.insert(schema)
            }
        };

        if let Some(table) = schema.table(&definition.table) {
            live.insert(definition.qualified_name(), table.clone());
        }
    }

    Ok(live)
}
