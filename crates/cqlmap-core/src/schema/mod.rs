//! Schema reconciliation.
//!
//! The reader fetches live table views, the validator diffs them against the
//! declared `TableDefinition`s, and the creator/updater render the DDL that
//! closes additive gaps. `SchemaReconciler` runs the whole pass.

pub mod creator;
pub mod reader;
pub mod updater;
pub mod validator;

mod view;

#[cfg(test)]
mod tests;

use crate::{
    config::{PersistenceConfig, SchemaConfig},
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::TableDefinition,
    session::Session,
    statement::counter::counter_table_definition,
};
use thiserror::Error as ThisError;
use tracing::{debug, info};

// re-exports
pub use validator::SchemaMismatch;
pub use view::{ClusteringColumn, KeyspaceSchema, TableMetadataView};

///
/// SchemaError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum SchemaError {
    #[error("table '{table}' does not match its declaration: {}", render(.mismatches))]
    Drift {
        table: String,
        mismatches: Vec<SchemaMismatch>,
    },

    #[error("keyspace '{keyspace}' does not exist")]
    MissingKeyspace { keyspace: String },

    #[error("table '{table}' does not exist and table creation is disabled")]
    MissingTable { table: String },

    #[error("no keyspace declared or configured for table '{table}'")]
    NoKeyspace { table: String },

    #[error("table '{table}' already exists")]
    TableExists { table: String },
}

fn render(mismatches: &[SchemaMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NoKeyspace { .. } => {
                Self::metadata_invalid(ErrorOrigin::Schema, err.to_string())
            }
            SchemaError::TableExists { .. } => Self::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Schema,
                err.to_string(),
            ),
            _ => Self::schema_mismatch(err.to_string()),
        }
    }
}

///
/// ReconcileReport
///
/// Outcome per qualified table name plus every DDL statement executed.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub altered: Vec<String>,
    pub validated: Vec<String>,
    pub statements: Vec<String>,
}

///
/// SchemaReconciler
///

#[derive(Clone, Debug, Default)]
pub struct SchemaReconciler {
    config: SchemaConfig,
    default_keyspace: Option<String>,
}

impl SchemaReconciler {
    #[must_use]
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            config: config.schema,
            default_keyspace: config.keyspace.clone(),
        }
    }

    /// Bring the live schema in line with `definitions`, plus the shared
    /// counter table when any of them keeps counters there.
    ///
    /// Missing tables are created only with `force_table_creation`; missing
    /// columns and indexes are added only with `enable_schema_update`. Any
    /// other drift fails.
    pub fn reconcile<S: Session + ?Sized>(
        &self,
        session: &S,
        definitions: &[&TableDefinition],
    ) -> Result<ReconcileReport, InternalError> {
        let counter_table = counter_table_definition(None);
        let mut declared: Vec<&TableDefinition> = definitions.to_vec();
        if definitions.iter().any(|definition| definition.uses_counter_table) {
            declared.push(&counter_table);
        }

        let live = reader::read_tables(session, self.default_keyspace.as_deref(), &declared)?;
        let mut report = ReconcileReport::default();

        for definition in declared {
            let table = definition.qualified_name();

            let Some(view) = live.get(&table) else {
                if !self.config.force_table_creation {
                    return Err(SchemaError::MissingTable { table }.into());
                }
                info!(table = %table, "creating table");
                Self::execute(session, creator::create(definition, None)?, &mut report)?;
                report.created.push(table);
                continue;
            };

            let (additive, fatal): (Vec<_>, Vec<_>) = validator::diff(definition, view)
                .into_iter()
                .partition(SchemaMismatch::is_additive);
            if !fatal.is_empty() {
                return Err(SchemaError::Drift {
                    table,
                    mismatches: fatal,
                }
                .into());
            }

            if additive.is_empty() {
                debug!(table = %table, "schema matches");
                report.validated.push(table);
            } else if self.config.enable_schema_update {
                info!(table = %table, changes = additive.len(), "updating table");
                Self::execute(session, updater::plan(definition, &additive), &mut report)?;
                report.altered.push(table);
            } else {
                return Err(SchemaError::Drift {
                    table,
                    mismatches: additive,
                }
                .into());
            }
        }

        Ok(report)
    }

    fn execute<S: Session + ?Sized>(
        session: &S,
        ddl: Vec<String>,
        report: &mut ReconcileReport,
    ) -> Result<(), InternalError> {
        for statement in ddl {
            info!(ddl = %statement, "executing schema statement");
            session.execute_schema(&statement)?;
            report.statements.push(statement);
        }

        Ok(())
    }
}
