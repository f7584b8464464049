//! Declared-versus-live comparison. Pure: nothing here touches the session
//! or mutates its inputs.

use crate::{
    model::{ClusteringOrder, KeyColumn, TableDefinition, live_identifier},
    schema::{SchemaError, TableMetadataView},
    statement::counter::counter_table_definition,
    value::ColumnType,
};
use std::fmt::{self, Display};

///
/// SchemaMismatch
///

#[derive(Clone, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum SchemaMismatch {
    ClusteringKeyMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    ClusteringOrderMismatch {
        column: String,
        expected: ClusteringOrder,
        found: ClusteringOrder,
    },
    ColumnTypeMismatch {
        column: String,
        expected: String,
        found: String,
    },
    MissingColumn {
        column: String,
    },
    MissingIndex {
        column: String,
    },
    PartitionKeyMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl SchemaMismatch {
    /// Whether an additive ALTER or CREATE INDEX can resolve the mismatch.
    #[must_use]
    pub const fn is_additive(&self) -> bool {
        matches!(self, Self::MissingColumn { .. } | Self::MissingIndex { .. })
    }
}

impl Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClusteringKeyMismatch { expected, found } => write!(
                f,
                "clustering key [{}] declared, found [{}]",
                expected.join(", "),
                found.join(", ")
            ),
            Self::ClusteringOrderMismatch {
                column,
                expected,
                found,
            } => write!(f, "clustering column '{column}' is {found}, declared {expected}"),
            Self::ColumnTypeMismatch {
                column,
                expected,
                found,
            } => write!(f, "column '{column}' is {found}, declared {expected}"),
            Self::MissingColumn { column } => write!(f, "column '{column}' is missing"),
            Self::MissingIndex { column } => write!(f, "index on '{column}' is missing"),
            Self::PartitionKeyMismatch { expected, found } => write!(
                f,
                "partition key [{}] declared, found [{}]",
                expected.join(", "),
                found.join(", ")
            ),
        }
    }
}

/// Every difference between `definition` and `live`, keys first.
#[must_use]
pub fn diff(definition: &TableDefinition, live: &TableMetadataView) -> Vec<SchemaMismatch> {
    let mut mismatches = Vec::new();

    let expected = live_names(&definition.partition_keys);
    if expected != live.partition_keys {
        mismatches.push(SchemaMismatch::PartitionKeyMismatch {
            expected,
            found: live.partition_keys.clone(),
        });
    }

    let expected = live_names(&definition.clustering_keys);
    let found: Vec<String> = live.clustering_keys.iter().map(|c| c.name.clone()).collect();
    if expected == found {
        for (declared, actual) in definition.clustering_keys.iter().zip(&live.clustering_keys) {
            if declared.order != actual.order {
                mismatches.push(SchemaMismatch::ClusteringOrderMismatch {
                    column: actual.name.clone(),
                    expected: declared.order,
                    found: actual.order,
                });
            }
        }
    } else {
        mismatches.push(SchemaMismatch::ClusteringKeyMismatch { expected, found });
    }

    // a missing key column already shows up as a key mismatch
    for key in definition.key_columns() {
        if let Some(mismatch @ SchemaMismatch::ColumnTypeMismatch { .. }) =
            compare_column(live, &key.column, &key.column_type)
        {
            mismatches.push(mismatch);
        }
    }
    for column in &definition.columns {
        if let Some(mismatch) = compare_column(live, &column.column, &column.cql_type) {
            mismatches.push(mismatch);
        }
    }

    for column in &definition.columns {
        if column.index.is_some()
            && live.column_type(&column.column).is_some()
            && !live.is_indexed(&column.column)
        {
            mismatches.push(SchemaMismatch::MissingIndex {
                column: live_identifier(&column.column),
            });
        }
    }

    mismatches
}

/// Fail on any difference between `definition` and `live`.
pub fn validate(definition: &TableDefinition, live: &TableMetadataView) -> Result<(), SchemaError> {
    let mismatches = diff(definition, live);
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Drift {
            table: definition.qualified_name(),
            mismatches,
        })
    }
}

/// Check the shared counter table: column names, types and key roles.
pub fn validate_counter_table(live: &TableMetadataView) -> Result<(), SchemaError> {
    validate(&counter_table_definition(None), live)
}

fn compare_column(
    live: &TableMetadataView,
    column: &str,
    declared: &ColumnType,
) -> Option<SchemaMismatch> {
    match live.column_type(column) {
        None => Some(SchemaMismatch::MissingColumn {
            column: live_identifier(column),
        }),
        Some(found) if !declared.matches_cql(found) => Some(SchemaMismatch::ColumnTypeMismatch {
            column: live_identifier(column),
            expected: declared.to_string(),
            found: found.to_string(),
        }),
        Some(_) => None,
    }
}

fn live_names(keys: &[KeyColumn]) -> Vec<String> {
    keys.iter().map(|key| live_identifier(&key.column)).collect()
}
