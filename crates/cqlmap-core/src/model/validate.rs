use crate::{
    error::{ErrorOrigin, InternalError},
    model::KeyColumn,
    value::Value,
};
use thiserror::Error as ThisError;

///
/// KeyValidationError
///
/// Per-call key argument failures.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum KeyValidationError {
    #[error("entity '{entity}' expects {expected} key values, found {found}")]
    ArityMismatch {
        entity: String,
        expected: usize,
        found: usize,
    },

    #[error("entity '{entity}': clustering value for '{column}' follows a null clustering value")]
    ClusteringHole { entity: String, column: String },

    #[error("entity '{entity}': key column '{column}' expects {expected}, found {found}")]
    ComponentTypeMismatch {
        entity: String,
        column: String,
        expected: String,
        found: &'static str,
    },

    #[error("entity '{entity}': key column '{column}' must not be null")]
    NullKeyComponent { entity: String, column: String },
}

impl From<KeyValidationError> for InternalError {
    fn from(err: KeyValidationError) -> Self {
        Self::argument_invalid(ErrorOrigin::Metadata, err.to_string())
    }
}

/// A complete primary key: one non-null value of the right type per column.
pub(crate) fn validate_full_key(
    entity: &str,
    columns: &[KeyColumn],
    values: &[Value],
) -> Result<(), KeyValidationError> {
    if columns.len() != values.len() {
        return Err(KeyValidationError::ArityMismatch {
            entity: entity.to_string(),
            expected: columns.len(),
            found: values.len(),
        });
    }

    for (column, value) in columns.iter().zip(values) {
        if value.is_null() {
            return Err(KeyValidationError::NullKeyComponent {
                entity: entity.to_string(),
                column: column.column.clone(),
            });
        }
        check_type(entity, column, value)?;
    }

    Ok(())
}

/// A clustering prefix: at most one value per clustering column, and once a
/// null appears every later value must be null too.
pub(crate) fn validate_clustering_prefix(
    entity: &str,
    columns: &[KeyColumn],
    values: &[Value],
) -> Result<(), KeyValidationError> {
    if values.len() > columns.len() {
        return Err(KeyValidationError::ArityMismatch {
            entity: entity.to_string(),
            expected: columns.len(),
            found: values.len(),
        });
    }

    let mut seen_null = false;
    for (column, value) in columns.iter().zip(values) {
        if value.is_null() {
            seen_null = true;
            continue;
        }
        if seen_null {
            return Err(KeyValidationError::ClusteringHole {
                entity: entity.to_string(),
                column: column.column.clone(),
            });
        }
        check_type(entity, column, value)?;
    }

    Ok(())
}

fn check_type(entity: &str, column: &KeyColumn, value: &Value) -> Result<(), KeyValidationError> {
    if column.column_type.accepts(value) {
        Ok(())
    } else {
        Err(KeyValidationError::ComponentTypeMismatch {
            entity: entity.to_string(),
            column: column.column.clone(),
            expected: column.column_type.to_string(),
            found: value.label(),
        })
    }
}
