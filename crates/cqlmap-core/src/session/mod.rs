//! Transport seam.
//!
//! The engine never talks to the network itself; a `Session` implementation
//! prepares templates, executes bound statements and describes live schema.

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::live_identifier,
    schema::KeyspaceSchema,
    statement::{BoundStatement, PreparedStatement, StatementTemplate},
    value::Value,
};
use derive_more::{Deref, IntoIterator};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Column reported by conditional writes.
pub const APPLIED_COLUMN: &str = "[applied]";

///
/// TransportError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TransportError {
    #[error("execution of '{statement}' failed: {message}")]
    Execution { statement: String, message: String },

    #[error("session unavailable: {message}")]
    Unavailable { message: String },
}

impl From<TransportError> for InternalError {
    fn from(err: TransportError) -> Self {
        Self::new(ErrorClass::Transport, ErrorOrigin::Session, err.to_string())
    }
}

///
/// Session
///

pub trait Session {
    fn prepare(&self, template: &StatementTemplate) -> Result<PreparedStatement, TransportError>;

    fn execute(&self, statement: &BoundStatement) -> Result<RowSet, TransportError>;

    /// Run one DDL statement.
    fn execute_schema(&self, ddl: &str) -> Result<(), TransportError>;

    /// Live schema of `keyspace`, or `None` when it does not exist.
    fn describe_keyspace(&self, keyspace: &str) -> Result<Option<KeyspaceSchema>, TransportError>;
}

///
/// Row
///
/// One result row keyed by live column name.
///

#[derive(Clone, Debug, Default, Deref, PartialEq)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Value of `column`, matched the way the cluster folds identifiers.
    #[must_use]
    pub fn column(&self, column: &str) -> Option<&Value> {
        self.0.get(&live_identifier(column))
    }

    /// Owned value of `column`; absent columns read as null.
    #[must_use]
    pub fn value(&self, column: &str) -> Value {
        self.column(column).cloned().unwrap_or(Value::Null)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// RowSet
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct RowSet(Vec<Row>);

impl RowSet {
    #[must_use]
    pub const fn new(rows: Vec<Row>) -> Self {
        Self(rows)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_first(self) -> Option<Row> {
        self.0.into_iter().next()
    }

    /// Whether a conditional write was applied. Result sets without the
    /// `[applied]` column count as applied.
    #[must_use]
    pub fn applied(&self) -> bool {
        !matches!(
            self.0.first().and_then(|row| row.0.get(APPLIED_COLUMN)),
            Some(Value::Boolean(false))
        )
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self(rows)
    }
}
