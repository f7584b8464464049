use crate::{
    consistency::{ConsistencyLevel, ResolvedConsistency},
    statement::{StatementError, StatementKind, StatementTemplate},
    value::Value,
};
use std::sync::Arc;

///
/// PreparedStatement
///
/// Session-issued handle for a template. Cheap to clone.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreparedStatement {
    id: u64,
    template: Arc<StatementTemplate>,
}

impl PreparedStatement {
    #[must_use]
    pub fn new(id: u64, template: StatementTemplate) -> Self {
        Self {
            id,
            template: Arc::new(template),
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn template(&self) -> &StatementTemplate {
        &self.template
    }
}

///
/// BoundStatement
///
/// A prepared statement with its ordered values and the consistency levels
/// captured at bind time. `values` and `encoded` always hold exactly one
/// entry per placeholder.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BoundStatement {
    prepared: PreparedStatement,
    values: Vec<Value>,
    encoded: Vec<String>,
    consistency: ConsistencyLevel,
    serial_consistency: Option<ConsistencyLevel>,
}

impl BoundStatement {
    pub fn new(
        prepared: PreparedStatement,
        values: Vec<Value>,
        consistency: ResolvedConsistency,
    ) -> Result<Self, StatementError> {
        let expected = prepared.template().placeholders();
        if values.len() != expected {
            return Err(StatementError::PlaceholderMismatch {
                statement: prepared.template().text().to_string(),
                expected,
                found: values.len(),
            });
        }
        let encoded = values.iter().map(Value::to_cql_literal).collect();

        Ok(Self {
            prepared,
            values,
            encoded,
            consistency: consistency.level,
            serial_consistency: consistency.serial,
        })
    }

    #[must_use]
    pub const fn prepared(&self) -> &PreparedStatement {
        &self.prepared
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.prepared.template().text()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.prepared.template().table()
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.prepared.template().kind()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// CQL literal rendering of each value, same indices as `values`.
    #[must_use]
    pub fn encoded(&self) -> &[String] {
        &self.encoded
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    #[must_use]
    pub const fn serial_consistency(&self) -> Option<ConsistencyLevel> {
        self.serial_consistency
    }
}
