//! Parameter ordering.
//!
//! Every statement shape has one fixed order:
//!
//! insert   → [columns.., key.., ttl]
//! update   → [ttl, values.., key.., cas..]
//! select   → [key..]
//! delete   → [key.., cas..]
//! counter  → [delta, fqcn, primary key, property name]
//! clustered counter → [delta, key..]

use crate::{
    consistency::ResolvedConsistency,
    model::KeyValues,
    statement::{BoundStatement, PreparedStatement, StatementError},
    value::Value,
};

///
/// Bindings
///
/// Ordered value accumulator; the final count is checked against the
/// template when bound.
///

#[derive(Debug, Default)]
pub struct Bindings {
    values: Vec<Value>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL in seconds, bound as a CQL `int`.
    pub fn ttl(mut self, ttl: u32) -> Result<Self, StatementError> {
        let ttl = i32::try_from(ttl).map_err(|_| StatementError::TtlOutOfRange { ttl })?;
        self.values.push(Value::Int(ttl));

        Ok(self)
    }

    #[must_use]
    pub fn value(mut self, value: Value) -> Self {
        self.values.push(value);
        self
    }

    #[must_use]
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.values.extend(values);
        self
    }

    #[must_use]
    pub fn key(mut self, key: &KeyValues) -> Self {
        self.values.extend(key.iter().cloned());
        self
    }

    pub fn bind(
        self,
        prepared: PreparedStatement,
        consistency: ResolvedConsistency,
    ) -> Result<BoundStatement, StatementError> {
        BoundStatement::new(prepared, self.values, consistency)
    }
}

pub fn bind_insert(
    prepared: PreparedStatement,
    columns: Vec<Value>,
    key: &KeyValues,
    ttl: u32,
    consistency: ResolvedConsistency,
) -> Result<BoundStatement, StatementError> {
    Bindings::new()
        .values(columns)
        .key(key)
        .ttl(ttl)?
        .bind(prepared, consistency)
}

pub fn bind_update(
    prepared: PreparedStatement,
    ttl: u32,
    values: Vec<Value>,
    key: &KeyValues,
    cas: Vec<Value>,
    consistency: ResolvedConsistency,
) -> Result<BoundStatement, StatementError> {
    Bindings::new()
        .ttl(ttl)?
        .values(values)
        .key(key)
        .values(cas)
        .bind(prepared, consistency)
}

pub fn bind_select(
    prepared: PreparedStatement,
    key: &KeyValues,
    consistency: ResolvedConsistency,
) -> Result<BoundStatement, StatementError> {
    Bindings::new().key(key).bind(prepared, consistency)
}

pub fn bind_delete(
    prepared: PreparedStatement,
    key: &KeyValues,
    cas: Vec<Value>,
    consistency: ResolvedConsistency,
) -> Result<BoundStatement, StatementError> {
    Bindings::new()
        .key(key)
        .values(cas)
        .bind(prepared, consistency)
}

///
/// CounterCell
///
/// Coordinates of one simple counter in the shared counter table.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CounterCell {
    pub fqcn: String,
    pub primary_key: String,
    pub property: String,
}

impl CounterCell {
    fn values(self) -> [Value; 3] {
        [
            Value::Text(self.fqcn),
            Value::Text(self.primary_key),
            Value::Text(self.property),
        ]
    }
}

/// Counter-table statement; `delta` is absent for select and delete.
pub fn bind_counter(
    prepared: PreparedStatement,
    delta: Option<i64>,
    cell: CounterCell,
    consistency: ResolvedConsistency,
) -> Result<BoundStatement, StatementError> {
    Bindings::new()
        .values(delta.map(Value::BigInt))
        .values(cell.values())
        .bind(prepared, consistency)
}

pub fn bind_clustered_counter(
    prepared: PreparedStatement,
    delta: i64,
    key: &KeyValues,
    consistency: ResolvedConsistency,
) -> Result<BoundStatement, StatementError> {
    Bindings::new()
        .value(Value::BigInt(delta))
        .key(key)
        .bind(prepared, consistency)
}
