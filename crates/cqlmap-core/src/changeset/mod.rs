//! Changeset translation.
//!
//! A `ChangeSet` describes one incremental mutation of a collection, map or
//! counter field since the last flush. `translate` turns it into the minimal
//! native assignment(s) plus their bound values, in placeholder order.


use crate::{
    error::{ErrorOrigin, InternalError},
    model::{PropertyKind, PropertyMeta, PropertyType},
    value::{ColumnType, Value},
};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

///
/// ChangesetError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ChangesetError {
    #[error("counter delta on '{property}' does not fit a bigint magnitude")]
    CounterOutOfRange { property: String },

    #[error("change '{change}' does not apply to {kind} property '{property}'")]
    IncompatibleChange {
        property: String,
        change: &'static str,
        kind: &'static str,
    },

    #[error("indexed list mutation on '{property}' is not supported; assign the whole list")]
    IndexedListMutation { property: String },

    #[error("change on '{property}' expects {expected}, found {found}")]
    ValueTypeMismatch {
        property: String,
        expected: String,
        found: &'static str,
    },
}

impl From<ChangesetError> for InternalError {
    fn from(err: ChangesetError) -> Self {
        match err {
            ChangesetError::CounterOutOfRange { .. }
            | ChangesetError::ValueTypeMismatch { .. } => {
                Self::argument_invalid(ErrorOrigin::Changeset, err.to_string())
            }
            _ => Self::unsupported(ErrorOrigin::Changeset, err.to_string()),
        }
    }
}

///
/// Change
///
/// Incremental mutation kinds produced by the dirty-checking layer.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    AssignValue(Value),
    AppendToList(Vec<Value>),
    PrependToList(Vec<Value>),
    AddToSet(Vec<Value>),
    RemoveFromCollection(Vec<Value>),
    SetListElementAtIndex { index: usize, value: Value },
    RemoveListElementAtIndex { index: usize },
    AddToMap(Vec<(Value, Value)>),
    RemoveFromMap(Vec<Value>),
    RemoveValue,
    Increment(i64),
    Decrement(i64),
}

impl Change {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AssignValue(_) => "assign",
            Self::AppendToList(_) => "append",
            Self::PrependToList(_) => "prepend",
            Self::AddToSet(_) => "add elements",
            Self::RemoveFromCollection(_) => "remove elements",
            Self::SetListElementAtIndex { .. } => "set at index",
            Self::RemoveListElementAtIndex { .. } => "remove at index",
            Self::AddToMap(_) => "add entries",
            Self::RemoveFromMap(_) => "remove entries",
            Self::RemoveValue => "remove value",
            Self::Increment(_) => "increment",
            Self::Decrement(_) => "decrement",
        }
    }

    /// Signed counter delta of a counter change on `property`. The delta's
    /// magnitude must itself fit a bigint.
    pub fn counter_delta(&self, property: &str) -> Result<i64, ChangesetError> {
        let delta = match *self {
            Self::Increment(delta) => Some(delta),
            Self::Decrement(delta) => delta.checked_neg(),
            _ => {
                return Err(ChangesetError::IncompatibleChange {
                    property: property.to_string(),
                    change: self.label(),
                    kind: PropertyType::Counter.as_str(),
                });
            }
        };

        delta
            .filter(|delta| delta.checked_abs().is_some())
            .ok_or_else(|| ChangesetError::CounterOutOfRange {
                property: property.to_string(),
            })
    }
}

///
/// ChangeSet
///
/// One change against one property, consumed exactly once.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ChangeSet {
    property: String,
    change: Change,
}

impl ChangeSet {
    #[must_use]
    pub fn new(property: impl Into<String>, change: Change) -> Self {
        Self {
            property: property.into(),
            change,
        }
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    #[must_use]
    pub const fn change(&self) -> &Change {
        &self.change
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Change) {
        (self.property, self.change)
    }
}

///
/// Assignment
///
/// Shape of one SET clause fragment.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Assignment {
    /// `col=?`
    Assign,
    /// `col=col+?`
    Append,
    /// `col=?+col`
    Prepend,
    /// `col=col-?`
    Subtract,
    /// `col[?]=?`
    PutEntry,
    /// `col=null`
    Tombstone,
}

impl Assignment {
    /// Number of placeholders this fragment binds.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Tombstone => 0,
            Self::PutEntry => 2,
            _ => 1,
        }
    }
}

///
/// NativeAssignment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NativeAssignment {
    pub column: String,
    pub assignment: Assignment,
}

impl NativeAssignment {
    #[must_use]
    pub fn new(column: impl Into<String>, assignment: Assignment) -> Self {
        Self {
            column: column.into(),
            assignment,
        }
    }
}

impl Display for NativeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let col = &self.column;

        match self.assignment {
            Assignment::Assign => write!(f, "{col}=?"),
            Assignment::Append => write!(f, "{col}={col}+?"),
            Assignment::Prepend => write!(f, "{col}=?+{col}"),
            Assignment::Subtract => write!(f, "{col}={col}-?"),
            Assignment::PutEntry => write!(f, "{col}[?]=?"),
            Assignment::Tombstone => write!(f, "{col}=null"),
        }
    }
}

///
/// NativeOperation
///
/// Translated change: SET fragments plus their values in placeholder order.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeOperation {
    pub assignments: Vec<NativeAssignment>,
    pub values: Vec<Value>,
}

impl NativeOperation {
    fn single(column: &str, assignment: Assignment, values: Vec<Value>) -> Self {
        Self {
            assignments: vec![NativeAssignment::new(column, assignment)],
            values,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Append another operation, keeping fragment and value order aligned.
    pub fn extend(&mut self, other: Self) {
        self.assignments.extend(other.assignments);
        self.values.extend(other.values);
    }
}

/// Translate one change against `property`.
pub fn translate<E>(
    property: &PropertyMeta<E>,
    change: Change,
) -> Result<NativeOperation, ChangesetError> {
    let column = property.column();
    let incompatible = |change: &Change| ChangesetError::IncompatibleChange {
        property: property.name().to_string(),
        change: change.label(),
        kind: property.property_type().as_str(),
    };

    let operation = match (property.kind(), change) {
        (PropertyKind::Id | PropertyKind::EmbeddedId(_), change) => {
            return Err(incompatible(&change));
        }

        (PropertyKind::Counter, change) => {
            // sign lives in the assignment, the bound value is the magnitude
            let delta = change.counter_delta(property.name())?;
            let assignment = if delta < 0 {
                Assignment::Subtract
            } else {
                Assignment::Append
            };
            NativeOperation::single(column, assignment, vec![Value::BigInt(delta.abs())])
        }

        (_, Change::RemoveValue) => {
            NativeOperation::single(column, Assignment::Tombstone, Vec::new())
        }
        (_, Change::AssignValue(value)) => {
            check_value(property, &value)?;
            NativeOperation::single(column, Assignment::Assign, vec![value])
        }

        (PropertyKind::List, Change::AppendToList(items)) => {
            let value = checked(property, Value::List(items))?;
            NativeOperation::single(column, Assignment::Append, vec![value])
        }
        (PropertyKind::List, Change::PrependToList(items)) => {
            let value = checked(property, Value::List(items))?;
            NativeOperation::single(column, Assignment::Prepend, vec![value])
        }
        (PropertyKind::List, Change::RemoveFromCollection(items)) => {
            let value = checked(property, Value::List(items))?;
            NativeOperation::single(column, Assignment::Subtract, vec![value])
        }
        (
            PropertyKind::List,
            Change::SetListElementAtIndex { .. } | Change::RemoveListElementAtIndex { .. },
        ) => {
            return Err(ChangesetError::IndexedListMutation {
                property: property.name().to_string(),
            });
        }

        (PropertyKind::Set, Change::AddToSet(items)) => {
            let value = checked(property, Value::Set(items))?;
            NativeOperation::single(column, Assignment::Append, vec![value])
        }
        (PropertyKind::Set, Change::RemoveFromCollection(items)) => {
            let value = checked(property, Value::Set(items))?;
            NativeOperation::single(column, Assignment::Subtract, vec![value])
        }

        (PropertyKind::Map { key }, Change::AddToMap(entries)) => {
            let mut operation = NativeOperation::default();
            for (k, v) in entries {
                check_key(property, key, &k)?;
                if !property.value_type().accepts(&v) {
                    return Err(mismatch(property, property.value_type(), &v));
                }
                operation.extend(NativeOperation::single(
                    column,
                    Assignment::PutEntry,
                    vec![k, v],
                ));
            }
            operation
        }
        (PropertyKind::Map { key }, Change::RemoveFromMap(keys)) => {
            for k in &keys {
                check_key(property, key, k)?;
            }
            NativeOperation::single(column, Assignment::Subtract, vec![Value::Set(keys)])
        }

        (_, change) => return Err(incompatible(&change)),
    };

    Ok(operation)
}

fn checked<E>(property: &PropertyMeta<E>, value: Value) -> Result<Value, ChangesetError> {
    check_value(property, &value)?;
    Ok(value)
}

fn check_value<E>(property: &PropertyMeta<E>, value: &Value) -> Result<(), ChangesetError> {
    match property.cql_type() {
        Some(ty) if !ty.accepts(value) => Err(mismatch(property, &ty, value)),
        _ => Ok(()),
    }
}

// map keys are never null
fn check_key<E>(
    property: &PropertyMeta<E>,
    ty: &ColumnType,
    value: &Value,
) -> Result<(), ChangesetError> {
    if !value.is_null() && ty.accepts(value) {
        Ok(())
    } else {
        Err(mismatch(property, ty, value))
    }
}

fn mismatch<E>(property: &PropertyMeta<E>, ty: &ColumnType, value: &Value) -> ChangesetError {
    ChangesetError::ValueTypeMismatch {
        property: property.name().to_string(),
        expected: ty.to_string(),
        found: value.label(),
    }
}
