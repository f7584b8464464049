use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// ColumnType
///
/// CQL column type of a mapped property or key component.
/// `Display` renders the CQL spelling used in DDL.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum ColumnType {
    BigInt,
    Blob,
    Boolean,
    Counter,
    Double,
    Int,
    List(Box<Self>),
    Map(Box<Self>, Box<Self>),
    Set(Box<Self>),
    Text,
    Timestamp,
    Timeuuid,
    Uuid,
}

impl ColumnType {
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    #[must_use]
    pub fn set(element: Self) -> Self {
        Self::Set(Box::new(element))
    }

    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(..))
    }

    #[must_use]
    pub const fn is_counter(&self) -> bool {
        matches!(self, Self::Counter)
    }

    /// Scalar types may be key components, collection elements or map keys.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !self.is_collection() && !self.is_counter()
    }

    /// Whether `value` can be bound to a column of this type.
    /// Null is accepted everywhere; key positions reject it separately.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::BigInt | Self::Counter, Value::BigInt(_))
            | (Self::Blob, Value::Blob(_))
            | (Self::Boolean, Value::Boolean(_))
            | (Self::Double, Value::Double(_))
            | (Self::Int, Value::Int(_))
            | (Self::Text, Value::Text(_))
            | (Self::Timestamp, Value::Timestamp(_))
            | (Self::Timeuuid | Self::Uuid, Value::Uuid(_)) => true,
            (Self::List(element), Value::List(items)) | (Self::Set(element), Value::Set(items)) => {
                items.iter().all(|item| !item.is_null() && element.accepts(item))
            }
            (Self::Map(key, value), Value::Map(entries)) => entries
                .iter()
                .all(|(k, v)| !k.is_null() && key.accepts(k) && value.accepts(v)),
            _ => false,
        }
    }

    /// Compare against a type name reported by the live cluster.
    ///
    /// Whitespace and case are ignored and `varchar` is read as `text`.
    #[must_use]
    pub fn matches_cql(&self, live: &str) -> bool {
        normalize_type_name(&self.to_string()) == normalize_type_name(live)
    }
}

// Canonical comparison form for CQL type names.
fn normalize_type_name(name: &str) -> String {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    compact.replace("varchar", "text")
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BigInt => f.write_str("bigint"),
            Self::Blob => f.write_str("blob"),
            Self::Boolean => f.write_str("boolean"),
            Self::Counter => f.write_str("counter"),
            Self::Double => f.write_str("double"),
            Self::Int => f.write_str("int"),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Self::Set(element) => write!(f, "set<{element}>"),
            Self::Text => f.write_str("text"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Timeuuid => f.write_str("timeuuid"),
            Self::Uuid => f.write_str("uuid"),
        }
    }
}
