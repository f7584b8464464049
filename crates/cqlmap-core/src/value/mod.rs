mod column_type;


use crate::error::{ErrorOrigin, InternalError};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write as _,
};
use thiserror::Error as ThisError;

// re-exports
pub use column_type::ColumnType;

///
/// ValueError
///
/// Conversion failures between `Value` and Rust field types.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValueError {
    #[error("value type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<ValueError> for InternalError {
    fn from(err: ValueError) -> Self {
        Self::argument_invalid(ErrorOrigin::Binder, err.to_string())
    }
}

///
/// Value
///
/// Bound-parameter vocabulary exchanged with the session.
///
/// Null → absent column value (unset or tombstoned).
/// Set/Map keep the caller's element order; the store normalizes them.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    BigInt(i64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
    Uuid(u128),
    Timestamp(i64),
    List(Vec<Self>),
    Set(Vec<Self>),
    Map(Vec<(Self, Self)>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }

    /// Short type label used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    /// Render the value as a CQL literal.
    ///
    /// Used for the encoded side of bound statements (logging and diffing),
    /// never for execution.
    #[must_use]
    pub fn to_cql_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }

    fn write_literal(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Boolean(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Int(v) => {
                let _ = write!(out, "{v}");
            }
            Self::BigInt(v) | Self::Timestamp(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Double(v) => {
                let _ = write!(out, "{v}");
            }
            Self::Text(v) => {
                out.push('\'');
                out.push_str(&v.replace('\'', "''"));
                out.push('\'');
            }
            Self::Blob(bytes) => {
                out.push_str("0x");
                for byte in bytes {
                    let _ = write!(out, "{byte:02x}");
                }
            }
            Self::Uuid(v) => out.push_str(&format_uuid(*v)),
            Self::List(items) => write_items(out, '[', ']', items),
            Self::Set(items) => write_items(out, '{', '}', items),
            Self::Map(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_literal(out);
                    out.push_str(": ");
                    value.write_literal(out);
                }
                out.push('}');
            }
        }
    }

    /// Project the value into JSON for textual key encoding.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Boolean(v) => Json::Bool(*v),
            Self::Int(v) => Json::from(*v),
            Self::BigInt(v) | Self::Timestamp(v) => Json::from(*v),
            Self::Double(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::Text(v) => Json::String(v.clone()),
            Self::Blob(_) => Json::String(self.to_cql_literal()),
            Self::Uuid(v) => Json::String(format_uuid(*v)),
            Self::List(items) | Self::Set(items) => {
                Json::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(entries) => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
        }
    }

    /// Unwrap list-like payloads (list or set) into their elements.
    pub fn into_elements(self) -> Result<Vec<Self>, ValueError> {
        match self {
            Self::List(items) | Self::Set(items) => Ok(items),
            Self::Null => Ok(Vec::new()),
            other => Err(mismatch("list or set", &other)),
        }
    }
}

fn write_items(out: &mut String, open: char, close: char, items: &[Value]) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_literal(out);
    }
    out.push(close);
}

fn format_uuid(v: u128) -> String {
    let hex = format!("{v:032x}");

    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

const fn mismatch(expected: &'static str, found: &Value) -> ValueError {
    ValueError::TypeMismatch {
        expected,
        found: found.label(),
    }
}

///
/// FromValue
///
/// Decode a `Value` into a Rust field type; used by field setters.
///

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! impl_from_value_scalar {
    ($ty:ty, $label:literal, $ctor:ident $(| $alt:ident)*) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$ctor(v) $(| Value::$alt(v))* => Ok(v),
                    other => Err(mismatch($label, &other)),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$ctor(v)
            }
        }
    };
}

impl_from_value_scalar!(bool, "boolean", Boolean);
impl_from_value_scalar!(i32, "int", Int);
impl_from_value_scalar!(i64, "bigint", BigInt | Timestamp);
impl_from_value_scalar!(f64, "double", Double);
impl_from_value_scalar!(String, "text", Text);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.into_elements()?.into_iter().map(T::from_value).collect()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        value.into_elements()?.into_iter().map(T::from_value).collect()
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Self::Set(v.into_iter().map(Into::into).collect())
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Ok(Self::new()),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
