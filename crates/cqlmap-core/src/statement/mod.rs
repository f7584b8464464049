//! Statement generation and binding.
//!
//! `generator` and `counter` render parameterized templates from metadata;
//! `binder` orders the bound values; `cache` keeps prepared handles per
//! template text.

pub mod binder;
pub mod cache;
pub mod counter;
pub mod generator;

mod bound;

#[cfg(test)]
mod tests;

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

// re-exports
pub use bound::{BoundStatement, PreparedStatement};
pub use cache::{CacheStats, StatementCache};

///
/// StatementError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum StatementError {
    #[error("counter property '{property}' is written through the counter operations")]
    CounterColumn { property: String },

    #[error("{kind} statement for '{table}' names no columns")]
    EmptyColumns {
        kind: StatementKind,
        table: String,
    },

    #[error("statement '{statement}' expects {expected} values, found {found}")]
    PlaceholderMismatch {
        statement: String,
        expected: usize,
        found: usize,
    },

    #[error("ttl {ttl} exceeds the supported range")]
    TtlOutOfRange { ttl: u32 },
}

impl From<StatementError> for InternalError {
    fn from(err: StatementError) -> Self {
        match err {
            StatementError::CounterColumn { .. } => {
                Self::unsupported(ErrorOrigin::Statement, err.to_string())
            }
            StatementError::EmptyColumns { .. } | StatementError::TtlOutOfRange { .. } => {
                Self::argument_invalid(ErrorOrigin::Statement, err.to_string())
            }
            StatementError::PlaceholderMismatch { .. } => {
                Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Binder, err.to_string())
            }
        }
    }
}

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum StatementKind {
    Counter,
    Delete,
    Insert,
    Select,
    Update,
}

impl StatementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Delete => "delete",
            Self::Insert => "insert",
            Self::Select => "select",
            Self::Update => "update",
        }
    }

    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Select)
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// StatementTemplate
///
/// Parameterized statement text plus its placeholder count.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StatementTemplate {
    kind: StatementKind,
    table: String,
    text: String,
    placeholders: usize,
}

impl StatementTemplate {
    #[must_use]
    pub fn new(kind: StatementKind, table: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let placeholders = text.matches('?').count();

        Self {
            kind,
            table: table.into(),
            text,
            placeholders,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Table reference the statement targets.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn placeholders(&self) -> usize {
        self.placeholders
    }
}

impl Display for StatementTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
