use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured engine error with a stable classification.
/// Module-level error enums convert into this type at their boundary.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a metadata build failure.
    pub(crate) fn metadata_invalid(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidMetadata, origin, message)
    }

    /// Construct a per-call argument failure.
    pub(crate) fn argument_invalid(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidArgument, origin, message)
    }

    /// Construct an unsupported-operation failure.
    pub(crate) fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, origin, message)
    }

    /// Construct a context-origin invariant violation.
    pub(crate) fn context_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Context,
            message,
        )
    }

    /// Construct a schema drift failure.
    pub(crate) fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::SchemaMismatch, ErrorOrigin::Schema, message)
    }

    /// Construct a rejected conditional write.
    pub(crate) fn conditional_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, ErrorOrigin::Context, message)
    }

    #[must_use]
    pub const fn is_schema_mismatch(&self) -> bool {
        matches!(self.class, ErrorClass::SchemaMismatch)
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.class, ErrorClass::Unsupported)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Declared metadata is malformed; raised at build time only.
    InvalidMetadata,
    /// Per-call arguments (keys, values, options) are malformed.
    InvalidArgument,
    /// Declared and live schema disagree.
    SchemaMismatch,
    /// The operation cannot be expressed at this layer.
    Unsupported,
    /// A state machine or internal invariant was violated.
    InvariantViolation,
    /// A conditional write was not applied.
    Conflict,
    /// The external session failed.
    Transport,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidMetadata => "invalid_metadata",
            Self::InvalidArgument => "invalid_argument",
            Self::SchemaMismatch => "schema_mismatch",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
            Self::Conflict => "conflict",
            Self::Transport => "transport",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Binder,
    Changeset,
    Config,
    Consistency,
    Context,
    Metadata,
    Schema,
    Session,
    Statement,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Binder => "binder",
            Self::Changeset => "changeset",
            Self::Config => "config",
            Self::Consistency => "consistency",
            Self::Context => "context",
            Self::Metadata => "metadata",
            Self::Schema => "schema",
            Self::Session => "session",
            Self::Statement => "statement",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_class_prefixes_origin_and_class() {
        let err = InternalError::unsupported(ErrorOrigin::Binder, "index mutation");

        assert_eq!(err.display_with_class(), "binder:unsupported: index mutation");
        assert!(err.is_unsupported());
        assert!(!err.is_schema_mismatch());
    }
}
