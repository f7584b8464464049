use cqlmap_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Whether retrying the same call unchanged could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport | ErrorKind::Conflict)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ErrorKind {
    /// Keys, values or options passed to one call are malformed.
    Argument,

    /// A conditional write was not applied.
    Conflict,

    /// The caller cannot remediate this.
    Internal,

    /// Entity declarations are malformed.
    Metadata,

    /// Live and declared schema disagree.
    Schema,

    /// The session failed to execute a statement.
    Transport,

    /// The operation cannot be expressed for this property or entity.
    Unsupported,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::InvalidMetadata => Self::Metadata,
            ErrorClass::InvalidArgument => Self::Argument,
            ErrorClass::SchemaMismatch => Self::Schema,
            ErrorClass::Unsupported => Self::Unsupported,
            ErrorClass::InvariantViolation => Self::Internal,
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::Transport => Self::Transport,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
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

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Binder => Self::Binder,
            CoreErrorOrigin::Changeset => Self::Changeset,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Consistency => Self::Consistency,
            CoreErrorOrigin::Context => Self::Context,
            CoreErrorOrigin::Metadata => Self::Metadata,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Session => Self::Session,
            CoreErrorOrigin::Statement => Self::Statement,
        }
    }
}
