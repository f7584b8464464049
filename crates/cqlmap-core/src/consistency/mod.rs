//! Consistency levels and the layered resolution policy.
//!
//! Resolution order for one statement:
//! per-call override → property override (counter columns) → entity default
//! → global default. The resolved level is captured by the bound statement.


use crate::error::{ErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

///
/// ConsistencyError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConsistencyError {
    #[error("serial consistency must be SERIAL or LOCAL_SERIAL, found {level}")]
    SerialLevelExpected { level: ConsistencyLevel },

    #[error("{role} consistency cannot be the serial level {level}")]
    SerialLevelNotAllowed {
        role: &'static str,
        level: ConsistencyLevel,
    },
}

impl From<ConsistencyError> for InternalError {
    fn from(err: ConsistencyError) -> Self {
        Self::metadata_invalid(ErrorOrigin::Consistency, err.to_string())
    }
}

///
/// ConsistencyLevel
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    LocalQuorum,
    EachQuorum,
    All,
    LocalOne,
    Serial,
    LocalSerial,
}

impl ConsistencyLevel {
    #[must_use]
    pub const fn is_serial(self) -> bool {
        matches!(self, Self::Serial | Self::LocalSerial)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::All => "ALL",
            Self::LocalOne => "LOCAL_ONE",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
        }
    }
}

impl Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept `level` only if it is one of the two serial variants.
pub const fn validate_serial(
    level: ConsistencyLevel,
) -> Result<ConsistencyLevel, ConsistencyError> {
    if level.is_serial() {
        Ok(level)
    } else {
        Err(ConsistencyError::SerialLevelExpected { level })
    }
}

const fn validate_plain(
    role: &'static str,
    level: ConsistencyLevel,
) -> Result<ConsistencyLevel, ConsistencyError> {
    if level.is_serial() {
        Err(ConsistencyError::SerialLevelNotAllowed { role, level })
    } else {
        Ok(level)
    }
}

///
/// ConsistencyPair
///
/// Validated (read, write) pair; neither side may be a serial level.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ConsistencyPair {
    read: ConsistencyLevel,
    write: ConsistencyLevel,
}

impl ConsistencyPair {
    pub const fn new(
        read: ConsistencyLevel,
        write: ConsistencyLevel,
    ) -> Result<Self, ConsistencyError> {
        let read = match validate_plain("read", read) {
            Ok(level) => level,
            Err(err) => return Err(err),
        };
        let write = match validate_plain("write", write) {
            Ok(level) => level,
            Err(err) => return Err(err),
        };

        Ok(Self { read, write })
    }

    pub const fn uniform(level: ConsistencyLevel) -> Result<Self, ConsistencyError> {
        Self::new(level, level)
    }

    #[must_use]
    pub const fn read(&self) -> ConsistencyLevel {
        self.read
    }

    #[must_use]
    pub const fn write(&self) -> ConsistencyLevel {
        self.write
    }

    #[must_use]
    pub const fn get(&self, operation: Operation) -> ConsistencyLevel {
        match operation {
            Operation::Read => self.read,
            Operation::Write => self.write,
        }
    }
}

impl Default for ConsistencyPair {
    fn default() -> Self {
        Self {
            read: ConsistencyLevel::One,
            write: ConsistencyLevel::One,
        }
    }
}

// Deserialize through the validating constructor so configuration files
// cannot smuggle in serial levels.
impl<'de> Deserialize<'de> for ConsistencyPair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            read: ConsistencyLevel,
            write: ConsistencyLevel,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.read, raw.write).map_err(serde::de::Error::custom)
    }
}

///
/// Operation
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Read,
    Write,
}

///
/// AmbientConsistency
///
/// Per-call requested levels. Empty slots defer to the next layer.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AmbientConsistency {
    pub read: Option<ConsistencyLevel>,
    pub write: Option<ConsistencyLevel>,
    pub serial: Option<ConsistencyLevel>,
}

impl AmbientConsistency {
    /// Build an override, validating every provided slot.
    pub fn new(
        read: Option<ConsistencyLevel>,
        write: Option<ConsistencyLevel>,
        serial: Option<ConsistencyLevel>,
    ) -> Result<Self, ConsistencyError> {
        Ok(Self {
            read: read.map(|level| validate_plain("read", level)).transpose()?,
            write: write.map(|level| validate_plain("write", level)).transpose()?,
            serial: serial.map(validate_serial).transpose()?,
        })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.read.is_none() && self.write.is_none() && self.serial.is_none()
    }

    #[must_use]
    pub const fn get(&self, operation: Operation) -> Option<ConsistencyLevel> {
        match operation {
            Operation::Read => self.read,
            Operation::Write => self.write,
        }
    }

    /// Slot-wise layering: values in `self` win over `lower`.
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        Self {
            read: self.read.or(lower.read),
            write: self.write.or(lower.write),
            serial: self.serial.or(lower.serial),
        }
    }
}

///
/// ConsistencyDefaults
///
/// Global fallback levels.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ConsistencyDefaults {
    pub read: ConsistencyLevel,
    pub write: ConsistencyLevel,
    pub serial: ConsistencyLevel,
}

impl ConsistencyDefaults {
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        validate_plain("read", self.read)?;
        validate_plain("write", self.write)?;
        validate_serial(self.serial)?;

        Ok(())
    }
}

impl Default for ConsistencyDefaults {
    fn default() -> Self {
        Self {
            read: ConsistencyLevel::One,
            write: ConsistencyLevel::One,
            serial: ConsistencyLevel::Serial,
        }
    }
}

///
/// ResolvedConsistency
///
/// Levels captured for one statement at bind time.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResolvedConsistency {
    pub level: ConsistencyLevel,
    pub serial: Option<ConsistencyLevel>,
}

///
/// ConsistencyPolicy
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsistencyPolicy {
    defaults: ConsistencyDefaults,
}

impl ConsistencyPolicy {
    pub fn new(defaults: ConsistencyDefaults) -> Result<Self, ConsistencyError> {
        defaults.validate()?;

        Ok(Self { defaults })
    }

    #[must_use]
    pub const fn defaults(&self) -> &ConsistencyDefaults {
        &self.defaults
    }

    /// Resolve the read/write level for one statement.
    #[must_use]
    pub fn resolve(
        &self,
        operation: Operation,
        ambient: &AmbientConsistency,
        property: Option<&ConsistencyPair>,
        entity: Option<&ConsistencyPair>,
    ) -> ConsistencyLevel {
        ambient
            .get(operation)
            .or_else(|| property.map(|pair| pair.get(operation)))
            .or_else(|| entity.map(|pair| pair.get(operation)))
            .unwrap_or(match operation {
                Operation::Read => self.defaults.read,
                Operation::Write => self.defaults.write,
            })
    }

    /// Resolve the serial level used by conditional writes.
    #[must_use]
    pub fn resolve_serial(
        &self,
        ambient: &AmbientConsistency,
        entity: Option<ConsistencyLevel>,
    ) -> ConsistencyLevel {
        ambient
            .serial
            .or(entity)
            .unwrap_or(self.defaults.serial)
    }
}
