use crate::{
    consistency::{AmbientConsistency, ConsistencyLevel},
    error::{ErrorOrigin, InternalError},
    value::Value,
};

///
/// CasCondition
///
/// `IF column = value` guard on a conditional write.
///

#[derive(Clone, Debug, PartialEq)]
pub struct CasCondition {
    pub property: String,
    pub value: Value,
}

///
/// Options
///
/// Per-call overrides for one operation.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    pub ttl: Option<u32>,
    pub consistency: Option<ConsistencyLevel>,
    pub serial_consistency: Option<ConsistencyLevel>,
    pub cas_conditions: Vec<CasCondition>,
    pub if_not_exists: bool,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Level used for the operation, read or write.
    #[must_use]
    pub const fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    #[must_use]
    pub const fn serial_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.serial_consistency = Some(level);
        self
    }

    #[must_use]
    pub fn cas(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.cas_conditions.push(CasCondition {
            property: property.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        self.if_not_exists || !self.cas_conditions.is_empty()
    }

    /// Same levels and TTL, without any condition. Counter statements and
    /// reads are never conditional.
    #[must_use]
    pub fn without_conditions(&self) -> Self {
        Self {
            ttl: self.ttl,
            consistency: self.consistency,
            serial_consistency: self.serial_consistency,
            cas_conditions: Vec::new(),
            if_not_exists: false,
        }
    }

    pub(crate) fn ambient(&self) -> Result<AmbientConsistency, InternalError> {
        AmbientConsistency::new(
            self.consistency,
            self.consistency,
            self.serial_consistency,
        )
        .map_err(|err| InternalError::argument_invalid(ErrorOrigin::Consistency, err.to_string()))
    }
}
