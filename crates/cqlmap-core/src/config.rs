//! Runtime configuration.
//!
//! `PersistenceConfig` is the global layer; `EntityConfig` is the validated
//! per-entity declaration consumed by `EntityMetaBuilder`.

use crate::{
    consistency::{ConsistencyDefaults, ConsistencyLevel, ConsistencyPair},
    error::{ErrorOrigin, InternalError},
    model::{NamingStrategy, validate_schema_name},
};
use serde::{Deserialize, Serialize};

///
/// InsertStrategy
///
/// Which properties an INSERT carries.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertStrategy {
    /// Every non-counter property, null or not.
    #[default]
    AllFields,

    /// Only the properties whose current value is not null.
    NotNullFields,
}

///
/// SchemaConfig
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Create declared tables that are missing from the live keyspace.
    pub force_table_creation: bool,

    /// Add declared-but-missing columns and indexes to live tables.
    pub enable_schema_update: bool,
}

///
/// PersistenceConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub keyspace: Option<String>,
    pub consistency: ConsistencyDefaults,
    pub naming: NamingStrategy,
    pub insert_strategy: InsertStrategy,
    pub schema: SchemaConfig,
}

impl PersistenceConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, InternalError> {
        let config: Self = serde_json::from_str(json).map_err(|err| {
            InternalError::metadata_invalid(ErrorOrigin::Config, format!("invalid config: {err}"))
        })?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InternalError> {
        self.consistency.validate()?;
        if let Some(keyspace) = &self.keyspace {
            validate_schema_name(keyspace)?;
        }

        Ok(())
    }
}

///
/// EntityConfig
///
/// Per-entity declaration. Every slot is optional and falls back to the
/// global configuration or the builder's derived default.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct EntityConfig {
    pub table: Option<String>,
    pub keyspace: Option<String>,
    pub consistency: Option<ConsistencyPair>,
    pub serial_consistency: Option<ConsistencyLevel>,
    pub ttl: Option<u32>,
    pub insert_strategy: Option<InsertStrategy>,
    pub naming: Option<NamingStrategy>,
}

impl EntityConfig {
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    #[must_use]
    pub const fn consistency(mut self, pair: ConsistencyPair) -> Self {
        self.consistency = Some(pair);
        self
    }

    #[must_use]
    pub const fn serial_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.serial_consistency = Some(level);
        self
    }

    #[must_use]
    pub const fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn insert_strategy(mut self, strategy: InsertStrategy) -> Self {
        self.insert_strategy = Some(strategy);
        self
    }

    #[must_use]
    pub const fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = Some(naming);
        self
    }
}

///
/// TESTS
///
