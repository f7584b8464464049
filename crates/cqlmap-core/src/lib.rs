//! Core runtime for cqlmap: entity metadata, consistency resolution,
//! changeset translation, statement generation and binding, the flush/batch
//! context and schema reconciliation.
//!
//! The engine never performs I/O itself; every statement goes through a
//! caller-supplied `session::Session`.

#[macro_use]
mod macros;

// public exports are one module level down
pub mod changeset;
pub mod config;
pub mod consistency;
pub mod context;
pub mod error;
pub mod model;
pub mod persist;
pub mod schema;
pub mod session;
pub mod statement;
pub mod value;

// test
#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

///
/// Prelude
///
/// Vocabulary needed to declare entities and run operations.
/// Errors, DDL helpers and statement internals stay in their modules.
///

pub mod prelude {
    pub use crate::{
        changeset::{Change, ChangeSet},
        config::{EntityConfig, InsertStrategy, PersistenceConfig},
        consistency::{ConsistencyLevel, ConsistencyPair},
        context::FlushContext,
        field_accessor,
        model::{EmbeddedIdProperties, EntityMeta, KeyComponent, KeyValues, PropertyMeta},
        persist::{Options, Persister},
        session::Session,
        value::{ColumnType, Value},
    };
}
