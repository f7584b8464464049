//! Entity and property metadata.
//!
//! Declarations are validated when built; everything here is immutable
//! afterwards and shared by reference with the generator, binder and
//! schema reconciler.

mod accessor;
mod entity;
mod key;
mod naming;
mod property;
mod table;
mod validate;

#[cfg(test)]
mod tests;

use crate::{
    consistency::ConsistencyError,
    error::{ErrorOrigin, InternalError},
};
use thiserror::Error as ThisError;

// re-exports
pub use accessor::{FieldAccessor, Getter, Setter};
pub use entity::{EntityMeta, EntityMetaBuilder};
pub use key::{ClusteringOrder, EmbeddedIdProperties, KeyColumn, KeyComponent, KeyValues};
pub use naming::{
    MAX_SCHEMA_NAME_LEN, NamingStrategy, live_identifier, simple_name, unquote,
    validate_column_name, validate_schema_name,
};
pub use property::{
    CascadeType, FetchMode, IndexProperties, JoinProperties, PropertyKind, PropertyMeta,
    PropertyMetaBuilder, PropertyType,
};
pub use table::{ColumnDefinition, TableDefinition};
pub use validate::KeyValidationError;

///
/// MetadataError
///
/// Build-time declaration failures. Never raised at call time.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum MetadataError {
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    #[error("duplicate property '{property}'")]
    DuplicateProperty { property: String },

    #[error("entity '{entity}' declares no properties besides its id")]
    EmptyProperties { entity: String },

    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("property '{property}' has an incompatible declaration: {reason}")]
    IncompatibleKind { property: String, reason: String },

    #[error("invalid column name '{name}': expected [A-Za-z0-9][A-Za-z0-9_]{{0,47}}")]
    InvalidColumnName { name: String },

    #[error("invalid schema name '{name}': expected [A-Za-z0-9][A-Za-z0-9_]{{1,47}}")]
    InvalidSchemaName { name: String },

    #[error("property '{property}' has no field accessor")]
    MissingAccessor { property: String },

    #[error("entity '{entity}' declares no id")]
    MissingId { entity: String },

    #[error("embedded id '{property}' declares no partition component")]
    MissingPartitionKey { property: String },

    #[error("static column '{property}' needs a clustering key, '{entity}' has none")]
    StaticOnUnclusteredEntity { entity: String, property: String },
}

impl From<MetadataError> for InternalError {
    fn from(err: MetadataError) -> Self {
        Self::metadata_invalid(ErrorOrigin::Metadata, err.to_string())
    }
}
