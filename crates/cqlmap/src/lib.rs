//! ## Crate layout
//! - `core`: metadata model, consistency policy, changeset translation,
//!   statement generation, flush/batch context and schema reconciliation.
//! - `error`: the public error type callers match on.
//!
//! The `prelude` module exposes what entity declarations and operation call
//! sites need; everything else is reachable through `core`.

pub use cqlmap_core as core;

pub mod error;

/// re-exports
///
/// macros can use these, stops the user having to specify all the dependencies
/// in the Cargo.toml file manually
pub mod __reexports {
    pub use derive_more;
    pub use remain;
    pub use serde;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use cqlmap_core::field_accessor;
pub use error::{Error, ErrorKind, ErrorOrigin};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{Error, ErrorKind, ErrorOrigin};
    pub use cqlmap_core::{
        context::ConsistencyScope,
        prelude::*,
        schema::{ReconcileReport, SchemaReconciler},
    };
}
