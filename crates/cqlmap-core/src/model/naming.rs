use crate::model::MetadataError;
use convert_case::{Case, Casing};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Maximum length of a table, keyspace or column identifier.
pub const MAX_SCHEMA_NAME_LEN: usize = 48;

static SCHEMA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_]{1,47}$").expect("schema name pattern is valid")
});

// columns may be a single character
static COLUMN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_]{0,47}$").expect("column name pattern is valid")
});

///
/// NamingStrategy
///
/// Maps logical (Rust) names to schema identifiers when no explicit name is
/// declared.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    SnakeCase,
    LowerCase,
    CaseSensitive,
}

impl NamingStrategy {
    #[must_use]
    pub fn apply(self, logical: &str) -> String {
        match self {
            Self::SnakeCase => logical.to_case(Case::Snake),
            Self::LowerCase => logical.to_lowercase(),
            Self::CaseSensitive => format!("\"{logical}\""),
        }
    }
}

/// Check `name` against the schema identifier grammar.
///
/// A name wrapped in double quotes is validated without its quotes.
pub fn validate_schema_name(name: &str) -> Result<(), MetadataError> {
    let bare = unquote(name);

    if SCHEMA_NAME.is_match(bare) {
        Ok(())
    } else {
        Err(MetadataError::InvalidSchemaName {
            name: name.to_string(),
        })
    }
}

/// Check a column or key-component name. Quoting follows
/// `validate_schema_name`.
pub fn validate_column_name(name: &str) -> Result<(), MetadataError> {
    if COLUMN_NAME.is_match(unquote(name)) {
        Ok(())
    } else {
        Err(MetadataError::InvalidColumnName {
            name: name.to_string(),
        })
    }
}

/// Identifier as the cluster reports it: quoted names keep their case,
/// unquoted names are folded to lower case.
#[must_use]
pub fn live_identifier(name: &str) -> String {
    if is_quoted(name) {
        unquote(name).to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Strip one pair of surrounding double quotes, if present.
#[must_use]
pub fn unquote(name: &str) -> &str {
    if is_quoted(name) {
        &name[1..name.len() - 1]
    } else {
        name
    }
}

fn is_quoted(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('"') && name.ends_with('"')
}

/// Last path segment of a Rust or dotted class name.
#[must_use]
pub fn simple_name(class_name: &str) -> &str {
    let tail = class_name.rsplit("::").next().unwrap_or(class_name);

    tail.rsplit('.').next().unwrap_or(tail)
}
