use crate::{
    error::InternalError,
    session::Session,
    statement::{PreparedStatement, StatementTemplate},
};
use std::collections::HashMap;

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

///
/// StatementCache
///
/// Prepared handles keyed by template text; a template is prepared once per
/// cache lifetime.
///

#[derive(Debug, Default)]
pub struct StatementCache {
    entries: HashMap<String, PreparedStatement>,
    stats: CacheStats,
}

impl StatementCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_prepare<S: Session + ?Sized>(
        &mut self,
        session: &S,
        template: StatementTemplate,
    ) -> Result<PreparedStatement, InternalError> {
        if let Some(prepared) = self.entries.get(template.text()) {
            self.stats.hits += 1;
            tracing::trace!(statement = template.text(), "prepared statement cache hit");

            return Ok(prepared.clone());
        }

        let prepared = session.prepare(&template)?;
        self.stats.misses += 1;
        tracing::debug!(
            id = prepared.id(),
            table = template.table(),
            statement = template.text(),
            "prepared statement"
        );
        self.entries.insert(template.text().to_string(), prepared.clone());

        Ok(prepared)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
