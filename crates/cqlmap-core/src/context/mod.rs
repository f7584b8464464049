//! Flush/batch context.
//!
//! The context owns the unit of work: it executes statements immediately or
//! buffers them until `end_batch`, caches one mutator handle per table, and
//! carries the ambient consistency overrides.

#[cfg(test)]
mod tests;

use crate::{
    consistency::AmbientConsistency,
    error::InternalError,
    session::{RowSet, Session},
    statement::{BoundStatement, PreparedStatement, StatementCache, StatementTemplate},
};
use derive_more::Display;
use std::{
    collections::HashMap,
    mem,
    ops::{Deref, DerefMut},
};
use tracing::{debug, trace, warn};

///
/// FlushType
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum FlushType {
    #[display("immediate")]
    Immediate,
    #[display("batch")]
    Batch,
}

///
/// MutatorId
///
/// Per-table handle issued for the lifetime of one unit of work.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("mutator#{_0}")]
pub struct MutatorId(u64);

///
/// PendingStatement
///

#[derive(Clone, Debug)]
pub struct PendingStatement {
    pub table: String,
    pub mutator: MutatorId,
    pub statement: BoundStatement,
}

///
/// FlushContext
///

pub struct FlushContext<'s, S: Session + ?Sized> {
    session: &'s S,
    flush_type: FlushType,
    pending: Vec<PendingStatement>,
    mutators: HashMap<String, MutatorId>,
    next_mutator: u64,
    cache: StatementCache,
    batch_consistency: AmbientConsistency,
    call_consistency: AmbientConsistency,
}

impl<'s, S: Session + ?Sized> FlushContext<'s, S> {
    /// A context that executes statements as they are produced.
    pub fn immediate(session: &'s S) -> Self {
        Self {
            session,
            flush_type: FlushType::Immediate,
            pending: Vec::new(),
            mutators: HashMap::new(),
            next_mutator: 0,
            cache: StatementCache::new(),
            batch_consistency: AmbientConsistency::default(),
            call_consistency: AmbientConsistency::default(),
        }
    }

    /// A context that buffers writes until `end_batch`.
    pub fn batching(session: &'s S) -> Self {
        let mut ctx = Self::immediate(session);
        ctx.flush_type = FlushType::Batch;
        ctx
    }

    pub const fn session(&self) -> &'s S {
        self.session
    }

    pub const fn flush_type(&self) -> FlushType {
        self.flush_type
    }

    pub fn pending(&self) -> &[PendingStatement] {
        &self.pending
    }

    pub const fn cache(&self) -> &StatementCache {
        &self.cache
    }

    /// Open a unit of work on a batch context, clearing any leftover state.
    pub fn start_batch(&mut self) -> Result<(), InternalError> {
        self.start_batch_with(AmbientConsistency::default())
    }

    /// Open a unit of work with a batch-level consistency override.
    pub fn start_batch_with(
        &mut self,
        consistency: AmbientConsistency,
    ) -> Result<(), InternalError> {
        self.require_batch("start_batch")?;
        if !self.pending.is_empty() || !self.mutators.is_empty() {
            warn!(
                pending = self.pending.len(),
                mutators = self.mutators.len(),
                "clearing leftover unit-of-work state before batch"
            );
        }

        self.reset();
        self.batch_consistency = consistency;
        debug!("batch started");

        Ok(())
    }

    /// Execute every buffered statement in insertion order. Local state is
    /// cleared before the first execution, so a failure leaves nothing
    /// buffered.
    pub fn end_batch(&mut self) -> Result<(), InternalError> {
        self.require_batch("end_batch")?;

        let pending = mem::take(&mut self.pending);
        self.reset();
        debug!(statements = pending.len(), "ending batch");

        for entry in pending {
            trace!(table = %entry.table, mutator = %entry.mutator, "flushing buffered statement");
            self.execute(&entry.statement)?;
        }

        Ok(())
    }

    /// Writes are flushed by `end_batch` or executed immediately; there is
    /// nothing to do here in either mode.
    pub const fn flush(&mut self) {}

    /// Drop buffered statements, mutators and overrides without executing.
    pub fn clean_up(&mut self) {
        if !self.pending.is_empty() {
            debug!(discarded = self.pending.len(), "discarding buffered statements");
        }
        self.reset();
    }

    /// Mutator handle for `table`, issued once per unit of work.
    pub fn entity_mutator(&mut self, table: &str) -> MutatorId {
        if let Some(&mutator) = self.mutators.get(table) {
            return mutator;
        }

        self.next_mutator += 1;
        let mutator = MutatorId(self.next_mutator);
        trace!(table, %mutator, "issued mutator");
        self.mutators.insert(table.to_string(), mutator);

        mutator
    }

    /// Prepare `template` through the context's statement cache.
    pub fn prepare(
        &mut self,
        template: StatementTemplate,
    ) -> Result<PreparedStatement, InternalError> {
        self.cache.get_or_prepare(self.session, template)
    }

    /// Execute or buffer a write. Returns the result set only when executed.
    pub fn push_statement(
        &mut self,
        statement: BoundStatement,
    ) -> Result<Option<RowSet>, InternalError> {
        match self.flush_type {
            FlushType::Immediate => self.execute(&statement).map(Some),
            FlushType::Batch => {
                let table = statement.table().to_string();
                let mutator = self.entity_mutator(&table);
                trace!(table = %table, %mutator, statement = statement.text(), "buffered");
                self.pending.push(PendingStatement {
                    table,
                    mutator,
                    statement,
                });

                Ok(None)
            }
        }
    }

    /// Execute immediately regardless of mode; used for reads.
    pub fn execute_immediate(
        &mut self,
        statement: &BoundStatement,
    ) -> Result<RowSet, InternalError> {
        self.execute(statement)
    }

    /// Effective ambient override: per-call scope over batch level.
    pub fn ambient(&self) -> AmbientConsistency {
        self.call_consistency.or(self.batch_consistency)
    }

    /// Install a per-call override until the returned scope is dropped.
    pub fn with_consistency(
        &mut self,
        consistency: AmbientConsistency,
    ) -> ConsistencyScope<'_, 's, S> {
        let previous = mem::replace(&mut self.call_consistency, consistency);

        ConsistencyScope {
            ctx: self,
            previous,
        }
    }

    fn execute(&self, statement: &BoundStatement) -> Result<RowSet, InternalError> {
        debug!(
            table = statement.table(),
            consistency = %statement.consistency(),
            serial = ?statement.serial_consistency(),
            values = ?statement.encoded(),
            "execute {}",
            statement.text()
        );

        Ok(self.session.execute(statement)?)
    }

    fn require_batch(&self, transition: &str) -> Result<(), InternalError> {
        match self.flush_type {
            FlushType::Batch => Ok(()),
            FlushType::Immediate => Err(InternalError::context_invariant(format!(
                "{transition} called on an immediate context"
            ))),
        }
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.mutators.clear();
        self.batch_consistency = AmbientConsistency::default();
        self.call_consistency = AmbientConsistency::default();
    }
}

///
/// ConsistencyScope
///
/// Guard restoring the previous per-call override on drop, on every exit
/// path including early returns and unwinding.
///

pub struct ConsistencyScope<'c, 's, S: Session + ?Sized> {
    ctx: &'c mut FlushContext<'s, S>,
    previous: AmbientConsistency,
}

impl<'s, S: Session + ?Sized> Deref for ConsistencyScope<'_, 's, S> {
    type Target = FlushContext<'s, S>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<S: Session + ?Sized> DerefMut for ConsistencyScope<'_, '_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl<S: Session + ?Sized> Drop for ConsistencyScope<'_, '_, S> {
    fn drop(&mut self) {
        self.ctx.call_consistency = self.previous;
    }
}
