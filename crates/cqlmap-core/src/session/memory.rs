//! Recording in-memory session for tests.

use crate::{
    schema::{KeyspaceSchema, TableMetadataView},
    session::{RowSet, Session, TransportError},
    statement::{BoundStatement, PreparedStatement, StatementTemplate},
};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
};

///
/// RecordingSession
///
/// Records every prepared template, executed statement and DDL string.
/// Serves queued result sets in FIFO order and configured keyspace schema.
///

#[derive(Debug, Default)]
pub struct RecordingSession {
    state: RefCell<State>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    prepared: Vec<StatementTemplate>,
    executed: Vec<BoundStatement>,
    schema: Vec<String>,
    keyspaces: HashMap<String, KeyspaceSchema>,
    results: VecDeque<RowSet>,
    fail_next: Option<String>,
}

impl RecordingSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_keyspace(self, keyspace: KeyspaceSchema) -> Self {
        self.add_keyspace(keyspace);
        self
    }

    pub fn add_keyspace(&self, keyspace: KeyspaceSchema) {
        self.state
            .borrow_mut()
            .keyspaces
            .insert(keyspace.name.clone(), keyspace);
    }

    /// Register a live table inside an existing or new keyspace.
    pub fn add_table(&self, keyspace: &str, table: TableMetadataView) {
        self.state
            .borrow_mut()
            .keyspaces
            .entry(keyspace.to_string())
            .or_insert_with(|| KeyspaceSchema::new(keyspace))
            .tables
            .insert(table.name.clone(), table);
    }

    /// Queue the result of the next `execute` call.
    pub fn push_result(&self, rows: impl Into<RowSet>) {
        self.state.borrow_mut().results.push_back(rows.into());
    }

    /// Make the next `execute` or `execute_schema` call fail.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_next = Some(message.into());
    }

    #[must_use]
    pub fn executed(&self) -> Vec<BoundStatement> {
        self.state.borrow().executed.clone()
    }

    #[must_use]
    pub fn executed_texts(&self) -> Vec<String> {
        self.state
            .borrow()
            .executed
            .iter()
            .map(|statement| statement.text().to_string())
            .collect()
    }

    #[must_use]
    pub fn schema_statements(&self) -> Vec<String> {
        self.state.borrow().schema.clone()
    }

    #[must_use]
    pub fn prepared_count(&self) -> usize {
        self.state.borrow().prepared.len()
    }

    /// Forget recorded statements; keyspaces and queued results stay.
    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.executed.clear();
        state.schema.clear();
    }

    fn take_failure(state: &mut State, statement: &str) -> Result<(), TransportError> {
        match state.fail_next.take() {
            Some(message) => Err(TransportError::Execution {
                statement: statement.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}

impl Session for RecordingSession {
    fn prepare(&self, template: &StatementTemplate) -> Result<PreparedStatement, TransportError> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.prepared.push(template.clone());

        Ok(PreparedStatement::new(state.next_id, template.clone()))
    }

    fn execute(&self, statement: &BoundStatement) -> Result<RowSet, TransportError> {
        let mut state = self.state.borrow_mut();
        Self::take_failure(&mut state, statement.text())?;
        state.executed.push(statement.clone());

        Ok(state.results.pop_front().unwrap_or_default())
    }

    fn execute_schema(&self, ddl: &str) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        Self::take_failure(&mut state, ddl)?;
        state.schema.push(ddl.to_string());

        Ok(())
    }

    fn describe_keyspace(&self, keyspace: &str) -> Result<Option<KeyspaceSchema>, TransportError> {
        Ok(self.state.borrow().keyspaces.get(keyspace).cloned())
    }
}
