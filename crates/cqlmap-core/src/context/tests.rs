use super::*;
use crate::{
    consistency::{ConsistencyLevel, ResolvedConsistency},
    error::{ErrorClass, ErrorOrigin},
    session::memory::RecordingSession,
    statement::{StatementKind, binder::Bindings},
    value::Value,
};

const ONE: ResolvedConsistency = ResolvedConsistency {
    level: ConsistencyLevel::One,
    serial: None,
};

fn write<S: Session + ?Sized>(
    ctx: &mut FlushContext<'_, S>,
    table: &str,
    id: i64,
) -> BoundStatement {
    let template = StatementTemplate::new(
        StatementKind::Update,
        table,
        format!("UPDATE {table} USING TTL ? SET v=? WHERE id=?;"),
    );
    let prepared = ctx.prepare(template).unwrap();

    Bindings::new()
        .ttl(0)
        .unwrap()
        .value(Value::from("v"))
        .value(Value::BigInt(id))
        .bind(prepared, ONE)
        .unwrap()
}

fn read<S: Session + ?Sized>(ctx: &mut FlushContext<'_, S>) -> BoundStatement {
    let prepared = ctx
        .prepare(StatementTemplate::new(
            StatementKind::Select,
            "users",
            "SELECT name FROM users WHERE id=?;",
        ))
        .unwrap();

    Bindings::new()
        .value(Value::BigInt(1))
        .bind(prepared, ONE)
        .unwrap()
}

fn quorum() -> AmbientConsistency {
    AmbientConsistency::new(Some(ConsistencyLevel::Quorum), Some(ConsistencyLevel::Quorum), None)
        .unwrap()
}

#[test]
fn immediate_context_executes_at_once() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(&session);

    let statement = write(&mut ctx, "users", 1);
    let rows = ctx.push_statement(statement).unwrap();

    assert!(rows.is_some());
    assert_eq!(session.executed().len(), 1);
    ctx.flush();
    assert_eq!(session.executed().len(), 1);
}

#[test]
fn end_batch_outside_batch_is_invalid() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(&session);

    let err = ctx.end_batch().unwrap_err();

    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Context);
}

#[test]
fn start_batch_on_immediate_context_is_invalid() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(&session);

    let err = ctx.start_batch().unwrap_err();

    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Context);
    assert_eq!(ctx.flush_type(), FlushType::Immediate);
}

#[test]
fn start_batch_clears_leftover_state() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batching(&session);
    let statement = write(&mut ctx, "users", 1);
    ctx.push_statement(statement).unwrap();
    let stale = ctx.entity_mutator("users");

    ctx.start_batch().unwrap();

    assert!(ctx.pending().is_empty());
    assert_ne!(ctx.entity_mutator("users"), stale);
    assert_eq!(ctx.flush_type(), FlushType::Batch);
    assert!(session.executed().is_empty());
}

#[test]
fn batch_executes_in_insertion_order() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batching(&session);
    ctx.start_batch().unwrap();

    for (table, id) in [("users", 1), ("events", 2), ("users", 3)] {
        let statement = write(&mut ctx, table, id);
        assert!(ctx.push_statement(statement).unwrap().is_none());
    }
    ctx.flush();
    assert!(session.executed().is_empty());
    assert_eq!(ctx.pending().len(), 3);
    assert_eq!(ctx.pending()[0].mutator, ctx.pending()[2].mutator);
    assert_ne!(ctx.pending()[0].mutator, ctx.pending()[1].mutator);

    ctx.end_batch().unwrap();

    let ids: Vec<Value> = session
        .executed()
        .iter()
        .map(|statement| statement.values()[2].clone())
        .collect();
    assert_eq!(ids, [Value::BigInt(1), Value::BigInt(2), Value::BigInt(3)]);
    assert!(ctx.pending().is_empty());
    assert_eq!(ctx.flush_type(), FlushType::Batch);
}

#[test]
fn mutator_is_reissued_after_end_batch() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batching(&session);

    let first = ctx.entity_mutator("users");
    assert_eq!(ctx.entity_mutator("users"), first);

    ctx.end_batch().unwrap();
    let second = ctx.entity_mutator("users");
    assert_ne!(first, second);

    ctx.clean_up();
    assert_ne!(ctx.entity_mutator("users"), second);
}

#[test]
fn failed_end_batch_still_clears_state() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batching(&session);
    ctx.start_batch_with(quorum()).unwrap();

    for id in 1..=2 {
        let statement = write(&mut ctx, "users", id);
        ctx.push_statement(statement).unwrap();
    }
    session.fail_next("node down");

    let err = ctx.end_batch().unwrap_err();

    assert_eq!(err.class, ErrorClass::Transport);
    assert!(ctx.pending().is_empty());
    assert!(ctx.ambient().is_empty());
    assert_eq!(ctx.flush_type(), FlushType::Batch);
    assert!(session.executed().is_empty());
}

#[test]
fn reads_bypass_the_batch_buffer() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batching(&session);

    let statement = read(&mut ctx);
    ctx.execute_immediate(&statement).unwrap();

    assert_eq!(session.executed_texts(), ["SELECT name FROM users WHERE id=?;"]);
    assert!(ctx.pending().is_empty());
}

#[test]
fn consistency_scope_clears_on_drop() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(&session);

    {
        let scope = ctx.with_consistency(quorum());
        assert_eq!(scope.ambient().write, Some(ConsistencyLevel::Quorum));
    }

    assert!(ctx.ambient().is_empty());
}

#[test]
fn consistency_scope_clears_on_early_return() {
    fn failing(ctx: &mut FlushContext<'_, RecordingSession>) -> Result<(), InternalError> {
        let mut scope = ctx.with_consistency(quorum());
        scope.end_batch()?;

        Ok(())
    }

    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(&session);

    assert!(failing(&mut ctx).is_err());
    assert!(ctx.ambient().is_empty());
}

#[test]
fn scope_wins_over_batch_level_override() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batching(&session);
    let batch = AmbientConsistency::new(None, Some(ConsistencyLevel::All), None).unwrap();
    ctx.start_batch_with(batch).unwrap();

    {
        let scope = ctx.with_consistency(quorum());
        assert_eq!(scope.ambient().write, Some(ConsistencyLevel::Quorum));
    }
    assert_eq!(ctx.ambient().write, Some(ConsistencyLevel::All));

    ctx.end_batch().unwrap();
    assert!(ctx.ambient().is_empty());
}

#[test]
fn templates_are_prepared_once() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(&session);

    let _ = write(&mut ctx, "users", 1);
    let _ = write(&mut ctx, "users", 2);

    assert_eq!(session.prepared_count(), 1);
    assert_eq!(ctx.cache().stats().hits, 1);
    assert_eq!(ctx.cache().stats().misses, 1);
}
