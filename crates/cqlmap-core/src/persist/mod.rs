//! Entity operations.
//!
//! `Persister` turns entity-level requests (insert, update, changesets,
//! removal, loading, counters) into bound statements and hands them to a
//! `FlushContext`.

mod options;


use crate::{
    changeset::{self, ChangeSet, ChangesetError, NativeOperation},
    config::{InsertStrategy, PersistenceConfig},
    consistency::{ConsistencyPair, ConsistencyPolicy, Operation, ResolvedConsistency},
    context::FlushContext,
    error::{ErrorOrigin, InternalError},
    model::{EntityMeta, KeyValues, PropertyMeta},
    session::{Row, RowSet, Session},
    statement::{
        StatementTemplate,
        binder::{self, CounterCell},
        counter, generator,
    },
    value::Value,
};
use tracing::debug;

// re-exports
pub use options::{CasCondition, Options};

///
/// Persister
///

#[derive(Clone, Debug, Default)]
pub struct Persister {
    config: PersistenceConfig,
    policy: ConsistencyPolicy,
}

impl Persister {
    pub fn new(config: PersistenceConfig) -> Result<Self, InternalError> {
        config.validate()?;
        let policy = ConsistencyPolicy::new(config.consistency)?;

        Ok(Self { config, policy })
    }

    #[must_use]
    pub const fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    #[must_use]
    pub const fn policy(&self) -> &ConsistencyPolicy {
        &self.policy
    }

    ///
    /// WRITES
    ///

    /// Insert `entity`. Non-zero counter values are written as initial
    /// increments; a clustered counter entity is written through its counter
    /// only.
    pub fn insert<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        entity: &E,
        options: &Options,
    ) -> Result<(), InternalError> {
        let key = meta.primary_key_of(entity)?;
        meta.validate_primary_key(&key)?;
        if !options.cas_conditions.is_empty() {
            return Err(InternalError::argument_invalid(
                ErrorOrigin::Statement,
                "inserts accept IF NOT EXISTS, not CAS conditions",
            ));
        }
        debug!(entity = meta.class_name(), "insert");

        let mut counters = Vec::new();
        for property in meta.counter_properties() {
            let delta = counter_value(property, property.read(entity)?)?;
            if delta == i64::MIN {
                return Err(counter_out_of_range(property));
            }
            if delta != 0 {
                counters.push((property, delta));
            }
        }

        if !meta.is_clustered_counter() {
            let strategy = meta.insert_strategy().unwrap_or(self.config.insert_strategy);
            let mut properties = Vec::new();
            let mut values = Vec::new();
            for property in meta.column_properties() {
                let value = property.read(entity)?;
                if strategy == InsertStrategy::NotNullFields && value.is_null() {
                    continue;
                }
                properties.push(property);
                values.push(value);
            }

            let template = generator::insert(meta, &properties, options.if_not_exists)?;
            let consistency = self.resolve(ctx, meta, options, Operation::Write, None)?;
            let prepared = ctx.prepare(template)?;
            let bound =
                binder::bind_insert(prepared, values, &key, Self::ttl(meta, options), consistency)?;
            let rows = ctx.push_statement(bound)?;
            Self::check_applied(meta, rows.as_ref())?;
        }

        let plain = options.without_conditions();
        for (property, delta) in counters {
            self.counter_delta(ctx, meta, property, &key, delta, &plain)?;
        }

        Ok(())
    }

    /// Overwrite the named properties of `entity`.
    pub fn update<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        entity: &E,
        properties: &[&str],
        options: &Options,
    ) -> Result<(), InternalError> {
        let key = meta.primary_key_of(entity)?;
        meta.validate_primary_key(&key)?;

        let properties = Self::non_id_properties(meta, properties)?;
        let values = properties
            .iter()
            .map(|property| property.read(entity))
            .collect::<Result<Vec<_>, _>>()?;
        let (conditions, cas_values) = Self::cas(meta, options)?;

        let template = generator::update(meta, &properties, &conditions)?;
        let consistency = self.resolve(ctx, meta, options, Operation::Write, None)?;
        let prepared = ctx.prepare(template)?;
        let bound = binder::bind_update(
            prepared,
            Self::ttl(meta, options),
            values,
            &key,
            cas_values,
            consistency,
        )?;
        let rows = ctx.push_statement(bound)?;

        Self::check_applied(meta, rows.as_ref())
    }

    /// Apply dirty-checked changesets. Non-counter changes are merged into
    /// one UPDATE; counter changes go through the counter path. Every
    /// changeset is translated and checked before any statement is sent.
    pub fn push_changesets<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        changesets: Vec<ChangeSet>,
        options: &Options,
    ) -> Result<(), InternalError> {
        meta.validate_primary_key(key)?;

        let mut operation = NativeOperation::default();
        let mut counters = Vec::new();
        for changeset in changesets {
            let (name, change) = changeset.into_parts();
            let property = meta.property_or_err(&name)?;

            if property.is_counter() {
                counters.push((property, change.counter_delta(&name)?));
            } else {
                operation.extend(changeset::translate(property, change)?);
            }
        }
        let (conditions, cas_values) = Self::cas(meta, options)?;

        // row update first: a rejected condition leaves counters untouched
        if !operation.is_empty() {
            let template =
                generator::update_assignments(meta, &operation.assignments, &conditions, true)?;
            let consistency = self.resolve(ctx, meta, options, Operation::Write, None)?;
            let prepared = ctx.prepare(template)?;
            let bound = binder::bind_update(
                prepared,
                Self::ttl(meta, options),
                operation.values,
                key,
                cas_values,
                consistency,
            )?;
            let rows = ctx.push_statement(bound)?;
            Self::check_applied(meta, rows.as_ref())?;
        }

        let plain = options.without_conditions();
        for (property, delta) in counters {
            self.counter_delta(ctx, meta, property, key, delta, &plain)?;
        }

        Ok(())
    }

    /// Delete the row and every simple counter of the entity.
    pub fn remove<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        options: &Options,
    ) -> Result<(), InternalError> {
        meta.validate_primary_key(key)?;
        debug!(entity = meta.class_name(), "remove");

        let (conditions, cas_values) = Self::cas(meta, options)?;
        let template = generator::delete_row(meta, &conditions);
        let consistency = self.resolve(ctx, meta, options, Operation::Write, None)?;
        let prepared = ctx.prepare(template)?;
        let bound = binder::bind_delete(prepared, key, cas_values, consistency)?;
        let rows = ctx.push_statement(bound)?;
        Self::check_applied(meta, rows.as_ref())?;

        let plain = options.without_conditions();
        for property in meta.simple_counters() {
            self.counter_statement(ctx, meta, property, key, counter::delete(), None, &plain)?;
        }

        Ok(())
    }

    /// Delete the named columns of one row.
    pub fn remove_properties<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        properties: &[&str],
        options: &Options,
    ) -> Result<(), InternalError> {
        meta.validate_primary_key(key)?;

        let properties = Self::non_id_properties(meta, properties)?;
        let (conditions, cas_values) = Self::cas(meta, options)?;
        let template = generator::delete_columns(meta, &properties, &conditions)?;
        let consistency = self.resolve(ctx, meta, options, Operation::Write, None)?;
        let prepared = ctx.prepare(template)?;
        let bound = binder::bind_delete(prepared, key, cas_values, consistency)?;
        let rows = ctx.push_statement(bound)?;

        Self::check_applied(meta, rows.as_ref())
    }

    ///
    /// READS
    ///

    /// Fetch the eager row of one entity.
    pub fn load_row<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        options: &Options,
    ) -> Result<Option<Row>, InternalError> {
        meta.validate_primary_key(key)?;

        let template = generator::select_entity(meta);
        let rows = self.read(ctx, meta, template, key, options)?;

        Ok(rows.into_first())
    }

    /// Load and hydrate one entity; lazy properties keep their defaults.
    pub fn load<S: Session + ?Sized, E: Default>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        options: &Options,
    ) -> Result<Option<E>, InternalError> {
        let Some(row) = self.load_row(ctx, meta, key, options)? else {
            return Ok(None);
        };

        let mut entity = E::default();
        meta.write_primary_key(&mut entity, key)?;
        for property in meta.eager_properties() {
            property.write(&mut entity, row.value(property.column()))?;
        }

        Ok(Some(entity))
    }

    /// Load a single property, counters included.
    pub fn load_property<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        property: &str,
        options: &Options,
    ) -> Result<Value, InternalError> {
        let meta_property = meta.property_or_err(property)?;
        if meta_property.is_counter() {
            return self.get_counter(ctx, meta, key, property, options).map(Value::BigInt);
        }
        meta.validate_primary_key(key)?;

        let template = generator::select_columns(meta, &[meta_property])?;
        let rows = self.read(ctx, meta, template, key, options)?;

        Ok(rows
            .into_first()
            .map_or(Value::Null, |row| row.value(meta_property.column())))
    }

    ///
    /// COUNTERS
    ///

    pub fn increment_counter<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        property: &str,
        delta: i64,
        options: &Options,
    ) -> Result<(), InternalError> {
        let property = Self::counter_property(meta, property)?;
        meta.validate_primary_key(key)?;

        self.counter_delta(ctx, meta, property, key, delta, options)
    }

    pub fn decrement_counter<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        property: &str,
        delta: i64,
        options: &Options,
    ) -> Result<(), InternalError> {
        let property = Self::counter_property(meta, property)?;
        meta.validate_primary_key(key)?;

        let delta = delta
            .checked_neg()
            .ok_or_else(|| counter_out_of_range(property))?;

        self.counter_delta(ctx, meta, property, key, delta, options)
    }

    /// Current counter value; a missing cell reads as zero.
    pub fn get_counter<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        property: &str,
        options: &Options,
    ) -> Result<i64, InternalError> {
        let property = Self::counter_property(meta, property)?;
        meta.validate_primary_key(key)?;

        let consistency = self.resolve(
            ctx,
            meta,
            &options.without_conditions(),
            Operation::Read,
            property.consistency(),
        )?;
        let (rows, column) = if meta.is_clustered_counter() {
            let prepared = ctx.prepare(generator::select_columns(meta, &[property])?)?;
            let bound = binder::bind_select(prepared, key, consistency)?;
            (ctx.execute_immediate(&bound)?, property.column())
        } else {
            let prepared = ctx.prepare(counter::select())?;
            let cell = Self::counter_cell(meta, property, key);
            let bound = binder::bind_counter(prepared, None, cell, consistency)?;
            (ctx.execute_immediate(&bound)?, counter::COUNTER_VALUE)
        };
        let value = rows.into_first().map_or(Value::Null, |row| row.value(column));

        counter_value(property, value)
    }

    /// Delete one counter cell.
    pub fn remove_counter<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        key: &KeyValues,
        property: &str,
        options: &Options,
    ) -> Result<(), InternalError> {
        let property = Self::counter_property(meta, property)?;
        meta.validate_primary_key(key)?;

        if meta.is_clustered_counter() {
            let template = generator::delete_row(meta, &[]);
            let consistency = self.resolve(
                ctx,
                meta,
                &options.without_conditions(),
                Operation::Write,
                property.consistency(),
            )?;
            let prepared = ctx.prepare(template)?;
            let bound = binder::bind_delete(prepared, key, Vec::new(), consistency)?;
            ctx.push_statement(bound)?;

            return Ok(());
        }

        self.counter_statement(ctx, meta, property, key, counter::delete(), None, options)
    }

    ///
    /// HELPERS
    ///

    fn counter_delta<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        property: &PropertyMeta<E>,
        key: &KeyValues,
        delta: i64,
        options: &Options,
    ) -> Result<(), InternalError> {
        // counters bind the magnitude; the sign lives in the template
        let decrement = delta < 0;
        let magnitude = delta
            .checked_abs()
            .ok_or_else(|| counter_out_of_range(property))?;

        if meta.is_clustered_counter() {
            let assignment = if decrement {
                changeset::Assignment::Subtract
            } else {
                changeset::Assignment::Append
            };
            let template = counter::clustered_update(meta, property, assignment);
            let consistency = self.resolve(
                ctx,
                meta,
                &options.without_conditions(),
                Operation::Write,
                property.consistency(),
            )?;
            let prepared = ctx.prepare(template)?;
            let bound = binder::bind_clustered_counter(prepared, magnitude, key, consistency)?;
            ctx.push_statement(bound)?;

            return Ok(());
        }

        let template = if decrement {
            counter::decrement()
        } else {
            counter::increment()
        };
        self.counter_statement(ctx, meta, property, key, template, Some(magnitude), options)
    }

    #[allow(clippy::too_many_arguments)]
    fn counter_statement<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        property: &PropertyMeta<E>,
        key: &KeyValues,
        template: StatementTemplate,
        delta: Option<i64>,
        options: &Options,
    ) -> Result<(), InternalError> {
        let consistency = self.resolve(
            ctx,
            meta,
            &options.without_conditions(),
            Operation::Write,
            property.consistency(),
        )?;
        let prepared = ctx.prepare(template)?;
        let cell = Self::counter_cell(meta, property, key);
        let bound = binder::bind_counter(prepared, delta, cell, consistency)?;
        ctx.push_statement(bound)?;

        Ok(())
    }

    fn read<S: Session + ?Sized, E>(
        &self,
        ctx: &mut FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        template: StatementTemplate,
        key: &KeyValues,
        options: &Options,
    ) -> Result<RowSet, InternalError> {
        let consistency =
            self.resolve(ctx, meta, &options.without_conditions(), Operation::Read, None)?;
        let prepared = ctx.prepare(template)?;
        let bound = binder::bind_select(prepared, key, consistency)?;

        ctx.execute_immediate(&bound)
    }

    /// Layered resolution: call options, context scope, batch level,
    /// property (counters only), entity, global defaults.
    fn resolve<S: Session + ?Sized, E>(
        &self,
        ctx: &FlushContext<'_, S>,
        meta: &EntityMeta<E>,
        options: &Options,
        operation: Operation,
        property: Option<&ConsistencyPair>,
    ) -> Result<ResolvedConsistency, InternalError> {
        let ambient = options.ambient()?.or(ctx.ambient());
        let level = self
            .policy
            .resolve(operation, &ambient, property, meta.consistency());
        let serial = options
            .is_conditional()
            .then(|| self.policy.resolve_serial(&ambient, meta.serial_consistency()));

        Ok(ResolvedConsistency { level, serial })
    }

    fn ttl<E>(meta: &EntityMeta<E>, options: &Options) -> u32 {
        options.ttl.or(meta.ttl()).unwrap_or(0)
    }

    fn cas<'m, E>(
        meta: &'m EntityMeta<E>,
        options: &Options,
    ) -> Result<(Vec<&'m str>, Vec<Value>), InternalError> {
        let mut columns = Vec::with_capacity(options.cas_conditions.len());
        let mut values = Vec::with_capacity(options.cas_conditions.len());

        for condition in &options.cas_conditions {
            let property = meta.property_or_err(&condition.property)?;
            if property.property_type().is_id() || property.is_counter() {
                return Err(InternalError::unsupported(
                    ErrorOrigin::Statement,
                    format!(
                        "'{}' cannot be used in a CAS condition",
                        condition.property
                    ),
                ));
            }
            if let Some(ty) = property.cql_type()
                && !ty.accepts(&condition.value)
            {
                return Err(InternalError::argument_invalid(
                    ErrorOrigin::Statement,
                    format!(
                        "CAS condition on '{}' expects {ty}, found {}",
                        condition.property,
                        condition.value.label()
                    ),
                ));
            }
            columns.push(property.column());
            values.push(condition.value.clone());
        }

        Ok((columns, values))
    }

    fn non_id_properties<'m, E>(
        meta: &'m EntityMeta<E>,
        names: &[&str],
    ) -> Result<Vec<&'m PropertyMeta<E>>, InternalError> {
        names
            .iter()
            .map(|name| {
                let property = meta.property_or_err(name)?;
                if property.property_type().is_id() {
                    return Err(InternalError::unsupported(
                        ErrorOrigin::Statement,
                        format!("primary key '{name}' cannot be updated or deleted as a column"),
                    ));
                }
                Ok(property)
            })
            .collect()
    }

    fn counter_property<'m, E>(
        meta: &'m EntityMeta<E>,
        name: &str,
    ) -> Result<&'m PropertyMeta<E>, InternalError> {
        let property = meta.property_or_err(name)?;
        if property.is_counter() {
            Ok(property)
        } else {
            Err(InternalError::unsupported(
                ErrorOrigin::Statement,
                format!("'{name}' is not a counter property"),
            ))
        }
    }

    fn counter_cell<E>(
        meta: &EntityMeta<E>,
        property: &PropertyMeta<E>,
        key: &KeyValues,
    ) -> CounterCell {
        CounterCell {
            fqcn: meta.class_name().to_string(),
            primary_key: meta.counter_primary_key(key),
            property: property.name().to_string(),
        }
    }

    fn check_applied<E>(meta: &EntityMeta<E>, rows: Option<&RowSet>) -> Result<(), InternalError> {
        match rows {
            Some(rows) if !rows.applied() => Err(InternalError::conditional_rejected(format!(
                "conditional write on '{}' was not applied",
                meta.qualified_table()
            ))),
            _ => Ok(()),
        }
    }
}

fn counter_out_of_range<E>(property: &PropertyMeta<E>) -> InternalError {
    ChangesetError::CounterOutOfRange {
        property: property.name().to_string(),
    }
    .into()
}

fn counter_value<E>(property: &PropertyMeta<E>, value: Value) -> Result<i64, InternalError> {
    match value {
        Value::BigInt(value) => Ok(value),
        Value::Null => Ok(0),
        other => Err(InternalError::argument_invalid(
            ErrorOrigin::Binder,
            format!(
                "counter '{}' holds {}, expected bigint",
                property.name(),
                other.label()
            ),
        )),
    }
}
