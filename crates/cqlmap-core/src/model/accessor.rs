use crate::{error::InternalError, value::Value};
use std::fmt;

pub type Getter<E> = fn(&E) -> Value;
pub type Setter<E> = fn(&mut E, Value) -> Result<(), InternalError>;

///
/// FieldAccessor
///
/// Read/write capability pair for one mapped field, resolved when the
/// metadata is declared.
///

pub struct FieldAccessor<E> {
    getter: Getter<E>,
    setter: Setter<E>,
}

impl<E> FieldAccessor<E> {
    #[must_use]
    pub const fn new(getter: Getter<E>, setter: Setter<E>) -> Self {
        Self { getter, setter }
    }

    #[must_use]
    pub fn read(&self, entity: &E) -> Value {
        (self.getter)(entity)
    }

    pub fn write(&self, entity: &mut E, value: Value) -> Result<(), InternalError> {
        (self.setter)(entity, value)
    }
}

impl<E> Clone for FieldAccessor<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for FieldAccessor<E> {}

impl<E> fmt::Debug for FieldAccessor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldAccessor")
    }
}
