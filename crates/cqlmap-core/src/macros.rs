// field_accessor
/// Build a `FieldAccessor` for `$entity.$field`, converting through
/// `Value::from` and `FromValue`.
#[macro_export]
macro_rules! field_accessor {
    ($entity:ty, $field:ident) => {
        $crate::model::FieldAccessor::<$entity>::new(
            |entity| $crate::value::Value::from(entity.$field.clone()),
            |entity, value| {
                entity.$field = $crate::value::FromValue::from_value(value)?;
                Ok(())
            },
        )
    };
}
