//! Positional argument views over JSON values
//!
//! Constructor arguments, method arguments, records and parameters are all
//! [`serde_json::Value`]s, so recipes can be assembled at runtime (or with
//! `json!`) without naming the concrete types involved.

use crate::ArgumentError;
use serde_json::Value;

/// Name of a value's kind, used in error messages
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Positional view over a call's arguments.
///
/// Passed to constructors and methods; every accessor reports a precise
/// [`ArgumentError`] instead of panicking.
///
/// # Examples
///
/// ```rust
/// use service_container::{Args, json};
///
/// let values = [json!("app.log"), json!(5)];
/// let args = Args::new(&values);
///
/// assert_eq!(args.str(0).unwrap(), "app.log");
/// assert_eq!(args.int(1).unwrap(), 5);
/// assert!(args.bool(1).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    #[inline]
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [Value] {
        self.values
    }

    /// Fail unless exactly `expected` arguments were supplied
    #[inline]
    pub fn expect_len(&self, expected: usize) -> Result<(), ArgumentError> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(ArgumentError::Arity {
                expected,
                got: self.values.len(),
            })
        }
    }

    /// Raw value at `index`
    #[inline]
    pub fn value(&self, index: usize) -> Result<&'a Value, ArgumentError> {
        self.values
            .get(index)
            .ok_or(ArgumentError::Missing { index })
    }

    pub fn str(&self, index: usize) -> Result<&'a str, ArgumentError> {
        let value = self.value(index)?;
        value.as_str().ok_or_else(|| mismatch(index, "string", value))
    }

    pub fn int(&self, index: usize) -> Result<i64, ArgumentError> {
        let value = self.value(index)?;
        value.as_i64().ok_or_else(|| mismatch(index, "int", value))
    }

    /// Float view; integers widen to `f64`
    pub fn float(&self, index: usize) -> Result<f64, ArgumentError> {
        let value = self.value(index)?;
        value.as_f64().ok_or_else(|| mismatch(index, "float", value))
    }

    pub fn bool(&self, index: usize) -> Result<bool, ArgumentError> {
        let value = self.value(index)?;
        value.as_bool().ok_or_else(|| mismatch(index, "bool", value))
    }
}

fn mismatch(index: usize, expected: &'static str, found: &Value) -> ArgumentError {
    ArgumentError::Type {
        index,
        expected,
        found: kind(found),
    }
}
