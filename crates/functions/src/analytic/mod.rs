//! Row-position functions (rank family) and dependent functions that are
//! computed from the terminated values of internally generated helpers.

pub mod distribution;
pub mod offset;
pub mod ranking;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;

use crate::aggregate::AggregateFunction;

static NULL: Value = Value::Null;

pub(crate) fn merge_unsupported(function: &dyn AggregateFunction) -> Result<()> {
    Err(Error::unsupported(format!(
        "{} does not support merge",
        function.name()
    )))
}

/// Terminated helper values for a dependent function, indexed in the order
/// its dependencies were declared.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DependencySlots {
    values: Vec<Value>,
}

impl DependencySlots {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            values: vec![Value::Null; len],
        }
    }

    pub(crate) fn set(&mut self, name: &str, index: usize, value: Value) -> Result<()> {
        let len = self.values.len();
        let slot = self.values.get_mut(index).ok_or_else(|| {
            Error::internal(format!(
                "{} has {} dependency slots, got index {}",
                name, len, index
            ))
        })?;
        *slot = value;
        Ok(())
    }

    pub(crate) fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&NULL)
    }

    pub(crate) fn int(&self, name: &str, index: usize) -> Result<i64> {
        let value = self.get(index);
        value.as_i64().ok_or_else(|| {
            Error::internal(format!(
                "{} expected an integer in dependency slot {}, got {}",
                name, index, value
            ))
        })
    }

    pub(crate) fn clear(&mut self) {
        for value in &mut self.values {
            *value = Value::Null;
        }
    }
}
