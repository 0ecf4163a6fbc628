//! Aggregate and analytic function contracts and the built-in accumulators.

pub mod basic;
pub mod boolean;
pub mod collection;
pub mod extrema;
pub mod order_statistic;
pub mod statistical;

use std::any::Any;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{Argument, WindowClause};

use crate::precision::DoubleDouble;

/// The init/iterate/merge/terminate lifecycle shared by every function.
///
/// `iterate` receives the values of the function's input arguments
/// ([`Argument::Field`] and [`Argument::All`]) for one record, in
/// declaration order. Literal arguments are bound at construction.
pub trait AggregateFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn arguments(&self) -> &[Argument];

    fn init(&mut self);

    fn iterate(&mut self, values: &[Value]) -> Result<()>;

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()>;

    fn terminate(&mut self) -> Result<Value>;

    fn as_any(&self) -> &dyn Any;

    fn input_arguments(&self) -> Vec<&Argument> {
        self.arguments().iter().filter(|a| a.is_input()).collect()
    }

    fn key(&self) -> FunctionKey {
        FunctionKey::new(self.name(), self.arguments().to_vec())
    }
}

/// A function usable inside a sliding window.
///
/// `delete` must exactly undo a previous `iterate` of the same values.
pub trait AnalyticFunction: AggregateFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()>;

    fn takes_window_clause(&self) -> bool {
        true
    }

    /// The fixed window used when `takes_window_clause` is `false`.
    fn window_clause(&self) -> Option<WindowClause> {
        None
    }

    /// Helper functions whose terminated values this function combines.
    /// A non-empty list makes the function dependent: it is never iterated,
    /// only fed its helpers' results through `set_dependency_value`.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    fn is_dependent(&self) -> bool {
        false
    }

    fn set_dependency_value(&mut self, index: usize, _value: Value) -> Result<()> {
        Err(Error::unsupported(format!(
            "{} has no dependency slot {}",
            self.name(),
            index
        )))
    }

    /// A fresh instance with the same configuration and empty state.
    fn replicate(&self) -> Box<dyn AnalyticFunction>;
}

#[derive(Debug)]
pub struct Dependency {
    pub function: Box<dyn AnalyticFunction>,
    pub window: WindowClause,
}

impl Dependency {
    pub fn new(function: Box<dyn AnalyticFunction>, window: WindowClause) -> Self {
        Self { function, window }
    }

    /// A helper that runs over its own fixed window.
    pub fn fixed(function: Box<dyn AnalyticFunction>) -> Self {
        let window = function.window_clause().unwrap_or_default();
        Self { function, window }
    }
}

/// Identity of a function for pooling and equivalence: same concrete
/// function and same argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionKey {
    pub name: String,
    pub arguments: Vec<Argument>,
}

impl FunctionKey {
    pub fn new(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

pub(crate) fn downcast<'a, T: 'static>(
    other: &'a dyn AggregateFunction,
    name: &str,
) -> Result<&'a T> {
    other.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::internal(format!(
            "Cannot merge {} with different function {}",
            name,
            other.name()
        ))
    })
}

pub(crate) fn first_input<'a>(values: &'a [Value], name: &str) -> Result<&'a Value> {
    values
        .first()
        .ok_or_else(|| Error::internal(format!("{} received no input value", name)))
}

pub(crate) fn numeric_f64(value: &Value, name: &str) -> Result<f64> {
    if !value.is_numeric() {
        return Err(Error::type_mismatch(
            format!("numeric input to {}", name),
            value.data_type().to_string(),
        ));
    }
    value.as_f64().ok_or_else(|| {
        Error::type_mismatch(
            format!("numeric input to {}", name),
            value.data_type().to_string(),
        )
    })
}

/// Exact-where-possible numeric input: integers and decimals go through
/// their own path, floats through double-double.
pub(crate) fn numeric_dd(value: &Value, name: &str) -> Result<DoubleDouble> {
    match value {
        Value::Int64(n) => Ok(DoubleDouble::from(*n)),
        Value::Numeric(d) => {
            // Decimal to f64 loses digits past 2^53; split off the remainder.
            let hi = decimal_to_f64(d);
            let rest = Decimal::try_from(hi)
                .ok()
                .and_then(|h| d.checked_sub(h))
                .map(|r| decimal_to_f64(&r))
                .unwrap_or(0.0);
            Ok(DoubleDouble::new(hi, rest))
        }
        other => numeric_f64(other, name).map(DoubleDouble::from),
    }
}

pub(crate) fn decimal_to_f64(d: &Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    d.to_f64().unwrap_or(f64::NAN)
}

pub(crate) fn bool_input(value: &Value, name: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        Error::type_mismatch(
            format!("BOOL input to {}", name),
            value.data_type().to_string(),
        )
    })
}

/// Validates a call taking exactly `count` field arguments.
pub(crate) fn field_arguments(name: &str, args: &[Argument], count: usize) -> Result<Vec<Argument>> {
    sliderule_ir::check_arity(name, args, count, count)?;
    for arg in args {
        arg.expect_field(name)?;
    }
    Ok(args.to_vec())
}

pub(crate) fn dd_from_i128(v: i128) -> DoubleDouble {
    let hi = v as f64;
    let lo = (v - hi as i128) as f64;
    DoubleDouble::new(hi, lo)
}
