use std::any::Any;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{Argument, WindowClause, check_arity};

use super::{DependencySlots, merge_unsupported};
use crate::aggregate::basic::CountFunction;
use crate::aggregate::collection::PositionalFunction;
use crate::aggregate::{AggregateFunction, AnalyticFunction, Dependency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetDirection {
    Lag,
    Lead,
}

impl OffsetDirection {
    pub fn name(self) -> &'static str {
        match self {
            OffsetDirection::Lag => "Lag",
            OffsetDirection::Lead => "Lead",
        }
    }
}

/// `Lag(field[, offset[, default]])` / `Lead(...)`.
///
/// Reads `First(field)` and `Count(*)` over the one-row frame `offset` rows
/// away. The count tells a missing row (default applies) apart from a row
/// whose field is null.
#[derive(Debug, Clone)]
pub struct OffsetFunction {
    direction: OffsetDirection,
    arguments: Vec<Argument>,
    field: String,
    offset: i64,
    default: Value,
    slots: DependencySlots,
}

impl OffsetFunction {
    pub fn new(direction: OffsetDirection, arguments: &[Argument]) -> Result<Self> {
        let name = direction.name();
        check_arity(name, arguments, 1, 3)?;
        let field = arguments[0].expect_field(name)?;
        let offset = match arguments.get(1) {
            Some(arg) => arg.expect_i64(name)?,
            None => 1,
        };
        if offset.checked_neg().is_none() {
            return Err(Error::specification(format!(
                "{} offset {} is out of range",
                name, offset
            )));
        }
        let default = match arguments.get(2) {
            Some(Argument::Literal(value)) => value.clone(),
            Some(other) => {
                return Err(Error::specification(format!(
                    "{} default must be a literal, got {}",
                    name, other
                )));
            }
            None => Value::Null,
        };
        Ok(Self {
            direction,
            arguments: arguments.to_vec(),
            field,
            offset,
            default,
            slots: DependencySlots::new(2),
        })
    }

    pub fn lag(arguments: &[Argument]) -> Result<Self> {
        Self::new(OffsetDirection::Lag, arguments)
    }

    pub fn lead(arguments: &[Argument]) -> Result<Self> {
        Self::new(OffsetDirection::Lead, arguments)
    }

    /// The one-row frame: `offset` rows back for lag, forward for lead.
    pub fn frame(&self) -> WindowClause {
        let back = match self.direction {
            OffsetDirection::Lag => self.offset,
            OffsetDirection::Lead => -self.offset,
        };
        WindowClause::rows(Some(back), Some(-back))
    }

    fn compute(&self) -> Result<Value> {
        let rows = self.slots.int(self.direction.name(), 1)?;
        if rows == 0 {
            Ok(self.default.clone())
        } else {
            Ok(self.slots.get(0).clone())
        }
    }
}

impl AggregateFunction for OffsetFunction {
    fn name(&self) -> &'static str {
        self.direction.name()
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.slots.clear();
    }

    fn iterate(&mut self, _values: &[Value]) -> Result<()> {
        Ok(())
    }

    fn merge(&mut self, _other: &dyn AggregateFunction) -> Result<()> {
        merge_unsupported(self)
    }

    fn terminate(&mut self) -> Result<Value> {
        self.compute()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for OffsetFunction {
    fn delete(&mut self, _values: &[Value]) -> Result<()> {
        Ok(())
    }

    fn takes_window_clause(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<Dependency> {
        let frame = self.frame();
        vec![
            Dependency::new(Box::new(PositionalFunction::first(self.field.clone())), frame),
            Dependency::new(Box::new(CountFunction::all()), frame),
        ]
    }

    fn is_dependent(&self) -> bool {
        true
    }

    fn set_dependency_value(&mut self, index: usize, value: Value) -> Result<()> {
        self.slots.set(self.direction.name(), index, value)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames() {
        let lag = OffsetFunction::lag(&[Argument::field("v")]).unwrap();
        assert_eq!(lag.frame(), WindowClause::rows(Some(1), Some(-1)));

        let lead = OffsetFunction::lead(&[Argument::field("v"), Argument::literal(2i64)]).unwrap();
        assert_eq!(lead.frame(), WindowClause::rows(Some(-2), Some(2)));
    }

    #[test]
    fn test_default_only_for_missing_row() {
        let args = [
            Argument::field("v"),
            Argument::literal(1i64),
            Argument::literal(-1i64),
        ];
        let mut lag = OffsetFunction::lag(&args).unwrap();

        lag.set_dependency_value(0, Value::null()).unwrap();
        lag.set_dependency_value(1, Value::int64(0)).unwrap();
        assert_eq!(lag.terminate().unwrap(), Value::int64(-1));

        lag.set_dependency_value(0, Value::null()).unwrap();
        lag.set_dependency_value(1, Value::int64(1)).unwrap();
        assert_eq!(lag.terminate().unwrap(), Value::null());

        lag.set_dependency_value(0, Value::int64(5)).unwrap();
        assert_eq!(lag.terminate().unwrap(), Value::int64(5));
    }

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        let error = OffsetFunction::lag(&[Argument::field("v"), Argument::literal(i64::MIN)])
            .err()
            .unwrap();
        assert!(matches!(error, Error::Specification(_)));
        assert!(
            OffsetFunction::lead(&[Argument::field("v"), Argument::literal(i64::MIN)]).is_err()
        );

        let lead =
            OffsetFunction::lead(&[Argument::field("v"), Argument::literal(i64::MAX)]).unwrap();
        assert_eq!(
            lead.frame(),
            WindowClause::rows(Some(-i64::MAX), Some(i64::MAX))
        );
    }

    #[test]
    fn test_argument_validation() {
        assert!(OffsetFunction::lag(&[]).is_err());
        assert!(OffsetFunction::lag(&[Argument::field("v"), Argument::literal(0.5)]).is_err());
        assert!(
            OffsetFunction::lead(&[
                Argument::field("v"),
                Argument::literal(1i64),
                Argument::field("w")
            ])
            .is_err()
        );
    }
}
