use std::any::Any;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::Argument;

use super::{AggregateFunction, AnalyticFunction, bool_input, downcast, field_arguments, first_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Logical AND / OR over non-null booleans; null when the frame has none.
#[derive(Debug, Clone)]
pub struct BoolFunction {
    op: BoolOp,
    arguments: Vec<Argument>,
    trues: u64,
    falses: u64,
}

impl BoolFunction {
    pub fn new(op: BoolOp, arguments: &[Argument]) -> Result<Self> {
        let name = match op {
            BoolOp::And => "And",
            BoolOp::Or => "Or",
        };
        Ok(Self {
            op,
            arguments: field_arguments(name, arguments, 1)?,
            trues: 0,
            falses: 0,
        })
    }
}

impl AggregateFunction for BoolFunction {
    fn name(&self) -> &'static str {
        match self.op {
            BoolOp::And => "And",
            BoolOp::Or => "Or",
        }
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.trues = 0;
        self.falses = 0;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        if value.is_null() {
            return Ok(());
        }
        if bool_input(value, self.name())? {
            self.trues += 1;
        } else {
            self.falses += 1;
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, self.name())?;
        if other.op != self.op {
            return Err(Error::internal(format!(
                "Cannot merge {} with {}",
                self.name(),
                other.name()
            )));
        }
        self.trues += other.trues;
        self.falses += other.falses;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.trues + self.falses == 0 {
            return Ok(Value::null());
        }
        let result = match self.op {
            BoolOp::And => self.falses == 0,
            BoolOp::Or => self.trues > 0,
        };
        Ok(Value::bool_val(result))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for BoolFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        if value.is_null() {
            return Ok(());
        }
        if bool_input(value, self.name())? {
            self.trues -= 1;
        } else {
            self.falses -= 1;
        }
        Ok(())
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
    fn test_and_or() {
        let arg = [Argument::field("flag")];
        let mut and = BoolFunction::new(BoolOp::And, &arg).unwrap();
        let mut or = BoolFunction::new(BoolOp::Or, &arg).unwrap();
        assert_eq!(and.terminate().unwrap(), Value::null());

        for v in [Value::bool_val(true), Value::null(), Value::bool_val(false)] {
            and.iterate(std::slice::from_ref(&v)).unwrap();
            or.iterate(std::slice::from_ref(&v)).unwrap();
        }
        assert_eq!(and.terminate().unwrap(), Value::bool_val(false));
        assert_eq!(or.terminate().unwrap(), Value::bool_val(true));

        and.delete(&[Value::bool_val(false)]).unwrap();
        assert_eq!(and.terminate().unwrap(), Value::bool_val(true));
    }

    #[test]
    fn test_non_boolean_input() {
        let mut and = BoolFunction::new(BoolOp::And, &[Argument::field("flag")]).unwrap();
        assert!(matches!(
            and.iterate(&[Value::int64(1)]),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
