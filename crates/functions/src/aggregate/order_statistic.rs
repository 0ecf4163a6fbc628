use std::any::Any;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{Argument, check_arity};

use super::{AggregateFunction, AnalyticFunction, downcast, field_arguments, first_input};
use crate::multiset::FrequencyMultiset;

/// Continuous percentile: the value at logical index `fraction * (n - 1)`
/// of the sorted frame, interpolated linearly between neighbours.
#[derive(Debug, Clone)]
pub struct PercentileFunction {
    name: &'static str,
    arguments: Vec<Argument>,
    fraction: f64,
    values: FrequencyMultiset,
}

impl PercentileFunction {
    /// `Percentile(fraction, field)`.
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("Percentile", arguments, 2, 2)?;
        let fraction = arguments[0].expect_f64("Percentile")?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::specification(format!(
                "Percentile fraction must be between 0 and 1, got {}",
                fraction
            )));
        }
        arguments[1].expect_field("Percentile")?;
        Ok(Self {
            name: "Percentile",
            arguments: arguments.to_vec(),
            fraction,
            values: FrequencyMultiset::new(),
        })
    }

    /// `Median(field)`, the 0.5 percentile.
    pub fn median(arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            name: "Median",
            arguments: field_arguments("Median", arguments, 1)?,
            fraction: 0.5,
            values: FrequencyMultiset::new(),
        })
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }
}

impl AggregateFunction for PercentileFunction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.values.clear();
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name)?;
        if value.is_null() {
            return Ok(());
        }
        self.values.insert(value.clone())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, self.name)?;
        self.values.merge(&other.values);
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.values.is_empty() {
            return Ok(Value::null());
        }
        let index = self.fraction * (self.values.len() - 1) as f64;
        self.values.interpolate(index)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for PercentileFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name)?;
        if !value.is_null() && !self.values.remove(value) {
            return Err(Error::internal(format!(
                "{} deleted {} which is not in its frame",
                self.name,
                value
            )));
        }
        Ok(())
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

/// Most frequent non-null value; ties resolve to the smallest.
#[derive(Debug, Clone)]
pub struct ModeFunction {
    arguments: Vec<Argument>,
    values: FrequencyMultiset,
}

impl ModeFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            arguments: field_arguments("Mode", arguments, 1)?,
            values: FrequencyMultiset::new(),
        })
    }
}

impl AggregateFunction for ModeFunction {
    fn name(&self) -> &'static str {
        "Mode"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.values.clear();
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Mode")?;
        if value.is_null() {
            return Ok(());
        }
        self.values.insert(value.clone())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "Mode")?;
        self.values.merge(&other.values);
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        Ok(self.values.mode().cloned().unwrap_or(Value::Null))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for ModeFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Mode")?;
        if !value.is_null() && !self.values.remove(value) {
            return Err(Error::internal(format!(
                "{} deleted {} which is not in its frame",
                "Mode",
                value
            )));
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

    fn feed(function: &mut dyn AnalyticFunction, values: &[i64]) {
        for v in values {
            function.iterate(&[Value::int64(*v)]).unwrap();
        }
    }

    #[test]
    fn test_percentile_interpolates() {
        let args = [Argument::literal(0.25), Argument::field("v")];
        let mut p = PercentileFunction::new(&args).unwrap();
        feed(&mut p, &[40, 10, 30, 20, 50]);
        // index 0.25 * 4 = 1 -> exactly the second value
        assert_eq!(p.terminate().unwrap(), Value::int64(20));

        let args = [Argument::literal(0.9), Argument::field("v")];
        let mut p = PercentileFunction::new(&args).unwrap();
        feed(&mut p, &[10, 20]);
        let v = p.terminate().unwrap().as_f64().unwrap();
        assert!((v - 19.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_fraction_is_validated() {
        let args = [Argument::literal(1.5), Argument::field("v")];
        let err = PercentileFunction::new(&args).unwrap_err();
        assert!(err.is_specification_error());

        let args = [Argument::field("v"), Argument::literal(0.5)];
        assert!(PercentileFunction::new(&args).is_err());
    }

    #[test]
    fn test_median_after_delete() {
        let mut median = PercentileFunction::median(&[Argument::field("v")]).unwrap();
        feed(&mut median, &[1, 2, 3, 4]);
        assert_eq!(median.terminate().unwrap(), Value::float64(2.5));
        median.delete(&[Value::int64(1)]).unwrap();
        assert_eq!(median.terminate().unwrap(), Value::int64(3));
        assert_eq!(median.name(), "Median");
    }

    #[test]
    fn test_mode() {
        let mut mode = ModeFunction::new(&[Argument::field("v")]).unwrap();
        feed(&mut mode, &[3, 1, 3, 1, 2]);
        assert_eq!(mode.terminate().unwrap(), Value::int64(1));
        mode.delete(&[Value::int64(1)]).unwrap();
        assert_eq!(mode.terminate().unwrap(), Value::int64(3));
    }

    #[test]
    fn test_delete_of_unknown_value_fails() {
        let mut median = PercentileFunction::median(&[Argument::field("v")]).unwrap();
        feed(&mut median, &[1, 2]);
        assert!(matches!(
            median.delete(&[Value::int64(9)]),
            Err(Error::Internal(_))
        ));

        let mut mode = ModeFunction::new(&[Argument::field("v")]).unwrap();
        assert!(mode.delete(&[Value::int64(1)]).is_err());
    }
}
