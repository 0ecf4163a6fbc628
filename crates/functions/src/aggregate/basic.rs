use std::any::Any;

use rust_decimal::Decimal;
use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{Argument, check_arity};

use super::{
    AggregateFunction, AnalyticFunction, dd_from_i128, downcast, field_arguments, first_input,
    numeric_dd,
};
use crate::precision::DoubleDouble;

/// `Count(field)` counts non-null values; `Count(*)` counts every record.
#[derive(Debug, Clone)]
pub struct CountFunction {
    arguments: Vec<Argument>,
    count: i64,
}

impl CountFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("Count", arguments, 1, 1)?;
        if !arguments[0].is_input() {
            return Err(Error::specification(format!(
                "Count expects a field name or *, got {}",
                arguments[0]
            )));
        }
        Ok(Self {
            arguments: arguments.to_vec(),
            count: 0,
        })
    }

    pub fn all() -> Self {
        Self {
            arguments: vec![Argument::All],
            count: 0,
        }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self {
            arguments: vec![Argument::field(name)],
            count: 0,
        }
    }
}

impl AggregateFunction for CountFunction {
    fn name(&self) -> &'static str {
        "Count"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.count = 0;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        if !first_input(values, "Count")?.is_null() {
            self.count += 1;
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "Count")?;
        self.count += other.count;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        Ok(Value::int64(self.count))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for CountFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        if !first_input(values, "Count")?.is_null() {
            self.count -= 1;
        }
        Ok(())
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

/// Integer input sums exactly to `Int64`, decimals to `Numeric`, and any
/// float input switches the result to a double-double `Float64`.
#[derive(Debug, Clone)]
pub struct SumFunction {
    arguments: Vec<Argument>,
    int_sum: i128,
    decimal_sum: Decimal,
    float_sum: DoubleDouble,
    int_count: u64,
    decimal_count: u64,
    float_count: u64,
}

impl SumFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        let arguments = field_arguments("Sum", arguments, 1)?;
        Ok(Self {
            arguments,
            int_sum: 0,
            decimal_sum: Decimal::ZERO,
            float_sum: DoubleDouble::ZERO,
            int_count: 0,
            decimal_count: 0,
            float_count: 0,
        })
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self {
            arguments: vec![Argument::field(name)],
            int_sum: 0,
            decimal_sum: Decimal::ZERO,
            float_sum: DoubleDouble::ZERO,
            int_count: 0,
            decimal_count: 0,
            float_count: 0,
        }
    }

    fn count(&self) -> u64 {
        self.int_count + self.decimal_count + self.float_count
    }

    fn apply(&mut self, value: &Value, sign: i8) -> Result<()> {
        match value {
            Value::Null => {}
            Value::Int64(n) => {
                if sign > 0 {
                    self.int_sum += *n as i128;
                    self.int_count += 1;
                } else {
                    self.int_sum -= *n as i128;
                    self.int_count -= 1;
                }
            }
            Value::Numeric(d) => {
                let next = if sign > 0 {
                    self.decimal_sum.checked_add(*d)
                } else {
                    self.decimal_sum.checked_sub(*d)
                };
                self.decimal_sum = next.ok_or_else(|| Error::overflow("Sum"))?;
                if sign > 0 {
                    self.decimal_count += 1;
                } else {
                    self.decimal_count -= 1;
                }
            }
            Value::Float64(f) => {
                if sign > 0 {
                    self.float_sum = self.float_sum.add_f64(f.0);
                    self.float_count += 1;
                } else {
                    self.float_sum = self.float_sum.add_f64(-f.0);
                    self.float_count -= 1;
                    if self.float_count == 0 {
                        self.float_sum = DoubleDouble::ZERO;
                    }
                }
            }
            other => {
                return Err(Error::type_mismatch(
                    "numeric input to Sum",
                    other.data_type().to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl AggregateFunction for SumFunction {
    fn name(&self) -> &'static str {
        "Sum"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.int_sum = 0;
        self.decimal_sum = Decimal::ZERO;
        self.float_sum = DoubleDouble::ZERO;
        self.int_count = 0;
        self.decimal_count = 0;
        self.float_count = 0;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Sum")?;
        self.apply(value, 1)
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "Sum")?;
        self.int_sum += other.int_sum;
        self.decimal_sum = self
            .decimal_sum
            .checked_add(other.decimal_sum)
            .ok_or_else(|| Error::overflow("Sum"))?;
        self.float_sum += other.float_sum;
        self.int_count += other.int_count;
        self.decimal_count += other.decimal_count;
        self.float_count += other.float_count;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.count() == 0 {
            return Ok(Value::null());
        }

        if self.float_count > 0 {
            let total = self.float_sum
                + dd_from_i128(self.int_sum)
                + numeric_dd(&Value::Numeric(self.decimal_sum), "Sum")?;
            return Ok(Value::float64(total.to_f64()));
        }

        if self.decimal_count > 0 {
            let ints = Decimal::try_from_i128_with_scale(self.int_sum, 0)
                .map_err(|_| Error::overflow("Sum"))?;
            let total = self
                .decimal_sum
                .checked_add(ints)
                .ok_or_else(|| Error::overflow("Sum"))?;
            return Ok(Value::numeric(total));
        }

        i64::try_from(self.int_sum)
            .map(Value::int64)
            .map_err(|_| Error::overflow("Sum"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for SumFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Sum")?;
        self.apply(value, -1)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

#[derive(Debug, Clone)]
pub struct AvgFunction {
    arguments: Vec<Argument>,
    sum: DoubleDouble,
    count: u64,
}

impl AvgFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        let arguments = field_arguments("Avg", arguments, 1)?;
        Ok(Self {
            arguments,
            sum: DoubleDouble::ZERO,
            count: 0,
        })
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self {
            arguments: vec![Argument::field(name)],
            sum: DoubleDouble::ZERO,
            count: 0,
        }
    }
}

impl AggregateFunction for AvgFunction {
    fn name(&self) -> &'static str {
        "Avg"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.sum = DoubleDouble::ZERO;
        self.count = 0;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Avg")?;
        if value.is_null() {
            return Ok(());
        }
        self.sum += numeric_dd(value, "Avg")?;
        self.count += 1;
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "Avg")?;
        self.sum += other.sum;
        self.count += other.count;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.count == 0 {
            return Ok(Value::null());
        }
        let avg = self.sum / DoubleDouble::from(self.count as f64);
        Ok(Value::float64(avg.to_f64()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for AvgFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Avg")?;
        if value.is_null() {
            return Ok(());
        }
        self.sum -= numeric_dd(value, "Avg")?;
        self.count -= 1;
        if self.count == 0 {
            self.sum = DoubleDouble::ZERO;
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

    fn run(function: &mut dyn AnalyticFunction, values: &[Value]) -> Value {
        function.init();
        for v in values {
            function.iterate(std::slice::from_ref(v)).unwrap();
        }
        function.terminate().unwrap()
    }

    #[test]
    fn test_count_skips_nulls_unless_all() {
        let values = [Value::int64(1), Value::null(), Value::int64(3)];
        assert_eq!(run(&mut CountFunction::field("v"), &values), Value::int64(2));

        let mut all = CountFunction::all();
        all.init();
        for _ in 0..3 {
            all.iterate(&[Value::int64(1)]).unwrap();
        }
        assert_eq!(all.terminate().unwrap(), Value::int64(3));
    }

    #[test]
    fn test_sum_result_types() {
        let ints = [Value::int64(1), Value::int64(2), Value::null()];
        assert_eq!(run(&mut SumFunction::field("v"), &ints), Value::int64(3));

        let decimals = [Value::int64(1), Value::numeric(Decimal::new(25, 1))];
        assert_eq!(
            run(&mut SumFunction::field("v"), &decimals),
            Value::numeric(Decimal::new(35, 1))
        );

        let floats = [Value::int64(1), Value::float64(0.5)];
        assert_eq!(
            run(&mut SumFunction::field("v"), &floats),
            Value::float64(1.5)
        );

        assert_eq!(run(&mut SumFunction::field("v"), &[]), Value::null());
    }

    #[test]
    fn test_sum_delete_restores_integer_result() {
        let mut sum = SumFunction::field("v");
        sum.iterate(&[Value::int64(5)]).unwrap();
        sum.iterate(&[Value::float64(0.25)]).unwrap();
        sum.delete(&[Value::float64(0.25)]).unwrap();
        assert_eq!(sum.terminate().unwrap(), Value::int64(5));
    }

    #[test]
    fn test_sum_rejects_strings() {
        let mut sum = SumFunction::field("v");
        let err = sum.iterate(&[Value::string("x")]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_sum_overflow() {
        let mut sum = SumFunction::field("v");
        sum.iterate(&[Value::int64(i64::MAX)]).unwrap();
        sum.iterate(&[Value::int64(1)]).unwrap();
        assert!(matches!(sum.terminate(), Err(Error::Overflow(_))));
        sum.delete(&[Value::int64(1)]).unwrap();
        assert_eq!(sum.terminate().unwrap(), Value::int64(i64::MAX));
    }

    #[test]
    fn test_avg_and_merge() {
        let mut a = AvgFunction::field("v");
        a.iterate(&[Value::int64(1)]).unwrap();
        a.iterate(&[Value::int64(2)]).unwrap();
        let mut b = AvgFunction::field("v");
        b.iterate(&[Value::int64(6)]).unwrap();
        a.merge(&b).unwrap();
        assert_eq!(a.terminate().unwrap(), Value::float64(3.0));
    }

    #[test]
    fn test_merge_with_other_function_fails() {
        let mut a = AvgFunction::field("v");
        let b = SumFunction::field("v");
        assert!(a.merge(&b).is_err());
    }
}
