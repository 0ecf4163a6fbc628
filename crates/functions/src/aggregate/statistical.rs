use std::any::Any;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::Argument;

use super::{AggregateFunction, AnalyticFunction, downcast, field_arguments, first_input, numeric_dd};
use crate::precision::DoubleDouble;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceKind {
    Variance,
    VariancePop,
    StdDev,
    StdDevPop,
}

impl VarianceKind {
    pub fn name(self) -> &'static str {
        match self {
            VarianceKind::Variance => "Variance",
            VarianceKind::VariancePop => "VariancePop",
            VarianceKind::StdDev => "StdDev",
            VarianceKind::StdDevPop => "StdDevPop",
        }
    }

    fn is_sample(self) -> bool {
        matches!(self, VarianceKind::Variance | VarianceKind::StdDev)
    }

    fn takes_root(self) -> bool {
        matches!(self, VarianceKind::StdDev | VarianceKind::StdDevPop)
    }
}

/// Sample and population variance / standard deviation from running power
/// sums kept in double-double precision.
#[derive(Debug, Clone)]
pub struct VarianceFunction {
    kind: VarianceKind,
    arguments: Vec<Argument>,
    count: u64,
    sum: DoubleDouble,
    sum_sq: DoubleDouble,
}

impl VarianceFunction {
    pub fn new(kind: VarianceKind, arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            kind,
            arguments: field_arguments(kind.name(), arguments, 1)?,
            count: 0,
            sum: DoubleDouble::ZERO,
            sum_sq: DoubleDouble::ZERO,
        })
    }

    pub fn field(kind: VarianceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            arguments: vec![Argument::field(name)],
            count: 0,
            sum: DoubleDouble::ZERO,
            sum_sq: DoubleDouble::ZERO,
        }
    }
}

impl AggregateFunction for VarianceFunction {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.count = 0;
        self.sum = DoubleDouble::ZERO;
        self.sum_sq = DoubleDouble::ZERO;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        if value.is_null() {
            return Ok(());
        }
        let x = numeric_dd(value, self.name())?;
        self.count += 1;
        self.sum += x;
        self.sum_sq += x.sqr();
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, self.name())?;
        if other.kind != self.kind {
            return Err(Error::internal(format!(
                "Cannot merge {} with {}",
                self.name(),
                other.name()
            )));
        }
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        let min_count = if self.kind.is_sample() { 2 } else { 1 };
        if self.count < min_count {
            return Ok(Value::null());
        }
        let n = DoubleDouble::from(self.count as f64);
        let divisor = if self.kind.is_sample() {
            DoubleDouble::from((self.count - 1) as f64)
        } else {
            n
        };
        let mut variance = (self.sum_sq - self.sum.sqr() / n) / divisor;
        if variance.is_negative() {
            variance = DoubleDouble::ZERO;
        }
        if self.kind.takes_root() {
            variance = variance.sqrt();
        }
        Ok(Value::float64(variance.to_f64()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for VarianceFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        if value.is_null() {
            return Ok(());
        }
        let x = numeric_dd(value, self.name())?;
        self.count -= 1;
        if self.count == 0 {
            self.sum = DoubleDouble::ZERO;
            self.sum_sq = DoubleDouble::ZERO;
        } else {
            self.sum -= x;
            self.sum_sq -= x.sqr();
        }
        Ok(())
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BivariateKind {
    Covariance,
    Correlation,
}

impl BivariateKind {
    pub fn name(self) -> &'static str {
        match self {
            BivariateKind::Covariance => "Covariance",
            BivariateKind::Correlation => "Correlation",
        }
    }
}

/// Sample covariance and Pearson correlation of `(x, y)` pairs. A pair with
/// either side null is skipped.
#[derive(Debug, Clone)]
pub struct BivariateFunction {
    kind: BivariateKind,
    arguments: Vec<Argument>,
    count: u64,
    sum_x: DoubleDouble,
    sum_y: DoubleDouble,
    sum_xx: DoubleDouble,
    sum_yy: DoubleDouble,
    sum_xy: DoubleDouble,
}

impl BivariateFunction {
    pub fn new(kind: BivariateKind, arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            kind,
            arguments: field_arguments(kind.name(), arguments, 2)?,
            count: 0,
            sum_x: DoubleDouble::ZERO,
            sum_y: DoubleDouble::ZERO,
            sum_xx: DoubleDouble::ZERO,
            sum_yy: DoubleDouble::ZERO,
            sum_xy: DoubleDouble::ZERO,
        })
    }

    fn pair(&self, values: &[Value]) -> Result<Option<(DoubleDouble, DoubleDouble)>> {
        let (x, y) = match values {
            [x, y] => (x, y),
            _ => {
                return Err(Error::internal(format!(
                    "{} expects two input values, got {}",
                    self.name(),
                    values.len()
                )));
            }
        };
        if x.is_null() || y.is_null() {
            return Ok(None);
        }
        Ok(Some((
            numeric_dd(x, self.name())?,
            numeric_dd(y, self.name())?,
        )))
    }
}

impl AggregateFunction for BivariateFunction {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.count = 0;
        self.sum_x = DoubleDouble::ZERO;
        self.sum_y = DoubleDouble::ZERO;
        self.sum_xx = DoubleDouble::ZERO;
        self.sum_yy = DoubleDouble::ZERO;
        self.sum_xy = DoubleDouble::ZERO;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        if let Some((x, y)) = self.pair(values)? {
            self.count += 1;
            self.sum_x += x;
            self.sum_y += y;
            self.sum_xx += x.sqr();
            self.sum_yy += y.sqr();
            self.sum_xy += x * y;
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, self.name())?;
        if other.kind != self.kind {
            return Err(Error::internal(format!(
                "Cannot merge {} with {}",
                self.name(),
                other.name()
            )));
        }
        self.count += other.count;
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.sum_xx += other.sum_xx;
        self.sum_yy += other.sum_yy;
        self.sum_xy += other.sum_xy;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.count < 2 {
            return Ok(Value::null());
        }
        let n = DoubleDouble::from(self.count as f64);
        match self.kind {
            BivariateKind::Covariance => {
                let numerator = self.sum_xy - self.sum_x * self.sum_y / n;
                let covariance = numerator / DoubleDouble::from((self.count - 1) as f64);
                Ok(Value::float64(covariance.to_f64()))
            }
            BivariateKind::Correlation => {
                let numerator = n * self.sum_xy - self.sum_x * self.sum_y;
                let var_x = n * self.sum_xx - self.sum_x.sqr();
                let var_y = n * self.sum_yy - self.sum_y.sqr();
                let denominator = (var_x * var_y).sqrt();
                if denominator.is_zero() || !denominator.is_finite() {
                    return Ok(Value::null());
                }
                let r = (numerator / denominator).to_f64().clamp(-1.0, 1.0);
                Ok(Value::float64(r))
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for BivariateFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        if let Some((x, y)) = self.pair(values)? {
            self.count -= 1;
            if self.count == 0 {
                self.init();
            } else {
                self.sum_x -= x;
                self.sum_y -= y;
                self.sum_xx -= x.sqr();
                self.sum_yy -= y.sqr();
                self.sum_xy -= x * y;
            }
        }
        Ok(())
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

/// `n`th root of the running product. Zeros are counted apart from the
/// product so a zero leaving the window never divides by zero.
#[derive(Debug, Clone)]
pub struct GeometricMeanFunction {
    arguments: Vec<Argument>,
    product: DoubleDouble,
    count: u64,
    zeros: u64,
}

impl GeometricMeanFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            arguments: field_arguments("GeometricMean", arguments, 1)?,
            product: DoubleDouble::ONE,
            count: 0,
            zeros: 0,
        })
    }

    fn input(value: &Value) -> Result<Option<DoubleDouble>> {
        if value.is_null() {
            return Ok(None);
        }
        let x = numeric_dd(value, "GeometricMean")?;
        if x.is_negative() {
            return Err(Error::type_mismatch(
                "non-negative input to GeometricMean",
                value.to_string(),
            ));
        }
        Ok(Some(x))
    }
}

impl AggregateFunction for GeometricMeanFunction {
    fn name(&self) -> &'static str {
        "GeometricMean"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.product = DoubleDouble::ONE;
        self.count = 0;
        self.zeros = 0;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        match Self::input(first_input(values, "GeometricMean")?)? {
            Some(x) if x.is_zero() => self.zeros += 1,
            Some(x) => {
                self.product *= x;
                self.count += 1;
            }
            None => {}
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "GeometricMean")?;
        self.product *= other.product;
        self.count += other.count;
        self.zeros += other.zeros;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.count + self.zeros == 0 {
            return Ok(Value::null());
        }
        if self.zeros > 0 {
            return Ok(Value::float64(0.0));
        }
        if !self.product.is_finite() {
            return Err(Error::overflow("GeometricMean"));
        }
        let n = u32::try_from(self.count).map_err(|_| Error::overflow("GeometricMean"))?;
        Ok(Value::float64(self.product.nth_root(n).to_f64()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for GeometricMeanFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        match Self::input(first_input(values, "GeometricMean")?)? {
            Some(x) if x.is_zero() => self.zeros -= 1,
            Some(x) => {
                self.count -= 1;
                if self.count == 0 {
                    self.product = DoubleDouble::ONE;
                } else {
                    self.product /= x;
                }
            }
            None => {}
        }
        Ok(())
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

/// `n / sum(1 / x)`; a zero input is a division by zero.
#[derive(Debug, Clone)]
pub struct HarmonicMeanFunction {
    arguments: Vec<Argument>,
    reciprocal_sum: DoubleDouble,
    count: u64,
}

impl HarmonicMeanFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            arguments: field_arguments("HarmonicMean", arguments, 1)?,
            reciprocal_sum: DoubleDouble::ZERO,
            count: 0,
        })
    }

    fn reciprocal(value: &Value) -> Result<Option<DoubleDouble>> {
        if value.is_null() {
            return Ok(None);
        }
        let x = numeric_dd(value, "HarmonicMean")?;
        if x.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(Some(x.recip()))
    }
}

impl AggregateFunction for HarmonicMeanFunction {
    fn name(&self) -> &'static str {
        "HarmonicMean"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.reciprocal_sum = DoubleDouble::ZERO;
        self.count = 0;
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        if let Some(r) = Self::reciprocal(first_input(values, "HarmonicMean")?)? {
            self.reciprocal_sum += r;
            self.count += 1;
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "HarmonicMean")?;
        self.reciprocal_sum += other.reciprocal_sum;
        self.count += other.count;
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.count == 0 {
            return Ok(Value::null());
        }
        if self.reciprocal_sum.is_zero() {
            return Err(Error::DivisionByZero);
        }
        let mean = DoubleDouble::from(self.count as f64) / self.reciprocal_sum;
        Ok(Value::float64(mean.to_f64()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for HarmonicMeanFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        if let Some(r) = Self::reciprocal(first_input(values, "HarmonicMean")?)? {
            self.count -= 1;
            if self.count == 0 {
                self.reciprocal_sum = DoubleDouble::ZERO;
            } else {
                self.reciprocal_sum -= r;
            }
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

    fn feed(function: &mut dyn AnalyticFunction, values: &[f64]) {
        for v in values {
            function.iterate(&[Value::float64(*v)]).unwrap();
        }
    }

    fn as_f64(value: Value) -> f64 {
        value.as_f64().unwrap()
    }

    #[test]
    fn test_variance_family() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let arg = [Argument::field("v")];

        let mut pop = VarianceFunction::new(VarianceKind::VariancePop, &arg).unwrap();
        feed(&mut pop, &data);
        assert!((as_f64(pop.terminate().unwrap()) - 4.0).abs() < 1e-12);

        let mut std_pop = VarianceFunction::new(VarianceKind::StdDevPop, &arg).unwrap();
        feed(&mut std_pop, &data);
        assert!((as_f64(std_pop.terminate().unwrap()) - 2.0).abs() < 1e-12);

        let mut sample = VarianceFunction::new(VarianceKind::Variance, &arg).unwrap();
        feed(&mut sample, &data);
        assert!((as_f64(sample.terminate().unwrap()) - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_variance_needs_two_values() {
        let mut sample = VarianceFunction::field(VarianceKind::Variance, "v");
        feed(&mut sample, &[3.0]);
        assert_eq!(sample.terminate().unwrap(), Value::null());

        let mut pop = VarianceFunction::field(VarianceKind::VariancePop, "v");
        feed(&mut pop, &[3.0]);
        assert_eq!(pop.terminate().unwrap(), Value::float64(0.0));
    }

    #[test]
    fn test_variance_merge_matches_concatenation() {
        let mut left = VarianceFunction::field(VarianceKind::Variance, "v");
        feed(&mut left, &[1.0, 2.0, 3.0]);
        let mut right = VarianceFunction::field(VarianceKind::Variance, "v");
        feed(&mut right, &[10.0, 20.0]);
        left.merge(&right).unwrap();

        let mut whole = VarianceFunction::field(VarianceKind::Variance, "v");
        feed(&mut whole, &[1.0, 2.0, 3.0, 10.0, 20.0]);

        let merged = as_f64(left.terminate().unwrap());
        let direct = as_f64(whole.terminate().unwrap());
        assert!((merged - direct).abs() < 1e-12);
    }

    #[test]
    fn test_variance_delete_is_inverse_of_iterate() {
        let mut var = VarianceFunction::field(VarianceKind::Variance, "v");
        feed(&mut var, &[1.5, 2.5, 10.25]);
        let before = as_f64(var.terminate().unwrap());
        var.iterate(&[Value::float64(1e9)]).unwrap();
        var.delete(&[Value::float64(1e9)]).unwrap();
        let after = as_f64(var.terminate().unwrap());
        assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn test_covariance_and_correlation() {
        let args = [Argument::field("x"), Argument::field("y")];
        let mut cov = BivariateFunction::new(BivariateKind::Covariance, &args).unwrap();
        let mut corr = BivariateFunction::new(BivariateKind::Correlation, &args).unwrap();
        for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)] {
            let pair = [Value::float64(x), Value::float64(y)];
            cov.iterate(&pair).unwrap();
            corr.iterate(&pair).unwrap();
        }
        cov.iterate(&[Value::null(), Value::float64(1.0)]).unwrap();
        assert!((as_f64(cov.terminate().unwrap()) - 2.0).abs() < 1e-12);
        assert!((as_f64(corr.terminate().unwrap()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_of_constant_is_null() {
        let args = [Argument::field("x"), Argument::field("y")];
        let mut corr = BivariateFunction::new(BivariateKind::Correlation, &args).unwrap();
        for y in [1.0, 2.0] {
            corr.iterate(&[Value::float64(5.0), Value::float64(y)]).unwrap();
        }
        assert_eq!(corr.terminate().unwrap(), Value::null());
    }

    #[test]
    fn test_geometric_mean() {
        let mut gm = GeometricMeanFunction::new(&[Argument::field("v")]).unwrap();
        feed(&mut gm, &[2.0, 8.0]);
        assert!((as_f64(gm.terminate().unwrap()) - 4.0).abs() < 1e-12);

        gm.iterate(&[Value::int64(0)]).unwrap();
        assert_eq!(gm.terminate().unwrap(), Value::float64(0.0));
        gm.delete(&[Value::int64(0)]).unwrap();
        gm.delete(&[Value::float64(2.0)]).unwrap();
        assert!((as_f64(gm.terminate().unwrap()) - 8.0).abs() < 1e-12);

        assert!(gm.iterate(&[Value::int64(-1)]).is_err());
    }

    #[test]
    fn test_harmonic_mean() {
        let mut hm = HarmonicMeanFunction::new(&[Argument::field("v")]).unwrap();
        feed(&mut hm, &[1.0, 4.0, 4.0]);
        assert!((as_f64(hm.terminate().unwrap()) - 2.0).abs() < 1e-12);
        assert!(matches!(
            hm.iterate(&[Value::int64(0)]),
            Err(Error::DivisionByZero)
        ));
    }
}
