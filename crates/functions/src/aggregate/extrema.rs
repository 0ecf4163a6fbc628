use std::any::Any;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::Argument;

use super::{AggregateFunction, AnalyticFunction, downcast, field_arguments, first_input};
use crate::multiset::FrequencyMultiset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// `Min`/`Max` over a frequency multiset so that sliding the window start
/// removes exactly the departing value.
#[derive(Debug, Clone)]
pub struct ExtremumFunction {
    kind: Extremum,
    arguments: Vec<Argument>,
    values: FrequencyMultiset,
}

impl ExtremumFunction {
    pub fn new(kind: Extremum, arguments: &[Argument]) -> Result<Self> {
        let name = match kind {
            Extremum::Min => "Min",
            Extremum::Max => "Max",
        };
        Ok(Self {
            kind,
            arguments: field_arguments(name, arguments, 1)?,
            values: FrequencyMultiset::new(),
        })
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self {
            kind: Extremum::Min,
            arguments: vec![Argument::field(field)],
            values: FrequencyMultiset::new(),
        }
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self {
            kind: Extremum::Max,
            arguments: vec![Argument::field(field)],
            values: FrequencyMultiset::new(),
        }
    }
}

impl AggregateFunction for ExtremumFunction {
    fn name(&self) -> &'static str {
        match self.kind {
            Extremum::Min => "Min",
            Extremum::Max => "Max",
        }
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.values.clear();
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        if value.is_null() {
            return Ok(());
        }
        self.values.insert(value.clone())
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
        self.values.merge(&other.values);
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        let value = match self.kind {
            Extremum::Min => self.values.first(),
            Extremum::Max => self.values.last(),
        };
        Ok(value.cloned().unwrap_or(Value::Null))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for ExtremumFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        if !value.is_null() && !self.values.remove(value) {
            return Err(Error::internal(format!(
                "{} deleted {} which is not in its frame",
                self.name(),
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
