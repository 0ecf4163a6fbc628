use std::any::Any;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{Argument, WindowClause, check_arity};

use super::ranking::RankFunction;
use super::{DependencySlots, merge_unsupported};
use crate::aggregate::basic::{CountFunction, SumFunction};
use crate::aggregate::{AggregateFunction, AnalyticFunction, Dependency};

/// Shared `AggregateFunction` body for dependent functions: they never see
/// records, only helper results.
macro_rules! dependent_aggregate {
    ($ty:ty, $name:expr) => {
        impl AggregateFunction for $ty {
            fn name(&self) -> &'static str {
                $name
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
    };
}

/// Fraction of the partition ordered at or before the current row's peer
/// group: `count(range(, 0)) / count(range())`.
#[derive(Debug, Clone)]
pub struct CumeDistFunction {
    arguments: Vec<Argument>,
    slots: DependencySlots,
}

impl CumeDistFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("CumeDist", arguments, 0, 0)?;
        Ok(Self {
            arguments: Vec::new(),
            slots: DependencySlots::new(2),
        })
    }

    fn compute(&self) -> Result<Value> {
        let through_current = self.slots.int("CumeDist", 0)?;
        let total = self.slots.int("CumeDist", 1)?;
        if total == 0 {
            return Ok(Value::null());
        }
        Ok(Value::float64(through_current as f64 / total as f64))
    }
}

dependent_aggregate!(CumeDistFunction, "CumeDist");

impl AnalyticFunction for CumeDistFunction {
    fn delete(&mut self, _values: &[Value]) -> Result<()> {
        Ok(())
    }

    fn takes_window_clause(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::new(Box::new(CountFunction::all()), WindowClause::default()),
            Dependency::new(Box::new(CountFunction::all()), WindowClause::unbounded()),
        ]
    }

    fn is_dependent(&self) -> bool {
        true
    }

    fn set_dependency_value(&mut self, index: usize, value: Value) -> Result<()> {
        self.slots.set("CumeDist", index, value)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        Box::new(Self {
            arguments: Vec::new(),
            slots: DependencySlots::new(2),
        })
    }
}

/// `(rank - 1) / (count - 1)`, zero for a single-row partition.
#[derive(Debug, Clone)]
pub struct PercentRankFunction {
    arguments: Vec<Argument>,
    slots: DependencySlots,
}

impl PercentRankFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("PercentRank", arguments, 0, 0)?;
        Ok(Self {
            arguments: Vec::new(),
            slots: DependencySlots::new(2),
        })
    }

    fn compute(&self) -> Result<Value> {
        let rank = self.slots.int("PercentRank", 0)?;
        let count = self.slots.int("PercentRank", 1)?;
        if count <= 1 {
            return Ok(Value::float64(0.0));
        }
        Ok(Value::float64((rank - 1) as f64 / (count - 1) as f64))
    }
}

dependent_aggregate!(PercentRankFunction, "PercentRank");

impl AnalyticFunction for PercentRankFunction {
    fn delete(&mut self, _values: &[Value]) -> Result<()> {
        Ok(())
    }

    fn takes_window_clause(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::fixed(Box::new(RankFunction::rank())),
            Dependency::new(Box::new(CountFunction::all()), WindowClause::unbounded()),
        ]
    }

    fn is_dependent(&self) -> bool {
        true
    }

    fn set_dependency_value(&mut self, index: usize, value: Value) -> Result<()> {
        self.slots.set("PercentRank", index, value)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        Box::new(Self {
            arguments: Vec::new(),
            slots: DependencySlots::new(2),
        })
    }
}

/// Splits the partition into `n` buckets as evenly as possible; the first
/// `count % n` buckets get one extra row.
#[derive(Debug, Clone)]
pub struct NtileFunction {
    arguments: Vec<Argument>,
    buckets: i64,
    slots: DependencySlots,
}

impl NtileFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("Ntile", arguments, 1, 1)?;
        let buckets = arguments[0].expect_i64("Ntile")?;
        if buckets < 1 {
            return Err(Error::specification(format!(
                "Ntile bucket count must be positive, got {}",
                buckets
            )));
        }
        Ok(Self {
            arguments: arguments.to_vec(),
            buckets,
            slots: DependencySlots::new(2),
        })
    }

    pub fn bucket(row_number: i64, count: i64, buckets: i64) -> i64 {
        let base = count / buckets;
        let extra = count % buckets;
        let large_rows = extra * (base + 1);
        if row_number <= large_rows {
            (row_number - 1) / (base + 1) + 1
        } else {
            extra + (row_number - 1 - large_rows) / base + 1
        }
    }

    fn compute(&self) -> Result<Value> {
        let row_number = self.slots.int("Ntile", 0)?;
        let count = self.slots.int("Ntile", 1)?;
        Ok(Value::int64(Self::bucket(row_number, count, self.buckets)))
    }
}

dependent_aggregate!(NtileFunction, "Ntile");

impl AnalyticFunction for NtileFunction {
    fn delete(&mut self, _values: &[Value]) -> Result<()> {
        Ok(())
    }

    fn takes_window_clause(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::fixed(Box::new(RankFunction::row_number())),
            Dependency::new(Box::new(CountFunction::all()), WindowClause::unbounded()),
        ]
    }

    fn is_dependent(&self) -> bool {
        true
    }

    fn set_dependency_value(&mut self, index: usize, value: Value) -> Result<()> {
        self.slots.set("Ntile", index, value)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        Box::new(Self {
            arguments: self.arguments.clone(),
            buckets: self.buckets,
            slots: DependencySlots::new(2),
        })
    }
}

/// The current row's value as a fraction of the partition total.
#[derive(Debug, Clone)]
pub struct RatioToReportFunction {
    arguments: Vec<Argument>,
    field: String,
    slots: DependencySlots,
}

impl RatioToReportFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("RatioToReport", arguments, 1, 1)?;
        let field = arguments[0].expect_field("RatioToReport")?;
        Ok(Self {
            arguments: arguments.to_vec(),
            field,
            slots: DependencySlots::new(2),
        })
    }

    fn compute(&self) -> Result<Value> {
        let current = self.slots.get(0);
        let total = self.slots.get(1);
        match (current.as_f64(), total.as_f64()) {
            (Some(_), Some(t)) if t == 0.0 => Ok(Value::null()),
            (Some(c), Some(t)) => Ok(Value::float64(c / t)),
            _ => Ok(Value::null()),
        }
    }
}

dependent_aggregate!(RatioToReportFunction, "RatioToReport");

impl AnalyticFunction for RatioToReportFunction {
    fn delete(&mut self, _values: &[Value]) -> Result<()> {
        Ok(())
    }

    fn takes_window_clause(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![
            Dependency::new(
                Box::new(SumFunction::field(self.field.clone())),
                WindowClause::rows(Some(0), Some(0)),
            ),
            Dependency::new(
                Box::new(SumFunction::field(self.field.clone())),
                WindowClause::unbounded(),
            ),
        ]
    }

    fn is_dependent(&self) -> bool {
        true
    }

    fn set_dependency_value(&mut self, index: usize, value: Value) -> Result<()> {
        self.slots.set("RatioToReport", index, value)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        Box::new(Self {
            arguments: self.arguments.clone(),
            field: self.field.clone(),
            slots: DependencySlots::new(2),
        })
    }
}
