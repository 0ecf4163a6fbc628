use std::collections::HashMap;

use lazy_static::lazy_static;
use sliderule_common::error::{Error, Result};
use sliderule_ir::Argument;

use crate::aggregate::AnalyticFunction;
use crate::aggregate::basic::{AvgFunction, CountFunction, SumFunction};
use crate::aggregate::boolean::{BoolFunction, BoolOp};
use crate::aggregate::collection::{CollectFunction, ConcatFunction, Position, PositionalFunction};
use crate::aggregate::extrema::{Extremum, ExtremumFunction};
use crate::aggregate::order_statistic::{ModeFunction, PercentileFunction};
use crate::aggregate::statistical::{
    BivariateFunction, BivariateKind, GeometricMeanFunction, HarmonicMeanFunction,
    VarianceFunction, VarianceKind,
};
use crate::analytic::distribution::{
    CumeDistFunction, NtileFunction, PercentRankFunction, RatioToReportFunction,
};
use crate::analytic::offset::{OffsetDirection, OffsetFunction};
use crate::analytic::ranking::{RankFunction, RankKind};

pub type FunctionConstructor = fn(&[Argument]) -> Result<Box<dyn AnalyticFunction>>;

lazy_static! {
    static ref DEFAULT_REGISTRY: FunctionRegistry = FunctionRegistry::new();
}

/// The process-wide registry of built-in functions.
pub fn default_registry() -> &'static FunctionRegistry {
    &DEFAULT_REGISTRY
}

/// Lookup key for a function name: case-insensitive, underscores ignored.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    constructors: HashMap<String, FunctionConstructor>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_builtins();
        registry
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn register_builtins(&mut self) {
        self.register("Count", |args| Ok(Box::new(CountFunction::new(args)?)));
        self.register("Sum", |args| Ok(Box::new(SumFunction::new(args)?)));
        self.register("Avg", |args| Ok(Box::new(AvgFunction::new(args)?)));
        self.register("Min", |args| {
            Ok(Box::new(ExtremumFunction::new(Extremum::Min, args)?))
        });
        self.register("Max", |args| {
            Ok(Box::new(ExtremumFunction::new(Extremum::Max, args)?))
        });

        self.register("Variance", |args| {
            Ok(Box::new(VarianceFunction::new(VarianceKind::Variance, args)?))
        });
        self.register("VariancePop", |args| {
            Ok(Box::new(VarianceFunction::new(VarianceKind::VariancePop, args)?))
        });
        self.register("StdDev", |args| {
            Ok(Box::new(VarianceFunction::new(VarianceKind::StdDev, args)?))
        });
        self.register("StdDevPop", |args| {
            Ok(Box::new(VarianceFunction::new(VarianceKind::StdDevPop, args)?))
        });
        self.register("Covariance", |args| {
            Ok(Box::new(BivariateFunction::new(BivariateKind::Covariance, args)?))
        });
        self.register("Correlation", |args| {
            Ok(Box::new(BivariateFunction::new(BivariateKind::Correlation, args)?))
        });
        self.register("GeometricMean", |args| {
            Ok(Box::new(GeometricMeanFunction::new(args)?))
        });
        self.register("HarmonicMean", |args| {
            Ok(Box::new(HarmonicMeanFunction::new(args)?))
        });

        self.register("Percentile", |args| Ok(Box::new(PercentileFunction::new(args)?)));
        self.register("Median", |args| Ok(Box::new(PercentileFunction::median(args)?)));
        self.register("Mode", |args| Ok(Box::new(ModeFunction::new(args)?)));

        self.register("First", |args| {
            Ok(Box::new(PositionalFunction::new(Position::First, args)?))
        });
        self.register("Last", |args| {
            Ok(Box::new(PositionalFunction::new(Position::Last, args)?))
        });
        self.register("Concat", |args| Ok(Box::new(ConcatFunction::new(args)?)));
        self.register("Collect", |args| Ok(Box::new(CollectFunction::new(args)?)));
        self.register("And", |args| Ok(Box::new(BoolFunction::new(BoolOp::And, args)?)));
        self.register("Or", |args| Ok(Box::new(BoolFunction::new(BoolOp::Or, args)?)));

        self.register("RowNumber", |args| {
            Ok(Box::new(RankFunction::new(RankKind::RowNumber, args)?))
        });
        self.register("Rank", |args| {
            Ok(Box::new(RankFunction::new(RankKind::Rank, args)?))
        });
        self.register("DenseRank", |args| {
            Ok(Box::new(RankFunction::new(RankKind::DenseRank, args)?))
        });

        self.register("CumeDist", |args| Ok(Box::new(CumeDistFunction::new(args)?)));
        self.register("PercentRank", |args| {
            Ok(Box::new(PercentRankFunction::new(args)?))
        });
        self.register("Ntile", |args| Ok(Box::new(NtileFunction::new(args)?)));
        self.register("RatioToReport", |args| {
            Ok(Box::new(RatioToReportFunction::new(args)?))
        });
        self.register("Lag", |args| {
            Ok(Box::new(OffsetFunction::new(OffsetDirection::Lag, args)?))
        });
        self.register("Lead", |args| {
            Ok(Box::new(OffsetFunction::new(OffsetDirection::Lead, args)?))
        });
    }

    pub fn register(&mut self, name: &str, constructor: FunctionConstructor) {
        self.constructors.insert(normalize_name(name), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize_name(name))
    }

    pub fn create(&self, name: &str, arguments: &[Argument]) -> Result<Box<dyn AnalyticFunction>> {
        let constructor = self
            .constructors
            .get(&normalize_name(name))
            .ok_or_else(|| Error::function_not_found(name))?;
        constructor(arguments)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use sliderule_common::types::Value;

    use super::*;

    #[test]
    fn test_names_are_case_and_underscore_insensitive() {
        let registry = default_registry();
        assert!(registry.contains("row_number"));
        assert!(registry.contains("ROWNUMBER"));
        assert!(registry.contains("dense_rank"));
        assert!(registry.contains("stddev_pop"));
        let f = registry.create("sum", &[Argument::field("v")]).unwrap();
        assert_eq!(f.name(), "Sum");
    }

    #[test]
    fn test_unknown_function() {
        let err = default_registry()
            .create("Frobnicate", &[Argument::field("v")])
            .unwrap_err();
        assert!(matches!(err, Error::FunctionNotFound(_)));
        assert!(err.is_specification_error());
    }

    #[test]
    fn test_wrong_arity_is_specification_error() {
        let err = default_registry().create("Sum", &[]).unwrap_err();
        assert!(err.is_specification_error());
        let err = default_registry().create("Rank", &[Argument::field("v")]).unwrap_err();
        assert!(err.is_specification_error());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = FunctionRegistry::empty();
        assert!(!registry.contains("Total"));
        registry.register("Total", |args| Ok(Box::new(SumFunction::new(args)?)));
        let mut f = registry.create("total", &[Argument::field("v")]).unwrap();
        f.iterate(&[Value::int64(2)]).unwrap();
        assert_eq!(f.terminate().unwrap(), Value::int64(2));
    }

    #[test]
    fn test_every_builtin_is_registered() {
        let names = default_registry().names();
        assert_eq!(names.len(), 31);
        assert!(names.contains(&"RATIOTOREPORT"));
    }
}
