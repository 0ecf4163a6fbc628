//! sliderule - an in-memory analytic and aggregation engine.
//!
//! sliderule evaluates windowed analytic functions (running sums, moving
//! averages, ranks, lag/lead, cumulative distributions) over partitioned,
//! ordered slices of records, and classic group-by aggregation with
//! rollup, cube and grouping sets.
//!
//! # Architecture
//!
//! ```text
//! spec string → Parser → AnalyticAggregator → dependency expansion
//!             → sorted-view plan → sliding-window scan → AnalyticValue
//! ```
//!
//! # Example
//!
//! ```rust
//! use sliderule::{RecordAccessor, Value, row};
//!
//! let records = vec![
//!     row([("cat", Value::from("A")), ("v", Value::from(1i64))]),
//!     row([("cat", Value::from("A")), ("v", Value::from(2i64))]),
//!     row([("cat", Value::from("B")), ("v", Value::from(10i64))]),
//! ];
//!
//! let out = sliderule::analyze(
//!     &records,
//!     &RecordAccessor,
//!     &["sum(v) partitionBy(cat) range()", "lag(v, 1) partitionBy(cat) orderBy(v)"],
//! )
//! .unwrap();
//!
//! assert_eq!(out[1].value(0), Some(&Value::int64(3)));
//! assert_eq!(out[1].value(1), Some(&Value::int64(1)));
//! ```

pub use sliderule_common::error::{Error, ErrorKind, Result};
pub use sliderule_common::record::{FieldAccessor, Record, RecordAccessor, Row, row};
pub use sliderule_common::types::{DataType, Value};
pub use sliderule_executor::{
    AggregateValue, Analytic, AnalyticAggregator, AnalyticAggregatorBuilder, AnalyticComparator,
    AnalyticConfig, AnalyticValue, GroupBy, GroupByBuilder, GroupByConfig,
};
pub use sliderule_functions::{
    AggregateFunction, AnalyticFunction, FunctionPool, FunctionRegistry, default_registry,
};
pub use sliderule_ir::{
    Argument, NullOrdering, OrderByClause, OrderByElement, PartitionClause, SortDirection,
    WindowClause, WindowType,
};
pub use sliderule_parser::{AggregatorSpec, SpecCache, parse_aggregator_spec};

/// Runs `specs` over `records` with a default [`Analytic`].
///
/// Callers issuing many calls should keep one [`Analytic`] around so the
/// function pool and spec cache are reused.
pub fn analyze<'a, T, A>(
    records: &'a [T],
    accessor: &A,
    specs: &[&str],
) -> Result<Vec<AnalyticValue<'a, T>>>
where
    A: FieldAccessor<T> + ?Sized,
{
    Analytic::from_env().analyze_specs(records, accessor, specs)
}

/// Groups `records` by `properties` and terminates each aggregator spec.
pub fn group_by<'a, T, A>(
    records: &'a [T],
    accessor: &A,
    properties: &[&str],
    aggregators: &[&str],
) -> Result<Vec<AggregateValue<'a, T>>>
where
    A: FieldAccessor<T> + ?Sized,
{
    GroupBy::builder()
        .properties(properties.iter().copied())
        .aggregators(aggregators.iter().copied())
        .build()?
        .group_by(records, accessor)
}
