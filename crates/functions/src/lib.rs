//! Built-in aggregate and analytic functions for sliderule.

#![allow(clippy::new_ret_no_self)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod aggregate;
pub mod analytic;
pub mod multiset;
pub mod pool;
pub mod precision;
mod registry;

pub use aggregate::{AggregateFunction, AnalyticFunction, Dependency, FunctionKey};
pub use multiset::FrequencyMultiset;
pub use pool::{FunctionPool, PoolStats};
pub use precision::DoubleDouble;
pub use registry::{FunctionConstructor, FunctionRegistry, default_registry, normalize_name};
