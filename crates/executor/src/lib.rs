//! Analytic and group-by evaluation for sliderule.
//!
//! [`Analytic::analyze`] expands dependent functions into helper slots,
//! plans the fewest sorts that serve every comparator, and drives one
//! sliding-window scan per slot over its sorted view. [`GroupBy`] computes
//! classic aggregates with optional rollup, cube and grouping sets.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod aggregator;
pub mod analytic;
pub mod columns;
pub mod comparator;
pub mod config;
mod context;
mod dependency;
mod frame;
pub mod group_by;
pub mod value;
mod view;

pub use aggregator::{AnalyticAggregator, AnalyticAggregatorBuilder};
pub use analytic::Analytic;
pub use columns::ColumnStore;
pub use comparator::{AnalyticComparator, BoundComparator};
pub use config::{AnalyticConfig, GroupByConfig};
pub use group_by::{GroupBy, GroupByBuilder};
pub use value::{AggregateValue, AnalyticValue};
