//! Specification-string grammar for sliderule aggregators.
//!
//! ```text
//! functionName(arg[, arg]*) [partitionBy(f[, f]*)]
//!     [orderBy(f [ASC|DESC] [NULLS FIRST|LAST][, ...])] [rows|range([start], [end])]
//! ```

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod grammar;
pub mod spec;

pub use cache::{SpecCache, SpecCacheStats};
pub use grammar::parse_aggregator_spec;
pub use spec::AggregatorSpec;
