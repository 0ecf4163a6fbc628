//! Common types and error handling for sliderule.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod float_utils;
pub mod record;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use record::{FieldAccessor, Record, RecordAccessor, Row, row};
pub use types::{DataType, Value, compare_values, values_equal};
