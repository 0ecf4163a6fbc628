//! Clause model shared by the parser, functions and executor.

pub mod argument;
pub mod clause;
pub mod window;

pub use argument::{Argument, check_arity};
pub use clause::{NullOrdering, OrderByClause, OrderByElement, PartitionClause, SortDirection};
pub use window::{WindowClause, WindowType};
