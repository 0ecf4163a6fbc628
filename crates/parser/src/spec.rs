use std::fmt;

use serde::{Deserialize, Serialize};
use sliderule_ir::{Argument, OrderByClause, PartitionClause, WindowClause};

/// Syntactic form of one aggregator: the function call plus whichever
/// clauses were written. Semantic checks (function arity, window legality,
/// RANGE/orderBy agreement) happen when the aggregator is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorSpec {
    pub function: String,
    pub arguments: Vec<Argument>,
    pub partition: Option<PartitionClause>,
    pub order_by: Option<OrderByClause>,
    pub window: Option<WindowClause>,
}

impl AggregatorSpec {
    pub fn new(function: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            function: function.into(),
            arguments,
            partition: None,
            order_by: None,
            window: None,
        }
    }

    pub fn has_clauses(&self) -> bool {
        self.partition.is_some() || self.order_by.is_some() || self.window.is_some()
    }
}

impl fmt::Display for AggregatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.function, args.join(", "))?;
        if let Some(partition) = &self.partition {
            write!(f, " {}", partition)?;
        }
        if let Some(order_by) = &self.order_by {
            write!(f, " {}", order_by)?;
        }
        if let Some(window) = &self.window {
            write!(f, " {}", window)?;
        }
        Ok(())
    }
}
