use std::fmt;

use sliderule_common::error::{Error, Result};
use sliderule_functions::{AnalyticFunction, FunctionRegistry, default_registry};
use sliderule_ir::{OrderByClause, PartitionClause, WindowClause};
use sliderule_parser::{AggregatorSpec, SpecCache, parse_aggregator_spec};

use crate::comparator::AnalyticComparator;

/// A function bound to its partition, ordering and window.
#[derive(Debug)]
pub struct AnalyticAggregator {
    function: Box<dyn AnalyticFunction>,
    partition: Option<PartitionClause>,
    order_by: Option<OrderByClause>,
    window: WindowClause,
}

impl Clone for AnalyticAggregator {
    fn clone(&self) -> Self {
        Self {
            function: self.function.replicate(),
            partition: self.partition.clone(),
            order_by: self.order_by.clone(),
            window: self.window,
        }
    }
}

impl AnalyticAggregator {
    pub fn builder(function: Box<dyn AnalyticFunction>) -> AnalyticAggregatorBuilder {
        AnalyticAggregatorBuilder {
            function,
            partition: None,
            order_by: None,
            window: None,
        }
    }

    /// Parses a specification string and resolves the function against the
    /// built-in registry.
    pub fn parse(spec: &str) -> Result<Self> {
        Self::from_spec(&parse_aggregator_spec(spec)?, default_registry())
    }

    pub fn parse_cached(spec: &str, cache: &SpecCache) -> Result<Self> {
        Self::from_spec(&cache.get_or_parse(spec)?, default_registry())
    }

    pub fn from_spec(spec: &AggregatorSpec, registry: &FunctionRegistry) -> Result<Self> {
        let function = registry.create(&spec.function, &spec.arguments)?;
        let mut builder = Self::builder(function);
        if let Some(partition) = &spec.partition {
            builder = builder.partition_by(partition.clone());
        }
        if let Some(order_by) = &spec.order_by {
            builder = builder.order_by(order_by.clone());
        }
        if let Some(window) = spec.window {
            builder = builder.window(window);
        }
        builder.build()
    }

    pub fn function(&self) -> &dyn AnalyticFunction {
        self.function.as_ref()
    }

    pub fn partition(&self) -> Option<&PartitionClause> {
        self.partition.as_ref()
    }

    pub fn order_by(&self) -> Option<&OrderByClause> {
        self.order_by.as_ref()
    }

    pub fn window(&self) -> WindowClause {
        self.window
    }

    pub fn comparator(&self) -> AnalyticComparator {
        AnalyticComparator::new(self.partition.as_ref(), self.order_by.as_ref())
    }
}

impl fmt::Display for AnalyticAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function.key())?;
        if let Some(partition) = &self.partition {
            write!(f, " {}", partition)?;
        }
        if let Some(order_by) = &self.order_by {
            write!(f, " {}", order_by)?;
        }
        if self.function.takes_window_clause() {
            write!(f, " {}", self.window)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct AnalyticAggregatorBuilder {
    function: Box<dyn AnalyticFunction>,
    partition: Option<PartitionClause>,
    order_by: Option<OrderByClause>,
    window: Option<WindowClause>,
}

impl AnalyticAggregatorBuilder {
    pub fn partition_by(mut self, partition: PartitionClause) -> Self {
        self.partition = (!partition.is_empty()).then_some(partition);
        self
    }

    pub fn order_by(mut self, order_by: OrderByClause) -> Self {
        self.order_by = (!order_by.is_empty()).then_some(order_by);
        self
    }

    pub fn window(mut self, window: WindowClause) -> Self {
        self.window = Some(window);
        self
    }

    pub fn build(self) -> Result<AnalyticAggregator> {
        let name = self.function.name();
        let window = match (self.window, self.function.takes_window_clause()) {
            (Some(window), true) => window,
            (Some(window), false) => {
                return Err(Error::specification(format!(
                    "{} does not accept a window clause, got {}",
                    name, window
                )));
            }
            (None, true) => WindowClause::default(),
            (None, false) => self.function.window_clause().unwrap_or_default(),
        };

        let order_by_len = self.order_by.as_ref().map_or(0, OrderByClause::len);
        window.validate(order_by_len)?;

        Ok(AnalyticAggregator {
            function: self.function,
            partition: self.partition,
            order_by: self.order_by,
            window,
        })
    }
}
