use debug_print::debug_eprintln;
use sliderule_common::error::{Error, Result};
use sliderule_functions::AnalyticFunction;
use sliderule_ir::WindowClause;

use crate::aggregator::AnalyticAggregator;
use crate::comparator::AnalyticComparator;

/// One function to evaluate: a requested aggregator or a synthesized helper.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) function: Box<dyn AnalyticFunction>,
    pub(crate) comparator: AnalyticComparator,
    pub(crate) window: WindowClause,
    /// Slots whose terminated values feed this node, in declaration order.
    pub(crate) dependencies: Vec<usize>,
}

/// Requested aggregators occupy slots `0..requested`; helpers are appended
/// after the node that declared them, so every dependency has a larger
/// slot than its dependent and reverse slot order is a topological order.
#[derive(Debug)]
pub(crate) struct DependencyGraph {
    nodes: Vec<Node>,
    requested: usize,
}

impl DependencyGraph {
    pub(crate) fn expand(aggregators: &[AnalyticAggregator]) -> Result<Self> {
        let mut graph = Self {
            nodes: aggregators
                .iter()
                .map(|aggregator| Node {
                    function: aggregator.function().replicate(),
                    comparator: aggregator.comparator(),
                    window: aggregator.window(),
                    dependencies: Vec::new(),
                })
                .collect(),
            requested: aggregators.len(),
        };

        let mut ancestors = Vec::new();
        for slot in 0..graph.requested {
            graph.expand_node(slot, &mut ancestors)?;
        }
        Ok(graph)
    }

    fn expand_node(&mut self, slot: usize, ancestors: &mut Vec<&'static str>) -> Result<()> {
        let dependencies = self.nodes[slot].function.dependencies();
        if dependencies.is_empty() {
            return Ok(());
        }

        let name = self.nodes[slot].function.name();
        ancestors.push(name);
        let comparator = self.nodes[slot].comparator.clone();

        let mut added = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let helper = dependency.function.name();
            if ancestors.contains(&helper) {
                return Err(Error::specification(format!(
                    "{} cannot depend on {}: cyclic dependency",
                    name, helper
                )));
            }
            debug_eprintln!(
                "[executor::dependency] slot {} ({}) needs {} over {} at slot {}",
                slot,
                name,
                dependency.function.key(),
                dependency.window,
                self.nodes.len()
            );
            added.push(self.nodes.len());
            self.nodes.push(Node {
                function: dependency.function,
                comparator: comparator.clone(),
                window: dependency.window,
                dependencies: Vec::new(),
            });
        }

        for &helper in &added {
            self.expand_node(helper, ancestors)?;
        }
        ancestors.pop();
        self.nodes[slot].dependencies = added;
        Ok(())
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn requested(&self) -> usize {
        self.requested
    }

    /// Every field any node reads: clause keys and input arguments.
    pub(crate) fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        for node in &self.nodes {
            fields.extend(node.comparator.fields());
            fields.extend(
                node.function
                    .arguments()
                    .iter()
                    .filter_map(|argument| argument.as_field()),
            );
        }
        fields
    }

    pub(crate) fn comparators(&self) -> impl Iterator<Item = &AnalyticComparator> {
        self.nodes.iter().map(|node| &node.comparator)
    }
}
