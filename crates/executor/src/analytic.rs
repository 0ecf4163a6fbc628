use std::sync::Arc;

use debug_print::debug_eprintln;
use sliderule_common::error::Result;
use sliderule_common::record::FieldAccessor;
use sliderule_functions::FunctionPool;
use sliderule_parser::SpecCache;

use crate::aggregator::AnalyticAggregator;
use crate::columns::ColumnStore;
use crate::config::AnalyticConfig;
use crate::context::{AnalyticContext, ResultTable};
use crate::dependency::DependencyGraph;
use crate::value::AnalyticValue;
use crate::view::ViewPlan;

/// Evaluates analytic aggregators over a slice of records.
///
/// Each call is single-threaded and owns all of its scan state. The
/// function pool and the spec cache are the only shared pieces, so one
/// `Analytic` can serve concurrent calls from several threads.
#[derive(Debug, Clone)]
pub struct Analytic {
    config: AnalyticConfig,
    pool: Arc<FunctionPool>,
    specs: Arc<SpecCache>,
}

impl Default for Analytic {
    fn default() -> Self {
        Self::with_config(AnalyticConfig::default())
    }
}

impl Analytic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::with_config(AnalyticConfig::from_env())
    }

    pub fn with_config(config: AnalyticConfig) -> Self {
        Self {
            config,
            pool: Arc::new(FunctionPool::with_capacity(config.pool_capacity)),
            specs: Arc::new(SpecCache::new()),
        }
    }

    /// Shares an existing pool instead of the one created from the config.
    pub fn with_pool(mut self, pool: Arc<FunctionPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn config(&self) -> &AnalyticConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<FunctionPool> {
        &self.pool
    }

    pub fn spec_cache(&self) -> &Arc<SpecCache> {
        &self.specs
    }

    /// Returns one [`AnalyticValue`] per record, in input order, carrying
    /// the result of every aggregator in `aggregators` order.
    pub fn analyze<'a, T, A>(
        &self,
        records: &'a [T],
        accessor: &A,
        aggregators: &[AnalyticAggregator],
    ) -> Result<Vec<AnalyticValue<'a, T>>>
    where
        A: FieldAccessor<T> + ?Sized,
    {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let graph = DependencyGraph::expand(aggregators)?;
        let columns = ColumnStore::load(records, accessor, graph.fields())?;
        let plan = ViewPlan::build(graph.comparators(), &columns, self.config.reuse_sorted_views)?;
        debug_eprintln!(
            "[executor::analytic] {} aggregators, {} slots, {} sorts over {} records",
            graph.requested(),
            graph.len(),
            plan.sort_count(),
            records.len()
        );

        let mut contexts = Vec::with_capacity(graph.len());
        for (slot, node) in graph.nodes().iter().enumerate() {
            let view = plan.view_for(&node.comparator)?;
            let function = self.pool.acquire(node.function.as_ref());
            contexts.push(AnalyticContext::new(slot, node, function, view, &columns)?);
        }

        let mut results = ResultTable::new(graph.len(), records.len());
        let outcome = scan(&mut contexts, records.len(), &mut results);
        self.pool
            .release_all(contexts.into_iter().map(AnalyticContext::into_function));
        outcome?;

        Ok(results
            .into_rows(graph.requested())
            .into_iter()
            .zip(records)
            .enumerate()
            .map(|(index, (values, record))| AnalyticValue::new(record, index, values))
            .collect())
    }

    /// Parses each specification string (memoized in the spec cache) and
    /// runs [`analyze`](Self::analyze).
    pub fn analyze_specs<'a, T, A>(
        &self,
        records: &'a [T],
        accessor: &A,
        specs: &[&str],
    ) -> Result<Vec<AnalyticValue<'a, T>>>
    where
        A: FieldAccessor<T> + ?Sized,
    {
        let aggregators = specs
            .iter()
            .map(|spec| AnalyticAggregator::parse_cached(spec, &self.specs))
            .collect::<Result<Vec<_>>>()?;
        self.analyze(records, accessor, &aggregators)
    }
}

/// Drives every context over the outer index. Contexts run in reverse
/// slot order so helpers terminate a row before their dependents read it.
fn scan(contexts: &mut [AnalyticContext<'_>], len: usize, results: &mut ResultTable) -> Result<()> {
    for index in 0..len {
        for context in contexts.iter_mut().rev() {
            context.advance(index, results)?;
        }
    }
    for context in contexts.iter_mut().rev() {
        context.finish(results)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sliderule_common::record::{RecordAccessor, Row, row};
    use sliderule_common::types::Value;

    use super::*;

    fn records() -> Vec<Row> {
        vec![
            row([("cat", Value::from("A")), ("v", Value::from(1i64))]),
            row([("cat", Value::from("A")), ("v", Value::from(2i64))]),
            row([("cat", Value::from("A")), ("v", Value::from(3i64))]),
            row([("cat", Value::from("B")), ("v", Value::from(10i64))]),
        ]
    }

    fn column(results: &[AnalyticValue<'_, Row>], slot: usize) -> Vec<Value> {
        results
            .iter()
            .map(|r| r.value(slot).cloned().unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<Row> = Vec::new();
        let out = Analytic::new()
            .analyze_specs(&records, &RecordAccessor, &["Sum(v)"])
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_results_follow_input_order() {
        let records = records();
        let out = Analytic::new()
            .analyze_specs(
                &records,
                &RecordAccessor,
                &["Sum(v) partitionBy(cat) range()", "RowNumber() orderBy(v desc)"],
            )
            .unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[3].index(), 3);
        assert_eq!(
            column(&out, 0),
            vec![Value::int64(6), Value::int64(6), Value::int64(6), Value::int64(10)]
        );
        assert_eq!(
            column(&out, 1),
            vec![Value::int64(4), Value::int64(3), Value::int64(2), Value::int64(1)]
        );
        assert_eq!(out[0].values().len(), 2);
    }

    #[test]
    fn test_pool_is_reused_across_calls() {
        let records = records();
        let analytic = Analytic::new();
        for _ in 0..2 {
            analytic
                .analyze_specs(&records, &RecordAccessor, &["Avg(v) orderBy(v) rows(1, 0)"])
                .unwrap();
        }
        let stats = analytic.pool().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(analytic.spec_cache().stats().hits, 1);
    }

    #[test]
    fn test_type_error_aborts_call() {
        let records = vec![
            row([("v", Value::from(1i64))]),
            row([("v", Value::from("x"))]),
        ];
        let err = Analytic::new()
            .analyze_specs(&records, &RecordAccessor, &["Sum(v)"])
            .unwrap_err();
        assert!(matches!(err, sliderule_common::Error::TypeMismatch { .. }));
    }
}
