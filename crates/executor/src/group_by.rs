use std::cmp::Ordering;

use debug_print::debug_eprintln;
use indexmap::IndexMap;
use sliderule_common::error::{Error, Result};
use sliderule_common::record::FieldAccessor;
use sliderule_common::types::{Value, compare_values};
use sliderule_functions::{AnalyticFunction, FunctionRegistry, default_registry};
use sliderule_parser::parse_aggregator_spec;

use crate::columns::{ColumnStore, InputColumns};
use crate::config::GroupByConfig;
use crate::value::AggregateValue;

const MAX_CUBE_PROPERTIES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Grouping {
    Plain,
    Rollup(Vec<String>),
    Cube(Vec<String>),
    Sets(Vec<Vec<String>>),
}

#[derive(Debug)]
enum PendingAggregator {
    Spec(String),
    Function(Box<dyn AnalyticFunction>),
}

#[derive(Debug)]
pub struct GroupByBuilder {
    properties: Vec<String>,
    aggregators: Vec<PendingAggregator>,
    grouping: Grouping,
    config: GroupByConfig,
}

impl GroupByBuilder {
    pub fn properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Aggregators as specification strings, e.g. `"Sum(v)"`.
    pub fn aggregators<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aggregators
            .extend(specs.into_iter().map(|s| PendingAggregator::Spec(s.into())));
        self
    }

    pub fn aggregator(mut self, function: Box<dyn AnalyticFunction>) -> Self {
        self.aggregators.push(PendingAggregator::Function(function));
        self
    }

    /// Adds super-aggregate rows for each prefix of `properties`.
    pub fn rollup<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouping = Grouping::Rollup(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Adds super-aggregate rows for every subset of `properties`.
    pub fn cube<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouping = Grouping::Cube(properties.into_iter().map(Into::into).collect());
        self
    }

    pub fn grouping_sets<I, J, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grouping = Grouping::Sets(
            sets.into_iter()
                .map(|set| set.into_iter().map(Into::into).collect())
                .collect(),
        );
        self
    }

    pub fn config(mut self, config: GroupByConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<GroupBy> {
        self.build_with(default_registry())
    }

    pub fn build_with(self, registry: &FunctionRegistry) -> Result<GroupBy> {
        if self.aggregators.is_empty() {
            return Err(Error::specification("group-by needs at least one aggregator"));
        }

        let mut functions = Vec::with_capacity(self.aggregators.len());
        for pending in self.aggregators {
            let function = match pending {
                PendingAggregator::Spec(text) => {
                    let spec = parse_aggregator_spec(&text)?;
                    if spec.has_clauses() {
                        return Err(Error::specification(format!(
                            "group-by aggregator {} cannot carry partitionBy, orderBy or window clauses",
                            text
                        )));
                    }
                    registry.create(&spec.function, &spec.arguments)?
                }
                PendingAggregator::Function(function) => function,
            };
            if function.is_dependent() || !function.takes_window_clause() {
                return Err(Error::specification(format!(
                    "{} is only available as an analytic function",
                    function.name()
                )));
            }
            functions.push(function);
        }

        let grouping_sets = grouping_sets(&self.properties, &self.grouping)?;
        Ok(GroupBy {
            properties: self.properties,
            functions,
            grouping_sets,
            config: self.config,
        })
    }
}

fn position(properties: &[String], name: &str) -> Result<usize> {
    properties.iter().position(|p| p == name).ok_or_else(|| {
        Error::specification(format!("{} is not a group-by property", name))
    })
}

/// Active-property masks, one per grouping set, finest first.
fn grouping_sets(properties: &[String], grouping: &Grouping) -> Result<Vec<Vec<bool>>> {
    let all = vec![true; properties.len()];
    match grouping {
        Grouping::Plain => Ok(vec![all]),
        Grouping::Rollup(rolled) => {
            let indices = rolled
                .iter()
                .map(|name| position(properties, name))
                .collect::<Result<Vec<_>>>()?;
            let mut sets = Vec::with_capacity(indices.len() + 1);
            for kept in (0..=indices.len()).rev() {
                let mut mask = all.clone();
                for &index in &indices[kept..] {
                    mask[index] = false;
                }
                sets.push(mask);
            }
            Ok(sets)
        }
        Grouping::Cube(cubed) => {
            if cubed.len() > MAX_CUBE_PROPERTIES {
                return Err(Error::specification(format!(
                    "cube supports at most {} properties, got {}",
                    MAX_CUBE_PROPERTIES,
                    cubed.len()
                )));
            }
            let indices = cubed
                .iter()
                .map(|name| position(properties, name))
                .collect::<Result<Vec<_>>>()?;
            let n = indices.len();
            let mut subsets: Vec<u32> = (0..1u32 << n).rev().collect();
            subsets.sort_by_key(|subset| std::cmp::Reverse(subset.count_ones()));
            Ok(subsets
                .into_iter()
                .map(|subset| {
                    let mut mask = all.clone();
                    for (j, &index) in indices.iter().enumerate() {
                        if subset & (1 << (n - 1 - j)) == 0 {
                            mask[index] = false;
                        }
                    }
                    mask
                })
                .collect())
        }
        Grouping::Sets(sets) => sets
            .iter()
            .map(|set| {
                let mut mask = vec![false; properties.len()];
                for name in set {
                    mask[position(properties, name)?] = true;
                }
                Ok(mask)
            })
            .collect(),
    }
}

/// Classic grouping with optional super-aggregates.
#[derive(Debug)]
pub struct GroupBy {
    properties: Vec<String>,
    functions: Vec<Box<dyn AnalyticFunction>>,
    grouping_sets: Vec<Vec<bool>>,
    config: GroupByConfig,
}

#[derive(Debug)]
struct FinestGroup {
    members: Vec<usize>,
    functions: Vec<Box<dyn AnalyticFunction>>,
}

#[derive(Debug)]
struct Group {
    representative: usize,
    functions: Vec<Box<dyn AnalyticFunction>>,
}

impl GroupBy {
    pub fn builder() -> GroupByBuilder {
        GroupByBuilder {
            properties: Vec::new(),
            aggregators: Vec::new(),
            grouping: Grouping::Plain,
            config: GroupByConfig::default(),
        }
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn grouping_set_count(&self) -> usize {
        self.grouping_sets.len()
    }

    fn replicas(&self) -> Vec<Box<dyn AnalyticFunction>> {
        self.functions.iter().map(|f| f.replicate()).collect()
    }

    /// Groups `records` and terminates every aggregator per group. Rows come
    /// out by grouping set, then by property values.
    ///
    /// Super-aggregate rows fold the finest groups in order of first
    /// appearance, so order-sensitive functions such as `First` or
    /// `Concat` see the same sequence whether they merge or re-iterate.
    pub fn group_by<'a, T, A>(
        &self,
        records: &'a [T],
        accessor: &A,
    ) -> Result<Vec<AggregateValue<'a, T>>>
    where
        A: FieldAccessor<T> + ?Sized,
    {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let fields = self.properties.iter().map(String::as_str).chain(
            self.functions
                .iter()
                .flat_map(|f| f.arguments().iter().filter_map(|a| a.as_field())),
        );
        let columns = ColumnStore::load(records, accessor, fields)?;
        let keys = self
            .properties
            .iter()
            .map(|p| columns.column(p))
            .collect::<Result<Vec<_>>>()?;
        let inputs = self
            .functions
            .iter()
            .map(|f| columns.inputs(f.arguments()))
            .collect::<Result<Vec<_>>>()?;

        let finest = self.finest_groups(records.len(), &keys, &inputs)?;
        debug_eprintln!(
            "[executor::group_by] {} finest groups, {} grouping sets, merge={}",
            finest.len(),
            self.grouping_sets.len(),
            self.config.use_merge
        );

        let mut out = Vec::new();
        for (set_index, mask) in self.grouping_sets.iter().enumerate() {
            let mut groups: IndexMap<Vec<Value>, Group> = IndexMap::new();
            for (key, finest_group) in &finest {
                let projected: Vec<Value> = key
                    .iter()
                    .zip(mask)
                    .map(|(value, &active)| if active { value.clone() } else { Value::Null })
                    .collect();
                let group = groups.entry(projected).or_insert_with(|| Group {
                    representative: finest_group.members[0],
                    functions: self.replicas(),
                });

                if self.config.use_merge {
                    for (target, source) in group.functions.iter_mut().zip(&finest_group.functions) {
                        target.merge(&**source)?;
                    }
                } else {
                    fold(&mut group.functions, &inputs, &finest_group.members)?;
                }
            }

            let mut groups: Vec<(Vec<Value>, Group)> = groups.into_iter().collect();
            groups.sort_by(|(a, _), (b, _)| compare_keys(a, b));

            let grouped_out: Vec<bool> = mask.iter().map(|active| !active).collect();
            for (key, mut group) in groups {
                let values = group
                    .functions
                    .iter_mut()
                    .map(|f| f.terminate())
                    .collect::<Result<Vec<_>>>()?;
                out.push(AggregateValue::new(
                    &records[group.representative],
                    set_index,
                    key,
                    grouped_out.clone(),
                    values,
                ));
            }
        }
        Ok(out)
    }

    fn finest_groups(
        &self,
        len: usize,
        keys: &[&[Value]],
        inputs: &[InputColumns<'_>],
    ) -> Result<IndexMap<Vec<Value>, FinestGroup>> {
        let mut finest: IndexMap<Vec<Value>, FinestGroup> = IndexMap::new();
        for record in 0..len {
            let key: Vec<Value> = keys.iter().map(|column| column[record].clone()).collect();
            finest
                .entry(key)
                .or_insert_with(|| FinestGroup {
                    members: Vec::new(),
                    functions: Vec::new(),
                })
                .members
                .push(record);
        }

        if self.config.use_merge {
            for group in finest.values_mut() {
                group.functions = self.replicas();
                fold(&mut group.functions, inputs, &group.members)?;
            }
        }
        Ok(finest)
    }
}

fn fold(
    functions: &mut [Box<dyn AnalyticFunction>],
    inputs: &[InputColumns<'_>],
    members: &[usize],
) -> Result<()> {
    let mut buffer = Vec::new();
    for (function, inputs) in functions.iter_mut().zip(inputs) {
        for &record in members {
            inputs.fill(record, &mut buffer);
            function.iterate(&buffer)?;
        }
    }
    Ok(())
}

fn compare_keys(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ordering = compare_values(x, y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
