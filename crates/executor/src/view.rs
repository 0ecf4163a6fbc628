use std::collections::HashMap;

use debug_print::debug_eprintln;
use indexmap::IndexSet;
use sliderule_common::error::{Error, Result};

use crate::columns::ColumnStore;
use crate::comparator::AnalyticComparator;

/// Record indices sorted by one comparator.
#[derive(Debug, Clone)]
pub(crate) struct SortedView {
    comparator: AnalyticComparator,
    order: Vec<usize>,
}

impl SortedView {
    fn sort(comparator: AnalyticComparator, columns: &ColumnStore) -> Result<Self> {
        let bound = comparator.bind(columns)?;
        let mut order: Vec<usize> = (0..columns.len()).collect();
        order.sort_by(|&a, &b| bound.compare(a, b));
        Ok(Self { comparator, order })
    }

    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }
}

/// The distinct sorts an analyze call performs, and which sort serves
/// each comparator.
#[derive(Debug, Clone, Default)]
pub(crate) struct ViewPlan {
    views: Vec<SortedView>,
    assignments: HashMap<AnalyticComparator, usize>,
}

impl ViewPlan {
    /// With `reuse`, comparators are visited most specific first and each
    /// takes the first existing view that covers it.
    pub(crate) fn build<'c>(
        comparators: impl IntoIterator<Item = &'c AnalyticComparator>,
        columns: &ColumnStore,
        reuse: bool,
    ) -> Result<Self> {
        let mut distinct: Vec<&AnalyticComparator> = comparators
            .into_iter()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        if reuse {
            distinct.sort_by(|a, b| b.specificity().cmp(&a.specificity()));
        }

        let mut plan = Self::default();
        for comparator in distinct {
            let covering = if reuse {
                plan.views
                    .iter()
                    .position(|view| view.comparator.covers(comparator))
            } else {
                None
            };

            let index = match covering {
                Some(index) => {
                    debug_eprintln!(
                        "[executor::view] {} reuses view sorted by {}",
                        comparator,
                        plan.views[index].comparator
                    );
                    index
                }
                None => {
                    debug_eprintln!("[executor::view] sorting by {}", comparator);
                    plan.views
                        .push(SortedView::sort(comparator.clone(), columns)?);
                    plan.views.len() - 1
                }
            };
            plan.assignments.insert(comparator.clone(), index);
        }
        Ok(plan)
    }

    pub(crate) fn view_for(&self, comparator: &AnalyticComparator) -> Result<&[usize]> {
        self.assignments
            .get(comparator)
            .and_then(|&index| self.views.get(index))
            .map(SortedView::order)
            .ok_or_else(|| Error::internal(format!("no sorted view planned for {}", comparator)))
    }

    pub(crate) fn sort_count(&self) -> usize {
        self.views.len()
    }
}
