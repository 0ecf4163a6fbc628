use std::cmp::Ordering;
use std::fmt;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::{Value, compare_values};
use sliderule_ir::{OrderByClause, OrderByElement, PartitionClause};

use crate::columns::ColumnStore;

/// Partition keys plus within-partition ordering for one aggregator.
///
/// Two aggregators with equal comparators can share a sorted view; a
/// comparator that [`covers`](Self::covers) another can lend it its view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnalyticComparator {
    partition: PartitionClause,
    order_by: OrderByClause,
}

impl AnalyticComparator {
    pub fn new(partition: Option<&PartitionClause>, order_by: Option<&OrderByClause>) -> Self {
        Self {
            partition: partition.cloned().unwrap_or_default(),
            order_by: order_by.cloned().unwrap_or_default(),
        }
    }

    pub fn partition(&self) -> &PartitionClause {
        &self.partition
    }

    pub fn order_by(&self) -> &OrderByClause {
        &self.order_by
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.partition
            .fields
            .iter()
            .map(String::as_str)
            .chain(self.order_by.elements.iter().map(|e| e.field.as_str()))
    }

    /// Sort key for view planning: more keys first.
    pub fn specificity(&self) -> (usize, usize) {
        (self.partition.fields.len(), self.order_by.len())
    }

    /// Whether an ordering by `self` is also a valid ordering by `other`.
    ///
    /// Holds when `other` only partitions, by a prefix of our partition
    /// keys, or when the partitions match and `other`'s order-by is a
    /// prefix of ours.
    pub fn covers(&self, other: &AnalyticComparator) -> bool {
        if other.order_by.is_empty() && self.partition.fields.starts_with(&other.partition.fields)
        {
            return true;
        }
        self.partition == other.partition
            && self.order_by.elements.starts_with(&other.order_by.elements)
    }

    pub fn bind<'a>(&self, columns: &'a ColumnStore) -> Result<BoundComparator<'a>> {
        let partition = self
            .partition
            .fields
            .iter()
            .map(|field| columns.column(field))
            .collect::<Result<Vec<_>>>()?;

        let mut order_by = Vec::with_capacity(self.order_by.len());
        for element in &self.order_by.elements {
            let values = columns.column(&element.field)?;
            if let Some(value) = values.iter().find(|v| v.as_array().is_some()) {
                return Err(Error::type_mismatch(
                    format!("comparable orderBy value for {}", element.field),
                    value.data_type().to_string(),
                ));
            }
            order_by.push(SortKey::new(values, element));
        }

        Ok(BoundComparator {
            partition,
            order_by,
        })
    }
}

impl fmt::Display for AnalyticComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.partition.is_empty(), self.order_by.is_empty()) {
            (true, true) => write!(f, "<unordered>"),
            (false, true) => write!(f, "{}", self.partition),
            (true, false) => write!(f, "{}", self.order_by),
            (false, false) => write!(f, "{} {}", self.partition, self.order_by),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
    pub values: &'a [Value],
    pub ascending: bool,
    pub nulls_first: bool,
}

impl<'a> SortKey<'a> {
    fn new(values: &'a [Value], element: &OrderByElement) -> Self {
        Self {
            values,
            ascending: element.direction.is_ascending(),
            nulls_first: element.nulls_first(),
        }
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        compare_with_nulls(
            &self.values[a],
            &self.values[b],
            self.ascending,
            self.nulls_first,
        )
    }
}

/// A comparator resolved against loaded columns; compares record indices.
#[derive(Debug, Clone)]
pub struct BoundComparator<'a> {
    partition: Vec<&'a [Value]>,
    order_by: Vec<SortKey<'a>>,
}

impl<'a> BoundComparator<'a> {
    pub fn compare_partition(&self, a: usize, b: usize) -> Ordering {
        for values in &self.partition {
            let ordering = compare_values(&values[a], &values[b]);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub fn same_partition(&self, a: usize, b: usize) -> bool {
        self.compare_partition(a, b) == Ordering::Equal
    }

    pub fn compare_order(&self, a: usize, b: usize) -> Ordering {
        for key in &self.order_by {
            let ordering = key.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub fn compare(&self, a: usize, b: usize) -> Ordering {
        self.compare_partition(a, b)
            .then_with(|| self.compare_order(a, b))
    }

    /// The only order-by key, as numeric RANGE frames require.
    pub fn single_key(&self) -> Option<&SortKey<'a>> {
        match self.order_by.as_slice() {
            [key] => Some(key),
            _ => None,
        }
    }
}

/// Orders two values under a direction and null placement. Nulls are
/// peers of each other and sit outside the direction.
pub fn compare_with_nulls(a: &Value, b: &Value, ascending: bool, nulls_first: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if nulls_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if nulls_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => {
            let ordering = compare_values(a, b);
            if ascending { ordering } else { ordering.reverse() }
        }
    }
}

#[cfg(test)]
mod tests {
    use sliderule_common::record::{RecordAccessor, Row, row};
    use sliderule_ir::NullOrdering;

    use super::*;

    fn comparator(partition: &[&str], order_by: Vec<OrderByElement>) -> AnalyticComparator {
        let partition = PartitionClause::new(partition.iter().copied());
        let order_by = OrderByClause::new(order_by);
        AnalyticComparator::new(Some(&partition), Some(&order_by))
    }

    #[test]
    fn test_covers_partition_prefix_without_order() {
        let wide = comparator(&["a", "b"], vec![OrderByElement::asc("v")]);
        assert!(wide.covers(&comparator(&["a"], vec![])));
        assert!(wide.covers(&comparator(&[], vec![])));
        assert!(!wide.covers(&comparator(&["b"], vec![])));
        assert!(!wide.covers(&comparator(&["a"], vec![OrderByElement::asc("v")])));
    }

    #[test]
    fn test_covers_order_prefix_with_equal_partition() {
        let wide = comparator(
            &["a"],
            vec![OrderByElement::asc("v"), OrderByElement::desc("w")],
        );
        assert!(wide.covers(&comparator(&["a"], vec![OrderByElement::asc("v")])));
        assert!(wide.covers(&wide.clone()));
        assert!(!wide.covers(&comparator(&["a"], vec![OrderByElement::desc("v")])));
        assert!(!wide.covers(&comparator(
            &["a"],
            vec![OrderByElement::asc("v").nulls(NullOrdering::First)]
        )));
    }

    #[test]
    fn test_equality_and_display() {
        let a = comparator(&["cat"], vec![OrderByElement::asc("v")]);
        let b = comparator(&["cat"], vec![OrderByElement::asc("v")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "partitionBy(cat) orderBy(v ASC NULLS LAST)");
        assert_eq!(AnalyticComparator::default().to_string(), "<unordered>");
    }

    fn store(records: &[Row], fields: &[&str]) -> ColumnStore {
        ColumnStore::load(records, &RecordAccessor, fields.iter().copied()).unwrap()
    }

    #[test]
    fn test_bound_compare_honours_direction_and_nulls() {
        let records = vec![
            row([("cat", Value::from("A")), ("v", Value::from(2i64))]),
            row([("cat", Value::from("A")), ("v", Value::Null)]),
            row([("cat", Value::from("B")), ("v", Value::from(1i64))]),
            row([("cat", Value::from("A")), ("v", Value::from(5i64))]),
        ];
        let columns = store(&records, &["cat", "v"]);

        let asc = comparator(&["cat"], vec![OrderByElement::asc("v")]);
        let bound = asc.bind(&columns).unwrap();
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| bound.compare(a, b));
        assert_eq!(order, vec![0, 3, 1, 2]);

        let desc = comparator(&["cat"], vec![OrderByElement::desc("v")]);
        let bound = desc.bind(&columns).unwrap();
        order.sort_by(|&a, &b| bound.compare(a, b));
        assert_eq!(order, vec![1, 3, 0, 2]);
        assert!(bound.same_partition(0, 3));
        assert!(!bound.same_partition(0, 2));
    }

    #[test]
    fn test_array_order_key_is_type_error() {
        let records = vec![row([("v", Value::array(vec![Value::int64(1)]))])];
        let columns = store(&records, &["v"]);
        let err = comparator(&[], vec![OrderByElement::asc("v")])
            .bind(&columns)
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
