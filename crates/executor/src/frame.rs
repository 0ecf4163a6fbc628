use std::cmp::Ordering;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{WindowClause, WindowType};

use crate::comparator::BoundComparator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Window membership for one context. Positions are indices into the
/// context's sorted view; `target` is the row being terminated.
#[derive(Debug, Clone)]
pub(crate) struct Frame<'a> {
    window: WindowClause,
    comparator: BoundComparator<'a>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(window: WindowClause, comparator: BoundComparator<'a>) -> Self {
        Self { window, comparator }
    }

    pub(crate) fn comparator(&self) -> &BoundComparator<'a> {
        &self.comparator
    }

    /// `candidate` is not past the end of `target`'s frame.
    pub(crate) fn reaches(&self, view: &[usize], target: usize, candidate: usize) -> Result<bool> {
        match self.window.end {
            Some(bound) => self.within(view, target, candidate, bound, Edge::End),
            None => Ok(true),
        }
    }

    /// `candidate` is not before the start of `target`'s frame.
    pub(crate) fn admits(&self, view: &[usize], target: usize, candidate: usize) -> Result<bool> {
        match self.window.start {
            Some(bound) => self.within(view, target, candidate, bound, Edge::Start),
            None => Ok(true),
        }
    }

    fn within(
        &self,
        view: &[usize],
        target: usize,
        candidate: usize,
        bound: f64,
        edge: Edge,
    ) -> Result<bool> {
        match self.window.window_type {
            WindowType::Rows => {
                let offset = candidate as i64 - target as i64;
                let bound = bound as i64;
                Ok(match edge {
                    Edge::End => offset <= bound,
                    Edge::Start => offset >= bound.saturating_neg(),
                })
            }
            WindowType::Range if bound == 0.0 => {
                let ordering = self
                    .comparator
                    .compare_order(view[candidate], view[target]);
                Ok(match edge {
                    Edge::End => ordering != Ordering::Greater,
                    Edge::Start => ordering != Ordering::Less,
                })
            }
            WindowType::Range => {
                let distance = self.distance(view[target], view[candidate])?;
                Ok(match edge {
                    Edge::End => distance <= bound,
                    Edge::Start => distance >= -bound,
                })
            }
        }
    }

    /// Signed distance from `target` to `candidate` along the sort
    /// direction. A null on one side only sits infinitely far away on
    /// its null-ordering side.
    fn distance(&self, target: usize, candidate: usize) -> Result<f64> {
        let key = self.comparator.single_key().ok_or_else(|| {
            Error::internal("numeric RANGE window without a single orderBy key")
        })?;
        let (t, c) = (&key.values[target], &key.values[candidate]);
        let null_candidate = if key.nulls_first {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        match (t.is_null(), c.is_null()) {
            (true, true) => Ok(0.0),
            (false, true) => Ok(null_candidate),
            (true, false) => Ok(-null_candidate),
            (false, false) => {
                let (t, c) = (range_value(t)?, range_value(c)?);
                Ok(if key.ascending { c - t } else { t - c })
            }
        }
    }
}

fn range_value(value: &Value) -> Result<f64> {
    if !value.is_numeric() {
        return Err(Error::type_mismatch(
            "numeric orderBy value for RANGE window",
            value.data_type().to_string(),
        ));
    }
    value.as_f64().ok_or_else(|| {
        Error::type_mismatch(
            "numeric orderBy value for RANGE window",
            value.data_type().to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use sliderule_common::record::{RecordAccessor, row};
    use sliderule_ir::{OrderByClause, OrderByElement};

    use super::*;
    use crate::columns::ColumnStore;
    use crate::comparator::AnalyticComparator;

    fn column(values: Vec<Value>) -> ColumnStore {
        let records: Vec<_> = values.into_iter().map(|v| row([("v", v)])).collect();
        ColumnStore::load(&records, &RecordAccessor, ["v"]).unwrap()
    }

    fn members(frame: &Frame<'_>, len: usize, target: usize) -> Vec<usize> {
        let view: Vec<usize> = (0..len).collect();
        (0..len)
            .filter(|&c| {
                frame.admits(&view, target, c).unwrap() && frame.reaches(&view, target, c).unwrap()
            })
            .collect()
    }

    fn ordered(element: OrderByElement) -> AnalyticComparator {
        AnalyticComparator::new(None, Some(&OrderByClause::new(vec![element])))
    }

    #[test]
    fn test_rows_offsets() {
        let columns = column((0..5).map(Value::int64).collect());
        let comparator = ordered(OrderByElement::asc("v"));
        let frame = Frame::new(
            WindowClause::rows(Some(1), Some(0)),
            comparator.bind(&columns).unwrap(),
        );
        assert_eq!(members(&frame, 5, 0), vec![0]);
        assert_eq!(members(&frame, 5, 3), vec![2, 3]);

        let lag = Frame::new(
            WindowClause::rows(Some(2), Some(-2)),
            comparator.bind(&columns).unwrap(),
        );
        assert_eq!(members(&lag, 5, 4), vec![2]);
        assert!(members(&lag, 5, 1).is_empty());
    }

    #[test]
    fn test_rows_extreme_bounds() {
        let columns = column((0..3).map(Value::int64).collect());
        let comparator = ordered(OrderByElement::asc("v"));
        let frame = Frame::new(
            WindowClause::rows(Some(-i64::MAX), Some(i64::MAX)),
            comparator.bind(&columns).unwrap(),
        );
        assert!(members(&frame, 3, 1).is_empty());
    }

    #[test]
    fn test_range_zero_is_peer_group() {
        let columns = column(vec![
            Value::int64(1),
            Value::int64(2),
            Value::int64(2),
            Value::int64(3),
        ]);
        let comparator = ordered(OrderByElement::asc("v"));
        let peers = Frame::new(WindowClause::current_peers(), comparator.bind(&columns).unwrap());
        assert_eq!(members(&peers, 4, 1), vec![1, 2]);

        let running = Frame::new(WindowClause::default(), comparator.bind(&columns).unwrap());
        assert_eq!(members(&running, 4, 2), vec![0, 1, 2]);
    }

    #[test]
    fn test_numeric_range_follows_direction() {
        let asc_values = vec![
            Value::int64(1),
            Value::int64(3),
            Value::int64(4),
            Value::int64(8),
        ];
        let columns = column(asc_values);
        let comparator = ordered(OrderByElement::asc("v"));
        let frame = Frame::new(
            WindowClause::range(Some(2.0), Some(1.0)),
            comparator.bind(&columns).unwrap(),
        );
        // value 3: [1, 4]
        assert_eq!(members(&frame, 4, 1), vec![0, 1, 2]);

        let desc_values = vec![
            Value::int64(8),
            Value::int64(4),
            Value::int64(3),
            Value::int64(1),
        ];
        let columns = column(desc_values);
        let comparator = ordered(OrderByElement::desc("v"));
        let frame = Frame::new(
            WindowClause::range(Some(2.0), Some(1.0)),
            comparator.bind(&columns).unwrap(),
        );
        // value 3 descending: [5 .. 2]
        assert_eq!(members(&frame, 4, 2), vec![1, 2]);
    }

    #[test]
    fn test_numeric_range_nulls_are_far_away() {
        let columns = column(vec![Value::int64(1), Value::int64(2), Value::Null, Value::Null]);
        let comparator = ordered(OrderByElement::asc("v"));
        let frame = Frame::new(
            WindowClause::range(Some(5.0), Some(5.0)),
            comparator.bind(&columns).unwrap(),
        );
        assert_eq!(members(&frame, 4, 0), vec![0, 1]);
        assert_eq!(members(&frame, 4, 2), vec![2, 3]);
    }

    #[test]
    fn test_numeric_range_rejects_strings() {
        let columns = column(vec![Value::string("a"), Value::string("b")]);
        let comparator = ordered(OrderByElement::asc("v"));
        let frame = Frame::new(
            WindowClause::range(Some(1.0), Some(0.0)),
            comparator.bind(&columns).unwrap(),
        );
        let view = [0, 1];
        assert!(frame.admits(&view, 1, 0).is_err());
        // the zero end bound compares by ordering and accepts strings
        assert!(frame.reaches(&view, 0, 1).is_ok());
    }
}
