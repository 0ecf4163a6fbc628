use std::fmt;

use serde::{Deserialize, Serialize};
use sliderule_common::error::{Error, Result};
use sliderule_common::float_utils::is_integral;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    Rows,
    Range,
}

/// Frame bounds are offsets from the current row: a positive start bound
/// reaches back (preceding), a positive end bound reaches forward
/// (following). `None` is unbounded in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowClause {
    pub window_type: WindowType,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl Default for WindowClause {
    fn default() -> Self {
        Self {
            window_type: WindowType::Range,
            start: None,
            end: Some(0.0),
        }
    }
}

impl WindowClause {
    pub fn new(window_type: WindowType, start: Option<f64>, end: Option<f64>) -> Self {
        Self {
            window_type,
            start,
            end,
        }
    }

    pub fn rows(start: Option<i64>, end: Option<i64>) -> Self {
        Self::new(
            WindowType::Rows,
            start.map(|s| s as f64),
            end.map(|e| e as f64),
        )
    }

    pub fn range(start: Option<f64>, end: Option<f64>) -> Self {
        Self::new(WindowType::Range, start, end)
    }

    pub fn unbounded() -> Self {
        Self::range(None, None)
    }

    pub fn current_peers() -> Self {
        Self::range(Some(0.0), Some(0.0))
    }

    pub fn is_rows(&self) -> bool {
        self.window_type == WindowType::Rows
    }

    pub fn is_range(&self) -> bool {
        self.window_type == WindowType::Range
    }

    pub fn has_numeric_range_bound(&self) -> bool {
        let non_zero = |b: Option<f64>| b.is_some_and(|v| v != 0.0);
        self.is_range() && (non_zero(self.start) || non_zero(self.end))
    }

    pub fn validate(&self, order_by_len: usize) -> Result<()> {
        for bound in [self.start, self.end].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(Error::specification(format!(
                    "window bound must be finite, got {}",
                    bound
                )));
            }
            if self.is_rows() && !is_integral(bound) {
                return Err(Error::specification(format!(
                    "ROWS window bound must be an integer, got {}",
                    bound
                )));
            }
        }

        if self.has_numeric_range_bound() && order_by_len != 1 {
            return Err(Error::specification(format!(
                "RANGE window {} requires exactly one orderBy element, found {}",
                self, order_by_len
            )));
        }

        Ok(())
    }
}

impl fmt::Display for WindowClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.window_type {
            WindowType::Rows => "rows",
            WindowType::Range => "range",
        };
        let bound = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}({}, {})", kind, bound(self.start), bound(self.end))
    }
}
