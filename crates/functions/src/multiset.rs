use std::collections::BTreeMap;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;

/// Sorted multiset of values with occurrence counts.
///
/// Insert and remove are `O(log n)`; positional lookups walk the distinct
/// keys, so they cost `O(distinct values)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyMultiset {
    counts: BTreeMap<Value, u64>,
    len: usize,
}

impl FrequencyMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.len = 0;
    }

    pub fn insert(&mut self, value: Value) -> Result<()> {
        if !value.is_comparable() {
            return Err(Error::type_mismatch(
                "comparable value",
                value.data_type().to_string(),
            ));
        }
        *self.counts.entry(value).or_insert(0) += 1;
        self.len += 1;
        Ok(())
    }

    /// Removes one occurrence; returns `false` when the value was absent.
    pub fn remove(&mut self, value: &Value) -> bool {
        match self.counts.get_mut(value) {
            Some(count) if *count > 1 => {
                *count -= 1;
            }
            Some(_) => {
                self.counts.remove(value);
            }
            None => return false,
        }
        self.len -= 1;
        true
    }

    pub fn count(&self, value: &Value) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    pub fn first(&self) -> Option<&Value> {
        self.counts.keys().next()
    }

    pub fn last(&self) -> Option<&Value> {
        self.counts.keys().next_back()
    }

    /// The value at logical position `index` in sorted order, counting
    /// duplicates.
    pub fn get(&self, index: usize) -> Result<&Value> {
        let mut seen = 0usize;
        for (value, count) in &self.counts {
            seen += *count as usize;
            if index < seen {
                return Ok(value);
            }
        }
        Err(Error::index_out_of_range(index, self.len))
    }

    /// Linear interpolation at a fractional logical index: between
    /// `lo = get(floor(r))` and `hi = get(ceil(r))` the result is
    /// `lo + (r - floor(r)) * (hi - lo)`. Non-numeric neighbours yield `lo`.
    pub fn interpolate(&self, index: f64) -> Result<Value> {
        if !index.is_finite() || index < 0.0 {
            return Err(Error::index_out_of_range(0, self.len));
        }
        let floor = index.floor();
        let lower = floor as usize;
        let lo = self.get(lower)?;
        let frac = index - floor;
        if frac == 0.0 {
            return Ok(lo.clone());
        }

        let hi = self.get(lower + 1)?;
        if lo == hi {
            return Ok(lo.clone());
        }
        match (lo.as_f64(), hi.as_f64()) {
            (Some(a), Some(b)) if lo.is_numeric() && hi.is_numeric() => {
                Ok(Value::float64(a + frac * (b - a)))
            }
            _ => Ok(lo.clone()),
        }
    }

    /// Most frequent value; ties go to the smallest.
    pub fn mode(&self) -> Option<&Value> {
        let mut best: Option<(&Value, u64)> = None;
        for (value, count) in &self.counts {
            match best {
                Some((_, best_count)) if best_count >= *count => {}
                _ => best = Some((value, *count)),
            }
        }
        best.map(|(value, _)| value)
    }

    pub fn merge(&mut self, other: &FrequencyMultiset) {
        for (value, count) in &other.counts {
            *self.counts.entry(value.clone()).or_insert(0) += count;
        }
        self.len += other.len;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, u64)> {
        self.counts.iter().map(|(v, c)| (v, *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiset(values: &[i64]) -> FrequencyMultiset {
        let mut set = FrequencyMultiset::new();
        for v in values {
            set.insert(Value::int64(*v)).unwrap();
        }
        set
    }

    #[test]
    fn test_insert_remove_counts() {
        let mut set = multiset(&[3, 1, 3, 2]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.distinct(), 3);
        assert_eq!(set.count(&Value::int64(3)), 2);

        assert!(set.remove(&Value::int64(3)));
        assert_eq!(set.count(&Value::int64(3)), 1);
        assert!(set.remove(&Value::int64(3)));
        assert_eq!(set.count(&Value::int64(3)), 0);
        assert_eq!(set.distinct(), 2);
        assert!(!set.remove(&Value::int64(42)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_positional_lookup() {
        let set = multiset(&[5, 1, 5, 3]);
        assert_eq!(set.get(0).unwrap(), &Value::int64(1));
        assert_eq!(set.get(1).unwrap(), &Value::int64(3));
        assert_eq!(set.get(2).unwrap(), &Value::int64(5));
        assert_eq!(set.get(3).unwrap(), &Value::int64(5));
        assert!(matches!(
            set.get(4),
            Err(Error::IndexOutOfRange { index: 4, size: 4 })
        ));
        assert_eq!(set.first(), Some(&Value::int64(1)));
        assert_eq!(set.last(), Some(&Value::int64(5)));
    }

    #[test]
    fn test_interpolation() {
        let set = multiset(&[10, 20, 40]);
        assert_eq!(set.interpolate(0.0).unwrap(), Value::int64(10));
        assert_eq!(set.interpolate(0.5).unwrap(), Value::float64(15.0));
        assert_eq!(set.interpolate(1.25).unwrap(), Value::float64(25.0));
        assert_eq!(set.interpolate(2.0).unwrap(), Value::int64(40));
        assert!(set.interpolate(2.5).is_err());
    }

    #[test]
    fn test_interpolation_of_strings_takes_lower() {
        let mut set = FrequencyMultiset::new();
        set.insert(Value::string("a")).unwrap();
        set.insert(Value::string("b")).unwrap();
        assert_eq!(set.interpolate(0.5).unwrap(), Value::string("a"));
    }

    #[test]
    fn test_mode_prefers_smallest_on_ties() {
        let set = multiset(&[4, 2, 4, 2, 9]);
        assert_eq!(set.mode(), Some(&Value::int64(2)));
        assert_eq!(FrequencyMultiset::new().mode(), None);
    }

    #[test]
    fn test_arrays_are_rejected() {
        let mut set = FrequencyMultiset::new();
        let err = set.insert(Value::array(vec![Value::int64(1)])).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_merge() {
        let mut a = multiset(&[1, 2]);
        let b = multiset(&[2, 3]);
        a.merge(&b);
        assert_eq!(a.len(), 4);
        assert_eq!(a.count(&Value::int64(2)), 2);
    }
}
