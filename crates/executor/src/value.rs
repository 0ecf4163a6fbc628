use sliderule_common::types::Value;

/// One input record with the terminated result of every requested
/// aggregator, indexed in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticValue<'a, T> {
    record: &'a T,
    index: usize,
    values: Vec<Value>,
}

impl<'a, T> AnalyticValue<'a, T> {
    pub(crate) fn new(record: &'a T, index: usize, values: Vec<Value>) -> Self {
        Self {
            record,
            index,
            values,
        }
    }

    pub fn record(&self) -> &'a T {
        self.record
    }

    /// Position of the record in the input slice.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// One group of a group-by result.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateValue<'a, T> {
    record: &'a T,
    grouping_set: usize,
    properties: Vec<Value>,
    grouped_out: Vec<bool>,
    values: Vec<Value>,
}

impl<'a, T> AggregateValue<'a, T> {
    pub(crate) fn new(
        record: &'a T,
        grouping_set: usize,
        properties: Vec<Value>,
        grouped_out: Vec<bool>,
        values: Vec<Value>,
    ) -> Self {
        Self {
            record,
            grouping_set,
            properties,
            grouped_out,
            values,
        }
    }

    /// The first input record that fell into this group.
    pub fn record(&self) -> &'a T {
        self.record
    }

    pub fn grouping_set(&self) -> usize {
        self.grouping_set
    }

    /// Property values of the group; grouped-out properties are null.
    pub fn properties(&self) -> &[Value] {
        &self.properties
    }

    pub fn property(&self, index: usize) -> Option<&Value> {
        self.properties.get(index)
    }

    /// Whether the property at `index` was rolled up in this row.
    pub fn is_grouped_out(&self, index: usize) -> bool {
        self.grouped_out.get(index).copied().unwrap_or(false)
    }

    /// Bit vector of grouped-out properties, first property most significant.
    pub fn grouping_id(&self) -> u64 {
        self.grouped_out
            .iter()
            .fold(0, |id, &out| (id << 1) | u64::from(out))
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping_id() {
        let record = ();
        let value = AggregateValue::new(
            &record,
            1,
            vec![Value::string("A"), Value::Null, Value::Null],
            vec![false, true, true],
            vec![Value::int64(3)],
        );
        assert_eq!(value.grouping_id(), 0b011);
        assert!(value.is_grouped_out(1));
        assert!(!value.is_grouped_out(0));
        assert!(!value.is_grouped_out(9));
        assert_eq!(value.value(0), Some(&Value::int64(3)));
    }
}
