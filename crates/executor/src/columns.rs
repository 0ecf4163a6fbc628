use std::collections::HashMap;

use debug_print::debug_eprintln;
use sliderule_common::error::{Error, Result};
use sliderule_common::record::FieldAccessor;
use sliderule_common::types::Value;
use sliderule_ir::Argument;

/// Stand-in value fed for the `*` argument so that null rows still count.
const ALL_MARKER: Value = Value::Bool(true);

/// Every referenced field of every record, read once through the accessor.
#[derive(Debug, Clone, Default)]
pub struct ColumnStore {
    columns: HashMap<String, Vec<Value>>,
    len: usize,
}

impl ColumnStore {
    pub fn load<'f, T, A>(
        records: &[T],
        accessor: &A,
        fields: impl IntoIterator<Item = &'f str>,
    ) -> Result<Self>
    where
        A: FieldAccessor<T> + ?Sized,
    {
        let mut columns = HashMap::new();
        for field in fields {
            if columns.contains_key(field) {
                continue;
            }
            let values = records
                .iter()
                .map(|record| accessor.get(record, field))
                .collect::<Result<Vec<_>>>()?;
            columns.insert(field.to_string(), values);
        }
        debug_eprintln!(
            "[executor::columns] loaded {} columns over {} records",
            columns.len(),
            records.len()
        );
        Ok(Self {
            columns,
            len: records.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    pub fn column(&self, field: &str) -> Result<&[Value]> {
        self.columns
            .get(field)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::internal(format!("column {} was not loaded", field)))
    }

    /// Columns feeding a function's input arguments, in declaration order.
    pub fn inputs<'a>(&'a self, arguments: &[Argument]) -> Result<InputColumns<'a>> {
        let mut columns = Vec::new();
        for argument in arguments {
            match argument {
                Argument::Field(name) => columns.push(Some(self.column(name)?)),
                Argument::All => columns.push(None),
                Argument::Literal(_) => {}
            }
        }
        Ok(InputColumns { columns })
    }
}

#[derive(Debug, Clone)]
pub struct InputColumns<'a> {
    columns: Vec<Option<&'a [Value]>>,
}

impl InputColumns<'_> {
    /// Replaces `buffer` with the input values of `record`.
    pub fn fill(&self, record: usize, buffer: &mut Vec<Value>) {
        buffer.clear();
        for column in &self.columns {
            let value = match column {
                Some(values) => values.get(record).cloned().unwrap_or(Value::Null),
                None => ALL_MARKER,
            };
            buffer.push(value);
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use sliderule_common::record::{RecordAccessor, row};

    use super::*;

    #[test]
    fn test_load_reads_each_field_once() {
        use std::cell::Cell;

        let records = vec![1i64, 2, 3];
        let reads = Cell::new(0);
        let accessor = |record: &i64, _field: &str| -> Result<Value> {
            reads.set(reads.get() + 1);
            Ok(Value::int64(*record))
        };
        let store = ColumnStore::load(&records, &accessor, ["v", "v", "w"]).unwrap();
        assert_eq!(reads.get(), 6);
        assert_eq!(store.len(), 3);
        assert_eq!(store.column("w").unwrap()[2], Value::int64(3));
        assert!(store.column("x").is_err());
    }

    #[test]
    fn test_missing_field_fails_load() {
        let records = vec![row([("v", 1i64)])];
        let err = ColumnStore::load(&records, &RecordAccessor, ["missing"]).unwrap_err();
        assert!(matches!(err, Error::FieldNotFound(_)));
    }

    #[test]
    fn test_inputs_skip_literals_and_mark_all() {
        let records = vec![row([("v", Value::Null)])];
        let store = ColumnStore::load(&records, &RecordAccessor, ["v"]).unwrap();
        let inputs = store
            .inputs(&[Argument::All, Argument::literal(0.5), Argument::field("v")])
            .unwrap();
        assert_eq!(inputs.width(), 2);

        let mut buffer = Vec::new();
        inputs.fill(0, &mut buffer);
        assert_eq!(buffer, vec![Value::bool_val(true), Value::Null]);
    }
}
