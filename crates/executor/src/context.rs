use debug_print::debug_eprintln;
use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_functions::AnalyticFunction;

use crate::columns::{ColumnStore, InputColumns};
use crate::dependency::Node;
use crate::frame::Frame;

/// Terminated values per slot and record.
#[derive(Debug, Clone)]
pub(crate) struct ResultTable {
    slots: Vec<Vec<Option<Value>>>,
}

impl ResultTable {
    pub(crate) fn new(slots: usize, records: usize) -> Self {
        Self {
            slots: vec![vec![None; records]; slots],
        }
    }

    fn set(&mut self, slot: usize, record: usize, value: Value) -> Result<()> {
        let cell = self
            .slots
            .get_mut(slot)
            .and_then(|values| values.get_mut(record))
            .ok_or_else(|| {
                Error::internal(format!("no result cell for slot {} record {}", slot, record))
            })?;
        *cell = Some(value);
        Ok(())
    }

    fn get(&self, slot: usize, record: usize) -> Option<&Value> {
        self.slots.get(slot)?.get(record)?.as_ref()
    }

    /// Row-major results for the first `requested` slots.
    pub(crate) fn into_rows(self, requested: usize) -> Vec<Vec<Value>> {
        let records = self.slots.first().map_or(0, Vec::len);
        let mut rows = vec![Vec::with_capacity(requested); records];
        for values in self.slots.into_iter().take(requested) {
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value.unwrap_or(Value::Null));
            }
        }
        rows
    }
}

/// The function being evaluated and how far along its view it has
/// terminated.
#[derive(Debug)]
struct Cursor<'a> {
    slot: usize,
    function: Box<dyn AnalyticFunction>,
    view: &'a [usize],
    /// Next view position to terminate; everything before it is done.
    next: usize,
}

impl Cursor<'_> {
    fn store(&mut self, value: Value, results: &mut ResultTable) -> Result<()> {
        results.set(self.slot, self.view[self.next], value)?;
        self.next += 1;
        Ok(())
    }
}

#[derive(Debug)]
enum Scan<'a> {
    Window(SlidingWindow<'a>),
    /// Combines the terminated values of the listed slots.
    Dependent(Vec<usize>),
}

/// Window edges within the current partition. `start..end` are the view
/// positions currently folded into the function.
#[derive(Debug)]
struct SlidingWindow<'a> {
    frame: Frame<'a>,
    inputs: InputColumns<'a>,
    start: usize,
    end: usize,
    partition_end: Option<usize>,
    buffer: Vec<Value>,
}

impl SlidingWindow<'_> {
    fn advance(
        &mut self,
        index: usize,
        cursor: &mut Cursor<'_>,
        results: &mut ResultTable,
    ) -> Result<()> {
        if self.partition_end.is_none_or(|end| index > end) {
            if let Some(end) = self.partition_end {
                self.terminate_through(end, cursor, results)?;
            }
            cursor.function.init();

            let view = cursor.view;
            let mut end = index;
            while end + 1 < view.len()
                && self.frame.comparator().same_partition(view[end + 1], view[index])
            {
                end += 1;
            }
            debug_eprintln!(
                "[executor::analytic] slot {} partition [{}, {}]",
                cursor.slot,
                index,
                end
            );
            self.partition_end = Some(end);
            self.start = index;
            self.end = index;
        }

        let partition_end = self.partition_end.unwrap_or(index);
        while cursor.next <= partition_end && !self.frame.reaches(cursor.view, cursor.next, index)? {
            self.terminate_next(cursor, results)?;
        }

        self.inputs.fill(cursor.view[index], &mut self.buffer);
        cursor.function.iterate(&self.buffer)?;
        self.end = index + 1;
        Ok(())
    }

    fn finish(&mut self, cursor: &mut Cursor<'_>, results: &mut ResultTable) -> Result<()> {
        match self.partition_end {
            Some(end) => self.terminate_through(end, cursor, results),
            None => Ok(()),
        }
    }

    fn terminate_through(
        &mut self,
        end: usize,
        cursor: &mut Cursor<'_>,
        results: &mut ResultTable,
    ) -> Result<()> {
        while cursor.next <= end {
            self.terminate_next(cursor, results)?;
        }
        Ok(())
    }

    /// Slides the window start past rows outside the frame of the next
    /// target, then terminates that target.
    fn terminate_next(&mut self, cursor: &mut Cursor<'_>, results: &mut ResultTable) -> Result<()> {
        let target = cursor.next;
        while self.start < self.end && !self.frame.admits(cursor.view, target, self.start)? {
            self.inputs.fill(cursor.view[self.start], &mut self.buffer);
            cursor.function.delete(&self.buffer)?;
            self.start += 1;
        }

        let value = cursor.function.terminate()?;
        cursor.store(value, results)
    }
}

/// Terminates a dependent slot as far as its dependencies allow.
fn resolve(dependencies: &[usize], cursor: &mut Cursor<'_>, results: &mut ResultTable) -> Result<()> {
    while let Some(&record) = cursor.view.get(cursor.next) {
        if !dependencies
            .iter()
            .all(|&dependency| results.get(dependency, record).is_some())
        {
            break;
        }
        for (position, &dependency) in dependencies.iter().enumerate() {
            let value = results.get(dependency, record).cloned().unwrap_or(Value::Null);
            cursor.function.set_dependency_value(position, value)?;
        }
        let value = cursor.function.terminate()?;
        cursor.store(value, results)?;
    }
    Ok(())
}

/// Per-aggregator scan state over one sorted view.
#[derive(Debug)]
pub(crate) struct AnalyticContext<'a> {
    cursor: Cursor<'a>,
    scan: Scan<'a>,
}

impl<'a> AnalyticContext<'a> {
    pub(crate) fn new(
        slot: usize,
        node: &Node,
        function: Box<dyn AnalyticFunction>,
        view: &'a [usize],
        columns: &'a ColumnStore,
    ) -> Result<Self> {
        let scan = if node.dependencies.is_empty() {
            Scan::Window(SlidingWindow {
                frame: Frame::new(node.window, node.comparator.bind(columns)?),
                inputs: columns.inputs(function.arguments())?,
                start: 0,
                end: 0,
                partition_end: None,
                buffer: Vec::new(),
            })
        } else {
            Scan::Dependent(node.dependencies.clone())
        };
        Ok(Self {
            cursor: Cursor {
                slot,
                function,
                view,
                next: 0,
            },
            scan,
        })
    }

    pub(crate) fn into_function(self) -> Box<dyn AnalyticFunction> {
        self.cursor.function
    }

    /// Handles outer index `index`: crosses a partition boundary if needed,
    /// terminates every position whose frame can no longer grow, then
    /// iterates the record at `index`.
    pub(crate) fn advance(&mut self, index: usize, results: &mut ResultTable) -> Result<()> {
        match &mut self.scan {
            Scan::Window(window) => window.advance(index, &mut self.cursor, results),
            Scan::Dependent(dependencies) => resolve(dependencies, &mut self.cursor, results),
        }
    }

    /// Terminates everything left after the last outer index.
    pub(crate) fn finish(&mut self, results: &mut ResultTable) -> Result<()> {
        match &mut self.scan {
            Scan::Window(window) => window.finish(&mut self.cursor, results),
            Scan::Dependent(dependencies) => {
                resolve(dependencies, &mut self.cursor, results)?;
                let cursor = &self.cursor;
                if cursor.next < cursor.view.len() {
                    return Err(Error::internal(format!(
                        "slot {} left {} rows unresolved",
                        cursor.slot,
                        cursor.view.len() - cursor.next
                    )));
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_table_rows_keep_requested_slots() {
        let mut table = ResultTable::new(3, 2);
        table.set(0, 1, Value::int64(10)).unwrap();
        table.set(2, 0, Value::int64(99)).unwrap();
        assert_eq!(table.get(2, 0), Some(&Value::int64(99)));
        assert!(table.set(3, 0, Value::Null).is_err());

        let rows = table.into_rows(2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Value::Null, Value::Null]);
        assert_eq!(rows[1], vec![Value::int64(10), Value::Null]);
    }
}
