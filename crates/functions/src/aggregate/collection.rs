//! Positional functions. The frame is held in arrival order; `delete`
//! removes the oldest entry equal to the deleted value, which is the front
//! whenever the window start moves forward.

use std::any::Any;
use std::collections::VecDeque;

use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;
use sliderule_ir::{Argument, check_arity};

use super::{AggregateFunction, AnalyticFunction, downcast, field_arguments, first_input};

/// Removes the oldest element equal to `value`.
fn remove_oldest<T: PartialEq>(frame: &mut VecDeque<T>, value: &T, name: &str) -> Result<()> {
    let position = frame.iter().position(|item| item == value).ok_or_else(|| {
        Error::internal(format!("{} deleted a value that is not in its frame", name))
    })?;
    frame.remove(position);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
}

/// Value of the first or last row of the frame, nulls included.
#[derive(Debug, Clone)]
pub struct PositionalFunction {
    position: Position,
    arguments: Vec<Argument>,
    frame: VecDeque<Value>,
}

impl PositionalFunction {
    pub fn new(position: Position, arguments: &[Argument]) -> Result<Self> {
        let name = match position {
            Position::First => "First",
            Position::Last => "Last",
        };
        Ok(Self {
            position,
            arguments: field_arguments(name, arguments, 1)?,
            frame: VecDeque::new(),
        })
    }

    pub fn first(field: impl Into<String>) -> Self {
        Self {
            position: Position::First,
            arguments: vec![Argument::field(field)],
            frame: VecDeque::new(),
        }
    }

    pub fn last(field: impl Into<String>) -> Self {
        Self {
            position: Position::Last,
            arguments: vec![Argument::field(field)],
            frame: VecDeque::new(),
        }
    }
}

impl AggregateFunction for PositionalFunction {
    fn name(&self) -> &'static str {
        match self.position {
            Position::First => "First",
            Position::Last => "Last",
        }
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.frame.clear();
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, self.name())?;
        self.frame.push_back(value.clone());
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, self.name())?;
        if other.position != self.position {
            return Err(Error::internal(format!(
                "Cannot merge {} with {}",
                self.name(),
                other.name()
            )));
        }
        self.frame.extend(other.frame.iter().cloned());
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        let value = match self.position {
            Position::First => self.frame.front(),
            Position::Last => self.frame.back(),
        };
        Ok(value.cloned().unwrap_or(Value::Null))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for PositionalFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let name = self.name();
        let value = first_input(values, name)?;
        remove_oldest(&mut self.frame, value, name)
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

/// `Concat(field[, separator])`: display strings of the non-null values
/// joined in frame order. The default separator is `", "`.
#[derive(Debug, Clone)]
pub struct ConcatFunction {
    arguments: Vec<Argument>,
    separator: String,
    parts: VecDeque<String>,
}

impl ConcatFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        check_arity("Concat", arguments, 1, 2)?;
        arguments[0].expect_field("Concat")?;
        let separator = match arguments.get(1) {
            None => ", ".to_string(),
            Some(Argument::Literal(Value::String(s))) => s.clone(),
            Some(other) => {
                return Err(Error::specification(format!(
                    "Concat separator must be a string literal, got {}",
                    other
                )));
            }
        };
        Ok(Self {
            arguments: arguments.to_vec(),
            separator,
            parts: VecDeque::new(),
        })
    }
}

impl AggregateFunction for ConcatFunction {
    fn name(&self) -> &'static str {
        "Concat"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.parts.clear();
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Concat")?;
        if !value.is_null() {
            self.parts.push_back(value.to_string());
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "Concat")?;
        self.parts.extend(other.parts.iter().cloned());
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.parts.is_empty() {
            return Ok(Value::null());
        }
        let joined = self
            .parts
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&self.separator);
        Ok(Value::string(joined))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for ConcatFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Concat")?;
        if value.is_null() {
            return Ok(());
        }
        remove_oldest(&mut self.parts, &value.to_string(), "Concat")
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}

/// Array of the frame's non-null values in frame order.
#[derive(Debug, Clone)]
pub struct CollectFunction {
    arguments: Vec<Argument>,
    items: VecDeque<Value>,
}

impl CollectFunction {
    pub fn new(arguments: &[Argument]) -> Result<Self> {
        Ok(Self {
            arguments: field_arguments("Collect", arguments, 1)?,
            items: VecDeque::new(),
        })
    }
}

impl AggregateFunction for CollectFunction {
    fn name(&self) -> &'static str {
        "Collect"
    }

    fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    fn init(&mut self) {
        self.items.clear();
    }

    fn iterate(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Collect")?;
        if !value.is_null() {
            self.items.push_back(value.clone());
        }
        Ok(())
    }

    fn merge(&mut self, other: &dyn AggregateFunction) -> Result<()> {
        let other = downcast::<Self>(other, "Collect")?;
        self.items.extend(other.items.iter().cloned());
        Ok(())
    }

    fn terminate(&mut self) -> Result<Value> {
        Ok(Value::array(self.items.iter().cloned().collect()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for CollectFunction {
    fn delete(&mut self, values: &[Value]) -> Result<()> {
        let value = first_input(values, "Collect")?;
        if value.is_null() {
            return Ok(());
        }
        remove_oldest(&mut self.items, value, "Collect")
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        let mut copy = self.clone();
        copy.init();
        Box::new(copy)
    }
}
