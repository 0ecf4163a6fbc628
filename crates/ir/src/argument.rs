use std::fmt;

use serde::{Deserialize, Serialize};
use sliderule_common::error::{Error, Result};
use sliderule_common::types::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    Field(String),
    /// The `*` pseudo-field: every record contributes, nulls included.
    All,
    Literal(Value),
}

impl Argument {
    pub fn field(name: impl Into<String>) -> Self {
        Argument::Field(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Argument::Literal(value.into())
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Argument::Field(_) | Argument::All)
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            Argument::Field(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Argument::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn expect_field(&self, function: &str) -> Result<String> {
        match self {
            Argument::Field(name) => Ok(name.clone()),
            other => Err(Error::specification(format!(
                "{} expects a field name, got {}",
                function, other
            ))),
        }
    }

    pub fn expect_i64(&self, function: &str) -> Result<i64> {
        match self {
            Argument::Literal(Value::Int64(n)) => Ok(*n),
            other => Err(Error::specification(format!(
                "{} expects an integer literal, got {}",
                function, other
            ))),
        }
    }

    pub fn expect_f64(&self, function: &str) -> Result<f64> {
        match self {
            Argument::Literal(v) if v.is_numeric() => v.as_f64().ok_or_else(|| {
                Error::specification(format!("{} expects a numeric literal", function))
            }),
            other => Err(Error::specification(format!(
                "{} expects a numeric literal, got {}",
                function, other
            ))),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Field(name) => write!(f, "{}", name),
            Argument::All => write!(f, "*"),
            Argument::Literal(Value::String(s)) => write!(f, "'{}'", s),
            Argument::Literal(v) => write!(f, "{}", v),
        }
    }
}

pub fn check_arity(function: &str, args: &[Argument], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(Error::specification(format!(
            "{} takes {} argument(s), got {}",
            function,
            expected,
            args.len()
        )));
    }
    Ok(())
}
