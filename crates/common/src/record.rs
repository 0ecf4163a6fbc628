use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::types::Value;

pub type Row = IndexMap<String, Value>;

/// Resolves a named field of a record to a [`Value`].
///
/// The engine never inspects records directly; every function and
/// comparator reads through an accessor. Implementations must be
/// deterministic: the same record and name always yield the same value.
pub trait FieldAccessor<T: ?Sized> {
    fn get(&self, record: &T, field: &str) -> Result<Value>;
}

impl<T: ?Sized, F> FieldAccessor<T> for F
where
    F: Fn(&T, &str) -> Result<Value>,
{
    fn get(&self, record: &T, field: &str) -> Result<Value> {
        self(record, field)
    }
}

/// Records that can look up their own fields by name.
pub trait Record {
    fn field(&self, name: &str) -> Option<Value>;
}

/// Accessor over any [`Record`]; an unknown name is a type error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAccessor;

impl<T: Record + ?Sized> FieldAccessor<T> for RecordAccessor {
    fn get(&self, record: &T, field: &str) -> Result<Value> {
        record
            .field(field)
            .ok_or_else(|| Error::field_not_found(field))
    }
}

impl Record for IndexMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

// Dotted names walk nested objects: `address.city`.
impl Record for serde_json::Value {
    fn field(&self, name: &str) -> Option<Value> {
        let mut current = self;
        for part in name.split('.') {
            current = current.as_object()?.get(part)?;
        }
        Some(Value::from_json(current))
    }
}

pub fn row<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
