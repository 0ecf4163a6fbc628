use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionClause {
    pub fields: Vec<String>,
}

impl PartitionClause {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for PartitionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partitionBy({})", self.fields.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullOrdering {
    First,
    Last,
}

impl SortDirection {
    pub fn default_null_ordering(self) -> NullOrdering {
        match self {
            SortDirection::Asc => NullOrdering::Last,
            SortDirection::Desc => NullOrdering::First,
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Asc
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderByElement {
    pub field: String,
    pub direction: SortDirection,
    pub nulls: NullOrdering,
}

impl OrderByElement {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
            nulls: direction.default_null_ordering(),
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    pub fn nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = nulls;
        self
    }

    pub fn nulls_first(&self) -> bool {
        self.nulls == NullOrdering::First
    }
}

impl fmt::Display for OrderByElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        let nulls = match self.nulls {
            NullOrdering::First => "FIRST",
            NullOrdering::Last => "LAST",
        };
        write!(f, "{} {} NULLS {}", self.field, direction, nulls)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderByClause {
    pub elements: Vec<OrderByElement>,
}

impl OrderByClause {
    pub fn new(elements: Vec<OrderByElement>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl fmt::Display for OrderByClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.elements.iter().map(|e| e.to_string()).collect();
        write!(f, "orderBy({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_null_ordering_follows_direction() {
        assert_eq!(OrderByElement::asc("v").nulls, NullOrdering::Last);
        assert_eq!(OrderByElement::desc("v").nulls, NullOrdering::First);
        assert_eq!(
            OrderByElement::desc("v").nulls(NullOrdering::Last).nulls,
            NullOrdering::Last
        );
    }

    #[test]
    fn test_display() {
        let clause = OrderByClause::new(vec![
            OrderByElement::asc("v"),
            OrderByElement::desc("w"),
        ]);
        assert_eq!(
            clause.to_string(),
            "orderBy(v ASC NULLS LAST, w DESC NULLS FIRST)"
        );
        assert_eq!(
            PartitionClause::new(["cat", "sub"]).to_string(),
            "partitionBy(cat, sub)"
        );
    }
}
