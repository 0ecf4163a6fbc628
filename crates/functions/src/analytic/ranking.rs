use std::any::Any;

use sliderule_common::error::Result;
use sliderule_common::types::Value;
use sliderule_ir::{Argument, WindowClause, check_arity};

use super::merge_unsupported;
use crate::aggregate::{AggregateFunction, AnalyticFunction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKind {
    RowNumber,
    Rank,
    DenseRank,
}

impl RankKind {
    pub fn name(self) -> &'static str {
        match self {
            RankKind::RowNumber => "RowNumber",
            RankKind::Rank => "Rank",
            RankKind::DenseRank => "DenseRank",
        }
    }
}

/// Row number, rank and dense rank over a fixed `range(0, 0)` frame.
///
/// When a row is terminated the frame holds exactly its peer group and every
/// earlier row of the partition has been iterated, so the rows ahead of the
/// group number `seen - in_window`. A delete means the frame moved on to a
/// new peer group.
#[derive(Debug, Clone)]
pub struct RankFunction {
    kind: RankKind,
    seen: i64,
    in_window: i64,
    group_offset: i64,
    dense_rank: i64,
    new_group: bool,
}

impl RankFunction {
    pub fn new(kind: RankKind, arguments: &[Argument]) -> Result<Self> {
        check_arity(kind.name(), arguments, 0, 0)?;
        Ok(Self::of(kind))
    }

    pub fn of(kind: RankKind) -> Self {
        Self {
            kind,
            seen: 0,
            in_window: 0,
            group_offset: 0,
            dense_rank: 0,
            new_group: true,
        }
    }

    pub fn row_number() -> Self {
        Self::of(RankKind::RowNumber)
    }

    pub fn rank() -> Self {
        Self::of(RankKind::Rank)
    }

    pub fn dense_rank() -> Self {
        Self::of(RankKind::DenseRank)
    }
}

impl AggregateFunction for RankFunction {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn arguments(&self) -> &[Argument] {
        &[]
    }

    fn init(&mut self) {
        self.seen = 0;
        self.in_window = 0;
        self.group_offset = 0;
        self.dense_rank = 0;
        self.new_group = true;
    }

    fn iterate(&mut self, _values: &[Value]) -> Result<()> {
        self.seen += 1;
        self.in_window += 1;
        Ok(())
    }

    fn merge(&mut self, _other: &dyn AggregateFunction) -> Result<()> {
        merge_unsupported(self)
    }

    fn terminate(&mut self) -> Result<Value> {
        if self.new_group {
            self.new_group = false;
            self.group_offset = 0;
            self.dense_rank += 1;
        }
        let before_group = self.seen - self.in_window;
        let result = match self.kind {
            RankKind::RowNumber => before_group + 1 + self.group_offset,
            RankKind::Rank => before_group + 1,
            RankKind::DenseRank => self.dense_rank,
        };
        self.group_offset += 1;
        Ok(Value::int64(result))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnalyticFunction for RankFunction {
    fn delete(&mut self, _values: &[Value]) -> Result<()> {
        self.in_window -= 1;
        self.new_group = true;
        Ok(())
    }

    fn takes_window_clause(&self) -> bool {
        false
    }

    fn window_clause(&self) -> Option<WindowClause> {
        Some(WindowClause::current_peers())
    }

    fn replicate(&self) -> Box<dyn AnalyticFunction> {
        Box::new(Self::of(self.kind))
    }
}
