//! Operators: the declared transformation steps of a graph.
//!
//! [`Operator`] is a closed sum type; each variant carries its own typed
//! parameters, fixed when the builder method is called. Callbacks are stored as
//! shared trait objects so graph descriptions stay cheap to clone and can be
//! snapshotted by every run.

use crate::keys::Keys;
use crate::record::Record;
use std::fmt::{Debug, Display, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Lazy sequence of records returned by map and reduce callbacks.
pub type RecordIter = Box<dyn Iterator<Item = Record>>;

/// Flat-map callback: one record in, zero or more out.
pub type Mapper = Arc<dyn Fn(Record) -> RecordIter + Send + Sync>;

/// Group callback: one non-empty run of equal-key records in, zero or more out.
pub type Reducer = Arc<dyn Fn(Vec<Record>) -> RecordIter + Send + Sync>;

/// Fold step: `(accumulator, next) -> accumulator`.
pub type Folder = Arc<dyn Fn(Record, &Record) -> Record + Send + Sync>;

/// Which unmatched key groups a join keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Matched pairs only.
    #[default]
    Inner,
    /// Matched pairs plus unmatched left records.
    Left,
    /// Matched pairs plus unmatched right records.
    Right,
    /// Matched pairs plus unmatched records from both sides.
    Outer,
}

impl JoinKind {
    #[must_use]
    pub fn keeps_left(self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Outer)
    }

    #[must_use]
    pub fn keeps_right(self) -> bool {
        matches!(self, JoinKind::Right | JoinKind::Outer)
    }
}

impl Display for JoinKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Outer => "outer",
        })
    }
}

/// Discriminant of [`Operator`], used in errors and reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Map,
    Reduce,
    Fold,
    Sort,
    Join,
}

impl Display for OperatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(match self {
            OperatorKind::Map => "map",
            OperatorKind::Reduce => "reduce",
            OperatorKind::Fold => "fold",
            OperatorKind::Sort => "sort",
            OperatorKind::Join => "join",
        })
    }
}

/// One step of a graph's pipeline.
#[derive(Clone)]
pub enum Operator {
    Map {
        mapper: Mapper,
    },
    /// Upstream must already be grouped by `keys`; the engine does not sort here.
    Reduce {
        reducer: Reducer,
        keys: Keys,
    },
    Fold {
        folder: Folder,
        initial: Record,
    },
    Sort {
        keys: Keys,
        descending: bool,
    },
    /// `upstream` indexes the owning node's upstream list; it is never 0.
    Join {
        upstream: usize,
        keys: Keys,
        kind: JoinKind,
    },
}

impl Operator {
    #[must_use]
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Map { .. } => OperatorKind::Map,
            Operator::Reduce { .. } => OperatorKind::Reduce,
            Operator::Fold { .. } => OperatorKind::Fold,
            Operator::Sort { .. } => OperatorKind::Sort,
            Operator::Join { .. } => OperatorKind::Join,
        }
    }
}

impl Debug for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Operator::Map { .. } => f.debug_struct("Map").finish_non_exhaustive(),
            Operator::Reduce { keys, .. } => f
                .debug_struct("Reduce")
                .field("keys", keys)
                .finish_non_exhaustive(),
            Operator::Fold { initial, .. } => f
                .debug_struct("Fold")
                .field("initial", initial)
                .finish_non_exhaustive(),
            Operator::Sort { keys, descending } => f
                .debug_struct("Sort")
                .field("keys", keys)
                .field("descending", descending)
                .finish(),
            Operator::Join {
                upstream,
                keys,
                kind,
            } => f
                .debug_struct("Join")
                .field("upstream", upstream)
                .field("keys", keys)
                .field("kind", kind)
                .finish(),
        }
    }
}
