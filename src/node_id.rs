//! Handle for a graph node stored in a [`Pipeline`](crate::pipeline::Pipeline) arena.
//!
//! Every [`Graph`](crate::Graph) is one arena slot; `NodeId` is its index. Ids are
//! assigned sequentially per pipeline, are `Copy` and hashable, and are what the
//! fan-in pass and the per-run cache key on.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// Numeric identifier of a graph node within its pipeline.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    /// Underlying sequence number.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "#{}", self.0)
    }
}
