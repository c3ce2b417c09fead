//! Error type shared by graph construction, planning and execution.
//!
//! Every failure aborts the run it occurs in; nothing is retried. Errors carry
//! the operator kind, key list and field names involved so a caller can tell
//! what went wrong without seeing the internal operator representation.

use crate::keys::Keys;
use crate::node_id::NodeId;
use crate::operator::OperatorKind;
use thiserror::Error;

/// Canonical result for the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A named input reachable from the terminal graph has no binding.
    /// Raised before any record is computed.
    #[error("input `{name}` is not bound for this run")]
    UnboundInput { name: String },

    /// A join would merge two records that both carry the non-key field `field`.
    #[error("join on {keys}: field `{field}` exists on both sides and is not a join key")]
    AmbiguousField { field: String, keys: Keys },

    /// A reduce, sort or join key is missing from a record. Raised lazily, when
    /// the offending record reaches the operator.
    #[error("{operator} on {keys}: record has no field `{field}`")]
    MalformedKeys {
        operator: OperatorKind,
        keys: Keys,
        field: String,
    },

    /// An externally supplied input failed while being read.
    #[error("reading input `{name}` failed: {source:#}")]
    Input {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The graph was wired into its own ancestry.
    #[error("graph {node} is reachable from itself")]
    Cycle { node: NodeId },

    /// A graph built on another pipeline was used as an input.
    #[error("graph {node} belongs to a different pipeline")]
    ForeignGraph { node: NodeId },

    #[error("internal invariant failed: {0}")]
    Invariant(String),
}
