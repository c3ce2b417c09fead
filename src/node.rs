use crate::node_id::NodeId;
use crate::operator::Operator;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Where a graph node reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Upstream {
    /// Placeholder for an external input, bound by name at run time.
    Named(String),
    /// Another graph node of the same pipeline.
    Graph(NodeId),
    /// A graph node of a different pipeline; rejected when the graph is planned.
    Foreign(NodeId),
}

/// Immutable description of one DAG node.
///
/// `upstreams[0]` is the implicit first step: the node's pipeline starts by reading
/// it. Each `Join` in `ops` appends one more upstream and refers to it by index.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub upstreams: Vec<Upstream>,
    pub ops: Vec<Operator>,
}

impl GraphNode {
    pub(crate) fn reading(input: Upstream) -> Self {
        Self {
            upstreams: vec![input],
            ops: Vec::new(),
        }
    }
}

/// Identity of a vertex in the run-time DAG.
///
/// Named inputs are vertices of their own: every placeholder that mentions the
/// same name reads the same bound source.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vertex {
    Graph(NodeId),
    Input(String),
}

impl Display for Vertex {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Vertex::Graph(id) => write!(f, "graph {id}"),
            Vertex::Input(name) => write!(f, "input `{name}`"),
        }
    }
}
