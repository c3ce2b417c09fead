//! The builder-facing [`Graph`] handle.
//!
//! A `Graph` is one node of a pipeline's DAG: an upstream to read from plus an
//! ordered list of operators. Builder calls only record operators; nothing runs
//! until [`Graph::run`] (or [`Graph::stream`]) is called with concrete inputs.
//!
//! ```
//! use compgraph::*;
//!
//! # fn main() -> compgraph::Result<()> {
//! let p = Pipeline::default();
//! let counts = Graph::new(&p, "docs")
//!     .map(|r: Record| {
//!         let text = r.get_str("text").unwrap_or_default().to_string();
//!         text.split_whitespace()
//!             .map(|w| record! { "word" => w, "count" => 1 })
//!             .collect::<Vec<_>>()
//!     })
//!     .sort("word")
//!     .reduce(
//!         |group: Vec<Record>| {
//!             let word = group[0].get("word").cloned().unwrap_or_default();
//!             let total: i64 = group.iter().filter_map(|r| r.get_i64("count")).sum();
//!             Some(record! { "text" => word, "count" => total })
//!         },
//!         "word",
//!     );
//!
//! let out = counts.run(Bindings::new().bind("docs", vec![record! { "doc_id" => 1, "text" => "a a b" }]))?;
//! assert_eq!(
//!     out,
//!     vec![record! { "text" => "a", "count" => 2 }, record! { "text" => "b", "count" => 1 }]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing sub-graphs
//!
//! A graph can feed any number of downstream graphs. Within one run it is computed
//! once: if more than one consumer reads it, its output is materialized on first
//! pull and replayed to the others.

use crate::bindings::Bindings;
use crate::error::Result;
use crate::keys::Keys;
use crate::node::{GraphNode, Upstream};
use crate::node_id::NodeId;
use crate::operator::{JoinKind, Operator, RecordIter};
use crate::pipeline::Pipeline;
use crate::planner::{Explanation, explain};
use crate::record::Record;
use crate::runner::{RunStream, Runner};
use std::sync::Arc;

/// What a graph reads from: a named external input or another graph.
#[derive(Clone)]
pub enum Input {
    Named(String),
    Graph(Graph),
}

impl From<&str> for Input {
    fn from(name: &str) -> Self {
        Input::Named(name.to_string())
    }
}

impl From<String> for Input {
    fn from(name: String) -> Self {
        Input::Named(name)
    }
}

impl From<Graph> for Input {
    fn from(graph: Graph) -> Self {
        Input::Graph(graph)
    }
}

impl From<&Graph> for Input {
    fn from(graph: &Graph) -> Self {
        Input::Graph(graph.clone())
    }
}

/// Handle to one node of a pipeline's DAG.
#[derive(Clone)]
pub struct Graph {
    pub(crate) pipeline: Pipeline,
    pub(crate) id: NodeId,
}

impl Graph {
    /// Create a graph whose only upstream is `input`.
    ///
    /// A graph from another pipeline is accepted here but reported as
    /// [`Error::ForeignGraph`](crate::Error::ForeignGraph) when the graph is run.
    pub fn new(p: &Pipeline, input: impl Into<Input>) -> Self {
        let upstream = wire(p, input.into());
        let id = p.insert_node(GraphNode::reading(upstream));
        Graph {
            pipeline: p.clone(),
            id,
        }
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn push(self, op: Operator) -> Self {
        self.pipeline.update(self.id, |node| node.ops.push(op));
        self
    }

    /// Flat-map every record through `mapper`.
    #[must_use]
    pub fn map<F, I>(self, mapper: F) -> Self
    where
        F: Fn(Record) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'static,
    {
        let mapper = Arc::new(move |r: Record| Box::new(mapper(r).into_iter()) as RecordIter);
        self.push(Operator::Map { mapper })
    }

    /// Call `reducer` once per maximal run of consecutive records with equal `keys`.
    ///
    /// The upstream must already be ordered so that equal keys are adjacent,
    /// usually by a preceding [`sort`](Self::sort) on the same keys.
    #[must_use]
    pub fn reduce<F, I>(self, reducer: F, keys: impl Into<Keys>) -> Self
    where
        F: Fn(Vec<Record>) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'static,
    {
        let reducer =
            Arc::new(move |group: Vec<Record>| Box::new(reducer(group).into_iter()) as RecordIter);
        self.push(Operator::Reduce {
            reducer,
            keys: keys.into(),
        })
    }

    /// Fold the whole upstream into one record, starting from `initial`.
    ///
    /// Always emits exactly one record; an empty upstream yields `initial`.
    #[must_use]
    pub fn fold<F>(self, initial: Record, folder: F) -> Self
    where
        F: Fn(Record, &Record) -> Record + Send + Sync + 'static,
    {
        self.push(Operator::Fold {
            folder: Arc::new(folder),
            initial,
        })
    }

    /// Stable ascending sort by the key tuple.
    #[must_use]
    pub fn sort(self, keys: impl Into<Keys>) -> Self {
        self.push(Operator::Sort {
            keys: keys.into(),
            descending: false,
        })
    }

    /// Stable descending sort by the key tuple; ties keep their upstream order.
    #[must_use]
    pub fn sort_descending(self, keys: impl Into<Keys>) -> Self {
        self.push(Operator::Sort {
            keys: keys.into(),
            descending: true,
        })
    }

    /// Sort-merge join the records produced so far (left) with `other` (right).
    ///
    /// Both sides are sorted by `keys` internally. With no keys every record
    /// belongs to one group, so an inner join is the full Cartesian product.
    #[must_use]
    pub fn join(self, other: impl Into<Input>, keys: impl Into<Keys>, kind: JoinKind) -> Self {
        let upstream = wire(&self.pipeline, other.into());
        let keys = keys.into();
        self.pipeline.update(self.id, |node| {
            let index = node.upstreams.len();
            node.upstreams.push(upstream);
            node.ops.push(Operator::Join {
                upstream: index,
                keys,
                kind,
            });
        });
        self
    }

    /// Run the graph over `bindings` and collect the result table.
    ///
    /// # Errors
    /// Any [`Error`](crate::Error) raised while planning or computing the DAG.
    pub fn run(&self, bindings: Bindings) -> Result<Vec<Record>> {
        Runner::default().run(self, bindings)
    }

    /// Like [`run`](Self::run) but returns the lazy result stream.
    ///
    /// Planning errors (unbound inputs, cycles) are reported here; computation
    /// errors arrive as stream items.
    ///
    /// # Errors
    /// Planning errors, see above.
    pub fn stream(&self, bindings: Bindings) -> Result<RunStream> {
        Runner::default().stream(self, bindings)
    }

    /// Describe the DAG reachable from this graph.
    ///
    /// # Errors
    /// [`Error::Cycle`](crate::Error::Cycle) or
    /// [`Error::ForeignGraph`](crate::Error::ForeignGraph).
    pub fn explain(&self) -> Result<Explanation> {
        explain(&self.pipeline.snapshot(), self.id)
    }
}

fn wire(p: &Pipeline, input: Input) -> Upstream {
    match input {
        Input::Named(name) => Upstream::Named(name),
        Input::Graph(g) if g.pipeline.same_as(p) => Upstream::Graph(g.id),
        Input::Graph(g) => {
            tracing::warn!(node = %g.id, "graph from another pipeline wired as input");
            Upstream::Foreign(g.id)
        }
    }
}
