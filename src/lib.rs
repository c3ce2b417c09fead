//! # compgraph
//!
//! A **lazy table-transformation engine** for Rust. Callers declare a directed
//! acyclic graph of row-oriented operators over named inputs, then run it once to
//! produce a result table.
//!
//! ## Key Features
//!
//! - **Declarative graph API** - chain `map`, `reduce`, `fold`, `sort` and `join`
//! - **Sort-merge join** - inner, left, right and outer joins on any key tuple
//! - **Shared sub-graphs** - a graph feeding several consumers is computed once per run
//! - **Lazy, pull-based execution** - streaming operators never buffer more than needed
//! - **Reusable definitions** - graphs are immutable descriptions; each run has its own state
//! - **I/O integrations** - JSON Lines with optional gzip/zstd compression
//!
//! ## Quick Start
//!
//! ```
//! use compgraph::*;
//!
//! # fn main() -> compgraph::Result<()> {
//! let p = Pipeline::default();
//! let counts = algorithms::word_count_graph(&p, "docs");
//!
//! let out = counts.run(Bindings::new().bind(
//!     "docs",
//!     vec![record! { "doc_id" => 1, "text" => "a a b" }],
//! ))?;
//! assert_eq!(
//!     out,
//!     vec![record! { "text" => "b", "count" => 1 }, record! { "text" => "a", "count" => 2 }]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Records and values
//!
//! A [`Record`] maps field names to [`Value`]s. There is no schema: fields may vary
//! between records and between operators. Values are totally ordered so that any
//! field can be used as a sort, reduce or join key.
//!
//! ### Pipeline and Graph
//!
//! A [`Pipeline`] is the arena every graph node lives in. A [`Graph`] is a handle to
//! one node: an upstream (a named input or another graph) plus an ordered list of
//! [`Operator`]s appended by the builder methods:
//!
//! - [`map`](Graph::map) - flat-map each record to zero or more records
//! - [`reduce`](Graph::reduce) - call back once per run of consecutive equal keys
//! - [`fold`](Graph::fold) - fold everything into one record
//! - [`sort`](Graph::sort) / [`sort_descending`](Graph::sort_descending) - stable sort
//! - [`join`](Graph::join) - sort-merge join with another graph or input
//!
//! ### Running
//!
//! [`Graph::run`] binds every named input through [`Bindings`] and collects the
//! output. [`Graph::stream`] returns the lazy [`RunStream`] instead, and
//! [`Runner`] adds a record limit and per-run [`RunMetrics`]. [`Graph::explain`]
//! shows what a run will read, cache and compute.
//!
//! ### Errors
//!
//! Every failure is an [`Error`]. Planning errors (unbound inputs, cycles) are
//! reported before any record is read; key and join errors surface when the
//! offending record is reached.

pub mod algorithms;
pub mod bindings;
pub mod error;
pub mod exec;
pub mod graph;
pub mod io;
pub mod keys;
pub mod metrics;
pub mod node;
pub mod node_id;
pub mod operator;
pub mod pipeline;
pub mod planner;
pub mod record;
pub mod runner;
pub mod testing;
pub mod value;

pub use bindings::Bindings;
pub use error::{Error, Result};
pub use exec::RecordStream;
pub use graph::{Graph, Input};
pub use keys::{KeyTuple, Keys};
pub use metrics::{NodeMetrics, RunMetrics};
pub use node::Vertex;
pub use node_id::NodeId;
pub use operator::{JoinKind, Operator, OperatorKind};
pub use pipeline::Pipeline;
pub use planner::Explanation;
pub use record::Record;
pub use runner::{RunStream, Runner};
pub use value::Value;

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{read_jsonl, write_jsonl};
