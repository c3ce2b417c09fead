//! Per-run execution statistics.
//!
//! Every run keeps a small set of counters per DAG vertex: how often the vertex
//! was evaluated, how many records it produced, and whether its output was
//! cached and replayed. [`Runner::run_with_metrics`](crate::Runner::run_with_metrics)
//! and [`RunStream::metrics`](crate::RunStream::metrics) turn them into a
//! [`RunMetrics`] report that can be printed or saved as JSON.
//!
//! ```no_run
//! use compgraph::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let p = Pipeline::default();
//! let g = Graph::new(&p, "rows").sort("id");
//! let (rows, metrics) = Runner::default()
//!     .run_with_metrics(&g, Bindings::new().bind("rows", vec![record! { "id" => 1 }]))?;
//! metrics.print();
//! metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use crate::node::Vertex;
use crate::node_id::NodeId;
use anyhow::Result;
use serde_json::{Value, json};
use std::cell::Cell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Live counters for one vertex, updated while a run is pulled.
#[derive(Debug, Default)]
pub(crate) struct NodeCounters {
    pub evaluations: Cell<usize>,
    pub records: Cell<usize>,
    pub replays: Cell<usize>,
    pub materialized: Cell<bool>,
}

impl NodeCounters {
    pub fn evaluated(&self) {
        self.evaluations.set(self.evaluations.get() + 1);
    }

    pub fn produced(&self) {
        self.records.set(self.records.get() + 1);
    }

    pub fn replayed(&self) {
        self.replays.set(self.replays.get() + 1);
    }

    pub fn snapshot(&self, vertex: Vertex, consumers: usize) -> NodeMetrics {
        NodeMetrics {
            vertex,
            consumers,
            evaluations: self.evaluations.get(),
            records: self.records.get(),
            materialized: self.materialized.get(),
            replays: self.replays.get(),
        }
    }
}

/// Counters of one vertex at the time the report was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMetrics {
    pub vertex: Vertex,
    /// Readers counted by the fan-in pass.
    pub consumers: usize,
    /// Times the vertex's operators were instantiated. At most 1 per run.
    pub evaluations: usize,
    /// Records the vertex produced.
    pub records: usize,
    /// Whether the output was buffered for several consumers.
    pub materialized: bool,
    /// Consumers served from the buffer rather than by computing.
    pub replays: usize,
}

impl NodeMetrics {
    fn to_json(&self) -> Value {
        json!({
            "vertex": self.vertex.to_string(),
            "consumers": self.consumers,
            "evaluations": self.evaluations,
            "records": self.records,
            "materialized": self.materialized,
            "replays": self.replays,
        })
    }
}

/// Report for one run.
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    pub elapsed: Duration,
    /// Records delivered to the caller.
    pub records_out: usize,
    /// Every reachable vertex, upstreams first.
    pub nodes: Vec<NodeMetrics>,
}

impl RunMetrics {
    #[must_use]
    pub fn vertex(&self, vertex: &Vertex) -> Option<&NodeMetrics> {
        self.nodes.iter().find(|n| &n.vertex == vertex)
    }

    /// Shorthand for [`vertex`](Self::vertex) on a graph node.
    #[must_use]
    pub fn graph(&self, id: NodeId) -> Option<&NodeMetrics> {
        self.vertex(&Vertex::Graph(id))
    }

    /// Shorthand for [`vertex`](Self::vertex) on a named input.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&NodeMetrics> {
        self.vertex(&Vertex::Input(name.to_string()))
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "elapsed_ms": u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
            "records_out": self.records_out,
            "nodes": self.nodes.iter().map(NodeMetrics::to_json).collect::<Vec<_>>(),
        })
    }

    pub fn print(&self) {
        println!("\n========== Run Metrics ==========");
        println!("Elapsed: {:?}", self.elapsed);
        println!("Records out: {}", self.records_out);
        println!("---------------------------------");
        for n in &self.nodes {
            let cache = if n.materialized {
                format!(", cached, {} replays", n.replays)
            } else {
                String::new()
            };
            println!(
                "{}: {} records, {} consumers, {} evaluations{cache}",
                n.vertex, n.records, n.consumers, n.evaluations
            );
        }
        println!("=================================\n");
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    /// If the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_report_lists_vertices() {
        let m = RunMetrics {
            elapsed: Duration::from_millis(3),
            records_out: 2,
            nodes: vec![NodeMetrics {
                vertex: Vertex::Input("docs".into()),
                consumers: 2,
                evaluations: 1,
                records: 4,
                materialized: true,
                replays: 1,
            }],
        };
        let v = m.to_json();
        assert_eq!(v["records_out"], 2);
        assert_eq!(v["nodes"][0]["vertex"], "input `docs`");
        assert_eq!(v["nodes"][0]["replays"], 1);
        assert!(m.input("docs").is_some());
    }
}
