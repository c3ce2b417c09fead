//! Run planning: the fan-in pass and graph explanations.
//!
//! Before any record is computed the planner walks the DAG reachable from the
//! terminal graph and counts, for every vertex, how many consumers will read it
//! during the run. The terminal itself counts as one consumer (the caller). Those
//! counts decide which vertices are streamed straight through and which are
//! materialized once and replayed.
//!
//! The walk also rejects DAGs the runner cannot execute:
//! - a graph reachable from itself ([`Error::Cycle`]);
//! - a graph wired in from a different pipeline ([`Error::ForeignGraph`]).

use crate::error::{Error, Result};
use crate::node::{GraphNode, Upstream, Vertex};
use crate::node_id::NodeId;
use crate::operator::Operator;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// Result of the fan-in pass.
#[derive(Debug, Clone, Default)]
pub struct FanIn {
    /// Number of readers per reachable vertex.
    pub consumers: HashMap<Vertex, usize>,
    /// Reachable vertices, every vertex after all of its upstreams.
    pub order: Vec<Vertex>,
}

impl FanIn {
    #[must_use]
    pub fn consumers_of(&self, vertex: &Vertex) -> usize {
        self.consumers.get(vertex).copied().unwrap_or(0)
    }

    /// Named inputs reachable from the terminal, in first-visit order.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.order.iter().filter_map(|v| match v {
            Vertex::Input(name) => Some(name.as_str()),
            Vertex::Graph(_) => None,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

pub(crate) fn upstream_vertex(upstream: &Upstream) -> Result<Vertex> {
    match upstream {
        Upstream::Named(name) => Ok(Vertex::Input(name.clone())),
        Upstream::Graph(id) => Ok(Vertex::Graph(*id)),
        Upstream::Foreign(id) => Err(Error::ForeignGraph { node: *id }),
    }
}

/// Count consumers of every vertex reachable from `terminal`.
///
/// # Errors
/// [`Error::Cycle`] or [`Error::ForeignGraph`].
pub fn resolve_fan_in(nodes: &HashMap<NodeId, GraphNode>, terminal: NodeId) -> Result<FanIn> {
    let mut fan_in = FanIn::default();
    let mut marks = HashMap::new();
    fan_in.consumers.insert(Vertex::Graph(terminal), 1);
    visit(nodes, terminal, &mut marks, &mut fan_in)?;
    Ok(fan_in)
}

fn visit(
    nodes: &HashMap<NodeId, GraphNode>,
    id: NodeId,
    marks: &mut HashMap<NodeId, Mark>,
    fan_in: &mut FanIn,
) -> Result<()> {
    match marks.get(&id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => return Err(Error::Cycle { node: id }),
        None => {}
    }
    let node = nodes.get(&id).ok_or(Error::ForeignGraph { node: id })?;
    marks.insert(id, Mark::Visiting);

    for upstream in &node.upstreams {
        let vertex = upstream_vertex(upstream)?;
        let seen = {
            let count = fan_in.consumers.entry(vertex.clone()).or_insert(0);
            *count += 1;
            *count
        };
        match vertex {
            Vertex::Graph(up) => visit(nodes, up, marks, fan_in)?,
            Vertex::Input(_) if seen == 1 => fan_in.order.push(vertex),
            Vertex::Input(_) => {}
        }
    }

    marks.insert(id, Mark::Done);
    fan_in.order.push(Vertex::Graph(id));
    Ok(())
}

/// One vertex of an [`Explanation`].
#[derive(Debug, Clone)]
pub struct ExplainStep {
    pub vertex: Vertex,
    /// Readers of this vertex during a run.
    pub consumers: usize,
    /// Whether the vertex is materialized once and replayed.
    pub cached: bool,
    pub upstreams: Vec<String>,
    pub operators: Vec<String>,
}

/// Human-readable description of the DAG behind a graph.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub terminal: NodeId,
    /// Every reachable vertex, upstreams first.
    pub steps: Vec<ExplainStep>,
}

impl Explanation {
    /// Names of the inputs a run must bind.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| match &s.vertex {
            Vertex::Input(name) => Some(name.as_str()),
            Vertex::Graph(_) => None,
        })
    }

    /// Vertices that a run will cache.
    pub fn cached(&self) -> impl Iterator<Item = &Vertex> {
        self.steps.iter().filter(|s| s.cached).map(|s| &s.vertex)
    }
}

fn describe_upstream(upstream: &Upstream) -> String {
    match upstream {
        Upstream::Named(name) => format!("input `{name}`"),
        Upstream::Graph(id) => format!("graph {id}"),
        Upstream::Foreign(id) => format!("foreign graph {id}"),
    }
}

fn describe_operator(op: &Operator, upstreams: &[Upstream]) -> String {
    match op {
        Operator::Map { .. } => "map".to_string(),
        Operator::Reduce { keys, .. } => format!("reduce by {keys}"),
        Operator::Fold { initial, .. } => {
            format!("fold from {}", serde_json::to_string(initial).unwrap_or_default())
        }
        Operator::Sort { keys, descending } => {
            format!("sort by {keys}{}", if *descending { " desc" } else { "" })
        }
        Operator::Join {
            upstream,
            keys,
            kind,
        } => {
            let other = upstreams
                .get(*upstream)
                .map_or_else(|| "<missing>".to_string(), describe_upstream);
            format!("join {kind} with {other} on {keys}")
        }
    }
}

/// Build an [`Explanation`] of everything reachable from `terminal`.
///
/// # Errors
/// Same as [`resolve_fan_in`].
pub fn explain(nodes: &HashMap<NodeId, GraphNode>, terminal: NodeId) -> Result<Explanation> {
    let fan_in = resolve_fan_in(nodes, terminal)?;
    let steps = fan_in
        .order
        .iter()
        .map(|vertex| {
            let consumers = fan_in.consumers_of(vertex);
            let (upstreams, operators): (Vec<String>, Vec<String>) = match vertex {
                Vertex::Graph(id) => nodes.get(id).map_or_else(Default::default, |node| {
                    (
                        node.upstreams.iter().map(describe_upstream).collect(),
                        node.ops
                            .iter()
                            .map(|op| describe_operator(op, &node.upstreams))
                            .collect(),
                    )
                }),
                Vertex::Input(_) => (Vec::new(), Vec::new()),
            };
            ExplainStep {
                vertex: vertex.clone(),
                consumers,
                cached: consumers > 1,
                upstreams,
                operators,
            }
        })
        .collect();
    Ok(Explanation { terminal, steps })
}

impl Display for Explanation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        writeln!(
            f,
            "╔═══════════════════════════════════════════════════════════════╗"
        )?;
        writeln!(
            f,
            "║              GRAPH EXPLANATION                                ║"
        )?;
        writeln!(
            f,
            "╚═══════════════════════════════════════════════════════════════╝"
        )?;
        writeln!(f)?;

        let inputs: Vec<&str> = self.inputs().collect();
        let cached = self.cached().count();
        writeln!(
            f,
            "┌─ SUMMARY ────────────────────────────────────────────────────┐"
        )?;
        writeln!(f, "│ Terminal:          {:>10}", self.terminal.to_string())?;
        writeln!(f, "│ Vertices:          {:>10}", self.steps.len())?;
        writeln!(f, "│ Cached:            {cached:>10}")?;
        writeln!(f, "│ Inputs:            {}", inputs.join(", "))?;
        writeln!(
            f,
            "└──────────────────────────────────────────────────────────────┘"
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "┌─ VERTICES ───────────────────────────────────────────────────┐"
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            let marker = if step.cached { " [CACHED]" } else { "" };
            writeln!(f, "│")?;
            writeln!(
                f,
                "│ Step {}: {} ({} consumer{}){marker}",
                i + 1,
                step.vertex,
                step.consumers,
                if step.consumers == 1 { "" } else { "s" }
            )?;
            if let Some(first) = step.upstreams.first() {
                writeln!(f, "│   read {first}")?;
            }
            for op in &step.operators {
                writeln!(f, "│   {op}")?;
            }
        }
        writeln!(f, "│")?;
        writeln!(
            f,
            "└──────────────────────────────────────────────────────────────┘"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keys;
    use crate::operator::JoinKind;

    fn node(upstreams: Vec<Upstream>, ops: Vec<Operator>) -> GraphNode {
        GraphNode { upstreams, ops }
    }

    fn id(n: u64) -> NodeId {
        NodeId::new(n)
    }

    #[test]
    fn counts_shared_upstreams() {
        // #0 <- input; #1 <- #0; #2 <- #0 join #1
        let mut nodes = HashMap::new();
        nodes.insert(id(0), node(vec![Upstream::Named("src".into())], vec![]));
        nodes.insert(id(1), node(vec![Upstream::Graph(id(0))], vec![]));
        nodes.insert(
            id(2),
            node(
                vec![Upstream::Graph(id(0)), Upstream::Graph(id(1))],
                vec![Operator::Join {
                    upstream: 1,
                    keys: Keys::none(),
                    kind: JoinKind::Inner,
                }],
            ),
        );

        let fan_in = resolve_fan_in(&nodes, id(2)).unwrap();
        assert_eq!(fan_in.consumers_of(&Vertex::Graph(id(2))), 1);
        assert_eq!(fan_in.consumers_of(&Vertex::Graph(id(1))), 1);
        assert_eq!(fan_in.consumers_of(&Vertex::Graph(id(0))), 2);
        assert_eq!(fan_in.consumers_of(&Vertex::Input("src".into())), 1);
        assert_eq!(
            fan_in.order,
            vec![
                Vertex::Input("src".into()),
                Vertex::Graph(id(0)),
                Vertex::Graph(id(1)),
                Vertex::Graph(id(2)),
            ]
        );
    }

    #[test]
    fn detects_cycles() {
        let mut nodes = HashMap::new();
        nodes.insert(id(0), node(vec![Upstream::Graph(id(1))], vec![]));
        nodes.insert(id(1), node(vec![Upstream::Graph(id(0))], vec![]));
        assert!(matches!(
            resolve_fan_in(&nodes, id(0)),
            Err(Error::Cycle { .. })
        ));
    }

    #[test]
    fn rejects_foreign_upstream() {
        let mut nodes = HashMap::new();
        nodes.insert(id(0), node(vec![Upstream::Foreign(id(7))], vec![]));
        assert!(matches!(
            resolve_fan_in(&nodes, id(0)),
            Err(Error::ForeignGraph { node }) if node == id(7)
        ));
    }

    #[test]
    fn explanation_marks_cached_vertices() {
        let mut nodes = HashMap::new();
        nodes.insert(id(0), node(vec![Upstream::Named("a".into())], vec![]));
        nodes.insert(
            id(1),
            node(
                vec![Upstream::Graph(id(0)), Upstream::Graph(id(0))],
                vec![Operator::Join {
                    upstream: 1,
                    keys: Keys::from("k"),
                    kind: JoinKind::Left,
                }],
            ),
        );
        let e = explain(&nodes, id(1)).unwrap();
        let cached: Vec<_> = e.cached().cloned().collect();
        assert_eq!(cached, vec![Vertex::Graph(id(0))]);
        assert_eq!(e.inputs().collect::<Vec<_>>(), vec!["a"]);
        let text = e.to_string();
        assert!(text.contains("join left with graph #0 on [k]"));
        assert!(text.contains("[CACHED]"));
    }
}
