//! Graph execution.
//!
//! A run proceeds in two phases:
//! 1. **Plan**: snapshot the pipeline, run the fan-in pass over the DAG reachable
//!    from the terminal graph and check that every named input is bound. No
//!    record is read before this completes.
//! 2. **Pull**: open the terminal vertex. A vertex with one consumer is streamed
//!    straight into it. A vertex with several consumers is materialized on the
//!    first pull, replayed to the rest, and released after the last replay.
//!
//! All per-run state lives in a fresh run context; graph descriptions are
//! never mutated, so the same graph can be run any number of times.

use crate::bindings::Bindings;
use crate::error::{Error, Result};
use crate::exec::{RecordStream, compose};
use crate::graph::Graph;
use crate::metrics::{NodeCounters, NodeMetrics, RunMetrics};
use crate::node::{GraphNode, Vertex};
use crate::node_id::NodeId;
use crate::planner::{resolve_fan_in, upstream_vertex};
use crate::record::Record;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, trace};

/// Execution settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Runner {
    /// Stop after this many output records. Upstream work that is not needed to
    /// produce them is never done.
    pub limit: Option<usize>,
}

struct Slot {
    consumers: usize,
    /// Consumers that have not yet started replaying the cache.
    remaining: usize,
    cache: Option<Rc<Vec<Record>>>,
    counters: Rc<NodeCounters>,
}

/// Per-run state: node snapshot, unconsumed bindings and one slot per vertex.
struct RunContext {
    nodes: HashMap<NodeId, GraphNode>,
    bindings: Bindings,
    slots: HashMap<Vertex, Slot>,
    order: Vec<Vertex>,
}

type Ctx = Rc<RefCell<RunContext>>;

impl RunContext {
    fn counters(&self, vertex: &Vertex) -> Rc<NodeCounters> {
        self.slots
            .get(vertex)
            .map_or_else(Rc::default, |s| Rc::clone(&s.counters))
    }

    fn consumers(&self, vertex: &Vertex) -> usize {
        self.slots.get(vertex).map_or(1, |s| s.consumers)
    }

    fn metrics(&self) -> Vec<NodeMetrics> {
        self.order
            .iter()
            .filter_map(|v| {
                self.slots
                    .get(v)
                    .map(|s| s.counters.snapshot(v.clone(), s.consumers))
            })
            .collect()
    }
}

impl Runner {
    /// Plan the run and return its lazy output stream.
    ///
    /// # Errors
    /// [`Error::UnboundInput`], [`Error::Cycle`] or [`Error::ForeignGraph`].
    pub fn stream(&self, graph: &Graph, bindings: Bindings) -> Result<RunStream> {
        let started = Instant::now();
        let nodes = graph.pipeline.snapshot();
        let fan_in = resolve_fan_in(&nodes, graph.id)?;

        if let Some(name) = fan_in.inputs().find(|name| !bindings.contains(name)) {
            return Err(Error::UnboundInput {
                name: name.to_string(),
            });
        }

        let slots: HashMap<Vertex, Slot> = fan_in
            .consumers
            .iter()
            .map(|(vertex, &consumers)| {
                let slot = Slot {
                    consumers,
                    remaining: consumers,
                    cache: None,
                    counters: Rc::default(),
                };
                (vertex.clone(), slot)
            })
            .collect();
        debug!(
            terminal = %graph.id,
            vertices = fan_in.order.len(),
            shared = slots.values().filter(|s| s.consumers > 1).count(),
            "fan-in resolved"
        );

        let ctx: Ctx = Rc::new(RefCell::new(RunContext {
            nodes,
            bindings,
            slots,
            order: fan_in.order,
        }));
        let inner = open(&ctx, &Vertex::Graph(graph.id))?;
        Ok(RunStream {
            inner,
            ctx,
            remaining: self.limit,
            failed: false,
            emitted: 0,
            started,
        })
    }

    /// Run `graph` to completion and collect its output.
    ///
    /// # Errors
    /// The first error raised by planning or by any operator.
    pub fn run(&self, graph: &Graph, bindings: Bindings) -> Result<Vec<Record>> {
        let mut stream = self.stream(graph, bindings)?;
        let records = stream.by_ref().collect::<Result<Vec<_>>>()?;
        debug!(
            terminal = %graph.id,
            records = records.len(),
            elapsed = ?stream.started.elapsed(),
            "run finished"
        );
        Ok(records)
    }

    /// Like [`run`](Self::run), also returning per-vertex statistics.
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    pub fn run_with_metrics(
        &self,
        graph: &Graph,
        bindings: Bindings,
    ) -> Result<(Vec<Record>, RunMetrics)> {
        let mut stream = self.stream(graph, bindings)?;
        let records = stream.by_ref().collect::<Result<Vec<_>>>()?;
        Ok((records, stream.metrics()))
    }
}

/// Open a reader on `vertex`, honouring its consumer count.
fn open(ctx: &Ctx, vertex: &Vertex) -> Result<RecordStream> {
    let consumers = ctx.borrow().consumers(vertex);
    if consumers > 1 {
        Ok(Box::new(SharedStream {
            ctx: Rc::clone(ctx),
            vertex: vertex.clone(),
            state: Shared::Unopened,
        }))
    } else {
        produce(ctx, vertex)
    }
}

/// Instantiate the computation of `vertex`. Called at most once per vertex per run.
fn produce(ctx: &Ctx, vertex: &Vertex) -> Result<RecordStream> {
    let counters = ctx.borrow().counters(vertex);
    counters.evaluated();
    trace!(%vertex, "evaluating");

    let inner = match vertex {
        Vertex::Input(name) => ctx
            .borrow_mut()
            .bindings
            .take(name)
            .ok_or_else(|| Error::UnboundInput { name: name.clone() })?,
        Vertex::Graph(id) => {
            let node = ctx
                .borrow()
                .nodes
                .get(id)
                .cloned()
                .ok_or(Error::ForeignGraph { node: *id })?;
            let upstreams = node
                .upstreams
                .iter()
                .map(|u| open(ctx, &upstream_vertex(u)?))
                .collect::<Result<Vec<_>>>()?;
            compose(&node.ops, upstreams)
        }
    };
    Ok(Box::new(Counted { inner, counters }))
}

/// Counts records as they leave a vertex.
struct Counted {
    inner: RecordStream,
    counters: Rc<NodeCounters>,
}

impl Iterator for Counted {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        if item.is_ok() {
            self.counters.produced();
        }
        Some(item)
    }
}

enum Shared {
    Unopened,
    Replaying { cache: Rc<Vec<Record>>, pos: usize },
    Done,
}

/// One consumer's view of a vertex read by several consumers.
struct SharedStream {
    ctx: Ctx,
    vertex: Vertex,
    state: Shared,
}

impl SharedStream {
    /// Take the cache if an earlier consumer filled it, else fill it.
    fn attach(&self) -> Result<Rc<Vec<Record>>> {
        {
            let mut ctx = self.ctx.borrow_mut();
            let slot = ctx
                .slots
                .get_mut(&self.vertex)
                .ok_or_else(|| Error::Invariant(format!("no slot for {}", self.vertex)))?;
            if let Some(cache) = slot.cache.clone() {
                slot.counters.replayed();
                slot.remaining = slot.remaining.saturating_sub(1);
                trace!(vertex = %self.vertex, remaining = slot.remaining, "replaying cache");
                if slot.remaining == 0 {
                    slot.cache = None;
                    debug!(vertex = %self.vertex, "cache released");
                }
                return Ok(cache);
            }
        }

        // No borrow is held while upstream vertices are computed.
        let records = produce(&self.ctx, &self.vertex)?.collect::<Result<Vec<_>>>()?;
        let cache = Rc::new(records);

        let mut ctx = self.ctx.borrow_mut();
        if let Some(slot) = ctx.slots.get_mut(&self.vertex) {
            slot.counters.materialized.set(true);
            slot.remaining = slot.consumers.saturating_sub(1);
            if slot.remaining > 0 {
                slot.cache = Some(Rc::clone(&cache));
            }
            debug!(
                vertex = %self.vertex,
                records = cache.len(),
                consumers = slot.consumers,
                "materialized shared vertex"
            );
        }
        Ok(cache)
    }
}

impl Iterator for SharedStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                Shared::Done => return None,
                Shared::Replaying { cache, pos } => {
                    let record = cache.get(*pos).cloned();
                    *pos += 1;
                    if record.is_none() {
                        self.state = Shared::Done;
                    }
                    return record.map(Ok);
                }
                Shared::Unopened => match self.attach() {
                    Ok(cache) => self.state = Shared::Replaying { cache, pos: 0 },
                    Err(e) => {
                        self.state = Shared::Done;
                        return Some(Err(e));
                    }
                },
            }
        }
    }
}

/// Lazy output of one run.
///
/// Stops after the first error and after [`Runner::limit`] records. Dropping it
/// early abandons the rest of the computation.
pub struct RunStream {
    inner: RecordStream,
    ctx: Ctx,
    remaining: Option<usize>,
    failed: bool,
    emitted: usize,
    started: Instant,
}

impl RunStream {
    /// Statistics for the run so far.
    #[must_use]
    pub fn metrics(&self) -> RunMetrics {
        RunMetrics {
            elapsed: self.started.elapsed(),
            records_out: self.emitted,
            nodes: self.ctx.borrow().metrics(),
        }
    }
}

impl Iterator for RunStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == Some(0) {
            return None;
        }
        match self.inner.next()? {
            Ok(record) => {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                self.emitted += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
