use crate::node::GraphNode;
use crate::node_id::NodeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// -------- Pipeline arena --------
/// Every [`Graph`](crate::Graph) built on a pipeline is one node stored here and
/// addressed by [`NodeId`]. Cloning a `Pipeline` shares the arena.
pub struct Pipeline {
    pub(crate) inner: Arc<Mutex<PipelineInner>>,
}

pub struct PipelineInner {
    pub next_id: u64,
    pub nodes: HashMap<NodeId, GraphNode>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PipelineInner {
                next_id: 0,
                nodes: HashMap::new(),
            })),
        }
    }
}

/// Allow `Pipeline` cloning.
impl Clone for Pipeline {
    fn clone(&self) -> Self {
        Pipeline {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Pipeline {
    // A panic while holding the lock cannot leave a node half-written, so a
    // poisoned arena is still consistent.
    fn lock(&self) -> MutexGuard<'_, PipelineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_node(&self, node: GraphNode) -> NodeId {
        let mut g = self.lock();
        let id = NodeId::new(g.next_id);
        g.next_id += 1;
        g.nodes.insert(id, node);
        id
    }

    /// Apply `f` to node `id`. Returns `None` if the node does not exist.
    pub(crate) fn update<R>(&self, id: NodeId, f: impl FnOnce(&mut GraphNode) -> R) -> Option<R> {
        let mut g = self.lock();
        g.nodes.get_mut(&id).map(f)
    }

    /// Copy of every node description, taken at the start of a run.
    pub(crate) fn snapshot(&self) -> HashMap<NodeId, GraphNode> {
        self.lock().nodes.clone()
    }

    pub(crate) fn same_as(&self, other: &Pipeline) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of graph nodes created on this pipeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
