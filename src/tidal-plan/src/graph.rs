//! Plan graph with stable node identifiers.
//!
//! Edges point from a node to the nodes it reads from (its predecessors)
//! and to the nodes reading from it (its successors). A storage read is a
//! source with no predecessors; a yield is a sink with no successors.
//!
//! Rewrites never mutate a node's spec in place. They compute a new spec
//! value and the graph swaps it in through [`PlanGraph::replace_spec`] or
//! [`PlanGraph::merge_to_physical_node`].

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use common_display::DisplayTree;
use common_error::{TidalError, TidalResult};

use crate::ops::{ProcedureKind, ProcedureSpec};
use crate::read::PhysicalReadSpec;

/// Stable identifier of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier of the node merging `predecessor` into `node`.
    pub fn merged(predecessor: &Self, node: &Self) -> Self {
        Self(format!("merged_{}_{}", predecessor.0, node.0))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node of the plan graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanNode {
    id: NodeId,
    spec: ProcedureSpec,
    predecessors: Vec<NodeId>,
    successors: Vec<NodeId>,
}

impl PlanNode {
    /// Node identifier.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Node payload.
    pub fn spec(&self) -> &ProcedureSpec {
        &self.spec
    }

    /// Kind of the node payload.
    pub fn kind(&self) -> ProcedureKind {
        self.spec.kind()
    }

    /// Nodes this node reads from, in order.
    pub fn predecessors(&self) -> &[NodeId] {
        &self.predecessors
    }

    /// Nodes reading from this node, in order.
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }
}

/// Directed acyclic plan graph.
#[derive(Debug, Clone, Default)]
pub struct PlanGraph {
    nodes: HashMap<NodeId, PlanNode>,
    /// Insertion order, kept for deterministic traversal.
    order: Vec<NodeId>,
    next_id: usize,
}

impl PlanGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node with a generated id such as `range1`.
    pub fn add_node(&mut self, spec: impl Into<ProcedureSpec>) -> NodeId {
        let spec = spec.into();
        let id = loop {
            let candidate = NodeId(format!("{}{}", spec.kind(), self.next_id));
            self.next_id += 1;
            if !self.nodes.contains_key(&candidate) {
                break candidate;
            }
        };
        self.insert(id.clone(), spec);
        id
    }

    /// Add a node with an explicit id.
    pub fn add_node_with_id(
        &mut self,
        id: impl Into<NodeId>,
        spec: impl Into<ProcedureSpec>,
    ) -> TidalResult<NodeId> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(TidalError::planning(format!("duplicate node id {id}")));
        }
        self.insert(id.clone(), spec.into());
        Ok(id)
    }

    fn insert(&mut self, id: NodeId, spec: ProcedureSpec) {
        self.order.push(id.clone());
        self.nodes.insert(
            id.clone(),
            PlanNode {
                id,
                spec,
                predecessors: Vec::new(),
                successors: Vec::new(),
            },
        );
    }

    /// Add an edge: `to` reads from `from`.
    pub fn connect(&mut self, from: &NodeId, to: &NodeId) -> TidalResult<()> {
        if from == to {
            return Err(TidalError::planning(format!("self edge on {from}")));
        }
        self.node(to)?;
        self.node_mut(from)?.successors.push(to.clone());
        self.node_mut(to)?.predecessors.push(from.clone());
        Ok(())
    }

    /// Add `specs` as a linear chain; returns the ids from source to sink.
    pub fn chain<I>(&mut self, specs: I) -> TidalResult<Vec<NodeId>>
    where
        I: IntoIterator<Item = ProcedureSpec>,
    {
        let mut ids: Vec<NodeId> = Vec::new();
        for spec in specs {
            let id = self.add_node(spec);
            if let Some(prev) = ids.last() {
                self.connect(prev, &id)?;
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node.
    pub fn get(&self, id: &NodeId) -> Option<&PlanNode> {
        self.nodes.get(id)
    }

    /// Look up a node, failing if it is missing.
    pub fn node(&self, id: &NodeId) -> TidalResult<&PlanNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| TidalError::planning(format!("unknown plan node {id}")))
    }

    fn node_mut(&mut self, id: &NodeId) -> TidalResult<&mut PlanNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TidalError::planning(format!("unknown plan node {id}")))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &PlanNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Ids of the nodes that have no successors.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.successors.is_empty())
            .map(|n| n.id.clone())
            .collect()
    }

    /// All physical reads in insertion order.
    pub fn physical_reads(&self) -> impl Iterator<Item = (&NodeId, &PhysicalReadSpec)> {
        self.nodes()
            .filter_map(|n| n.spec.as_physical_read().map(|s| (&n.id, s)))
    }

    /// Node ids ordered so that every node follows its predecessors.
    pub fn topological_order(&self) -> TidalResult<Vec<NodeId>> {
        let mut in_degree: HashMap<&NodeId, usize> = self
            .nodes()
            .map(|n| (&n.id, n.predecessors.len()))
            .collect();
        let mut ready: VecDeque<&NodeId> = self
            .nodes()
            .filter(|n| n.predecessors.is_empty())
            .map(|n| &n.id)
            .collect();

        let mut sorted = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_front() {
            sorted.push(id.clone());
            for succ in &self.node(id)?.successors {
                if let Some(d) = in_degree.get_mut(succ) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push_back(succ);
                    }
                }
            }
        }

        if sorted.len() != self.nodes.len() {
            return Err(TidalError::planning("plan graph contains a cycle"));
        }
        Ok(sorted)
    }

    /// Swap the spec of a node, keeping its edges.
    pub fn replace_spec(&mut self, id: &NodeId, spec: impl Into<ProcedureSpec>) -> TidalResult<()> {
        self.node_mut(id)?.spec = spec.into();
        Ok(())
    }

    /// Merge `id` into its single predecessor, producing one physical read
    /// carrying `spec`.
    ///
    /// The merged node inherits the predecessor's inputs and the node's
    /// outputs. When the predecessor feeds other nodes as well it stays in
    /// place for them and the merged node is added beside it; otherwise
    /// both are replaced.
    pub fn merge_to_physical_node(
        &mut self,
        id: &NodeId,
        spec: PhysicalReadSpec,
    ) -> TidalResult<NodeId> {
        let node = self.node(id)?;
        let pred_id = match node.predecessors.as_slice() {
            [p] => p.clone(),
            preds => {
                return Err(TidalError::planning(format!(
                    "cannot merge {id}: expected one predecessor, found {}",
                    preds.len()
                )));
            }
        };
        let pred = self.node(&pred_id)?;
        let shared = pred.successors.len() > 1;

        let merged_id = NodeId::merged(&pred_id, id);
        if self.nodes.contains_key(&merged_id) {
            return Err(TidalError::planning(format!(
                "cannot merge {id}: node {merged_id} already exists"
            )));
        }

        let inputs = pred.predecessors.clone();
        let outputs = self.node(id)?.successors.clone();

        for input in &inputs {
            let successors = &mut self.node_mut(input)?.successors;
            if shared {
                successors.push(merged_id.clone());
            } else {
                for s in successors.iter_mut() {
                    if *s == pred_id {
                        *s = merged_id.clone();
                    }
                }
            }
        }
        for output in &outputs {
            for p in &mut self.node_mut(output)?.predecessors {
                if p == id {
                    *p = merged_id.clone();
                }
            }
        }

        self.nodes.remove(id);
        if shared {
            self.node_mut(&pred_id)?.successors.retain(|s| s != id);
        } else {
            self.nodes.remove(&pred_id);
        }
        self.nodes.insert(
            merged_id.clone(),
            PlanNode {
                id: merged_id.clone(),
                spec: ProcedureSpec::PhysicalRead(spec),
                predecessors: inputs,
                successors: outputs,
            },
        );

        // A replacing merge takes the predecessor's slot in traversal
        // order, a copying merge takes the node's.
        let slot = if shared { id } else { &pred_id };
        if let Some(pos) = self.order.iter().position(|n| n == slot) {
            self.order[pos] = merged_id.clone();
        }
        self.order.retain(|n| n != id);

        Ok(merged_id)
    }

    /// Render the graph as one tree per sink, inputs as children.
    pub fn explain(&self) -> String {
        self.sinks()
            .iter()
            .map(|sink| self.display_tree(sink).to_string())
            .collect()
    }

    fn display_tree(&self, id: &NodeId) -> DisplayTree {
        let Some(node) = self.nodes.get(id) else {
            return DisplayTree::new(id.to_string());
        };
        let mut tree = DisplayTree::new(format!("{} [{}]", node.id, node.kind()))
            .with_details(node.spec.summary());
        for pred in &node.predecessors {
            tree.push_child(self.display_tree(pred));
        }
        tree
    }
}
