//! Compiler output: the immutable, topologically-ordered program derived
//! from a [`GraphSpec`](crate::ir::GraphSpec).

use crate::ir::{NodeId, NodeKind, OutputRef};

/// One resolved upstream input: the producing node's *index* into
/// [`CompiledGraph::nodes`] (not its string id -- arena + index, not a
/// pointer graph, per the design notes) and the port on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInput {
    pub from_index: usize,
    pub from_port: usize,
}

/// One node after compilation: its shape is fully resolved and its
/// parameter range within a weight slab is assigned.
#[derive(Debug, Clone)]
pub struct CompiledNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Resolved incoming edges, ordered by `toPort` (or by `fromId`
    /// lexicographic order when `toPort` is absent on this node).
    pub inputs: Vec<ResolvedInput>,
    /// Total input width (sum of the sizes of `inputs`, or the Input
    /// node's own declared size).
    pub input_size: usize,
    /// Total output width of this node (all ports concatenated).
    pub output_size: usize,
    /// Per-port output sizes (single-entry except for Split).
    pub output_port_sizes: Vec<usize>,
    pub param_offset: usize,
    pub param_length: usize,
    pub hidden_size: usize,
}

impl CompiledNode {
    pub fn is_recurrent(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Gru { .. } | NodeKind::Lstm { .. } | NodeKind::Rru { .. }
        )
    }
}

/// A resolved output reference: node index + port, plus the port's width.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedOutput {
    pub node_index: usize,
    pub port: usize,
    pub size: usize,
}

/// The immutable result of [`compile`](crate::compiler::compile). Safe to
/// share by reference (e.g. `Arc<CompiledGraph>`) across worker threads.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    pub nodes: Vec<CompiledNode>,
    pub outputs: Vec<ResolvedOutput>,
    pub output_size: usize,
    pub total_params: usize,
    pub graph_key: String,
}

impl CompiledGraph {
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn input_node_index(&self) -> usize {
        self.nodes
            .iter()
            .position(|n| matches!(n.kind, NodeKind::Input { .. }))
            .expect("compiled graph always has exactly one Input node")
    }

    /// Raw output references as `(node_id, port)` pairs, for display/debug.
    pub fn output_refs(&self) -> Vec<OutputRef> {
        self.outputs
            .iter()
            .map(|o| OutputRef {
                node_id: self.nodes[o.node_index].id.clone(),
                port: Some(o.port),
            })
            .collect()
    }
}
