//! The graph runtime: one [`Brain`] per weight slab, executing a
//! [`CompiledGraph`] forward pass with zero per-pass allocation.

use crate::compiler::{CompiledGraph, CompiledNode};
use crate::ir::NodeKind;
use crate::kernels::{Dense, Gru, Lstm, Mlp, Rru, WeightView};
use crate::runtime::error::RuntimeError;
use crate::runtime::node::RuntimeNode;
use std::sync::Arc;

fn make_node(kind: &NodeKind, weights: WeightView) -> RuntimeNode {
    match kind {
        NodeKind::Input { .. } => RuntimeNode::Input,
        NodeKind::Dense { input_size, output_size } => {
            RuntimeNode::Dense(Dense::new(*input_size, *output_size, weights))
        }
        NodeKind::Mlp {
            input_size,
            output_size,
            hidden_sizes,
        } => RuntimeNode::Mlp(Mlp::new(*input_size, *output_size, hidden_sizes, weights)),
        NodeKind::Gru { input_size, hidden_size } => {
            RuntimeNode::Gru(Gru::new(*input_size, *hidden_size, weights))
        }
        NodeKind::Lstm { input_size, hidden_size } => {
            RuntimeNode::Lstm(Lstm::new(*input_size, *hidden_size, weights))
        }
        NodeKind::Rru { input_size, hidden_size } => {
            RuntimeNode::Rru(Rru::new(*input_size, *hidden_size, weights))
        }
        NodeKind::Concat => RuntimeNode::Concat,
        NodeKind::Split { .. } => RuntimeNode::Split,
    }
}

/// Read-only snapshot of one node's current activation, for inspection
/// tooling. Borrowed from the brain; invalidated by the next `forward`.
pub struct LayerView<'a> {
    pub id: &'a str,
    pub size: usize,
    pub is_recurrent: bool,
    pub activation: &'a [f32],
}

/// One instance of a compiled graph, bound to a weight slab.
///
/// Holds, per node, an owned output scratch buffer and an owned "gathered
/// input" scratch buffer; neither is reallocated after construction.
pub struct Brain {
    graph: Arc<CompiledGraph>,
    nodes: Vec<RuntimeNode>,
    node_outputs: Vec<Vec<f32>>,
    gather_bufs: Vec<Vec<f32>>,
    output_buf: Vec<f32>,
}

impl Brain {
    /// Build a brain bound to `weights`. `weights` must be at least
    /// `graph.total_params` long; this is a strict precondition (§9 open
    /// question, resolved strict) -- a shorter slab is rejected rather
    /// than silently truncated.
    pub fn new(graph: Arc<CompiledGraph>, weights: &[f32]) -> Result<Self, RuntimeError> {
        if weights.len() < graph.total_params {
            return Err(RuntimeError::SizeMismatch {
                have: weights.len(),
                need: graph.total_params,
            });
        }

        let nodes = graph
            .nodes
            .iter()
            .map(|n| {
                let slab = &weights[n.param_offset..n.param_offset + n.param_length];
                make_node(&n.kind, WeightView::from_slice(slab))
            })
            .collect();

        let node_outputs = graph.nodes.iter().map(|n| vec![0.0; n.output_size]).collect();
        let gather_bufs = graph.nodes.iter().map(|n| vec![0.0; n.input_size]).collect();
        let output_buf = vec![0.0; graph.output_size];

        Ok(Self {
            graph,
            nodes,
            node_outputs,
            gather_bufs,
            output_buf,
        })
    }

    pub fn param_length(&self) -> usize {
        self.graph.total_params
    }

    /// Run one forward pass. `input` is padded with zeros (if shorter than
    /// the Input node's declared size) or truncated (if longer).
    pub fn forward(&mut self, input: &[f32]) -> &[f32] {
        let input_idx = self.graph.input_node_index();
        let input_node_size = self.graph.nodes[input_idx].output_size;
        let dst = &mut self.node_outputs[input_idx];
        let copy_len = input.len().min(input_node_size);
        dst[..copy_len].copy_from_slice(&input[..copy_len]);
        for slot in &mut dst[copy_len..] {
            *slot = 0.0;
        }

        for (i, node) in self.graph.nodes.iter().enumerate() {
            if i == input_idx {
                continue;
            }
            gather(node, &self.graph.nodes, &self.node_outputs, &mut self.gather_bufs[i]);
            self.nodes[i].forward_into(&self.gather_bufs[i], &mut self.node_outputs[i]);
        }

        let mut pos = 0;
        for out_ref in &self.graph.outputs {
            let upstream = &self.graph.nodes[out_ref.node_index];
            let offset = port_offset(&upstream.output_port_sizes, out_ref.port);
            let slice = &self.node_outputs[out_ref.node_index][offset..offset + out_ref.size];
            self.output_buf[pos..pos + out_ref.size].copy_from_slice(slice);
            pos += out_ref.size;
        }
        &self.output_buf
    }

    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Rebind every kernel's weight borrow to `weights` without touching
    /// hidden state. Same strict length precondition as [`Brain::new`].
    pub fn rebind(&mut self, weights: &[f32]) -> Result<(), RuntimeError> {
        if weights.len() < self.graph.total_params {
            return Err(RuntimeError::SizeMismatch {
                have: weights.len(),
                need: self.graph.total_params,
            });
        }
        for (node, compiled) in self.nodes.iter_mut().zip(self.graph.nodes.iter()) {
            let slab = &weights[compiled.param_offset..compiled.param_offset + compiled.param_length];
            node.rebind(WeightView::from_slice(slab));
        }
        Ok(())
    }

    pub fn viz_data(&self) -> Vec<LayerView<'_>> {
        self.graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| LayerView {
                id: &n.id,
                size: n.output_size,
                is_recurrent: n.is_recurrent(),
                activation: &self.node_outputs[i],
            })
            .collect()
    }
}

fn port_offset(port_sizes: &[usize], port: usize) -> usize {
    port_sizes[..port].iter().sum()
}

/// Fill `out` with this node's input: its resolved upstream ports,
/// concatenated in the order the compiler already fixed (by `toPort`, or
/// by `fromId` when ports are absent).
fn gather(node: &CompiledNode, nodes: &[CompiledNode], node_outputs: &[Vec<f32>], out: &mut [f32]) {
    let mut pos = 0;
    for resolved in &node.inputs {
        let upstream = &nodes[resolved.from_index];
        let offset = port_offset(&upstream.output_port_sizes, resolved.from_port);
        let size = upstream.output_port_sizes[resolved.from_port];
        let slice = &node_outputs[resolved.from_index][offset..offset + size];
        out[pos..pos + size].copy_from_slice(slice);
        pos += size;
    }
}
