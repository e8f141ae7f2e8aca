//! Graph compiler: validates a [`GraphSpec`], assigns parameter offsets,
//! computes a topological evaluation order, and derives a stable
//! content-addressed [`graph_key`].
//!
//! Compilation is total (§4.2 of the spec): the first invariant violation
//! is reported as a [`GraphError`] naming the offending node, and no
//! partial [`CompiledGraph`] escapes a failed compile.

mod cache;
mod compiled;
mod error;
mod key;
mod param;
mod resolve;
mod topo;

pub use cache::compile_cached;
pub use compiled::{CompiledGraph, CompiledNode, ResolvedInput, ResolvedOutput};
pub use error::GraphError;
pub use key::graph_key;
pub(crate) use param::mlp_layers;

use crate::ir::{GraphSpec, NodeId, NodeKind};
use std::collections::HashSet;

/// Validate and compile a [`GraphSpec`] into an immutable [`CompiledGraph`],
/// without going through the process-wide compile cache. Prefer
/// [`compile_cached`] unless a fresh, uncached compile is specifically
/// required (e.g. testing compiler determinism itself).
pub fn compile_uncached(spec: &GraphSpec) -> Result<CompiledGraph, GraphError> {
    check_ids(spec)?;
    check_edges_exist(spec)?;
    check_single_input(spec)?;

    let topo_order = topo::topological_order(spec)?;
    let (mut nodes, outputs) = resolve::resolve(spec, &topo_order)?;

    let mut offset = 0usize;
    for node in nodes.iter_mut() {
        node.param_offset = offset;
        offset += node.param_length;
    }
    let total_params = offset;

    let output_size: usize = outputs.iter().map(|o| o.size).sum();
    let graph_key = key::graph_key(spec);

    Ok(CompiledGraph {
        nodes,
        outputs,
        output_size,
        total_params,
        graph_key,
    })
}

fn check_ids(spec: &GraphSpec) -> Result<(), GraphError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &spec.nodes {
        if node.id.is_empty() {
            return Err(GraphError::EmptyNodeId);
        }
        if !seen.insert(node.id.as_str()) {
            return Err(GraphError::DuplicateNodeId(node.id.clone()));
        }
    }
    Ok(())
}

fn check_edges_exist(spec: &GraphSpec) -> Result<(), GraphError> {
    let ids: HashSet<&str> = spec.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &spec.edges {
        if !ids.contains(edge.from.as_str()) {
            return Err(GraphError::DanglingEdge(edge.from.clone()));
        }
        if !ids.contains(edge.to.as_str()) {
            return Err(GraphError::DanglingEdge(edge.to.clone()));
        }
    }
    Ok(())
}

fn check_single_input(spec: &GraphSpec) -> Result<(), GraphError> {
    let input_ids: Vec<&NodeId> = spec
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Input { .. }))
        .map(|n| &n.id)
        .collect();
    if input_ids.len() != 1 {
        return Err(GraphError::InputCount(input_ids.len()));
    }
    Ok(())
}
