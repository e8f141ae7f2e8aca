//! Per-node size resolution and invariant checking, walked in topological
//! order so every upstream node's output sizes are already known when its
//! downstream consumers are validated.

use crate::compiler::compiled::{CompiledNode, ResolvedInput, ResolvedOutput};
use crate::compiler::error::GraphError;
use crate::compiler::param::{mlp_layers, param_length};
use crate::ir::{Edge, GraphSpec, NodeKind};
use std::collections::HashMap;

/// Number of *output* ports a node kind exposes, and their sizes, once its
/// own `output_size`/`output_sizes` are known.
fn output_port_sizes(kind: &NodeKind, output_size: usize) -> Vec<usize> {
    match kind {
        NodeKind::Split { output_sizes } => output_sizes.clone(),
        _ => vec![output_size],
    }
}

/// Resolve incoming edges for `node_id`, ordered per the spec's Concat
/// port-ordering rule: by `toPort` when every incoming edge declares one,
/// otherwise by `fromId` lexicographic order. Also validates invariant 6
/// (all-or-nothing ports, uniqueness, contiguity).
fn ordered_incoming<'a>(
    node_id: &str,
    edges: &'a [Edge],
) -> Result<Vec<&'a Edge>, GraphError> {
    let incoming: Vec<&Edge> = edges.iter().filter(|e| e.to == node_id).collect();

    let any_ported = incoming.iter().any(|e| e.to_port.is_some());
    let all_ported = incoming.iter().all(|e| e.to_port.is_some());

    if any_ported && !all_ported {
        return Err(GraphError::InconsistentPorts(node_id.to_string()));
    }

    let mut ordered = incoming;
    if all_ported && !ordered.is_empty() {
        let mut ports: Vec<usize> = ordered.iter().map(|e| e.to_port.unwrap()).collect();
        ports.sort_unstable();
        let contiguous = ports.iter().enumerate().all(|(i, &p)| i == p);
        if !contiguous || has_duplicates(&ports) {
            return Err(GraphError::NonContiguousPorts(node_id.to_string()));
        }
        ordered.sort_by_key(|e| e.to_port.unwrap());
    } else {
        ordered.sort_by(|a, b| a.from.cmp(&b.from));
    }

    Ok(ordered)
}

fn has_duplicates(sorted: &[usize]) -> bool {
    sorted.windows(2).any(|w| w[0] == w[1])
}

/// Resolve every node's shape and incoming-edge bindings in the given
/// topological order, checking invariants 5-11 along the way.
///
/// Returns compiled nodes (without `param_offset` assigned -- that is a
/// separate, purely additive pass over the result) and resolved output
/// references.
pub fn resolve(
    spec: &GraphSpec,
    topo_order: &[usize],
) -> Result<(Vec<CompiledNode>, Vec<ResolvedOutput>), GraphError> {
    // Map original spec index -> position in the topologically-ordered
    // compiled node array, and id -> compiled index.
    let mut compiled_index_of_spec_index = vec![0usize; spec.nodes.len()];
    for (compiled_idx, &spec_idx) in topo_order.iter().enumerate() {
        compiled_index_of_spec_index[spec_idx] = compiled_idx;
    }
    let spec_index_of_id: HashMap<&str, usize> = spec
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    // Resolved output port sizes for each node, filled in as we walk in
    // topological order (so upstream nodes are always resolved already).
    let mut resolved_ports: Vec<Vec<usize>> = vec![Vec::new(); spec.nodes.len()];
    let mut compiled: Vec<Option<CompiledNode>> = (0..spec.nodes.len()).map(|_| None).collect();

    for &spec_idx in topo_order {
        let node = &spec.nodes[spec_idx];

        for size in declared_sizes(&node.kind) {
            if size == 0 {
                return Err(GraphError::NonPositiveSize(node.id.clone()));
            }
        }

        let incoming = ordered_incoming(&node.id, &spec.edges)?;

        // Validate fromPort range and build resolved inputs against
        // already-resolved upstream port sizes.
        let mut inputs = Vec::with_capacity(incoming.len());
        let mut upstream_total = 0usize;
        for edge in &incoming {
            let from_spec_idx = *spec_index_of_id
                .get(edge.from.as_str())
                .expect("dangling edges rejected before resolve");
            let from_compiled_idx = compiled_index_of_spec_index[from_spec_idx];
            let from_ports = &resolved_ports[from_spec_idx];
            let port = edge.from_port();
            let port_size = *from_ports
                .get(port)
                .ok_or_else(|| GraphError::PortOutOfRange(edge.from.clone(), port))?;
            upstream_total += port_size;
            inputs.push(ResolvedInput {
                from_index: from_compiled_idx,
                from_port: port,
            });
        }

        match &node.kind {
            NodeKind::Input { .. } => {
                if !incoming.is_empty() {
                    return Err(GraphError::InputHasIncomingEdges(node.id.clone()));
                }
            }
            _ if node.kind.is_single_input() => {
                if incoming.len() != 1 {
                    return Err(GraphError::WrongInputCount(node.id.clone(), incoming.len()));
                }
            }
            _ => {}
        }

        let (input_size, output_size) = match &node.kind {
            NodeKind::Input { output_size } => (0, *output_size),
            NodeKind::Dense {
                input_size,
                output_size,
            } => {
                check_consumer_size(&node.id, *input_size, upstream_total)?;
                (*input_size, *output_size)
            }
            NodeKind::Mlp {
                input_size,
                output_size,
                hidden_sizes,
            } => {
                check_consumer_size(&node.id, *input_size, upstream_total)?;
                let _ = mlp_layers(*input_size, hidden_sizes, *output_size);
                (*input_size, *output_size)
            }
            NodeKind::Gru {
                input_size,
                hidden_size,
            }
            | NodeKind::Lstm {
                input_size,
                hidden_size,
            }
            | NodeKind::Rru {
                input_size,
                hidden_size,
            } => {
                check_consumer_size(&node.id, *input_size, upstream_total)?;
                (*input_size, *hidden_size)
            }
            NodeKind::Concat => (upstream_total, upstream_total),
            NodeKind::Split { output_sizes } => {
                if output_sizes.iter().any(|&s| s == 0) {
                    return Err(GraphError::SplitNonPositiveSize(node.id.clone()));
                }
                let declared_sum: usize = output_sizes.iter().sum();
                if declared_sum != upstream_total {
                    return Err(GraphError::SplitSizeMismatch(
                        node.id.clone(),
                        declared_sum,
                        upstream_total,
                    ));
                }
                (upstream_total, declared_sum)
            }
        };

        let hidden_size = match &node.kind {
            NodeKind::Gru { hidden_size, .. }
            | NodeKind::Lstm { hidden_size, .. }
            | NodeKind::Rru { hidden_size, .. } => *hidden_size,
            _ => 0,
        };

        let port_sizes = output_port_sizes(&node.kind, output_size);
        resolved_ports[spec_idx] = port_sizes.clone();

        compiled[spec_idx] = Some(CompiledNode {
            id: node.id.clone(),
            kind: node.kind.clone(),
            inputs,
            input_size,
            output_size,
            output_port_sizes: port_sizes,
            param_offset: 0,
            param_length: param_length(&node.kind),
            hidden_size,
        });
    }

    let compiled_in_topo_order: Vec<CompiledNode> = topo_order
        .iter()
        .map(|&spec_idx| {
            compiled[spec_idx]
                .take()
                .expect("every spec index is resolved exactly once")
        })
        .collect();

    let mut out_total = 0usize;
    let mut outputs = Vec::with_capacity(spec.outputs.len());
    for out_ref in &spec.outputs {
        let spec_idx = *spec_index_of_id
            .get(out_ref.node_id.as_str())
            .ok_or_else(|| GraphError::DanglingOutputRef(out_ref.node_id.clone()))?;
        let compiled_idx = compiled_index_of_spec_index[spec_idx];
        let port = out_ref.port();
        let size = *resolved_ports[spec_idx]
            .get(port)
            .ok_or_else(|| GraphError::PortOutOfRange(out_ref.node_id.clone(), port))?;
        out_total += size;
        outputs.push(ResolvedOutput {
            node_index: compiled_idx,
            port,
            size,
        });
    }

    if out_total != spec.output_size {
        return Err(GraphError::OutputSizeMismatch(spec.output_size, out_total));
    }

    Ok((compiled_in_topo_order, outputs))
}

fn check_consumer_size(node_id: &str, declared: usize, upstream: usize) -> Result<(), GraphError> {
    if declared != upstream {
        return Err(GraphError::ConcatSizeMismatch(
            node_id.to_string(),
            declared,
            upstream,
        ));
    }
    Ok(())
}

fn declared_sizes(kind: &NodeKind) -> Vec<usize> {
    match kind {
        NodeKind::Input { output_size } => vec![*output_size],
        NodeKind::Dense {
            input_size,
            output_size,
        } => vec![*input_size, *output_size],
        NodeKind::Mlp {
            input_size,
            output_size,
            hidden_sizes,
        } => {
            let mut v = vec![*input_size, *output_size];
            v.extend_from_slice(hidden_sizes);
            v
        }
        NodeKind::Gru {
            input_size,
            hidden_size,
        }
        | NodeKind::Lstm {
            input_size,
            hidden_size,
        }
        | NodeKind::Rru {
            input_size,
            hidden_size,
        } => vec![*input_size, *hidden_size],
        NodeKind::Concat => vec![],
        NodeKind::Split { output_sizes } => output_sizes.clone(),
    }
}
