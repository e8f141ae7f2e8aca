//! Topological ordering via Kahn's algorithm.
//!
//! Nodes are ordered by declaration order within each "ready" wavefront so
//! that the resulting order is stable and deterministic for any fixed
//! input node-declaration order, independent of edge-declaration order.

use crate::compiler::error::GraphError;
use crate::ir::GraphSpec;
use std::collections::VecDeque;

/// Returns node indices (into `spec.nodes`) in a valid topological order,
/// or the id of a node participating in a cycle.
pub fn topological_order(spec: &GraphSpec) -> Result<Vec<usize>, GraphError> {
    let n = spec.nodes.len();
    let mut in_degree = vec![0usize; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];

    let index_of = |id: &str| spec.nodes.iter().position(|node| node.id == id);

    for edge in &spec.edges {
        let from = index_of(&edge.from).expect("dangling edges rejected before topo sort");
        let to = index_of(&edge.to).expect("dangling edges rejected before topo sort");
        children[from].push(to);
        in_degree[to] += 1;
    }

    // Kahn's algorithm, ready set processed in declaration order: a simple
    // FIFO queue seeded in declaration order and re-filled in declaration
    // order already gives this, since we always scan indices 0..n to find
    // newly-ready nodes rather than using an unordered set.
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];

    while let Some(idx) = queue.pop_front() {
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        order.push(idx);

        // Re-scan in declaration order for determinism instead of pushing
        // directly onto the back of the queue in edge-declaration order.
        let mut newly_ready = Vec::new();
        for &child in &children[idx] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                newly_ready.push(child);
            }
        }
        newly_ready.sort_unstable();
        for child in newly_ready {
            queue.push_back(child);
        }
    }

    if order.len() != n {
        let stuck = (0..n)
            .find(|&i| !visited[i])
            .expect("order shorter than n implies an unvisited node exists");
        return Err(GraphError::Cycle(spec.nodes[stuck].id.clone()));
    }

    Ok(order)
}
