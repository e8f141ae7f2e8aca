//! Canonical, topology-stable content hash for a [`GraphSpec`].

use crate::ir::GraphSpec;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Compute the graph key: a canonical serialization of `spec`, hashed with
/// SHA-256 and rendered as lowercase hex.
///
/// The serialization is invariant under any reordering of `edges` or
/// `outputs` that does not change port assignments: edges are sorted by
/// `(fromId, fromPort, toId, toPort)` (absent ports normalized to `0`) and
/// outputs by `(nodeId, port)` before serialization. Nodes are kept in
/// declaration order, since node order has no bearing on topology once
/// edges resolve it, but the spec's node *declarations* (including their
/// attributes) are part of the content being addressed.
pub fn graph_key(spec: &GraphSpec) -> String {
    let mut buf = String::new();

    buf.push_str("nodes:[");
    for node in &spec.nodes {
        let _ = write!(
            buf,
            "{}|",
            serde_json::to_string(node).expect("Node serialization is infallible")
        );
    }
    buf.push(']');

    let mut edges: Vec<(&str, usize, &str, usize)> = spec
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.from_port(), e.to.as_str(), e.to_port.unwrap_or(0)))
        .collect();
    edges.sort();
    buf.push_str("edges:[");
    for (from, from_port, to, to_port) in edges {
        let _ = write!(buf, "{from}:{from_port}->{to}:{to_port}|");
    }
    buf.push(']');

    let mut outputs: Vec<(&str, usize)> = spec
        .outputs
        .iter()
        .map(|o| (o.node_id.as_str(), o.port()))
        .collect();
    outputs.sort();
    buf.push_str("outputs:[");
    for (node_id, port) in outputs {
        let _ = write!(buf, "{node_id}:{port}|");
    }
    buf.push(']');

    let _ = write!(buf, "outputSize:{}", spec.output_size);

    let digest = Sha256::digest(buf.as_bytes());
    hex::encode(digest)
}
