//! Graph specification types.
//!
//! A [`GraphSpec`] is the untrusted, user-authored description of a
//! computation DAG: nodes, edges, and output references. It carries no
//! derived information (no offsets, no evaluation order) -- that is the
//! compiler's job (`crate::compiler`).

use serde::{Deserialize, Serialize};

/// Stable identifier for a node within a [`GraphSpec`]. Non-empty, unique.
pub type NodeId = String;

/// A single node in the computation graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
}

/// Node-type discriminant and its type-specific attributes.
///
/// Tagged by `type` in the wire format, matching the canonical JSON shape
/// described in the external-interfaces section of the spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Input {
        output_size: usize,
    },
    Dense {
        input_size: usize,
        output_size: usize,
    },
    Mlp {
        input_size: usize,
        output_size: usize,
        #[serde(default)]
        hidden_sizes: Vec<usize>,
    },
    Gru {
        input_size: usize,
        hidden_size: usize,
    },
    Lstm {
        input_size: usize,
        hidden_size: usize,
    },
    Rru {
        input_size: usize,
        hidden_size: usize,
    },
    Concat,
    Split {
        output_sizes: Vec<usize>,
    },
}

impl NodeKind {
    /// Short discriminant name, used in error messages and the graph key.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Input { .. } => "Input",
            NodeKind::Dense { .. } => "Dense",
            NodeKind::Mlp { .. } => "Mlp",
            NodeKind::Gru { .. } => "Gru",
            NodeKind::Lstm { .. } => "Lstm",
            NodeKind::Rru { .. } => "Rru",
            NodeKind::Concat => "Concat",
            NodeKind::Split { .. } => "Split",
        }
    }

    /// Number of incoming edges this node type accepts (`None` means
    /// "determined by `outputSizes`", i.e. Split accepts exactly one but
    /// Concat accepts any number).
    pub fn is_single_input(&self) -> bool {
        !matches!(self, NodeKind::Input { .. } | NodeKind::Concat)
    }
}

/// A directed edge between two node ports.
///
/// `from_port`/`to_port` default to `0` when absent, per the spec's edge
/// model. `to_port` is only meaningful at a multi-input (Concat) node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub from_port: Option<usize>,
    #[serde(default)]
    pub to_port: Option<usize>,
}

impl Edge {
    pub fn from_port(&self) -> usize {
        self.from_port.unwrap_or(0)
    }
}

/// A reference to one output port of one node, contributing a contiguous
/// slice to the graph's overall output vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputRef {
    pub node_id: NodeId,
    #[serde(default)]
    pub port: Option<usize>,
}

impl OutputRef {
    pub fn port(&self) -> usize {
        self.port.unwrap_or(0)
    }
}

/// The full, user-authored graph specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    pub spec_type: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub outputs: Vec<OutputRef>,
    pub output_size: usize,
}

fn default_spec_type() -> String {
    "graph".to_string()
}

impl GraphSpec {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
