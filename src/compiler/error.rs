//! Compiler error taxonomy.

use crate::ir::NodeId;
use thiserror::Error;

/// Every way a [`GraphSpec`](crate::ir::GraphSpec) can fail to compile.
///
/// Compilation is total: the first violation encountered is reported and
/// no partial [`CompiledGraph`](crate::compiler::CompiledGraph) escapes.
/// Every variant names the offending node id(s) where one exists.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("node id must be non-empty")]
    EmptyNodeId,

    #[error("edge references unknown node: {0}")]
    DanglingEdge(NodeId),

    #[error("graph must have exactly one Input node, found {0}")]
    InputCount(usize),

    #[error("Input node {0} must not have incoming edges")]
    InputHasIncomingEdges(NodeId),

    #[error("cycle detected involving node {0}")]
    Cycle(NodeId),

    #[error("node {0} requires exactly one incoming edge, found {1}")]
    WrongInputCount(NodeId, usize),

    #[error("Concat node {0} has a mix of ported and unported incoming edges")]
    InconsistentPorts(NodeId),

    #[error("Concat node {0} has non-contiguous or duplicate toPort values")]
    NonContiguousPorts(NodeId),

    #[error("edge from {0} references out-of-range fromPort {1}")]
    PortOutOfRange(NodeId, usize),

    #[error("Split node {0}: sum(outputSizes)={1} does not match upstream size {2}")]
    SplitSizeMismatch(NodeId, usize, usize),

    #[error("Split node {0} has a non-positive outputSizes entry")]
    SplitNonPositiveSize(NodeId),

    #[error("Concat node {0}: declared inputSize {1} does not match summed upstream size {2}")]
    ConcatSizeMismatch(NodeId, usize, usize),

    #[error("declared graph outputSize {0} does not match summed output-port size {1}")]
    OutputSizeMismatch(usize, usize),

    #[error("output reference to unknown node: {0}")]
    DanglingOutputRef(NodeId),

    #[error("node {0} has a non-positive declared size")]
    NonPositiveSize(NodeId),
}
