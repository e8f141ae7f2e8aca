//! Typed node/edge/output descriptors for a computation graph.
//!
//! This module only defines the *shape* of a graph specification. It does
//! no validation and derives nothing; see [`crate::compiler`] for that.

mod spec;

pub use spec::{Edge, GraphSpec, Node, NodeId, NodeKind, OutputRef};
