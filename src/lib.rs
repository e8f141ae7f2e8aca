//! neuropool - batched neural-network inference core for a neuroevolution
//! simulation.
//!
//! Each simulation tick evaluates a population of small per-agent neural
//! networks ("brains") against a batch of sensor vectors and returns
//! their action vectors. Three pieces, built bottom-up:
//!
//! - [`ir`]: the typed graph specification (nodes, edges, outputs).
//! - [`compiler`]: validates a [`ir::GraphSpec`], assigns parameter
//!   offsets, computes a topological order, and derives a stable,
//!   content-addressed graph key.
//! - [`kernels`]: allocation-free vector math per node type (Dense, MLP,
//!   GRU, LSTM, RRU).
//! - [`runtime`]: executes a compiled graph bound to a weight slab
//!   ([`runtime::Brain`]), with zero per-pass allocation.
//! - [`pool`]: fans a batch out across worker threads through shared,
//!   preallocated memory regions, with an at-most-one-in-flight-batch
//!   guarantee and typed failure containment.
//!
//! Out of scope: training, arbitrary tensor shapes, GPU execution,
//! dynamic graph reshaping, and anything this core's caller -- the
//! surrounding simulation -- owns instead (persistence, physics,
//! evolutionary operators, rendering).

pub mod compiler;
pub mod ir;
pub mod kernels;
pub mod pool;
pub mod runtime;

pub use compiler::{compile_cached, graph_key, CompiledGraph, GraphError};
pub use ir::{Edge, GraphSpec, Node, NodeKind, OutputRef};
pub use pool::{BatchPool, PoolError, PoolOptions, Status};
pub use runtime::{Brain, RuntimeError};
