//! Graph runtime: executes a [`CompiledGraph`](crate::compiler::CompiledGraph)
//! bound to a weight slab, with zero per-pass allocation after
//! construction (§4.3 of the design).

mod brain;
mod error;
mod node;

pub use brain::{Brain, LayerView};
pub use error::RuntimeError;
