//! Tagged-variant runtime node: dispatch by match, not by virtual call
//! (§9 design notes).

use crate::kernels::{Dense, Gru, Lstm, Mlp, Rru, WeightView};

pub enum RuntimeNode {
    Input,
    Dense(Dense),
    Mlp(Mlp),
    Gru(Gru),
    Lstm(Lstm),
    Rru(Rru),
    Concat,
    Split,
}

impl RuntimeNode {
    /// Run this node's forward/step given its already-gathered input
    /// vector, writing the result into `out` (resized to the node's
    /// output size by the caller ahead of time).
    pub fn forward_into(&mut self, input: &[f32], out: &mut [f32]) {
        match self {
            RuntimeNode::Input => unreachable!("Input node is seeded directly, never dispatched"),
            RuntimeNode::Dense(k) => out.copy_from_slice(k.forward(input)),
            RuntimeNode::Mlp(k) => out.copy_from_slice(k.forward(input)),
            RuntimeNode::Gru(k) => out.copy_from_slice(k.step(input)),
            RuntimeNode::Lstm(k) => out.copy_from_slice(k.step(input)),
            RuntimeNode::Rru(k) => out.copy_from_slice(k.step(input)),
            // Concat/Split are pure wiring: their "kernel" is the identity
            // over the already-gathered, already-ordered input.
            RuntimeNode::Concat | RuntimeNode::Split => out.copy_from_slice(input),
        }
    }

    pub fn reset(&mut self) {
        match self {
            RuntimeNode::Gru(k) => k.reset(),
            RuntimeNode::Lstm(k) => k.reset(),
            RuntimeNode::Rru(k) => k.reset(),
            RuntimeNode::Dense(k) => k.reset(),
            RuntimeNode::Mlp(k) => k.reset(),
            RuntimeNode::Input | RuntimeNode::Concat | RuntimeNode::Split => {}
        }
    }

    pub fn rebind(&mut self, weights: WeightView) {
        match self {
            RuntimeNode::Dense(k) => k.rebind(weights),
            RuntimeNode::Mlp(k) => k.rebind(weights),
            RuntimeNode::Gru(k) => k.rebind(weights),
            RuntimeNode::Lstm(k) => k.rebind(weights),
            RuntimeNode::Rru(k) => k.rebind(weights),
            RuntimeNode::Input | RuntimeNode::Concat | RuntimeNode::Split => {}
        }
    }
}
