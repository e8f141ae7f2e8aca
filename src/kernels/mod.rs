//! Op kernels: allocation-free (after construction) vector math over
//! contiguous `f32` buffers, one struct per node type that carries
//! parameters. Structural node types (Input, Concat, Split) need no
//! kernel of their own -- the runtime wires their buffers directly.

mod activation;
mod dense;
mod gate;
mod gru;
mod lstm;
mod mlp;
mod rru;
mod weight_view;

pub use dense::Dense;
pub use gru::Gru;
pub use lstm::Lstm;
pub use mlp::Mlp;
pub use rru::Rru;
pub use weight_view::WeightView;
