//! MLP kernel: a chain of Dense layers with `tanh` between hidden layers
//! and a linear final layer.

use crate::compiler::mlp_layers;
use crate::kernels::activation::tanh_inplace;
use crate::kernels::dense::Dense;
use crate::kernels::weight_view::WeightView;

#[derive(Debug)]
pub struct Mlp {
    layers: Vec<Dense>,
    /// Owned hidden-layer scratch, one buffer per non-final layer,
    /// sized up front so `forward` never allocates.
    hidden_scratch: Vec<Vec<f32>>,
}

impl Mlp {
    pub fn new(
        input_size: usize,
        output_size: usize,
        hidden_sizes: &[usize],
        weights: WeightView,
    ) -> Self {
        let layer_sizes = mlp_layers(input_size, hidden_sizes, output_size);
        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut remaining = weights;
        for (a, b) in &layer_sizes {
            let len = a * b + b;
            let (head, rest) = remaining.split_at(len);
            layers.push(Dense::new(*a, *b, head));
            remaining = rest;
        }
        let hidden_scratch = layer_sizes[..layer_sizes.len() - 1]
            .iter()
            .map(|&(_, b)| vec![0.0; b])
            .collect();
        Self { layers, hidden_scratch }
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.output_size()).unwrap_or(0)
    }

    pub fn forward(&mut self, input: &[f32]) -> &[f32] {
        let n = self.layers.len();
        let mut current = input;
        for (layer, scratch) in self.layers[..n - 1].iter_mut().zip(self.hidden_scratch.iter_mut()) {
            let out = layer.forward(current);
            scratch.copy_from_slice(out);
            tanh_inplace(scratch);
            current = scratch;
        }
        self.layers[n - 1].forward(current)
    }

    pub fn reset(&mut self) {}

    pub fn rebind(&mut self, weights: WeightView) {
        let mut remaining = weights;
        for layer in self.layers.iter_mut() {
            let len = layer.param_len();
            let (head, rest) = remaining.split_at(len);
            layer.rebind(head);
            remaining = rest;
        }
    }
}
