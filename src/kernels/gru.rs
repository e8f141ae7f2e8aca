//! GRU kernel: standard reset/update/candidate gating.
//!
//! Weight slab layout: three gate blocks packed in the order reset,
//! update, candidate; each block is `(W, U, b)` as described in
//! `kernels::gate`.

use crate::kernels::activation::{sigmoid_inplace, tanh_inplace};
use crate::kernels::gate::{gate_preactivation, split_gate_block};
use crate::kernels::weight_view::WeightView;

#[derive(Debug)]
pub struct Gru {
    input_size: usize,
    hidden_size: usize,
    weights: WeightView,
    hidden: Vec<f32>,
    r: Vec<f32>,
    z: Vec<f32>,
    n: Vec<f32>,
    un_h: Vec<f32>,
}

impl Gru {
    pub fn new(input_size: usize, hidden_size: usize, weights: WeightView) -> Self {
        let unit = hidden_size * input_size + hidden_size * hidden_size + hidden_size;
        debug_assert_eq!(weights.len(), 3 * unit);
        Self {
            input_size,
            hidden_size,
            weights,
            hidden: vec![0.0; hidden_size],
            r: vec![0.0; hidden_size],
            z: vec![0.0; hidden_size],
            n: vec![0.0; hidden_size],
            un_h: vec![0.0; hidden_size],
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn blocks(&self) -> (&[f32], &[f32], &[f32]) {
        let unit = self.hidden_size * self.input_size + self.hidden_size * self.hidden_size + self.hidden_size;
        let slab = self.weights.as_slice();
        (&slab[0..unit], &slab[unit..2 * unit], &slab[2 * unit..3 * unit])
    }

    pub fn step(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.input_size);
        let (reset_block, update_block, candidate_block) = self.blocks();
        let (wr, ur, br) = split_gate_block(reset_block, self.input_size, self.hidden_size);
        let (wz, uz, bz) = split_gate_block(update_block, self.input_size, self.hidden_size);
        let (wn, un, bn) = split_gate_block(candidate_block, self.input_size, self.hidden_size);

        gate_preactivation(wr, ur, br, input, &self.hidden, self.input_size, self.hidden_size, &mut self.r);
        sigmoid_inplace(&mut self.r);

        gate_preactivation(wz, uz, bz, input, &self.hidden, self.input_size, self.hidden_size, &mut self.z);
        sigmoid_inplace(&mut self.z);

        // n = tanh(Wn x + bn + r * (Un h)), computed by first getting the
        // plain Un*h term via a zero-bias, zero-W pre-activation pass,
        // then the full candidate pre-activation with the gated h term
        // substituted in place of h.
        for (i, slot) in self.un_h.iter_mut().enumerate() {
            let u_row = &un[i * self.hidden_size..(i + 1) * self.hidden_size];
            let mut acc = 0.0;
            for (hi, ui) in self.hidden.iter().zip(u_row) {
                acc += hi * ui;
            }
            *slot = acc * self.r[i];
        }
        for (i, slot) in self.n.iter_mut().enumerate() {
            let w_row = &wn[i * self.input_size..(i + 1) * self.input_size];
            let mut acc = bn[i] + self.un_h[i];
            for (xi, wi) in input.iter().zip(w_row) {
                acc += xi * wi;
            }
            *slot = acc;
        }
        tanh_inplace(&mut self.n);

        for i in 0..self.hidden_size {
            self.hidden[i] = (1.0 - self.z[i]) * self.n[i] + self.z[i] * self.hidden[i];
        }
        &self.hidden
    }

    pub fn reset(&mut self) {
        self.hidden.iter_mut().for_each(|h| *h = 0.0);
    }

    pub fn rebind(&mut self, weights: WeightView) {
        debug_assert_eq!(weights.len(), self.weights.len());
        self.weights = weights;
    }
}
