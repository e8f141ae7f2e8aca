//! LSTM kernel: standard input/forget/candidate/output gating.
//!
//! Weight slab layout: four gate blocks packed in the order input,
//! forget, candidate, output; each block is `(W, U, b)` as described in
//! `kernels::gate`.

use crate::kernels::activation::{sigmoid_inplace, tanh_inplace};
use crate::kernels::gate::{gate_preactivation, split_gate_block};
use crate::kernels::weight_view::WeightView;

#[derive(Debug)]
pub struct Lstm {
    input_size: usize,
    hidden_size: usize,
    weights: WeightView,
    hidden: Vec<f32>,
    cell: Vec<f32>,
    i_gate: Vec<f32>,
    f_gate: Vec<f32>,
    g_gate: Vec<f32>,
    o_gate: Vec<f32>,
    cell_tanh: Vec<f32>,
}

impl Lstm {
    pub fn new(input_size: usize, hidden_size: usize, weights: WeightView) -> Self {
        let unit = hidden_size * input_size + hidden_size * hidden_size + hidden_size;
        debug_assert_eq!(weights.len(), 4 * unit);
        Self {
            input_size,
            hidden_size,
            weights,
            hidden: vec![0.0; hidden_size],
            cell: vec![0.0; hidden_size],
            i_gate: vec![0.0; hidden_size],
            f_gate: vec![0.0; hidden_size],
            g_gate: vec![0.0; hidden_size],
            o_gate: vec![0.0; hidden_size],
            cell_tanh: vec![0.0; hidden_size],
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn blocks(&self) -> (&[f32], &[f32], &[f32], &[f32]) {
        let unit = self.hidden_size * self.input_size + self.hidden_size * self.hidden_size + self.hidden_size;
        let slab = self.weights.as_slice();
        (
            &slab[0..unit],
            &slab[unit..2 * unit],
            &slab[2 * unit..3 * unit],
            &slab[3 * unit..4 * unit],
        )
    }

    pub fn step(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.input_size);
        let (ib, fb, gb, ob) = self.blocks();
        let (wi, ui, bi) = split_gate_block(ib, self.input_size, self.hidden_size);
        let (wf, uf, bf) = split_gate_block(fb, self.input_size, self.hidden_size);
        let (wg, ug, bg) = split_gate_block(gb, self.input_size, self.hidden_size);
        let (wo, uo, bo) = split_gate_block(ob, self.input_size, self.hidden_size);

        gate_preactivation(wi, ui, bi, input, &self.hidden, self.input_size, self.hidden_size, &mut self.i_gate);
        sigmoid_inplace(&mut self.i_gate);
        gate_preactivation(wf, uf, bf, input, &self.hidden, self.input_size, self.hidden_size, &mut self.f_gate);
        sigmoid_inplace(&mut self.f_gate);
        gate_preactivation(wg, ug, bg, input, &self.hidden, self.input_size, self.hidden_size, &mut self.g_gate);
        tanh_inplace(&mut self.g_gate);
        gate_preactivation(wo, uo, bo, input, &self.hidden, self.input_size, self.hidden_size, &mut self.o_gate);
        sigmoid_inplace(&mut self.o_gate);

        for i in 0..self.hidden_size {
            self.cell[i] = self.f_gate[i] * self.cell[i] + self.i_gate[i] * self.g_gate[i];
        }
        self.cell_tanh.copy_from_slice(&self.cell);
        tanh_inplace(&mut self.cell_tanh);
        for i in 0..self.hidden_size {
            self.hidden[i] = self.o_gate[i] * self.cell_tanh[i];
        }
        &self.hidden
    }

    pub fn reset(&mut self) {
        self.hidden.iter_mut().for_each(|h| *h = 0.0);
        self.cell.iter_mut().for_each(|c| *c = 0.0);
    }

    pub fn rebind(&mut self, weights: WeightView) {
        debug_assert_eq!(weights.len(), self.weights.len());
        self.weights = weights;
    }
}
