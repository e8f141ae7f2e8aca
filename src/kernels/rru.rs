//! RRU kernel: a reduced recurrent unit with a shared input projection.
//!
//! Weight slab layout: two blocks packed in the order projection, update;
//! each block is `(W, U, b)` as described in `kernels::gate`. The reset
//! gate reuses the projection block's input-facing term (`Wp x + bp`)
//! rather than carrying its own weights, which is what keeps this unit to
//! two gate blocks instead of three:
//!
//! - `r = sigmoid(Wp x + bp)`
//! - `c = tanh(Wp x + bp + r * (Up h))`
//! - `z = sigmoid(Wz x + Uz h + bz)`
//! - `h' = (1 - z) * h + z * c`

use crate::kernels::activation::{sigmoid_inplace, tanh_inplace};
use crate::kernels::gate::{gate_preactivation, split_gate_block};
use crate::kernels::weight_view::WeightView;

#[derive(Debug)]
pub struct Rru {
    input_size: usize,
    hidden_size: usize,
    weights: WeightView,
    hidden: Vec<f32>,
    proj_input_only: Vec<f32>,
    r: Vec<f32>,
    z: Vec<f32>,
    c: Vec<f32>,
    zero_h: Vec<f32>,
}

impl Rru {
    pub fn new(input_size: usize, hidden_size: usize, weights: WeightView) -> Self {
        let unit = hidden_size * input_size + hidden_size * hidden_size + hidden_size;
        debug_assert_eq!(weights.len(), 2 * unit);
        Self {
            input_size,
            hidden_size,
            weights,
            hidden: vec![0.0; hidden_size],
            proj_input_only: vec![0.0; hidden_size],
            r: vec![0.0; hidden_size],
            z: vec![0.0; hidden_size],
            c: vec![0.0; hidden_size],
            zero_h: vec![0.0; hidden_size],
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn blocks(&self) -> (&[f32], &[f32]) {
        let unit = self.hidden_size * self.input_size + self.hidden_size * self.hidden_size + self.hidden_size;
        let slab = self.weights.as_slice();
        (&slab[0..unit], &slab[unit..2 * unit])
    }

    pub fn step(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.input_size);
        let (proj_block, update_block) = self.blocks();
        let (wp, up, bp) = split_gate_block(proj_block, self.input_size, self.hidden_size);
        let (wz, uz, bz) = split_gate_block(update_block, self.input_size, self.hidden_size);

        gate_preactivation(
            wp,
            up,
            bp,
            input,
            &self.zero_h,
            self.input_size,
            self.hidden_size,
            &mut self.proj_input_only,
        );
        self.r.copy_from_slice(&self.proj_input_only);
        sigmoid_inplace(&mut self.r);

        for (i, slot) in self.c.iter_mut().enumerate() {
            let u_row = &up[i * self.hidden_size..(i + 1) * self.hidden_size];
            let mut uh = 0.0;
            for (hi, ui) in self.hidden.iter().zip(u_row) {
                uh += hi * ui;
            }
            *slot = self.proj_input_only[i] + self.r[i] * uh;
        }
        tanh_inplace(&mut self.c);

        gate_preactivation(wz, uz, bz, input, &self.hidden, self.input_size, self.hidden_size, &mut self.z);
        sigmoid_inplace(&mut self.z);

        for i in 0..self.hidden_size {
            self.hidden[i] = (1.0 - self.z[i]) * self.hidden[i] + self.z[i] * self.c[i];
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_hidden_state() {
        let unit = 1 + 1 + 1;
        let data = vec![0.3f32; 2 * unit];
        let mut rru = Rru::new(1, 1, WeightView::from_slice(&data));
        rru.step(&[1.0]);
        assert_ne!(rru.hidden[0], 0.0);
        rru.reset();
        assert_eq!(rru.hidden[0], 0.0);
    }

    #[test]
    fn reproducible_given_identical_sequence() {
        let unit = 2 + 4 + 2;
        let data: Vec<f32> = (0..2 * unit).map(|i| (i as f32 * 0.05) - 0.2).collect();
        let seq = [[0.1, 0.2], [0.3, -0.4], [1.0, 0.0]];
        let mut a = Rru::new(2, 2, WeightView::from_slice(&data));
        let mut b = Rru::new(2, 2, WeightView::from_slice(&data));
        let mut out_a = vec![];
        let mut out_b = vec![];
        for v in &seq {
            out_a = a.step(v).to_vec();
        }
        for v in &seq {
            out_b = b.step(v).to_vec();
        }
        assert_eq!(out_a, out_b);
    }
}
