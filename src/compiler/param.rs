//! Per-node-kind parameter-count formulas (§3 of the spec).

use crate::ir::NodeKind;

/// Ordered `(in, out)` layer pairs for an MLP's Dense chain: `inputSize ->
/// hiddenSizes[0] -> ... -> hiddenSizes[n-1] -> outputSize`.
pub fn mlp_layers(input_size: usize, hidden_sizes: &[usize], output_size: usize) -> Vec<(usize, usize)> {
    let mut sizes = Vec::with_capacity(hidden_sizes.len() + 2);
    sizes.push(input_size);
    sizes.extend_from_slice(hidden_sizes);
    sizes.push(output_size);
    sizes.windows(2).map(|w| (w[0], w[1])).collect()
}

fn dense_params(input_size: usize, output_size: usize) -> usize {
    input_size * output_size + output_size
}

/// Number of 32-bit float parameters this node contributes to a weight
/// slab. Zero for nodes with no learnable parameters (Input, Concat,
/// Split).
pub fn param_length(kind: &NodeKind) -> usize {
    match kind {
        NodeKind::Input { .. } | NodeKind::Concat | NodeKind::Split { .. } => 0,
        NodeKind::Dense {
            input_size,
            output_size,
        } => dense_params(*input_size, *output_size),
        NodeKind::Mlp {
            input_size,
            output_size,
            hidden_sizes,
        } => mlp_layers(*input_size, hidden_sizes, *output_size)
            .into_iter()
            .map(|(a, b)| dense_params(a, b))
            .sum(),
        NodeKind::Gru {
            input_size,
            hidden_size,
        } => 3 * (input_size * hidden_size + hidden_size * hidden_size + hidden_size),
        NodeKind::Lstm {
            input_size,
            hidden_size,
        } => 4 * (input_size * hidden_size + hidden_size * hidden_size + hidden_size),
        NodeKind::Rru {
            input_size,
            hidden_size,
        } => 2 * (input_size * hidden_size + hidden_size * hidden_size + hidden_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_matches_formula() {
        let k = NodeKind::Dense {
            input_size: 4,
            output_size: 3,
        };
        assert_eq!(param_length(&k), 4 * 3 + 3);
    }

    #[test]
    fn mlp_sums_adjacent_pairs() {
        let k = NodeKind::Mlp {
            input_size: 4,
            output_size: 2,
            hidden_sizes: vec![8, 6],
        };
        // (4,8) + (8,6) + (6,2)
        let expected = (4 * 8 + 8) + (8 * 6 + 6) + (6 * 2 + 2);
        assert_eq!(param_length(&k), expected);
    }

    #[test]
    fn gru_lstm_rru_ratios() {
        let gru = NodeKind::Gru {
            input_size: 5,
            hidden_size: 3,
        };
        let lstm = NodeKind::Lstm {
            input_size: 5,
            hidden_size: 3,
        };
        let rru = NodeKind::Rru {
            input_size: 5,
            hidden_size: 3,
        };
        let unit = 5 * 3 + 3 * 3 + 3;
        assert_eq!(param_length(&gru), 3 * unit);
        assert_eq!(param_length(&lstm), 4 * unit);
        assert_eq!(param_length(&rru), 2 * unit);
    }

    #[test]
    fn structural_nodes_have_no_params() {
        assert_eq!(param_length(&NodeKind::Input { output_size: 4 }), 0);
        assert_eq!(param_length(&NodeKind::Concat), 0);
        assert_eq!(
            param_length(&NodeKind::Split {
                output_sizes: vec![2, 2]
            }),
            0
        );
    }
}
