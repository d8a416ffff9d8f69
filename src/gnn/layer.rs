//! One message-passing layer: aggregate neighbors → gate → linear → ReLU.

use rand::rngs::StdRng;
use rand::Rng;

/// A single GNN transformation. Weights are heuristic, fixed at
/// construction: feature indices in the type/status range (0–16) get a
/// higher base weight than the tail features, with uniform jitter on top.
/// This is not a trained model.
#[derive(Debug, Clone)]
pub struct GnnLayer {
    /// `weights[input][output]`.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    /// Per-input-feature self-vs-neighborhood blend factor, in [0.9, 1.1).
    attention: Vec<f64>,
    input_dim: usize,
    output_dim: usize,
}

impl GnnLayer {
    pub fn new(input_dim: usize, output_dim: usize, rng: &mut StdRng) -> Self {
        let weights = (0..input_dim)
            .map(|i| {
                let base = if i <= 16 { 0.5 } else { 0.3 };
                (0..output_dim)
                    .map(|_| base + rng.gen_range(-0.15..0.15))
                    .collect()
            })
            .collect();
        let bias = vec![0.1; output_dim];
        let attention = (0..input_dim).map(|_| rng.gen_range(0.9..1.1)).collect();

        Self { weights, bias, attention, input_dim, output_dim }
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Forward pass for one node.
    ///
    /// 1. Weighted-average aggregation of `neighbors`, each weighted by
    ///    `adjacency_weights[i] * gates[i]` (gate defaults to 1). Skipped
    ///    entirely when the total weight is 0.
    /// 2. Per-feature convex blend of own vs. aggregated features by the
    ///    attention factors.
    /// 3. Linear transform + bias, then ReLU.
    pub fn forward(
        &self,
        node_features: &[f64],
        neighbors: &[&[f64]],
        adjacency_weights: &[f64],
        gates: Option<&[f64]>,
    ) -> Vec<f64> {
        debug_assert_eq!(node_features.len(), self.input_dim);

        // 1. Aggregate.
        let mut aggregated = vec![0.0; self.input_dim];
        let mut total_weight = 0.0;
        for (i, features) in neighbors.iter().enumerate() {
            let gate = gates.map(|g| g[i]).unwrap_or(1.0);
            let w = adjacency_weights[i] * gate;
            if w == 0.0 {
                continue;
            }
            total_weight += w;
            for (acc, f) in aggregated.iter_mut().zip(features.iter()) {
                *acc += w * f;
            }
        }
        if total_weight > 0.0 {
            for acc in &mut aggregated {
                *acc /= total_weight;
            }
        }

        // 2. Gated combination.
        let combined: Vec<f64> = node_features
            .iter()
            .zip(&aggregated)
            .zip(&self.attention)
            .map(|((own, agg), a)| a * own + (1.0 - a) * agg)
            .collect();

        // 3. Linear + bias + ReLU.
        (0..self.output_dim)
            .map(|o| {
                let sum: f64 = combined
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c * self.weights[i][o])
                    .sum();
                (sum + self.bias[o]).max(0.0)
            })
            .collect()
    }
}
