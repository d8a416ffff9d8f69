//! The stacked impact-prediction model.
//!
//! Three layers (24→48 expand, 48→48 message pass, 48→12 impact head) run
//! densely over *all* node pairs, gated by adjacency weight × relationship
//! gate. The dense shape is deliberate: it lets second- and third-order
//! effects reach distant nodes in a single call instead of being limited to
//! k-hop neighborhoods.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::graph::InfrastructureGraph;
use crate::model::{NodeId, NodeType, Severity, EMBED_DIM};

use super::gating;
use super::layer::GnnLayer;

const HIDDEN_DIM: usize = 48;
const OUTPUT_DIM: usize = 12;

/// Default jitter seed. Weights are heuristic; the seed only pins
/// reproducibility, not any trained behavior.
const DEFAULT_SEED: u64 = 0x1_7a31;

/// Interpreted 12-channel output for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeImpactMetrics {
    pub impact_probability: f64,
    pub severity_score: f64,
    /// Raw sigmoid channel reported in minutes, unscaled.
    pub time_to_impact: f64,
    pub access_disruption: f64,
    pub service_disruption: f64,
    pub economic_impact: f64,
    pub safety_risk: f64,
    pub population_affected: f64,
    pub cascade_risk: f64,
    pub recovery_difficulty: f64,
    pub alternative_available: f64,
    pub urgency_score: f64,
}

/// The hand-built impact-prediction GNN.
#[derive(Debug, Clone)]
pub struct ImpactPredictionGnn {
    expand: GnnLayer,
    message: GnnLayer,
    head: GnnLayer,
}

impl ImpactPredictionGnn {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Construct with an explicit jitter seed (useful for fixtures).
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            expand: GnnLayer::new(EMBED_DIM, HIDDEN_DIM, &mut rng),
            message: GnnLayer::new(HIDDEN_DIM, HIDDEN_DIM, &mut rng),
            head: GnnLayer::new(HIDDEN_DIM, OUTPUT_DIM, &mut rng),
        }
    }

    /// Run inference for one failure event.
    ///
    /// Returns one metrics record per node, aligned with the graph's stable
    /// `node_ids` ordering (the failed node's own entry is included but
    /// meaningless to the caller). The graph is never mutated; every call
    /// works on its own embedding clones.
    pub fn predict_impact(
        &self,
        graph: &InfrastructureGraph,
        failed: &NodeId,
        failure_type: &str,
        severity: Severity,
    ) -> Vec<NodeImpactMetrics> {
        let n = graph.node_count();
        let failed_idx = graph.index_of(failed);

        // 1. Clone embeddings into scratch space.
        let mut features: Vec<Vec<f64>> =
            graph.iter_nodes().map(|node| node.embedding.to_vec()).collect();
        let types: Vec<NodeType> = graph.iter_nodes().map(|n| n.node_type).collect();

        // 2. Failure injection at the epicenter.
        if let Some(fi) = failed_idx {
            for slot in 12..=16 {
                features[fi][slot] = 0.0;
            }
            features[fi][23] = severity.failure_signal();
            if let Some(node) = graph.node(failed) {
                features[fi][17] = (node.criticality() * 1.2).min(1.0);
            }
        }

        // 3. Relationship gating matrix: gate[j][i] is the strength with
        // which node j's state propagates into node i under this failure.
        let gate: Vec<Vec<f64>> = (0..n)
            .map(|j| {
                (0..n)
                    .map(|i| gating::relationship_gate(types[j], types[i], failure_type))
                    .collect()
            })
            .collect();

        // 4. Cascade exposure: max-product path strength from the epicenter
        // over the gated adjacency, bounded by the layer count. The ReLU
        // stack keeps head outputs non-negative, so the sigmoid alone never
        // drops below 0.5; exposure is what lets unreachable nodes report
        // zero probability.
        let exposure = cascade_exposure(graph, &gate, failed_idx);

        // 5. Three dense passes over all ordered pairs.
        for layer in [&self.expand, &self.message, &self.head] {
            features = self.dense_pass(layer, graph, &features, &gate);
        }

        // 6. Interpret the 12-channel head output per node.
        let failed_type = failed_idx.map(|i| types[i]);
        features
            .iter()
            .zip(&types)
            .zip(&exposure)
            .map(|((out, &t), &x)| interpret(out, failed_type, t, x))
            .collect()
    }

    /// One layer applied to every node, each attending to all other nodes.
    fn dense_pass(
        &self,
        layer: &GnnLayer,
        graph: &InfrastructureGraph,
        features: &[Vec<f64>],
        gate: &[Vec<f64>],
    ) -> Vec<Vec<f64>> {
        let n = features.len();
        let mut next = Vec::with_capacity(n);
        let mut neighbors: Vec<&[f64]> = Vec::with_capacity(n.saturating_sub(1));
        let mut adjacency = Vec::with_capacity(n.saturating_sub(1));
        let mut gates = Vec::with_capacity(n.saturating_sub(1));

        for i in 0..n {
            neighbors.clear();
            adjacency.clear();
            gates.clear();
            for j in 0..n {
                if j == i {
                    continue;
                }
                neighbors.push(features[j].as_slice());
                adjacency.push(graph.adjacency_weight(j, i));
                gates.push(gate[j][i]);
            }
            next.push(layer.forward(&features[i], &neighbors, &adjacency, Some(&gates)));
        }
        next
    }
}

impl Default for ImpactPredictionGnn {
    fn default() -> Self {
        Self::new()
    }
}

/// Max-product path strength from the epicenter to every node over the
/// gated adjacency, relaxed once per layer. A node the failure cannot
/// reach within three gated hops keeps exposure 0.
fn cascade_exposure(
    graph: &InfrastructureGraph,
    gate: &[Vec<f64>],
    failed_idx: Option<usize>,
) -> Vec<f64> {
    let n = gate.len();
    let mut exposure = vec![0.0_f64; n];
    let Some(fi) = failed_idx else {
        return exposure;
    };
    exposure[fi] = 1.0;

    for _ in 0..3 {
        let prev = exposure.clone();
        for i in 0..n {
            for (j, &from) in prev.iter().enumerate() {
                if j == i || from == 0.0 {
                    continue;
                }
                let w = from * graph.adjacency_weight(j, i) * gate[j][i];
                if w > exposure[i] {
                    exposure[i] = w;
                }
            }
        }
    }
    exposure
}

/// Map the raw 12-channel head output into named, sigmoid-squashed metrics.
///
/// Channels are first normalized by the max absolute value (avoids
/// saturating every sigmoid at 1), then scaled by the type-pair impact
/// multiplier. The probability channel is additionally attenuated by the
/// cascade exposure, so unreachable nodes report zero.
fn interpret(
    out: &[f64],
    failed_type: Option<NodeType>,
    receiver: NodeType,
    exposure: f64,
) -> NodeImpactMetrics {
    let max_abs = out.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let mult = failed_type
        .map(|ft| gating::type_impact_multiplier(ft, receiver))
        .unwrap_or(1.0);

    let mut c = [0.0; OUTPUT_DIM];
    for (slot, v) in c.iter_mut().zip(out.iter()) {
        let normalized = if max_abs > 0.0 { v / max_abs } else { 0.0 };
        *slot = sigmoid(normalized * mult);
    }

    NodeImpactMetrics {
        impact_probability: c[0] * exposure,
        severity_score: c[1],
        time_to_impact: c[2],
        access_disruption: c[3],
        service_disruption: c[4],
        economic_impact: c[5],
        safety_risk: c[6],
        population_affected: c[7],
        cascade_risk: c[8],
        recovery_difficulty: c[9],
        alternative_available: c[10],
        urgency_score: c[11],
    }
}

/// Logistic squash with the input clamped to ±500 to avoid overflow.
pub(crate) fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, PropertyMap};

    fn chain_graph() -> InfrastructureGraph {
        let mut g = InfrastructureGraph::new();
        g.add_node("power-a", NodeType::Power, PropertyMap::new());
        g.add_node("pump-b", NodeType::Pump, PropertyMap::new());
        g.add_node("tank-c", NodeType::Tank, PropertyMap::new());
        g.add_edge("power-a", Edge::new("pump-b", 0.9).with_kind("supply", "power-supply"));
        g.add_edge("pump-b", Edge::new("tank-c", 0.9).with_kind("mechanical", "mechanical"));
        g.build_adjacency_matrix();
        g
    }

    #[test]
    fn metrics_are_unit_interval() {
        let g = chain_graph();
        let model = ImpactPredictionGnn::with_seed(42);
        let out = model.predict_impact(&g, &"power-a".into(), "outage", Severity::Critical);
        assert_eq!(out.len(), 3);
        for m in &out {
            for v in [m.impact_probability, m.severity_score, m.cascade_risk, m.urgency_score] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn prediction_is_deterministic_for_fixed_weights() {
        let g = chain_graph();
        let model = ImpactPredictionGnn::with_seed(42);
        let a = model.predict_impact(&g, &"power-a".into(), "outage", Severity::High);
        let b = model.predict_impact(&g, &"power-a".into(), "outage", Severity::High);
        assert_eq!(a, b);
    }

    #[test]
    fn graph_embeddings_are_untouched_by_prediction() {
        let g = chain_graph();
        let before: Vec<_> = g.iter_nodes().map(|n| n.embedding).collect();
        let model = ImpactPredictionGnn::new();
        model.predict_impact(&g, &"power-a".into(), "outage", Severity::Critical);
        let after: Vec<_> = g.iter_nodes().map(|n| n.embedding).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn outage_reaches_the_pump_but_not_the_gravity_fed_tank() {
        let g = chain_graph();
        let model = ImpactPredictionGnn::with_seed(42);
        let out = model.predict_impact(&g, &"power-a".into(), "outage", Severity::Critical);

        let pump_idx = g.index_of(&"pump-b".into()).unwrap();
        let tank_idx = g.index_of(&"tank-c".into()).unwrap();
        // Gate power→pump saturates at 1.0 under an outage; the sigmoid
        // floor of 0.5 times the 0.9 adjacency weight keeps the pump hot.
        assert!(out[pump_idx].impact_probability > 0.3);
        // Every gated path into the tank is closed by the outage override.
        assert_eq!(out[tank_idx].impact_probability, 0.0);
    }

    #[test]
    fn unreachable_nodes_report_zero_probability() {
        let mut g = InfrastructureGraph::new();
        g.add_node("island", NodeType::Power, PropertyMap::new());
        g.add_node("mainland", NodeType::Pump, PropertyMap::new());
        g.build_adjacency_matrix();

        let model = ImpactPredictionGnn::with_seed(42);
        let out = model.predict_impact(&g, &"island".into(), "failure", Severity::Critical);
        let idx = g.index_of(&"mainland".into()).unwrap();
        assert_eq!(out[idx].impact_probability, 0.0);
    }

    #[test]
    fn sigmoid_survives_extreme_inputs() {
        assert!(sigmoid(1e9) <= 1.0);
        assert!(sigmoid(-1e9) >= 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }
}
