//! # Impact Analyzer
//!
//! Post-processes raw GNN output into the final report: physical distance
//! decay, noise-floor thresholding, severity ranking, BFS propagation
//! paths, the overall risk assessment, and a renderable graph payload.
//!
//! Stateless: each call is a pure function of `(graph, model, failure)`.

pub mod narrative;
pub mod report;
pub mod visualization;

pub use report::{
    AffectedNode, ImpactReport, MetricPercentages, OverallAssessment, PropagationStep,
    RiskLevel, SourceFailure,
};
pub use visualization::{VisLink, VisNode, VisualizationGraph};

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::gnn::{ImpactPredictionGnn, NodeImpactMetrics};
use crate::graph::InfrastructureGraph;
use crate::model::{NodeId, Severity};

/// Maximum BFS depth for propagation paths.
const MAX_PROPAGATION_DEPTH: usize = 5;

/// Hard cap on reported probability (never show 100%).
const PROBABILITY_CAP: f64 = 0.98;

/// Inverse-square physical decay on the raw impact probability, clamped to
/// [0.1, 1.0]. Distance 0 saturates at 1; unknown (infinite) distance
/// bottoms out at the 0.1 floor rather than erasing the node.
pub fn physics_decay(distance: f64) -> f64 {
    (1.0 / (distance * distance)).clamp(0.1, 1.0)
}

/// Criticality-adjusted noise floor: more critical nodes clear a lower bar.
pub fn noise_floor(criticality: f64) -> f64 {
    0.30 * (1.0 - criticality * 0.3)
}

/// Severity bucket from the raw severity-score channel.
pub fn severity_bucket(score: f64) -> Severity {
    if score >= 0.75 {
        Severity::Critical
    } else if score >= 0.5 {
        Severity::High
    } else if score >= 0.25 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Run the full analysis for one failure event.
///
/// The caller guarantees `failed` exists in the graph.
pub fn analyze_impact(
    graph: &InfrastructureGraph,
    model: &ImpactPredictionGnn,
    failed: &NodeId,
    failure_type: &str,
    severity: Severity,
) -> ImpactReport {
    let metrics = model.predict_impact(graph, failed, failure_type, severity);

    // 1–3. Decay, threshold, assemble — in stable node order.
    let mut affected = Vec::new();
    let mut affected_ids: HashSet<NodeId> = HashSet::new();
    let mut flow_links = Vec::new();

    for (idx, id) in graph.node_ids().iter().enumerate() {
        if id == failed {
            continue;
        }
        let Some(node) = graph.node(id) else { continue };
        let m = &metrics[idx];

        let distance = graph.distance_between(failed, id);
        let decay = physics_decay(distance);
        let adjusted = m.impact_probability * decay;

        if adjusted <= noise_floor(node.criticality()) {
            continue;
        }

        let capped = adjusted.min(PROBABILITY_CAP);
        flow_links.push(visualization::impact_link(
            failed.as_str(),
            id.as_str(),
            capped,
            distance,
        ));

        affected.push(AffectedNode {
            id: id.to_string(),
            node_type: node.node_type.as_str().to_string(),
            name: node.name().to_string(),
            probability: (capped * 100.0).round(),
            severity: severity_bucket(m.severity_score),
            severity_score: m.severity_score,
            time_to_impact_minutes: m.time_to_impact.round(),
            metrics: MetricPercentages::from_metrics(m),
            effects: narrative::effects_for(node.node_type, m),
            recommendations: narrative::recommendations_for(node.node_type, m),
        });
        affected_ids.insert(id.clone());
    }

    // 4. Rank by severity score, descending; ties break on id for a stable
    // report.
    affected.sort_by(|a, b| {
        b.severity_score
            .total_cmp(&a.severity_score)
            .then_with(|| a.id.cmp(&b.id))
    });

    // 5. Propagation paths over the stored edges, not the dense attention.
    let propagation_path = propagation_paths(graph, failed, &affected_ids);

    // 6. Overall assessment.
    let overall_assessment =
        assess(graph, failed, failure_type, severity, &affected);

    // 7. Visualization payload.
    let visualization = build_visualization(graph, failed, &affected, flow_links);

    debug!(
        failed = %failed,
        failure_type,
        affected = affected.len(),
        risk = ?overall_assessment.risk_level,
        "impact analysis complete"
    );

    let failed_node = graph.node(failed);
    ImpactReport {
        source_failure: SourceFailure {
            node_id: failed.to_string(),
            node_type: failed_node.map(|n| n.node_type.as_str()).unwrap_or("unknown").to_string(),
            name: failed_node.map(|n| n.name().to_string()).unwrap_or_else(|| failed.to_string()),
            failure_type: failure_type.to_string(),
            severity,
        },
        total_affected: affected.len(),
        total_nodes: graph.node_count(),
        affected_nodes: affected,
        propagation_path,
        overall_assessment,
        visualization,
    }
}

// ============================================================================
// Propagation paths (BFS, depth-capped)
// ============================================================================

/// BFS from the epicenter, recording every traversed edge whose target is
/// in the affected set. Traversal passes through unaffected nodes so that
/// indirect chains are still discovered.
fn propagation_paths(
    graph: &InfrastructureGraph,
    failed: &NodeId,
    affected: &HashSet<NodeId>,
) -> Vec<PropagationStep> {
    let mut steps = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<(NodeId, usize, Vec<String>)> = VecDeque::new();

    visited.insert(failed.clone());
    queue.push_back((failed.clone(), 0, vec![failed.to_string()]));

    while let Some((current, depth, path)) = queue.pop_front() {
        if depth >= MAX_PROPAGATION_DEPTH {
            continue;
        }
        for edge in graph.edges_from(&current) {
            if affected.contains(&edge.target) {
                let mut full_path = path.clone();
                full_path.push(edge.target.to_string());
                steps.push(PropagationStep {
                    from: current.to_string(),
                    to: edge.target.to_string(),
                    depth: depth + 1,
                    path: full_path,
                    weight: edge.weight,
                    relationship: edge.relationship.clone(),
                });
            }
            if visited.insert(edge.target.clone()) {
                let mut next_path = path.clone();
                next_path.push(edge.target.to_string());
                queue.push_back((edge.target.clone(), depth + 1, next_path));
            }
        }
    }
    steps
}

// ============================================================================
// Overall assessment
// ============================================================================

fn assess(
    graph: &InfrastructureGraph,
    failed: &NodeId,
    failure_type: &str,
    severity: Severity,
    affected: &[AffectedNode],
) -> OverallAssessment {
    let total_impact: f64 = affected.iter().map(|a| a.severity_score).sum();
    let critical_count = affected.iter().filter(|a| a.severity == Severity::Critical).count();
    let high_count = affected.iter().filter(|a| a.severity == Severity::High).count();

    let risk_level = if critical_count > 0 || total_impact > 4.0 {
        RiskLevel::Critical
    } else if high_count > 1 || total_impact > 2.5 {
        RiskLevel::High
    } else if affected.len() > 3 || total_impact > 1.5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let failed_node = graph.node(failed);
    let failed_type = failed_node.map(|n| n.node_type);
    let failed_name = failed_node.map(|n| n.name().to_string()).unwrap_or_else(|| failed.to_string());

    let summary = narrative::summary(
        &failed_name,
        failed_type.unwrap_or(crate::model::NodeType::Building),
        failure_type,
        affected.len(),
        graph.node_count(),
        total_impact,
    );

    // Priority actions from type-presence rules.
    let mut priority_actions = Vec::new();
    let has = |t: &str| {
        affected.iter().any(|a| a.node_type == t)
            || failed_type.map(|ft| ft.as_str() == t).unwrap_or(false)
    };
    if has("road") || has("bridge") {
        priority_actions.push("Divert traffic and establish alternate routes".to_string());
    }
    if has("hospital") || has("school") {
        priority_actions.push("Arrange backup services for hospitals and schools".to_string());
    }
    if has("power") {
        priority_actions.push("Activate the emergency power protocol".to_string());
    }
    if critical_count > 0 || severity == Severity::Critical {
        priority_actions.push("Activate the emergency response team".to_string());
    }

    let base_hours = failed_type
        .map(|t| narrative::base_recovery_hours(t, failure_type))
        .unwrap_or(12.0);
    let estimated_recovery_hours =
        base_hours * severity.recovery_multiplier() + total_impact * 2.0;

    let estimated_affected_population: u64 = affected
        .iter()
        .filter_map(|a| {
            graph
                .node(&NodeId(a.id.clone()))
                .map(|n| narrative::population_estimate(n.node_type))
        })
        .sum();

    OverallAssessment {
        risk_level,
        summary,
        priority_actions,
        estimated_recovery_hours,
        estimated_affected_population,
    }
}

// ============================================================================
// Visualization payload
// ============================================================================

fn build_visualization(
    graph: &InfrastructureGraph,
    failed: &NodeId,
    affected: &[AffectedNode],
    flow_links: Vec<VisLink>,
) -> VisualizationGraph {
    let by_id: HashMap<&str, &AffectedNode> =
        affected.iter().map(|a| (a.id.as_str(), a)).collect();

    let nodes = graph
        .iter_nodes()
        .map(|node| {
            let hit = by_id.get(node.id.as_str());
            visualization::vis_node(
                node.id.as_str(),
                node.name(),
                node.node_type,
                hit.map(|a| (a.severity, a.severity_score)),
                &node.id == failed,
            )
        })
        .collect();

    // Structural links: emit each undirected pair once.
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut links = Vec::new();
    for id in graph.node_ids() {
        for edge in graph.edges_from(id) {
            let key = if id.as_str() <= edge.target.as_str() {
                (id.to_string(), edge.target.to_string())
            } else {
                (edge.target.to_string(), id.to_string())
            };
            if seen.insert(key) {
                links.push(visualization::structural_link(
                    id.as_str(),
                    edge.target.as_str(),
                    edge.weight,
                ));
            }
        }
    }
    links.extend(flow_links);

    VisualizationGraph { nodes, links }
}
