//! Impact-report DTOs.
//!
//! These types cross the boundary to the host service untouched, so every
//! field serializes in the camelCase shape the UI layer consumes.

use serde::Serialize;

use crate::gnn::NodeImpactMetrics;
use crate::model::Severity;

use super::visualization::VisualizationGraph;

/// Overall risk classification for one failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Echo of the failure event that produced the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFailure {
    pub node_id: String,
    pub node_type: String,
    pub name: String,
    pub failure_type: String,
    pub severity: Severity,
}

/// One node predicted to be affected by the failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    /// Decay-adjusted impact probability as a percentage, capped at 98.
    pub probability: f64,
    /// Severity bucket derived from the raw severity score.
    pub severity: Severity,
    /// Raw severity channel, kept for ranking and the overall assessment.
    pub severity_score: f64,
    /// Rounded minutes until the effect is expected to land.
    pub time_to_impact_minutes: f64,
    pub metrics: MetricPercentages,
    pub effects: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The six disruption metrics, expressed as 0–100 percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPercentages {
    pub access_disruption: f64,
    pub service_disruption: f64,
    pub economic_impact: f64,
    pub safety_risk: f64,
    pub cascade_risk: f64,
    pub recovery_difficulty: f64,
}

impl MetricPercentages {
    pub fn from_metrics(m: &NodeImpactMetrics) -> Self {
        let pct = |v: f64| (v * 100.0).round();
        Self {
            access_disruption: pct(m.access_disruption),
            service_disruption: pct(m.service_disruption),
            economic_impact: pct(m.economic_impact),
            safety_risk: pct(m.safety_risk),
            cascade_risk: pct(m.cascade_risk),
            recovery_difficulty: pct(m.recovery_difficulty),
        }
    }
}

/// One BFS-derived edge on a propagation path from the epicenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationStep {
    pub from: String,
    pub to: String,
    /// Hops from the epicenter, 1-based; never exceeds 5.
    pub depth: usize,
    /// Full node-id chain from the epicenter to `to`.
    pub path: Vec<String>,
    pub weight: f64,
    pub relationship: String,
}

/// Aggregate assessment across all affected nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAssessment {
    pub risk_level: RiskLevel,
    pub summary: String,
    pub priority_actions: Vec<String>,
    pub estimated_recovery_hours: f64,
    pub estimated_affected_population: u64,
}

/// The complete, renderable impact report for one failure event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub source_failure: SourceFailure,
    /// Ranked by severity score, descending.
    pub affected_nodes: Vec<AffectedNode>,
    pub propagation_path: Vec<PropagationStep>,
    pub overall_assessment: OverallAssessment,
    pub total_affected: usize,
    pub total_nodes: usize,
    pub visualization: VisualizationGraph,
}
