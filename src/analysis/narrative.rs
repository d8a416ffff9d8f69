//! Effect, recommendation, and assessment text generation.
//!
//! Deterministic templates keyed by node type and metric thresholds — no
//! language model involved. The UI renders these strings verbatim.

use crate::gnn::NodeImpactMetrics;
use crate::model::NodeType;

/// Type-specific predicted effects for one affected node.
pub fn effects_for(node_type: NodeType, m: &NodeImpactMetrics) -> Vec<String> {
    let mut out = Vec::new();
    match node_type {
        NodeType::Road | NodeType::Bridge => {
            out.push("Traffic flow disrupted along this segment".to_string());
            if m.access_disruption > 0.5 {
                out.push("Access to adjacent properties restricted".to_string());
            }
            if m.alternative_available < 0.4 {
                out.push("No viable alternative route nearby".to_string());
            }
        }
        NodeType::Hospital => {
            out.push("Emergency service capacity reduced".to_string());
            if m.safety_risk > 0.5 {
                out.push("Patient transfers to neighboring facilities may be required".to_string());
            }
        }
        NodeType::School => {
            out.push("Classes likely suspended until service is restored".to_string());
            if m.access_disruption > 0.5 {
                out.push("Student transport routes affected".to_string());
            }
        }
        NodeType::Market => {
            out.push("Commercial activity interrupted".to_string());
            if m.economic_impact > 0.5 {
                out.push("Vendors face stock spoilage and lost trade".to_string());
            }
        }
        NodeType::Building => {
            out.push("Building services degraded".to_string());
            if m.safety_risk > 0.6 {
                out.push("Occupants may need temporary relocation".to_string());
            }
        }
        NodeType::Power => {
            out.push("Downstream electricity supply unstable".to_string());
            if m.cascade_risk > 0.5 {
                out.push("Cascading outages possible across the feeder".to_string());
            }
        }
        NodeType::Tank => {
            out.push("Stored water reserve at risk".to_string());
            if m.service_disruption > 0.5 {
                out.push("Gravity-fed distribution pressure will drop".to_string());
            }
        }
        NodeType::Pump => {
            out.push("Pumping capacity lost or reduced".to_string());
            if m.service_disruption > 0.5 {
                out.push("Tank refill cycles will stall".to_string());
            }
        }
        NodeType::Pipe => {
            out.push("Supply interruption along this segment".to_string());
            if m.cascade_risk > 0.5 {
                out.push("Downstream connections lose pressure".to_string());
            }
        }
        NodeType::Sensor => {
            out.push("Telemetry blind spot created".to_string());
        }
        NodeType::Cluster => {
            out.push("Household supply in this cluster affected".to_string());
            if m.service_disruption > 0.6 {
                out.push("Prolonged outage expected for connected households".to_string());
            }
        }
    }
    out
}

/// Type-specific recommended actions for one affected node.
pub fn recommendations_for(node_type: NodeType, m: &NodeImpactMetrics) -> Vec<String> {
    let mut out = Vec::new();
    match node_type {
        NodeType::Road | NodeType::Bridge => {
            out.push("Post diversion signage and notify transport operators".to_string());
            if m.urgency_score > 0.6 {
                out.push("Dispatch road crew for immediate inspection".to_string());
            }
        }
        NodeType::Hospital => {
            out.push("Verify backup generator and oxygen supply status".to_string());
            out.push("Alert district emergency coordination".to_string());
        }
        NodeType::School => {
            out.push("Notify parents and arrange early dismissal if needed".to_string());
        }
        NodeType::Market => {
            out.push("Coordinate with vendors on temporary relocation".to_string());
        }
        NodeType::Building => {
            out.push("Inspect structure before reoccupation".to_string());
        }
        NodeType::Power => {
            out.push("Switch affected feeders to an alternate source".to_string());
            if m.cascade_risk > 0.5 {
                out.push("Shed non-critical load to protect the network".to_string());
            }
        }
        NodeType::Tank => {
            out.push("Conserve stored water; restrict non-essential draw".to_string());
        }
        NodeType::Pump => {
            out.push("Start standby pump or arrange tanker supply".to_string());
        }
        NodeType::Pipe => {
            out.push("Isolate the segment and open bypass valves".to_string());
        }
        NodeType::Sensor => {
            out.push("Schedule manual readings until telemetry returns".to_string());
        }
        NodeType::Cluster => {
            out.push("Issue a supply-disruption notice to affected households".to_string());
            if m.urgency_score > 0.6 {
                out.push("Prioritize this cluster for tanker delivery".to_string());
            }
        }
    }
    out
}

/// One-paragraph natural-language summary of the whole event.
pub fn summary(
    failed_name: &str,
    failed_type: NodeType,
    failure_type: &str,
    affected: usize,
    total_nodes: usize,
    total_impact: f64,
) -> String {
    if affected == 0 {
        return format!(
            "A {failure_type} at {failed_name} ({failed_type}) is predicted to remain \
             contained, with no other infrastructure significantly affected."
        );
    }
    format!(
        "A {failure_type} at {failed_name} ({failed_type}) is predicted to affect \
         {affected} of {} other nodes, with a cumulative severity of {total_impact:.2}.",
        total_nodes.saturating_sub(1),
    )
}

/// Fixed per-type headcount used for the affected-population estimate.
pub fn population_estimate(node_type: NodeType) -> u64 {
    match node_type {
        NodeType::Cluster => 200,
        NodeType::Building => 50,
        NodeType::School => 300,
        NodeType::Hospital => 500,
        NodeType::Market => 150,
        NodeType::Road => 100,
        NodeType::Power => 200,
        _ => 0,
    }
}

/// Base recovery hours for a failure, before severity scaling.
pub fn base_recovery_hours(failed_type: NodeType, failure_type: &str) -> f64 {
    use NodeType::*;
    match (failed_type, failure_type) {
        (Road | Bridge, "damage") => 24.0,
        (Road | Bridge, "flood") => 48.0,
        (Road | Bridge, "blockage") => 6.0,
        (Road | Bridge, "accident") => 4.0,
        (Road | Bridge, _) => 12.0,
        (Power, "outage") => 8.0,
        (Power, "overload") => 6.0,
        (Power, _) => 10.0,
        (Tank | Pipe, "leak") => 12.0,
        (Tank | Pipe, "contamination") => 72.0,
        (Tank | Pipe, _) => 18.0,
        (Pump, _) => 16.0,
        (Building | School | Hospital | Market, "fire") => 48.0,
        (Building | School | Hospital | Market, "collapse") => 120.0,
        (Building | School | Hospital | Market, "evacuation") => 6.0,
        (Building | School | Hospital | Market, _) => 24.0,
        (Sensor, _) => 4.0,
        (Cluster, _) => 12.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(v: f64) -> NodeImpactMetrics {
        NodeImpactMetrics {
            impact_probability: v,
            severity_score: v,
            time_to_impact: v,
            access_disruption: v,
            service_disruption: v,
            economic_impact: v,
            safety_risk: v,
            population_affected: v,
            cascade_risk: v,
            recovery_difficulty: v,
            alternative_available: v,
            urgency_score: v,
        }
    }

    #[test]
    fn every_type_yields_at_least_one_effect_and_recommendation() {
        for t in NodeType::ALL {
            assert!(!effects_for(t, &flat(0.2)).is_empty(), "{t}");
            assert!(!recommendations_for(t, &flat(0.2)).is_empty(), "{t}");
        }
    }

    #[test]
    fn high_access_disruption_unlocks_extra_road_effects() {
        // Keep an alternative route available so only the access metric
        // decides the extra line.
        let mut calm = flat(0.2);
        calm.alternative_available = 0.9;
        let mut disrupted = flat(0.9);
        disrupted.alternative_available = 0.9;

        let low = effects_for(NodeType::Road, &calm);
        let high = effects_for(NodeType::Road, &disrupted);
        assert!(high.len() > low.len());
        assert!(high.iter().any(|e| e.contains("adjacent properties")));
        assert!(!low.iter().any(|e| e.contains("adjacent properties")));
    }

    #[test]
    fn contained_summary_for_zero_affected() {
        let s = summary("Tank 3", NodeType::Tank, "leak", 0, 10, 0.0);
        assert!(s.contains("contained"));
    }

    #[test]
    fn recovery_base_hours_distinguish_failure_types() {
        assert!(
            base_recovery_hours(NodeType::Road, "flood")
                > base_recovery_hours(NodeType::Road, "blockage")
        );
    }
}
