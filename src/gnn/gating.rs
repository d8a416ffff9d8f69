//! Relationship gating and type-impact tables.
//!
//! A relationship gate is a scalar in [0, 1] expressing how strongly a
//! failure of one infrastructure type propagates to another, modulated by
//! the concrete failure type. These tables replace the original ad hoc
//! conditionals with explicit type-pair lookups.

use crate::model::NodeType;

/// Base dependency gate for an ordered `(source, target)` type pair.
///
/// Defaults: 0.8 for same-type pairs, 0.3 otherwise.
pub fn dependency_gate(source: NodeType, target: NodeType) -> f64 {
    use NodeType::*;
    match (source, target) {
        // Power feeds almost everything electrically.
        (Power, Pump) => 0.9,
        (Power, Hospital) => 0.95,
        (Power, Building) => 0.85,
        (Power, School) => 0.8,
        (Power, Market) => 0.8,
        (Power, Sensor) => 0.85,
        (Power, Cluster) => 0.85,
        (Power, Tank) => 0.4,
        (Power, Pipe) => 0.2,

        // Roads carry access to structures.
        (Road, Hospital) => 0.9,
        (Road, School) => 0.85,
        (Road, Market) => 0.8,
        (Road, Building) => 0.7,
        (Road, Cluster) => 0.6,
        (Road, Bridge) | (Bridge, Road) => 0.9,
        (Road, Power) => 0.4,
        (Road, Tank) => 0.3,
        (Bridge, Hospital) => 0.8,
        (Bridge, School) => 0.75,

        // Water network mechanics.
        (Tank, Pipe) => 0.8,
        (Tank, Cluster) => 0.85,
        (Tank, Pump) => 0.6,
        (Tank, Building) => 0.7,
        (Tank, Hospital) => 0.8,
        // Tanks are gravity-fed consumers of power, never suppliers.
        (Tank, Power) => 0.0,
        (Pump, Tank) => 0.9,
        (Pump, Pipe) => 0.85,
        (Pump, Cluster) => 0.8,
        (Pipe, Cluster) => 0.85,
        (Pipe, Building) => 0.6,
        (Pipe, Tank) => 0.5,
        (Pipe, Hospital) => 0.7,

        // Sensors observe; their failure barely propagates.
        (Sensor, _) => 0.15,

        (a, b) if a == b => 0.8,
        _ => 0.3,
    }
}

/// Failure-type-specific multiplicative override applied to the gate of
/// the node *receiving* propagation. The caller clamps the product to [0,1].
pub fn failure_modifier(failure_type: &str, target: NodeType) -> f64 {
    use NodeType::*;
    match failure_type {
        // Water leaks and contamination never reach the power network.
        "leak" | "contamination" => match target {
            Power => 0.0,
            Cluster => 1.3,
            Hospital if failure_type == "contamination" => 1.2,
            _ => 1.0,
        },
        // Power outages cannot touch gravity-fed water assets, but anything
        // with a motor or a radio amplifies.
        "outage" | "overload" => match target {
            Tank | Pipe => 0.0,
            Pump | Sensor => 1.3,
            _ => 1.0,
        },
        // Road failures hit access-dependent structures hardest and barely
        // matter to fixed utility assets.
        "damage" | "flood" | "blockage" | "accident" => match target {
            Hospital | School => 1.2,
            Power | Tank => 0.5,
            _ => 1.0,
        },
        _ => 1.0,
    }
}

/// Combined gate for one ordered pair under a concrete failure type.
pub fn relationship_gate(source: NodeType, target: NodeType, failure_type: &str) -> f64 {
    (dependency_gate(source, target) * failure_modifier(failure_type, target)).clamp(0.0, 1.0)
}

/// Post-inference impact multiplier for the pair (failed type → receiving
/// type), applied to the raw output channels before the sigmoid squash.
/// Critical receivers score hotter than the raw model output suggests.
pub fn type_impact_multiplier(source: NodeType, target: NodeType) -> f64 {
    use NodeType::*;
    match (source, target) {
        (Road, Hospital) => 1.4,
        (Power, Hospital) => 1.3,
        (Power, Pump) => 1.3,
        (Road, School) => 1.2,
        (Tank, Cluster) => 1.2,
        (Pump, Cluster) => 1.15,
        (Power, Sensor) => 1.1,
        (_, Hospital) => 1.2,
        (_, Sensor) => 0.8,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType::*;

    #[test]
    fn defaults_apply_to_unlisted_pairs() {
        assert_eq!(dependency_gate(Cluster, Cluster), 0.8);
        assert_eq!(dependency_gate(Cluster, Bridge), 0.3);
    }

    #[test]
    fn leaks_never_reach_power() {
        assert_eq!(relationship_gate(Pipe, Power, "leak"), 0.0);
        assert_eq!(relationship_gate(Tank, Power, "contamination"), 0.0);
    }

    #[test]
    fn outage_amplifies_pumps_but_spares_gravity_fed_water() {
        assert_eq!(relationship_gate(Power, Tank, "outage"), 0.0);
        assert_eq!(relationship_gate(Power, Pipe, "outage"), 0.0);
        // 0.9 * 1.3, clamped to 1.0.
        assert_eq!(relationship_gate(Power, Pump, "outage"), 1.0);
    }

    #[test]
    fn road_failures_tilt_toward_access_dependent_structures() {
        let hospital = relationship_gate(Road, Hospital, "blockage");
        let tank = relationship_gate(Road, Tank, "blockage");
        assert!(hospital > tank);
        assert_eq!(tank, 0.3 * 0.5);
    }

    #[test]
    fn gates_stay_in_unit_interval() {
        for s in NodeType::ALL {
            for t in NodeType::ALL {
                for ft in ["failure", "outage", "leak", "flood", "fire"] {
                    let g = relationship_gate(s, t, ft);
                    assert!((0.0..=1.0).contains(&g), "{s}->{t} {ft} = {g}");
                }
            }
        }
    }
}
