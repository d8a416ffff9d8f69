//! End-to-end tests through the service facade: JSON snapshot ingestion,
//! prediction, introspection, and context swapping.

use infra_impact::{Error, ImpactService, Severity, VillageState};
use pretty_assertions::assert_eq;

/// A small village: two crossing roads, a clinic and a school, one power
/// node, and a pump→tank→cluster water chain. Coordinates are raw lat/lng.
const VILLAGE: &str = r#"{
  "roads": [
    {"id": "road-main", "name": "Main Road", "condition": "good", "isMainRoad": true,
     "path": [[77.5900, 12.9700], [77.5910, 12.9700], [77.5920, 12.9700]]},
    {"id": "road-cross", "condition": "fair",
     "path": [[77.5910, 12.9695], [77.5910, 12.9705]]}
  ],
  "buildings": [
    {"id": "clinic-1", "name": "Primary Health Clinic", "type": "clinic",
     "coords": {"lat": 12.9701, "lng": 77.5912}, "occupancy": 120},
    {"id": "school-1", "name": "Govt. School", "type": "school",
     "coords": {"lat": 12.9698, "lng": 77.5905}, "occupancy": 400}
  ],
  "powerNodes": [
    {"id": "power-1", "coords": {"lat": 12.9703, "lng": 77.5908},
     "capacity": 500, "load": 300, "status": "operational"}
  ],
  "waterTanks": [
    {"tankId": "tank-1", "coords": {"lat": 12.9699, "lng": 77.5915},
     "capacity": 10000, "level": 6000, "status": "operational"}
  ],
  "pumps": [
    {"pumpId": "pump-1", "tankId": "tank-1",
     "coords": {"lat": 12.9700, "lng": 77.5916}, "flowRate": 60, "status": "running"}
  ],
  "pipes": [
    {"pipeId": "pipe-1", "fromNode": "tank-1", "toNode": "cluster-1", "flow": 40}
  ],
  "sensors": [
    {"sensorId": "sensor-1", "coords": {"lat": 12.9702, "lng": 77.5914},
     "active": true, "value": 42, "maxValue": 100}
  ],
  "clusters": [
    {"clusterId": "cluster-1", "coords": {"lat": 12.9696, "lng": 77.5918},
     "demand": 800, "supplyStatus": "good"}
  ]
}"#;

fn village_service() -> ImpactService {
    let state = VillageState::from_json(VILLAGE).unwrap();
    let service = ImpactService::new();
    service.initialize_from_village_state(&state);
    service
}

// ============================================================================
// 1. Ingestion and introspection
// ============================================================================

#[test]
fn ingestion_builds_all_categories() {
    let service = village_service();
    // 2 roads + 2 buildings + power + tank + pump + pipe + sensor + cluster.
    assert_eq!(service.node_count(), 10);

    let nodes = service.get_graph_nodes();
    let type_of = |id: &str| {
        nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.node_type.clone())
            .unwrap_or_else(|| panic!("missing node {id}"))
    };
    // Free-text classification: "clinic" → hospital, "school" → school.
    assert_eq!(type_of("clinic-1"), "hospital");
    assert_eq!(type_of("school-1"), "school");
    assert_eq!(type_of("tank-1"), "tank");
    assert_eq!(type_of("road-main"), "road");
}

#[test]
fn ingestion_wires_explicit_and_spatial_edges() {
    let service = village_service();
    let edges = service.get_graph_edges();
    assert!(!edges.is_empty());

    // Crossing roads intersect at path-point proximity.
    assert!(edges.iter().any(|e| {
        e.relationship == "road-network"
            && ((e.source == "road-main" && e.target == "road-cross")
                || (e.source == "road-cross" && e.target == "road-main"))
    }));
    // Pump links to its tank via the explicit tankId reference.
    assert!(edges
        .iter()
        .any(|e| e.source == "pump-1" && e.target == "tank-1" && e.relationship == "mechanical"));
    // Pipe flow is directional: tank-1 → pipe-1 → cluster-1.
    assert!(edges
        .iter()
        .any(|e| e.source == "pipe-1" && e.target == "cluster-1" && e.relationship == "water-flow"));
    // Power supplies the clinic within range.
    assert!(edges
        .iter()
        .any(|e| e.source == "power-1" && e.target == "clinic-1" && e.relationship == "power-supply"));
}

#[test]
fn introspection_is_empty_before_ingestion() {
    let service = ImpactService::new();
    assert!(!service.is_initialized());
    assert!(service.get_graph_nodes().is_empty());
    assert!(service.get_graph_edges().is_empty());
}

// ============================================================================
// 2. Prediction through the facade
// ============================================================================

#[test]
fn power_outage_produces_a_complete_report() {
    let service = village_service();
    let report = service
        .predict_failure_impact("power-1", "outage", Severity::Critical)
        .unwrap();

    assert_eq!(report.source_failure.node_id, "power-1");
    assert_eq!(report.source_failure.node_type, "power");
    assert_eq!(report.total_nodes, 10);
    assert!(report.total_affected > 0);
    assert_eq!(report.total_affected, report.affected_nodes.len());

    for hit in &report.affected_nodes {
        assert!((0.0..=98.0).contains(&hit.probability));
        assert!(!hit.effects.is_empty());
        assert!(!hit.recommendations.is_empty());
    }
    for step in &report.propagation_path {
        assert!(step.depth <= 5);
    }

    // The epicenter is flagged and pulsing in the render payload.
    let epicenter = report
        .visualization
        .nodes
        .iter()
        .find(|n| n.is_epicenter)
        .unwrap();
    assert_eq!(epicenter.id, "power-1");
    assert!(epicenter.pulse);
}

#[test]
fn facade_prediction_is_deterministic() {
    let service = village_service();
    let a = service.predict_failure_impact("power-1", "outage", Severity::High).unwrap();
    let b = service.predict_failure_impact("power-1", "outage", Severity::High).unwrap();
    assert_eq!(a, b);
}

#[test]
fn report_serializes_to_camel_case_json() {
    let service = village_service();
    let report = service.predict("power-1").unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(json.get("sourceFailure").is_some());
    assert!(json.get("affectedNodes").is_some());
    assert!(json.get("propagationPath").is_some());
    assert!(json.get("overallAssessment").is_some());
    assert!(json.get("visualization").is_some());
}

// ============================================================================
// 3. Error conditions
// ============================================================================

#[test]
fn predict_before_ingestion_fails() {
    let service = ImpactService::new();
    assert!(matches!(
        service.predict_failure_impact("power-1", "outage", Severity::High),
        Err(Error::NotInitialized)
    ));
}

#[test]
fn unknown_node_error_names_known_ids() {
    let service = village_service();
    match service.predict("nope") {
        Err(Error::UnknownNode { id, known }) => {
            assert_eq!(id, "nope");
            assert!(!known.is_empty());
            assert!(known.len() <= 5);
        }
        other => panic!("expected UnknownNode, got {other:?}"),
    }
}

// ============================================================================
// 4. Snapshot swapping
// ============================================================================

#[test]
fn reingestion_replaces_the_previous_snapshot() {
    let service = village_service();
    assert_eq!(service.node_count(), 10);

    let smaller = VillageState::from_json(
        r#"{"powerNodes": [{"id": "power-x", "coords": {"lat": 12.97, "lng": 77.59}}]}"#,
    )
    .unwrap();
    service.initialize_from_village_state(&smaller);

    assert_eq!(service.node_count(), 1);
    // Old ids are gone with the old context.
    assert!(matches!(service.predict("power-1"), Err(Error::UnknownNode { .. })));
    assert!(service.predict("power-x").is_ok());
}

#[test]
fn partial_snapshots_degrade_gracefully() {
    let service = ImpactService::new();
    let state = VillageState::from_json(r#"{"sensors": [{"id": "s1"}]}"#).unwrap();
    service.initialize_from_village_state(&state);
    assert_eq!(service.node_count(), 1);
    // A sensor with no coordinates is excluded from the spatial index but
    // still addressable.
    assert!(service.predict("s1").is_ok());
}
