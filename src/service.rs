//! # Service Facade
//!
//! Owns the current `(graph, model)` context, ingests village-state
//! snapshots, and exposes prediction plus introspection to the host
//! service. Re-ingestion builds a fresh context and swaps it in whole —
//! in-flight predictions keep their `Arc` to the previous snapshot, so the
//! graph is never mutated while reads are outstanding.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;

use crate::analysis::{self, ImpactReport};
use crate::gnn::ImpactPredictionGnn;
use crate::graph::{embedding, InfrastructureGraph};
use crate::model::{Edge, NodeId, NodeType, PropertyMap, Severity, Value};
use crate::snapshot::VillageState;
use crate::{Error, Result};

// Distance thresholds in raw coordinate units. Snapshots carry lat/lng
// degrees and `distance_between` is planar on them, so these are
// degree-scale (1e-3 ≈ 100 m at village latitudes). Calibrated against
// that exact formula — do not convert to geodesic meters.

/// Road-path points closer than this (~80 m) form an intersection edge.
const INTERSECTION_DISTANCE: f64 = 0.0008;
/// Power nodes supply structures and tanks within this radius (~450 m).
const SUPPLY_DISTANCE: f64 = 0.0045;
/// Structures link to their nearest road within this radius (~300 m).
const ACCESS_DISTANCE: f64 = 0.003;
/// Generic proximity pass radius (~800 m).
const PROXIMITY_DISTANCE: f64 = 0.008;

/// One immutable engine context per snapshot.
pub struct EngineContext {
    pub graph: InfrastructureGraph,
    pub model: ImpactPredictionGnn,
}

/// The facade the host service talks to.
#[derive(Default)]
pub struct ImpactService {
    current: RwLock<Option<Arc<EngineContext>>>,
}

impl ImpactService {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Build a fresh graph + model from a snapshot and swap it in.
    ///
    /// Any subset of the snapshot arrays may be absent; ingestion degrades
    /// to fewer nodes rather than failing.
    pub fn initialize_from_village_state(&self, state: &VillageState) {
        let graph = build_graph(state);
        let model = ImpactPredictionGnn::new();

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "village state ingested"
        );

        *self.current.write() = Some(Arc::new(EngineContext { graph, model }));
    }

    pub fn is_initialized(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn node_count(&self) -> usize {
        self.current.read().as_ref().map(|c| c.graph.node_count()).unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.current.read().as_ref().map(|c| c.graph.edge_count()).unwrap_or(0)
    }

    // ========================================================================
    // Prediction
    // ========================================================================

    /// Predict the impact of failing one node.
    pub fn predict_failure_impact(
        &self,
        node_id: &str,
        failure_type: &str,
        severity: Severity,
    ) -> Result<ImpactReport> {
        let ctx = self.current.read().clone().ok_or(Error::NotInitialized)?;

        let id = NodeId::from(node_id);
        if !ctx.graph.contains(&id) {
            let known = ctx
                .graph
                .node_ids()
                .iter()
                .take(5)
                .map(ToString::to_string)
                .collect();
            return Err(Error::UnknownNode { id: node_id.to_string(), known });
        }

        Ok(analysis::analyze_impact(&ctx.graph, &ctx.model, &id, failure_type, severity))
    }

    /// Predict with the default generic failure at medium severity.
    pub fn predict(&self, node_id: &str) -> Result<ImpactReport> {
        self.predict_failure_impact(node_id, "failure", Severity::Medium)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Flat node listing; empty before ingestion.
    pub fn get_graph_nodes(&self) -> Vec<GraphNodeView> {
        let Some(ctx) = self.current.read().clone() else {
            return Vec::new();
        };
        ctx.graph
            .iter_nodes()
            .map(|n| GraphNodeView {
                id: n.id.to_string(),
                node_type: n.node_type.as_str().to_string(),
                name: n.name().to_string(),
                properties: n.properties.clone(),
            })
            .collect()
    }

    /// Flat edge listing; empty before ingestion.
    pub fn get_graph_edges(&self) -> Vec<GraphEdgeView> {
        let Some(ctx) = self.current.read().clone() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for id in ctx.graph.node_ids() {
            for edge in ctx.graph.edges_from(id) {
                out.push(GraphEdgeView {
                    source: id.to_string(),
                    target: edge.target.to_string(),
                    weight: edge.weight,
                    edge_type: edge.edge_type.clone(),
                    relationship: edge.relationship.clone(),
                });
            }
        }
        out
    }

    /// Static catalog of failure scenarios the UI offers per node type.
    pub fn failure_scenarios() -> Vec<FailureScenario> {
        const ROADS: &[&str] = &["road", "bridge"];
        const STRUCTURES: &[&str] = &["building", "school", "hospital", "market"];
        const WATER: &[&str] = &["tank", "pump", "pipe"];
        const ALL: &[&str] = &[
            "road", "building", "school", "hospital", "market", "power", "tank", "pump",
            "pipe", "sensor", "cluster", "bridge",
        ];

        vec![
            FailureScenario::new("damage", "Road damage", "Surface damage restricting traffic", ROADS),
            FailureScenario::new("flood", "Flooding", "Road flooded and impassable", ROADS),
            FailureScenario::new("blockage", "Blockage", "Road blocked by debris or obstruction", ROADS),
            FailureScenario::new("accident", "Accident", "Traffic accident closing the road", ROADS),
            FailureScenario::new("fire", "Fire", "Structure fire requiring evacuation", STRUCTURES),
            FailureScenario::new("collapse", "Collapse", "Partial or full structural collapse", STRUCTURES),
            FailureScenario::new("evacuation", "Evacuation", "Precautionary evacuation of occupants", STRUCTURES),
            FailureScenario::new("outage", "Power outage", "Supply interruption from this node", &["power"]),
            FailureScenario::new("overload", "Overload", "Load exceeds capacity; trip imminent", &["power"]),
            FailureScenario::new("leak", "Water leak", "Loss of water along the network", WATER),
            FailureScenario::new("contamination", "Contamination", "Water quality compromised", WATER),
            FailureScenario::new("failure", "General failure", "Unspecified functional failure", ALL),
            FailureScenario::new("maintenance", "Maintenance outage", "Planned downtime for maintenance", ALL),
        ]
    }
}

// ============================================================================
// Introspection DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNodeView {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdgeView {
    pub source: String,
    pub target: String,
    pub weight: f64,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureScenario {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub applicable_to: &'static [&'static str],
}

impl FailureScenario {
    fn new(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        applicable_to: &'static [&'static str],
    ) -> Self {
        Self { id, name, description, applicable_to }
    }
}

// ============================================================================
// Graph construction from a snapshot
// ============================================================================

fn build_graph(state: &VillageState) -> InfrastructureGraph {
    let mut graph = InfrastructureGraph::new();

    // --- Nodes, per category --------------------------------------------

    let mut road_ids: Vec<NodeId> = Vec::new();
    let mut road_paths: Vec<Vec<(f64, f64)>> = Vec::new();
    for (i, road) in state.roads.iter().enumerate() {
        let id = road.id.clone().unwrap_or_else(|| format!("road-{}", i + 1));
        let is_bridge = road
            .kind
            .as_deref()
            .map(|k| k.to_ascii_lowercase().contains("bridge"))
            .unwrap_or(false);
        let node_type = if is_bridge { NodeType::Bridge } else { NodeType::Road };
        let props = road.properties();
        road_paths.push(path_points(&props));
        graph.add_node(id.clone(), node_type, props);
        road_ids.push(NodeId::from(id));
    }

    let mut structure_ids: Vec<NodeId> = Vec::new();
    for (i, building) in state.buildings.iter().enumerate() {
        let id = building.id.clone().unwrap_or_else(|| format!("building-{}", i + 1));
        let text = building
            .kind
            .as_deref()
            .or(building.name.as_deref())
            .unwrap_or("");
        let node_type = NodeType::classify_building(text);
        graph.add_node(id.clone(), node_type, building.properties());
        structure_ids.push(NodeId::from(id));
    }

    let mut power_ids: Vec<NodeId> = Vec::new();
    for (i, power) in state.power_nodes.iter().enumerate() {
        let id = power.id.clone().unwrap_or_else(|| format!("power-{}", i + 1));
        graph.add_node(id.clone(), NodeType::Power, power.properties());
        power_ids.push(NodeId::from(id));
    }

    let mut tank_ids: Vec<NodeId> = Vec::new();
    for (i, tank) in state.all_tanks().enumerate() {
        let id = tank.id.clone().unwrap_or_else(|| format!("tank-{}", i + 1));
        graph.add_node(id.clone(), NodeType::Tank, tank.properties());
        tank_ids.push(NodeId::from(id));
    }

    for (i, pump) in state.pumps.iter().enumerate() {
        let id = pump.id.clone().unwrap_or_else(|| format!("pump-{}", i + 1));
        graph.add_node(id, NodeType::Pump, pump.properties());
    }

    for (i, pipe) in state.pipes.iter().enumerate() {
        let id = pipe.id.clone().unwrap_or_else(|| format!("pipe-{}", i + 1));
        graph.add_node(id, NodeType::Pipe, pipe.properties());
    }

    for (i, sensor) in state.sensors.iter().enumerate() {
        let id = sensor.id.clone().unwrap_or_else(|| format!("sensor-{}", i + 1));
        graph.add_node(id, NodeType::Sensor, sensor.properties());
    }

    for (i, cluster) in state.clusters.iter().enumerate() {
        let id = cluster.id.clone().unwrap_or_else(|| format!("cluster-{}", i + 1));
        graph.add_node(id, NodeType::Cluster, cluster.properties());
    }

    // --- Edges, in dependency order -------------------------------------

    // 1. Road intersections: any two roads with path points closer than
    //    the intersection threshold.
    for i in 0..road_ids.len() {
        for j in (i + 1)..road_ids.len() {
            if paths_intersect(&road_paths[i], &road_paths[j]) {
                graph.add_edge(
                    road_ids[i].clone(),
                    Edge::new(road_ids[j].clone(), 0.9).with_kind("intersection", "road-network"),
                );
            }
        }
    }

    // 2. Power supply: one-way edges to structures and tanks in range.
    for power in &power_ids {
        for target in structure_ids.iter().chain(tank_ids.iter()) {
            let d = graph.distance_between(power, target);
            if d < SUPPLY_DISTANCE {
                let weight = (1.0 - d / SUPPLY_DISTANCE).max(0.2);
                graph.add_edge(
                    power.clone(),
                    Edge::new(target.clone(), weight)
                        .with_kind("supply", "power-supply")
                        .directional(),
                );
            }
        }
    }

    // 3. Structure → nearest road, weight decaying linearly with distance.
    for structure in &structure_ids {
        let nearest = road_ids
            .iter()
            .map(|r| (r, graph.distance_between(structure, r)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((road, d)) = nearest {
            if d < ACCESS_DISTANCE {
                let weight = (1.0 - d / ACCESS_DISTANCE).max(0.1);
                graph.add_edge(
                    structure.clone(),
                    Edge::new(road.clone(), weight).with_kind("access", "road-access"),
                );
            }
        }
    }

    // 4. Mechanical links from explicit references.
    for (i, pump) in state.pumps.iter().enumerate() {
        let pump_id = NodeId::from(
            pump.id.clone().unwrap_or_else(|| format!("pump-{}", i + 1)),
        );
        if let Some(tank) = &pump.tank_id {
            let tank_id = NodeId::from(tank.as_str());
            if graph.contains(&tank_id) {
                graph.add_edge(
                    pump_id,
                    Edge::new(tank_id, 0.9).with_kind("mechanical", "mechanical"),
                );
            }
        }
    }
    for (i, pipe) in state.pipes.iter().enumerate() {
        let pipe_id = NodeId::from(
            pipe.id.clone().unwrap_or_else(|| format!("pipe-{}", i + 1)),
        );
        if let Some(from) = &pipe.from_node {
            let from_id = NodeId::from(from.as_str());
            if graph.contains(&from_id) {
                graph.add_edge(
                    from_id,
                    Edge::new(pipe_id.clone(), 0.85)
                        .with_kind("flow", "water-flow")
                        .directional(),
                );
            }
        }
        if let Some(to) = &pipe.to_node {
            let to_id = NodeId::from(to.as_str());
            if graph.contains(&to_id) {
                graph.add_edge(
                    pipe_id,
                    Edge::new(to_id, 0.85).with_kind("flow", "water-flow").directional(),
                );
            }
        }
    }

    // 5 & 6. Generic proximity pass, then the cached adjacency matrix.
    graph.build_proximity_edges(PROXIMITY_DISTANCE);
    graph.build_adjacency_matrix();

    graph
}

/// Parse a road's `path` property into coordinate points.
fn path_points(props: &PropertyMap) -> Vec<(f64, f64)> {
    match props.get("path") {
        Some(Value::List(points)) => points.iter().filter_map(embedding::point_of).collect(),
        _ => Vec::new(),
    }
}

/// Two roads intersect when any pair of their path points is closer than
/// the intersection threshold.
fn paths_intersect(a: &[(f64, f64)], b: &[(f64, f64)]) -> bool {
    a.iter().any(|pa| {
        b.iter().any(|pb| {
            let dx = pa.0 - pb.0;
            let dy = pa.1 - pb.1;
            (dx * dx + dy * dy).sqrt() < INTERSECTION_DISTANCE
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_before_ingestion_is_not_initialized() {
        let service = ImpactService::new();
        assert!(matches!(service.predict("anything"), Err(Error::NotInitialized)));
    }

    #[test]
    fn unknown_node_lists_sample_ids() {
        let service = ImpactService::new();
        let state = VillageState::from_json(
            r#"{"powerNodes": [{"id": "power-1"}], "pumps": [{"id": "pump-1"}]}"#,
        )
        .unwrap();
        service.initialize_from_village_state(&state);

        match service.predict("ghost") {
            Err(Error::UnknownNode { id, known }) => {
                assert_eq!(id, "ghost");
                assert!(known.contains(&"power-1".to_string()));
            }
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn failure_scenario_catalog_covers_every_type() {
        let scenarios = ImpactService::failure_scenarios();
        let generic = scenarios.iter().find(|s| s.id == "failure").unwrap();
        for t in NodeType::ALL {
            assert!(generic.applicable_to.contains(&t.as_str()), "{t}");
        }
    }

    #[test]
    fn ingestion_tolerates_an_empty_snapshot() {
        let service = ImpactService::new();
        service.initialize_from_village_state(&VillageState::default());
        assert!(service.is_initialized());
        assert_eq!(service.node_count(), 0);
        assert!(service.get_graph_nodes().is_empty());
    }
}
