//! # InfrastructureGraph
//!
//! Owns the nodes, adjacency lists, spatial index, and the cached dense
//! adjacency matrix. Built fresh per village-state snapshot — never patched
//! incrementally. Once `build_adjacency_matrix` has run, the graph is
//! read-only for the lifetime of the snapshot, so concurrent predictions
//! against it are safe.

pub mod embedding;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::model::{Edge, Node, NodeId, NodeType, PropertyMap};

/// Per-node adjacency list. Most infrastructure nodes carry a handful of
/// edges, so spill to the heap only past 4.
pub type EdgeList = SmallVec<[Edge; 4]>;

/// Spatial-index entry for proximity queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    pub coords: (f64, f64),
    pub node_type: NodeType,
}

/// The infrastructure graph for one village-state snapshot.
#[derive(Debug, Default)]
pub struct InfrastructureGraph {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<NodeId, EdgeList>,
    /// Nodes with known coordinates only; coordinate-less nodes are still
    /// addressable through explicit edges.
    spatial: HashMap<NodeId, SpatialEntry>,
    /// Stable insertion ordering — fixes row/column assignment in the
    /// adjacency matrix and the iteration order of the analyzer.
    node_ids: Vec<NodeId>,
    node_index: HashMap<NodeId, usize>,
    adjacency: Vec<Vec<f64>>,
}

impl InfrastructureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Insert a node, deriving its embedding and spatial-index entry from
    /// the raw properties. Re-adding an existing id replaces the node but
    /// keeps its position in the stable ordering.
    pub fn add_node(&mut self, id: impl Into<NodeId>, node_type: NodeType, properties: PropertyMap) {
        let id = id.into();
        let embedding = embedding::build_embedding(node_type, &properties);

        if let Some(coords) = embedding::extract_coords(node_type, &properties) {
            self.spatial.insert(id.clone(), SpatialEntry { coords, node_type });
        }

        if !self.node_index.contains_key(&id) {
            self.node_index.insert(id.clone(), self.node_ids.len());
            self.node_ids.push(id.clone());
        }
        self.edges.entry(id.clone()).or_default();
        self.nodes.insert(id.clone(), Node { id, node_type, properties, embedding });
        self.adjacency.clear();
    }

    /// Add an edge from `source`. A repeated `(source, target)` pair is a
    /// no-op. Non-directional edges get a mirrored record on the target,
    /// deduplicated independently.
    ///
    /// Returns whether the forward record was inserted.
    pub fn add_edge(&mut self, source: impl Into<NodeId>, edge: Edge) -> bool {
        let source = source.into();
        let mirrored = (!edge.directional).then(|| Edge {
            target: source.clone(),
            weight: edge.weight,
            edge_type: edge.edge_type.clone(),
            relationship: edge.relationship.clone(),
            directional: false,
        });
        let target = edge.target.clone();

        let inserted = Self::insert_deduped(self.edges.entry(source).or_default(), edge);
        let mut changed = inserted;
        if let Some(back) = mirrored {
            // The forward record may be a duplicate while the mirror is new
            // (an existing directional edge being widened); either insert
            // stales the cached matrix.
            changed |= Self::insert_deduped(self.edges.entry(target).or_default(), back);
        }
        if changed {
            self.adjacency.clear();
        }
        inserted
    }

    fn insert_deduped(list: &mut EdgeList, edge: Edge) -> bool {
        if list.iter().any(|e| e.target == edge.target) {
            return false;
        }
        list.push(edge);
        true
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    /// Planar Euclidean distance between two nodes' indexed coordinates.
    ///
    /// Deliberately not geodesic: every distance threshold in the edge
    /// builders is calibrated against this exact formula and the raw
    /// coordinate units the snapshots carry.
    /// Returns `f64::INFINITY` when either node has no coordinates.
    pub fn distance_between(&self, a: &NodeId, b: &NodeId) -> f64 {
        match (self.spatial.get(a), self.spatial.get(b)) {
            (Some(pa), Some(pb)) => {
                let dx = pa.coords.0 - pb.coords.0;
                let dy = pa.coords.1 - pb.coords.1;
                (dx * dx + dy * dy).sqrt()
            }
            _ => f64::INFINITY,
        }
    }

    /// O(n²) pairwise scan over the spatial index; every pair within
    /// `max_distance` gets a symmetric proximity edge weighted
    /// `max(0.1, 1 - d/max) * 0.7`, with a relationship guessed from the
    /// two node types.
    pub fn build_proximity_edges(&mut self, max_distance: f64) {
        let entries: Vec<(NodeId, SpatialEntry)> =
            self.node_ids.iter().filter_map(|id| {
                self.spatial.get(id).map(|e| (id.clone(), *e))
            }).collect();

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let (ref a, ea) = entries[i];
                let (ref b, eb) = entries[j];
                let d = self.distance_between(a, b);
                if d > max_distance {
                    continue;
                }
                let weight = (1.0 - d / max_distance).max(0.1) * 0.7;
                let relationship = relationship_hint(ea.node_type, eb.node_type);
                self.add_edge(
                    a.clone(),
                    Edge::new(b.clone(), weight).with_kind("proximity", relationship),
                );
            }
        }
    }

    // ========================================================================
    // Adjacency matrix
    // ========================================================================

    /// Build the dense n×n matrix of max edge weight per ordered pair and
    /// back-fill embedding slot 20 with the normalized connectivity degree
    /// `min(connections / 15, 1)`.
    pub fn build_adjacency_matrix(&mut self) {
        let n = self.node_ids.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for (source, list) in &self.edges {
            let Some(&si) = self.node_index.get(source) else { continue };
            for edge in list {
                let Some(&ti) = self.node_index.get(&edge.target) else { continue };
                if edge.weight > matrix[si][ti] {
                    matrix[si][ti] = edge.weight;
                }
            }
        }

        for (i, id) in self.node_ids.iter().enumerate() {
            let connections = matrix[i].iter().filter(|w| **w > 0.0).count();
            if let Some(node) = self.nodes.get_mut(id) {
                node.embedding[20] = (connections as f64 / 15.0).min(1.0);
            }
        }

        self.adjacency = matrix;
    }

    /// The cached adjacency matrix; empty until `build_adjacency_matrix`.
    pub fn adjacency(&self) -> &[Vec<f64>] {
        &self.adjacency
    }

    /// Max edge weight from `i` to `j` by matrix index; 0 when unbuilt.
    pub fn adjacency_weight(&self, i: usize, j: usize) -> f64 {
        self.adjacency.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn edges_from(&self, id: &NodeId) -> &[Edge] {
        self.edges.get(id).map(|l| l.as_slice()).unwrap_or(&[])
    }

    /// Stable node ordering (insertion order).
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    /// Iterate nodes in stable order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_ids.iter().filter_map(|id| self.nodes.get(id))
    }
}

/// Guess the semantic relationship for a proximity edge from the type pair.
fn relationship_hint(a: NodeType, b: NodeType) -> &'static str {
    use NodeType::*;
    match (a, b) {
        (Road, Road) | (Road, Bridge) | (Bridge, Road) | (Bridge, Bridge) => "road-network",
        (Power, _) | (_, Power) => "power-supply",
        (Road, _) | (_, Road) => "road-access",
        _ => "proximity",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn coords(x: f64, y: f64) -> PropertyMap {
        [(
            "coords".to_string(),
            Value::List(vec![Value::from(x), Value::from(y)]),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn add_edge_dedupes_by_target() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Power, PropertyMap::new());
        g.add_node("b", NodeType::Pump, PropertyMap::new());

        assert!(g.add_edge("a", Edge::new("b", 0.9)));
        assert!(!g.add_edge("a", Edge::new("b", 0.5)));
        assert_eq!(g.edges_from(&"a".into()).len(), 1);
        // First weight wins.
        assert_eq!(g.edges_from(&"a".into())[0].weight, 0.9);
    }

    #[test]
    fn undirected_edges_are_mirrored() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Road, PropertyMap::new());
        g.add_node("b", NodeType::Building, PropertyMap::new());
        g.add_edge("a", Edge::new("b", 0.5));
        assert_eq!(g.edges_from(&"b".into()).len(), 1);
        assert_eq!(g.edges_from(&"b".into())[0].target, "a".into());
    }

    #[test]
    fn directional_edges_are_not_mirrored() {
        let mut g = InfrastructureGraph::new();
        g.add_node("pipe", NodeType::Pipe, PropertyMap::new());
        g.add_node("cluster", NodeType::Cluster, PropertyMap::new());
        g.add_edge("pipe", Edge::new("cluster", 0.8).directional());
        assert!(g.edges_from(&"cluster".into()).is_empty());
    }

    #[test]
    fn mirror_only_insert_invalidates_cached_adjacency() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Power, PropertyMap::new());
        g.add_node("b", NodeType::Pump, PropertyMap::new());
        g.add_edge("a", Edge::new("b", 0.9).directional());
        g.build_adjacency_matrix();
        assert_eq!(g.adjacency_weight(1, 0), 0.0);

        // The forward record is a duplicate; only the mirror b→a lands.
        assert!(!g.add_edge("a", Edge::new("b", 0.9)));
        assert!(g.adjacency().is_empty());

        g.build_adjacency_matrix();
        assert_eq!(g.adjacency_weight(1, 0), 0.9);
    }

    #[test]
    fn distance_is_infinite_without_coordinates() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Sensor, PropertyMap::new());
        g.add_node("b", NodeType::Sensor, coords(3.0, 4.0));
        assert_eq!(g.distance_between(&"a".into(), &"b".into()), f64::INFINITY);
    }

    #[test]
    fn distance_is_planar_euclidean() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Tank, coords(0.0, 0.0));
        g.add_node("b", NodeType::Pump, coords(3.0, 4.0));
        assert_eq!(g.distance_between(&"a".into(), &"b".into()), 5.0);
    }

    #[test]
    fn proximity_edges_respect_threshold_and_weight_floor() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Building, coords(0.0, 0.0));
        g.add_node("b", NodeType::Building, coords(100.0, 0.0));
        g.add_node("far", NodeType::Building, coords(5000.0, 0.0));
        g.build_proximity_edges(800.0);

        let from_a = g.edges_from(&"a".into());
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].target, "b".into());
        let expected = (1.0 - 100.0 / 800.0) * 0.7;
        assert!((from_a[0].weight - expected).abs() < 1e-9);
    }

    #[test]
    fn adjacency_matrix_fills_connectivity_slot() {
        let mut g = InfrastructureGraph::new();
        g.add_node("a", NodeType::Power, PropertyMap::new());
        g.add_node("b", NodeType::Pump, PropertyMap::new());
        g.add_node("c", NodeType::Tank, PropertyMap::new());
        g.add_edge("a", Edge::new("b", 0.9));
        g.add_edge("a", Edge::new("c", 0.4));
        g.build_adjacency_matrix();

        let a = g.node(&"a".into()).unwrap();
        assert!((a.embedding[20] - 2.0 / 15.0).abs() < 1e-9);
        assert_eq!(g.adjacency_weight(0, 1), 0.9);
        assert_eq!(g.adjacency_weight(1, 0), 0.9);
    }
}
