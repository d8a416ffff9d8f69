//! Edge (dependency/connectivity link) in the infrastructure graph.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// A directed edge record, stored in the adjacency list of its source node.
///
/// Undirected connections (proximity, road intersections) are stored as two
/// mirrored records; one-way links (pipe flow) as a single record with
/// `directional` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    /// Connection strength in [0, 1].
    pub weight: f64,
    /// Structural kind: "connection", "intersection", "supply", "access",
    /// "mechanical", "flow", "proximity".
    pub edge_type: String,
    /// Semantic relationship: "road-access", "power-supply",
    /// "road-network", "water-flow", "proximity", ...
    pub relationship: String,
    pub directional: bool,
}

impl Edge {
    pub fn new(target: impl Into<NodeId>, weight: f64) -> Self {
        Self {
            target: target.into(),
            weight: weight.clamp(0.0, 1.0),
            edge_type: "connection".to_string(),
            relationship: "connected".to_string(),
            directional: false,
        }
    }

    pub fn with_kind(mut self, edge_type: impl Into<String>, relationship: impl Into<String>) -> Self {
        self.edge_type = edge_type.into();
        self.relationship = relationship.into();
        self
    }

    pub fn directional(mut self) -> Self {
        self.directional = true;
        self
    }
}
