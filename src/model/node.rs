//! Node in the infrastructure graph.

use serde::{Deserialize, Serialize};

use super::{PropertyMap, Value};

/// Embedding width. Indices 0–11 carry the type one-hot, 12–16 the
/// type-specific status/condition features, 17 criticality, 18–19
/// population/economic scale, 20 connectivity (back-filled after the
/// adjacency build), 21 maintenance recency, 22 flood risk, 23 the
/// historical-failure / injected-failure-severity signal.
pub const EMBED_DIM: usize = 24;

/// Infrastructure node identifier (simulator-assigned, e.g. `"pump-3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The twelve infrastructure kinds. The discriminant order fixes the one-hot
/// slot (indices 0–11 of the embedding), so variants must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Road,
    Building,
    School,
    Hospital,
    Market,
    Power,
    Tank,
    Pump,
    Pipe,
    Sensor,
    Cluster,
    Bridge,
}

impl NodeType {
    pub const ALL: [NodeType; 12] = [
        NodeType::Road,
        NodeType::Building,
        NodeType::School,
        NodeType::Hospital,
        NodeType::Market,
        NodeType::Power,
        NodeType::Tank,
        NodeType::Pump,
        NodeType::Pipe,
        NodeType::Sensor,
        NodeType::Cluster,
        NodeType::Bridge,
    ];

    /// One-hot slot in the embedding.
    pub fn one_hot_index(self) -> usize {
        self as usize
    }

    /// Default criticality when a node carries no explicit
    /// `criticalityLevel` property.
    pub fn default_criticality(self) -> f64 {
        match self {
            NodeType::Hospital => 1.0,
            NodeType::Power => 0.9,
            NodeType::Pump => 0.85,
            NodeType::Bridge => 0.85,
            NodeType::Tank => 0.8,
            NodeType::School => 0.8,
            NodeType::Road => 0.7,
            NodeType::Market => 0.6,
            NodeType::Pipe => 0.6,
            NodeType::Cluster => 0.5,
            NodeType::Building => 0.5,
            NodeType::Sensor => 0.3,
        }
    }

    /// Classify a building from free-text `type`/`name` fields.
    ///
    /// The simulator emits buildings with human-written labels
    /// ("Govt. Primary School", "Ration Shop"), so classification is a
    /// keyword scan rather than an exact match.
    pub fn classify_building(text: &str) -> NodeType {
        let t = text.to_ascii_lowercase();
        const HOSPITAL: &[&str] = &["hospital", "clinic", "health", "medical"];
        const SCHOOL: &[&str] = &["school", "college", "education", "university"];
        const MARKET: &[&str] = &["market", "shop", "commercial", "store", "mall"];

        if HOSPITAL.iter().any(|k| t.contains(k)) {
            NodeType::Hospital
        } else if SCHOOL.iter().any(|k| t.contains(k)) {
            NodeType::School
        } else if MARKET.iter().any(|k| t.contains(k)) {
            NodeType::Market
        } else {
            NodeType::Building
        }
    }

    /// Wire name used in reports and visualization payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Road => "road",
            NodeType::Building => "building",
            NodeType::School => "school",
            NodeType::Hospital => "hospital",
            NodeType::Market => "market",
            NodeType::Power => "power",
            NodeType::Tank => "tank",
            NodeType::Pump => "pump",
            NodeType::Pipe => "pipe",
            NodeType::Sensor => "sensor",
            NodeType::Cluster => "cluster",
            NodeType::Bridge => "bridge",
        }
    }

}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the infrastructure graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub properties: PropertyMap,
    /// Fixed-schema feature vector, derived once from type + properties.
    pub embedding: [f64; EMBED_DIM],
}

impl Node {
    /// Effective criticality: explicit `criticalityLevel` property when
    /// present (clamped to [0,1]), otherwise the type default.
    pub fn criticality(&self) -> f64 {
        self.properties
            .get("criticalityLevel")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or_else(|| self.node_type.default_criticality())
    }

    /// Display name: `name` property when present, otherwise the id.
    pub fn name(&self) -> &str {
        self.properties
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(self.id.as_str())
    }
}
