//! Village-state snapshot — the external input consumed at ingestion.
//!
//! The simulator emits plain JSON with loosely-named fields (`tankId` vs
//! `id`, `coords` vs `geo`, arbitrary extra attributes per entity). Each
//! entry type therefore names only the fields the edge builders need and
//! flattens everything else into a property bag that flows through to the
//! node unchanged. Any subset of the arrays may be absent.

use serde::Deserialize;

use crate::model::{PropertyMap, Value};
use crate::{Error, Result};

/// One snapshot of the simulated village.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillageState {
    #[serde(default)]
    pub roads: Vec<RoadEntry>,
    #[serde(default)]
    pub buildings: Vec<BuildingEntry>,
    #[serde(default)]
    pub power_nodes: Vec<PowerEntry>,
    #[serde(default)]
    pub water_tanks: Vec<TankEntry>,
    #[serde(default)]
    pub tanks: Vec<TankEntry>,
    #[serde(default)]
    pub pumps: Vec<PumpEntry>,
    #[serde(default)]
    pub pipes: Vec<PipeEntry>,
    #[serde(default)]
    pub sensors: Vec<SensorEntry>,
    #[serde(default)]
    pub clusters: Vec<ClusterEntry>,
}

impl VillageState {
    /// Parse a raw JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Snapshot(e.to_string()))
    }

    /// All tank entries, whichever array the simulator used.
    pub fn all_tanks(&self) -> impl Iterator<Item = &TankEntry> {
        self.water_tanks.iter().chain(self.tanks.iter())
    }
}

/// Convert a flattened JSON remainder into node properties.
fn bag_to_props(rest: &serde_json::Map<String, serde_json::Value>) -> PropertyMap {
    rest.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect()
}

macro_rules! entry_properties {
    ($entry:ty) => {
        impl $entry {
            /// Node properties: the flattened bag plus the named fields.
            pub fn properties(&self) -> PropertyMap {
                let mut props = bag_to_props(&self.rest);
                if let Some(name) = &self.name {
                    props.insert("name".to_string(), Value::from(name.clone()));
                }
                props
            }
        }
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoadEntry {
    #[serde(default, alias = "roadId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingEntry {
    #[serde(default, alias = "buildingId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Free text; classified by keyword into hospital/school/market/building.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PowerEntry {
    #[serde(default, alias = "nodeId", alias = "powerId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TankEntry {
    #[serde(default, alias = "tankId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PumpEntry {
    #[serde(default, alias = "pumpId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// The tank this pump feeds, when the simulator links them explicitly.
    #[serde(default, rename = "tankId")]
    pub tank_id: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipeEntry {
    #[serde(default, alias = "pipeId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "fromNode", alias = "from")]
    pub from_node: Option<String>,
    #[serde(default, rename = "toNode", alias = "to")]
    pub to_node: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    #[serde(default, alias = "sensorId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterEntry {
    #[serde(default, alias = "clusterId")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

entry_properties!(RoadEntry);
entry_properties!(BuildingEntry);
entry_properties!(PowerEntry);
entry_properties!(TankEntry);
entry_properties!(PumpEntry);
entry_properties!(PipeEntry);
entry_properties!(SensorEntry);
entry_properties!(ClusterEntry);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_missing_arrays() {
        let state = VillageState::from_json("{}").unwrap();
        assert!(state.roads.is_empty());
        assert!(state.all_tanks().next().is_none());
    }

    #[test]
    fn tolerates_aliased_ids() {
        let state = VillageState::from_json(
            r#"{"tanks": [{"tankId": "t1", "capacity": 5000}],
                "pumps": [{"pumpId": "p1", "tankId": "t1"}]}"#,
        )
        .unwrap();
        assert_eq!(state.tanks[0].id.as_deref(), Some("t1"));
        assert_eq!(state.pumps[0].id.as_deref(), Some("p1"));
        assert_eq!(state.pumps[0].tank_id.as_deref(), Some("t1"));
        // Unnamed fields survive in the property bag.
        assert!(state.tanks[0].properties().contains_key("capacity"));
    }

    #[test]
    fn malformed_json_is_a_snapshot_error() {
        let err = VillageState::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }
}
