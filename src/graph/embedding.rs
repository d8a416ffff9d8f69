//! Embedding construction — the fixed 24-dimension feature schema.
//!
//! Every node gets the same layout:
//!
//! | index | meaning                                   |
//! |-------|-------------------------------------------|
//! | 0–11  | type one-hot                              |
//! | 12–16 | type-specific status/condition features   |
//! | 17    | criticality                               |
//! | 18–19 | population / economic scale               |
//! | 20    | connectivity (back-filled after adjacency)|
//! | 21    | maintenance recency (365-day linear decay)|
//! | 22    | flood risk                                |
//! | 23    | historical failure / injected severity    |
//!
//! Missing optional properties default to neutral mid-range values instead
//! of failing — the simulator's snapshots are frequently partial.

use chrono::{NaiveDate, Utc};

use crate::model::{NodeType, PropertyMap, Value, EMBED_DIM};

/// Build the feature vector for a node from its type and raw properties.
pub fn build_embedding(node_type: NodeType, props: &PropertyMap) -> [f64; EMBED_DIM] {
    let mut e = [0.0; EMBED_DIM];
    e[node_type.one_hot_index()] = 1.0;

    match node_type {
        NodeType::Road | NodeType::Bridge => {
            e[12] = condition_score(props);
            e[13] = (num(props, &["width", "widthMeters"]).unwrap_or(5.0) / 10.0).clamp(0.0, 1.0);
            e[14] = 1.0 - (num(props, &["potholes", "potholeCount"]).unwrap_or(0.0) / 20.0).clamp(0.0, 1.0);
            e[15] = flag(props, &["isMainRoad", "mainRoad", "main"]).unwrap_or(false) as u8 as f64;
            e[16] = traffic_score(props);
        }
        NodeType::Building | NodeType::School | NodeType::Hospital | NodeType::Market => {
            e[12] = (num(props, &["occupancy", "population"]).unwrap_or(50.0) / 1000.0).clamp(0.0, 1.0);
            e[13] = (num(props, &["floors", "floorCount"]).unwrap_or(1.0) / 10.0).clamp(0.0, 1.0);
            e[14] = matches!(node_type, NodeType::Hospital | NodeType::School) as u8 as f64;
            e[15] = match node_type {
                NodeType::Hospital => 1.0,
                NodeType::School => 0.9,
                NodeType::Market => 0.7,
                _ => 0.5,
            };
        }
        NodeType::Power => {
            let capacity = num(props, &["capacity", "capacityKw"]).unwrap_or(100.0).max(1.0);
            let load = num(props, &["load", "currentLoad"]).unwrap_or(capacity * 0.5);
            e[12] = (load / capacity).clamp(0.0, 1.0);
            e[13] = status_score(props);
            e[14] = (num(props, &["voltage"]).unwrap_or(230.0) / 240.0).clamp(0.0, 1.0);
        }
        NodeType::Tank => {
            let capacity = num(props, &["capacity", "capacityLiters"]).unwrap_or(1000.0).max(1.0);
            let level = num(props, &["level", "currentLevel", "waterLevel"]).unwrap_or(capacity * 0.5);
            e[12] = (level / capacity).clamp(0.0, 1.0);
            e[13] = status_score(props);
        }
        NodeType::Pump => {
            e[12] = (num(props, &["flowRate", "flow"]).unwrap_or(50.0) / 100.0).clamp(0.0, 1.0);
            e[13] = status_score(props);
        }
        NodeType::Pipe => {
            e[12] = (num(props, &["flow", "flowRate"]).unwrap_or(50.0) / 100.0).clamp(0.0, 1.0);
            e[13] = status_score(props);
        }
        NodeType::Sensor => {
            e[12] = flag(props, &["active", "isActive"])
                .unwrap_or_else(|| status_score(props) > 0.5) as u8 as f64;
            let max_value = num(props, &["maxValue", "max"]).unwrap_or(100.0).max(1.0);
            e[13] = num(props, &["value", "reading"])
                .map(|v| (v / max_value).clamp(0.0, 1.0))
                .unwrap_or(0.5);
        }
        NodeType::Cluster => {
            e[12] = (num(props, &["demand", "waterDemand"]).unwrap_or(500.0) / 1000.0).clamp(0.0, 1.0);
            e[13] = supply_score(props);
        }
    }

    e[17] = props
        .get("criticalityLevel")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or_else(|| node_type.default_criticality());

    e[18] = (num(props, &["population", "occupancy", "households"]).unwrap_or(100.0) / 1000.0)
        .clamp(0.0, 1.0);
    e[19] = num(props, &["economicActivity", "economicValue"])
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(0.5);

    // e[20] stays 0 here; the adjacency build fills it in.
    e[21] = maintenance_recency(props);
    e[22] = num(props, &["floodRisk"]).map(|v| v.clamp(0.0, 1.0)).unwrap_or(0.2);
    e[23] = (num(props, &["failureHistory", "recentFailures"]).unwrap_or(0.0) / 10.0).clamp(0.0, 1.0);

    e
}

/// Coordinates for the spatial index: explicit `coords`, a `geo` fallback,
/// or the midpoint of a road's `path`.
pub fn extract_coords(node_type: NodeType, props: &PropertyMap) -> Option<(f64, f64)> {
    if let Some(c) = props.get("coords").and_then(point_of) {
        return Some(c);
    }
    if let Some(c) = props.get("geo").and_then(point_of) {
        return Some(c);
    }
    if matches!(node_type, NodeType::Road | NodeType::Bridge) {
        if let Some(Value::List(points)) = props.get("path") {
            if !points.is_empty() {
                return point_of(&points[points.len() / 2]);
            }
        }
    }
    None
}

/// Accepts `{lat, lng}`, `{x, y}`, or `[x, y]` point shapes.
pub fn point_of(v: &Value) -> Option<(f64, f64)> {
    match v {
        Value::Map(m) => {
            let x = m.get("x").or_else(|| m.get("lng")).or_else(|| m.get("lon"))?;
            let y = m.get("y").or_else(|| m.get("lat"))?;
            Some((x.as_f64()?, y.as_f64()?))
        }
        Value::List(xs) if xs.len() >= 2 => Some((xs[0].as_f64()?, xs[1].as_f64()?)),
        _ => None,
    }
}

// ============================================================================
// Property scoring helpers
// ============================================================================

fn num(props: &PropertyMap, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| props.get(*k).and_then(Value::as_f64))
}

fn flag(props: &PropertyMap, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| props.get(*k).and_then(Value::as_flag))
}

/// Score an operational `status` string. Unknown statuses score neutral.
fn status_score(props: &PropertyMap) -> f64 {
    match props.get("status").and_then(Value::as_str) {
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "operational" | "active" | "ok" | "normal" | "good" | "running" => 1.0,
            "degraded" | "partial" | "warning" | "low" => 0.5,
            "failed" | "broken" | "offline" | "inactive" | "stopped" => 0.1,
            _ => 0.5,
        },
        None => props.get("status").and_then(Value::as_f64).map(|v| v.clamp(0.0, 1.0)).unwrap_or(0.5),
    }
}

/// Score a road `condition`, accepting either a label or a numeric 0–1.
fn condition_score(props: &PropertyMap) -> f64 {
    match props.get("condition") {
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "excellent" => 1.0,
            "good" => 0.8,
            "fair" => 0.6,
            "poor" => 0.3,
            "damaged" | "bad" => 0.1,
            _ => 0.5,
        },
        Some(v) => v.as_f64().map(|x| x.clamp(0.0, 1.0)).unwrap_or(0.5),
        None => 0.5,
    }
}

fn traffic_score(props: &PropertyMap) -> f64 {
    match props.get("trafficLevel") {
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "high" | "heavy" => 0.9,
            "medium" | "moderate" => 0.6,
            "low" | "light" => 0.3,
            _ => 0.5,
        },
        Some(v) => v.as_f64().map(|x| x.clamp(0.0, 1.0)).unwrap_or(0.5),
        None => 0.5,
    }
}

fn supply_score(props: &PropertyMap) -> f64 {
    match props.get("supplyStatus").and_then(Value::as_str) {
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "good" | "full" | "normal" => 1.0,
            "partial" | "reduced" => 0.5,
            "none" | "cut" => 0.0,
            _ => 0.5,
        },
        None => 0.5,
    }
}

/// Linear decay to 0 over 365 days since `lastMaintenance`.
fn maintenance_recency(props: &PropertyMap) -> f64 {
    let Some(raw) = props.get("lastMaintenance").and_then(Value::as_str) else {
        return 0.5;
    };
    let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
        return 0.5;
    };
    let days = (Utc::now().date_naive() - date).num_days().max(0) as f64;
    (1.0 - days / 365.0).clamp(0.0, 1.0)
}
