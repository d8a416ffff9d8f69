//! Visualization payload — render hints for the force-graph view.

use serde::Serialize;

use crate::model::{NodeType, Severity};

/// Renderable graph: every structural node and edge, plus animated
/// impact-flow links for the affected set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationGraph {
    pub nodes: Vec<VisNode>,
    pub links: Vec<VisLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub color: String,
    pub size: f64,
    pub is_epicenter: bool,
    /// Epicenter pulses; affected criticals may too.
    pub pulse: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisLink {
    pub source: String,
    pub target: String,
    /// "structural" or "impact-flow".
    pub kind: String,
    pub strength: f64,
    pub color: String,
    pub animated: bool,
    /// Particle count for animated links; 0 for structural ones.
    pub particles: u32,
    /// Particle speed, inversely related to physical distance.
    pub speed: f64,
}

pub const COLOR_RED: &str = "#e74c3c";
pub const COLOR_ORANGE: &str = "#e67e22";
pub const COLOR_YELLOW: &str = "#f1c40f";
pub const COLOR_GRAY: &str = "#95a5a6";
pub const COLOR_GREEN: &str = "#2ecc71";
pub const COLOR_EPICENTER: &str = "#c0392b";

/// Link color bucketed by impact strength.
pub fn strength_color(strength: f64) -> &'static str {
    if strength > 0.7 {
        COLOR_RED
    } else if strength > 0.5 {
        COLOR_ORANGE
    } else if strength > 0.3 {
        COLOR_YELLOW
    } else {
        COLOR_GRAY
    }
}

/// Node color from its severity bucket; unaffected nodes are gray.
pub fn severity_color(severity: Option<Severity>) -> &'static str {
    match severity {
        Some(Severity::Critical) => COLOR_RED,
        Some(Severity::High) => COLOR_ORANGE,
        Some(Severity::Medium) => COLOR_YELLOW,
        Some(Severity::Low) => COLOR_GREEN,
        None => COLOR_GRAY,
    }
}

/// Node render size: severity-scaled for affected nodes, fixed for the rest.
pub fn node_size(severity_score: Option<f64>, is_epicenter: bool) -> f64 {
    if is_epicenter {
        20.0
    } else {
        8.0 + severity_score.unwrap_or(0.0) * 12.0
    }
}

/// Particle speed falls off with distance from the epicenter.
pub fn particle_speed(distance: f64) -> f64 {
    (100.0 / (distance + 25.0)).clamp(0.2, 4.0)
}

/// Particle count grows with impact strength.
pub fn particle_count(strength: f64) -> u32 {
    (strength * 6.0).ceil() as u32
}

/// Build an animated impact-flow link from the epicenter to a target.
pub fn impact_link(
    epicenter: &str,
    target: &str,
    strength: f64,
    distance: f64,
) -> VisLink {
    VisLink {
        source: epicenter.to_string(),
        target: target.to_string(),
        kind: "impact-flow".to_string(),
        strength,
        color: strength_color(strength).to_string(),
        animated: true,
        particles: particle_count(strength),
        speed: particle_speed(distance),
    }
}

/// Build a static structural link.
pub fn structural_link(source: &str, target: &str, weight: f64) -> VisLink {
    VisLink {
        source: source.to_string(),
        target: target.to_string(),
        kind: "structural".to_string(),
        strength: weight,
        color: COLOR_GRAY.to_string(),
        animated: false,
        particles: 0,
        speed: 0.0,
    }
}

/// Build a node marker.
pub fn vis_node(
    id: &str,
    label: &str,
    node_type: NodeType,
    severity: Option<(Severity, f64)>,
    is_epicenter: bool,
) -> VisNode {
    let color = if is_epicenter {
        COLOR_EPICENTER.to_string()
    } else {
        severity_color(severity.map(|(s, _)| s)).to_string()
    };
    VisNode {
        id: id.to_string(),
        label: label.to_string(),
        node_type: node_type.as_str().to_string(),
        color,
        size: node_size(severity.map(|(_, score)| score), is_epicenter),
        is_epicenter,
        pulse: is_epicenter || matches!(severity, Some((Severity::Critical, _))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_buckets() {
        assert_eq!(strength_color(0.9), COLOR_RED);
        assert_eq!(strength_color(0.6), COLOR_ORANGE);
        assert_eq!(strength_color(0.4), COLOR_YELLOW);
        assert_eq!(strength_color(0.1), COLOR_GRAY);
    }

    #[test]
    fn speed_decreases_with_distance() {
        assert!(particle_speed(10.0) > particle_speed(500.0));
        assert!(particle_speed(1e9) >= 0.2);
    }

    #[test]
    fn epicenter_pulses() {
        let n = vis_node("x", "X", NodeType::Power, None, true);
        assert!(n.pulse);
        assert_eq!(n.size, 20.0);
    }
}
