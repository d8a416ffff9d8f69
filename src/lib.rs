//! # infra-impact — Infrastructure Failure Impact Prediction
//!
//! A graph model of physical village infrastructure (roads, buildings, power
//! nodes, water tanks/pumps/pipes, sensors, consumer clusters) plus a
//! hand-built graph-neural-network inference pipeline that, given a single
//! failed node, predicts which other nodes are affected, how severely, and
//! how the effect propagates.
//!
//! ## Design Principles
//!
//! 1. **Pure core**: prediction is a synchronous function of
//!    `(graph snapshot, failure event)` — no I/O, no hidden state
//! 2. **Typed model**: node kinds are an enum with lookup tables, not
//!    string-keyed branching
//! 3. **Explicit context**: `ImpactService` owns one `(graph, model)` pair
//!    per snapshot; re-ingestion swaps the whole context, never mutates it
//! 4. **Heuristic, not trained**: layer weights are deterministic
//!    heuristics with seeded jitter — scores are illustrative, orderings
//!    and thresholds are the contract
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use infra_impact::{ImpactService, Severity, VillageState};
//!
//! # fn example(json: &str) -> infra_impact::Result<()> {
//! let state = VillageState::from_json(json)?;
//!
//! let service = ImpactService::new();
//! service.initialize_from_village_state(&state);
//!
//! let report = service.predict_failure_impact("power-1", "outage", Severity::Critical)?;
//! for hit in &report.affected_nodes {
//!     println!("{} {:?} {}%", hit.id, hit.severity, hit.probability);
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod gnn;
pub mod analysis;
pub mod snapshot;
pub mod service;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Edge, Node, NodeId, NodeType, PropertyMap, Severity, Value,
};

// ============================================================================
// Re-exports: Graph and inference
// ============================================================================

pub use graph::InfrastructureGraph;
pub use gnn::{GnnLayer, ImpactPredictionGnn, NodeImpactMetrics};

// ============================================================================
// Re-exports: Analysis output
// ============================================================================

pub use analysis::{
    AffectedNode, ImpactReport, OverallAssessment, PropagationStep,
    RiskLevel, VisualizationGraph,
};

// ============================================================================
// Re-exports: Facade
// ============================================================================

pub use service::{FailureScenario, GraphEdgeView, GraphNodeView, ImpactService};
pub use snapshot::VillageState;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `predict_failure_impact` was called before any successful ingestion.
    #[error("impact engine not initialized — call initialize_from_village_state first")]
    NotInitialized,

    /// The failed-node id is absent from the current graph.
    #[error("node '{id}' not found in infrastructure graph (known ids include: {})", known.join(", "))]
    UnknownNode { id: String, known: Vec<String> },

    /// The village-state snapshot could not be deserialized.
    #[error("malformed village state: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
