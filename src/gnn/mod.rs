//! # GNN inference pipeline
//!
//! A hand-built message-passing model: [`GnnLayer`] is one aggregate → gate
//! → linear → ReLU transformation; [`ImpactPredictionGnn`] stacks three of
//! them, injects the failure signal, and interprets the 12-channel head
//! output into named impact metrics. Weights are heuristically initialized
//! — there is no training loop and no calibration; relative orderings and
//! thresholds are the behavioral contract, not absolute scores.

pub mod gating;
pub mod layer;
pub mod model;

pub use gating::{dependency_gate, relationship_gate, type_impact_multiplier};
pub use layer::GnnLayer;
pub use model::{ImpactPredictionGnn, NodeImpactMetrics};
