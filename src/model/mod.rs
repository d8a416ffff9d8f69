//! # Infrastructure Graph Model
//!
//! Clean DTOs that define the infrastructure graph: typed nodes with
//! fixed-schema numeric embeddings, weighted directed edges, and the
//! property values carried on both.
//!
//! Design rule: this module is pure data — no I/O, no state, no inference.
//! Embedding *construction* lives in [`crate::graph`]; this module only
//! defines the schema.

pub mod node;
pub mod edge;
pub mod value;
pub mod severity;

pub use node::{Node, NodeId, NodeType, EMBED_DIM};
pub use edge::Edge;
pub use value::{PropertyMap, Value};
pub use severity::Severity;
