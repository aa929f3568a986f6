//! # transnet — Multi-Modal Transportation Network Engine
//!
//! Attributed routing graphs for train and road networks, with congestion-aware
//! travel times and a region-keyed registry of live network handles.
//!
//! ## Design Principles
//!
//! 1. **One lock per layer**: each [`Graph`] guards all of its state behind a
//!    single `RwLock`, so readers always see nodes, edges, and attributes from
//!    the same instant
//! 2. **Events after unlock**: observers run outside every lock and may call
//!    back into the graph that notified them
//! 3. **Typed attributes**: [`AttrValue`] keeps `Int(3)` and `Float(3.0)`
//!    distinct across serialization round-trips
//! 4. **Facades project, never route**: [`TrainNetwork`] and [`RoadNetwork`]
//!    translate vendor records into graph form; all path search lives in
//!    [`route`]
//!
//! ## Quick Start
//!
//! ```rust
//! use transnet::model::AttrMap;
//! use transnet::route::shortest_path;
//! use transnet::{Criterion, Graph};
//!
//! # fn main() -> transnet::Result<()> {
//! let graph: Graph<String> = Graph::new();
//! graph.add_edge("a".into(), "b".into(), 2.0, AttrMap::new())?;
//! graph.add_edge("b".into(), "c".into(), 2.0, AttrMap::new())?;
//! graph.add_edge("a".into(), "c".into(), 5.0, AttrMap::new())?;
//!
//! let path = shortest_path(&graph, &"a".to_string(), &"c".to_string(), Criterion::Distance);
//! assert_eq!(path, ["a", "b", "c"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! | Layer | Module | Description |
//! |-------|--------|-------------|
//! | Model | [`model`] | Typed attribute values and well-known keys |
//! | Core | [`graph`] | Thread-safe attributed digraph with change events |
//! | Routing | [`route`] | Dijkstra shortest path, Yen k-shortest paths |
//! | Transport | [`transport`] | BPR congestion, traffic counts, link modes |
//! | Facades | [`network`] | Train/road networks loaded from vendor files |
//! | Registry | [`registry`] | Region-keyed shared network handles |
//! | Formats | [`formats`] | Vendor node/link/config file parsers |
//! | Control | [`control`] | Slash-delimited controller message codec |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod route;
pub mod transport;
pub mod network;
pub mod formats;
pub mod registry;
pub mod control;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{AttrMap, AttrValue};

// ============================================================================
// Re-exports: Graph engine
// ============================================================================

pub use graph::{Graph, GraphDocument, GraphEvent, GraphObserver, NodeKey};

// ============================================================================
// Re-exports: Routing and transport
// ============================================================================

pub use route::Criterion;
pub use transport::{Metric, TransportGraph};

// ============================================================================
// Re-exports: Network facades
// ============================================================================

pub use network::{
    NetworkEvent, NetworkObserver, PathResult, RoadNetwork, RoadNetworkConfig, TrainNetwork,
};

// ============================================================================
// Re-exports: Registry
// ============================================================================

pub use registry::{Registry, RegistryEvent, RegistryObserver};

// ============================================================================
// Re-exports: Control channel
// ============================================================================

pub use control::{AddTripPayload, ControlMessage, MessageKind};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed vendor file. `line` is 1-based and refers to the file as
    /// read, before any row filtering.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unknown routing criterion: '{0}'")]
    InvalidCriterion(String),

    #[error("Unknown path metric: '{0}'")]
    InvalidMetric(String),

    /// Edge weights must be finite and non-negative.
    #[error("Invalid weight {weight} for edge {from} -> {to}")]
    InvalidWeight { from: String, to: String, weight: f64 },

    #[error("Control protocol error: {0}")]
    Control(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
