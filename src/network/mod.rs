//! # Network Facades
//!
//! Domain-level views over the graph engine. Each facade owns a graph keyed
//! by vendor node id, keeps the full vendor records alongside it, and maps
//! routing results back to link ids.
//!
//! | Type | Backing | Source files |
//! |------|---------|--------------|
//! | [`TrainNetwork`] | [`crate::graph::Graph`] | tab-separated node/link files |
//! | [`RoadNetwork`] | [`crate::transport::TransportGraph`] | whitespace node/link files |
//! | [`RoadNetworkConfig`] | [`RoadNetwork`] + [`SimulationConfig`] | config file |
//!
//! Lock order across the crate is facade state, then graph, then traffic
//! state. Facade events fire after all locks are released.

pub mod records;
pub mod road;
pub mod train;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::GraphInner;
use crate::route::{edge_travel_time, Criterion};

pub use records::{
    InputFiles, OutputFiles, RoadLink, RoadNode, SimulationConfig, TrainLink, TrainNode,
};
pub use road::{RoadNetwork, RoadNetworkConfig};
pub use train::TrainNetwork;

// ============================================================================
// PathResult
// ============================================================================

/// A routed path expressed in vendor ids.
///
/// `node_ids` is empty when no path exists; length and travel time are
/// infinite then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub node_ids: Vec<i64>,
    /// Vendor link ids traversed, in order. May be shorter than the edge
    /// count if an edge has no matching link record.
    pub link_ids: Vec<i64>,
    /// Sum of edge lengths.
    pub total_length: f64,
    /// Free-flow (uncongested) travel time.
    pub min_travel_time: f64,
    /// What the search minimized.
    pub criterion: Criterion,
}

impl PathResult {
    pub fn not_found(criterion: Criterion) -> Self {
        Self {
            node_ids: Vec::new(),
            link_ids: Vec::new(),
            total_length: f64::INFINITY,
            min_travel_time: f64::INFINITY,
            criterion,
        }
    }

    pub fn is_found(&self) -> bool {
        !self.node_ids.is_empty()
    }
}

/// Build a [`PathResult`] from a routed node sequence, resolving link ids
/// through the facade's span index and summing length and free-flow time
/// under the caller's graph lock.
pub(crate) fn assemble_path_result(
    g: &GraphInner<i64>,
    span_index: &HashMap<(i64, i64), i64>,
    node_ids: Vec<i64>,
    criterion: Criterion,
) -> PathResult {
    let mut link_ids = Vec::with_capacity(node_ids.len().saturating_sub(1));
    let mut total_length = 0.0;
    let mut min_travel_time = 0.0;
    for pair in node_ids.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if let Some(edge) = g.edge(&from, &to) {
            total_length += edge.weight;
            min_travel_time += edge_travel_time(edge.weight, &edge.attrs);
        }
        match span_index.get(&(from, to)) {
            Some(&link_id) => link_ids.push(link_id),
            None => warn!(from, to, "traversed edge has no link record"),
        }
    }
    PathResult { node_ids, link_ids, total_length, min_travel_time, criterion }
}

// ============================================================================
// Network events
// ============================================================================

/// Coarse facade-level change notification.
///
/// A successful load emits `NodesChanged`, `LinksChanged` and finally
/// `NetworkChanged`, each exactly once, however many rows were involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    NodesChanged,
    LinksChanged,
    NetworkChanged,
}

pub trait NetworkObserver: Send + Sync {
    fn on_network_event(&self, event: NetworkEvent);
}

impl<F> NetworkObserver for F
where
    F: Fn(NetworkEvent) + Send + Sync,
{
    fn on_network_event(&self, event: NetworkEvent) {
        self(event)
    }
}
