//! Transport graph: congestion, traffic counts and mode restrictions on top
//! of the plain digraph.
//!
//! [`TransportGraph`] composes a [`Graph`] with mutable traffic state. The
//! congestion model is the standard BPR volume-delay function
//!
//! ```text
//! factor = 1 + 0.15 * (v / c)^4
//! ```
//!
//! where `v` is the live vehicle count on the edge and `c` its capacity,
//! `lanes * saturation_flow` from the edge attributes. Traffic lives outside
//! the graph so that counters churn without touching edge attributes or
//! firing graph events.
//!
//! Lock order is graph before traffic state; no method ever holds them the
//! other way around.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{EdgeData, Graph, GraphObserver, NodeKey};
use crate::model::attrs::{COST_FACTOR, FREE_SPEED, LANES, LINK_ID, SATURATION_FLOW};
use crate::model::{float_attr, int_attr, positive_attr, AttrMap};
use crate::route::dijkstra::dijkstra_in;
use crate::route::yen::k_shortest_in;
use crate::{Error, Result};

/// BPR volume-delay coefficients.
const BPR_ALPHA: f64 = 0.15;
const BPR_BETA: i32 = 4;

/// Capacity fallbacks when an edge does not carry the attribute.
const DEFAULT_LANES: f64 = 1.0;
const DEFAULT_SATURATION_FLOW: f64 = 1800.0;
/// Fallback speed for time metrics on edges without a usable `free_speed`.
const DEFAULT_FREE_SPEED: f64 = 50.0;
const DEFAULT_COST_FACTOR: f64 = 1.0;

// ============================================================================
// Metric
// ============================================================================

/// What [`TransportGraph::path_metric`] accumulates along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Sum of edge lengths.
    Distance,
    /// Congestion-adjusted travel time at current traffic.
    Time,
    /// Length scaled by the per-edge `cost_factor`.
    Cost,
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "distance" => Ok(Metric::Distance),
            "time" => Ok(Metric::Time),
            "cost" => Ok(Metric::Cost),
            _ => Err(Error::InvalidMetric(s.to_owned())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Distance => "distance",
            Metric::Time => "time",
            Metric::Cost => "cost",
        })
    }
}

/// BPR factor for one edge at the given vehicle count.
fn bpr_factor(edge_attrs: &AttrMap, vehicles: u64) -> f64 {
    let lanes = float_attr(edge_attrs, LANES).unwrap_or(DEFAULT_LANES);
    let saturation = float_attr(edge_attrs, SATURATION_FLOW).unwrap_or(DEFAULT_SATURATION_FLOW);
    let capacity = lanes * saturation;
    if !capacity.is_finite() || capacity <= 0.0 {
        return 1.0;
    }
    let ratio = vehicles as f64 / capacity;
    1.0 + BPR_ALPHA * ratio.powi(BPR_BETA)
}

// ============================================================================
// TransportGraph
// ============================================================================

struct TrafficState<K> {
    /// (from, to) → vehicles currently on the edge. Entries at zero are
    /// pruned, so iteration only sees live congestion.
    traffic: HashMap<(K, K), u64>,
    /// External link id → allowed transport mode code.
    link_modes: HashMap<i64, i32>,
}

/// A digraph plus live traffic state and congestion-aware metrics.
pub struct TransportGraph<K: NodeKey> {
    graph: Graph<K>,
    state: RwLock<TrafficState<K>>,
}

impl<K: NodeKey> TransportGraph<K> {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            state: RwLock::new(TrafficState {
                traffic: HashMap::new(),
                link_modes: HashMap::new(),
            }),
        }
    }

    /// The underlying graph, for operations not mirrored here.
    pub fn graph(&self) -> &Graph<K> {
        &self.graph
    }

    // ========================================================================
    // Graph delegation
    // ========================================================================

    pub fn add_node(&self, id: K, attrs: AttrMap) {
        self.graph.add_node(id, attrs);
    }

    pub fn add_edge(&self, from: K, to: K, weight: f64, attrs: AttrMap) -> Result<()> {
        self.graph.add_edge(from, to, weight, attrs)
    }

    pub fn remove_node(&self, id: &K) -> bool {
        self.graph.remove_node(id)
    }

    pub fn remove_edge(&self, from: &K, to: &K) -> bool {
        self.graph.remove_edge(from, to)
    }

    /// Drop graph contents, traffic counters and mode restrictions.
    pub fn clear(&self) {
        {
            let mut st = self.state.write();
            st.traffic.clear();
            st.link_modes.clear();
        }
        self.graph.clear();
    }

    /// Replace the graph wholesale; resets traffic and modes. Emits a single
    /// `Changed` like [`Graph::load_batch`].
    pub fn load_batch<I, J>(&self, nodes: I, edges: J) -> Result<()>
    where
        I: IntoIterator<Item = (K, AttrMap)>,
        J: IntoIterator<Item = (K, K, f64, AttrMap)>,
    {
        {
            let mut st = self.state.write();
            st.traffic.clear();
            st.link_modes.clear();
        }
        self.graph.load_batch(nodes, edges)
    }

    pub fn has_node(&self, id: &K) -> bool {
        self.graph.has_node(id)
    }

    pub fn has_edge(&self, from: &K, to: &K) -> bool {
        self.graph.has_edge(from, to)
    }

    pub fn edge_weight(&self, from: &K, to: &K) -> f64 {
        self.graph.edge_weight(from, to)
    }

    pub fn set_edge_weight(&self, from: &K, to: &K, weight: f64) -> Result<bool> {
        self.graph.set_edge_weight(from, to, weight)
    }

    pub fn node_attrs(&self, id: &K) -> Option<AttrMap> {
        self.graph.node_attrs(id)
    }

    pub fn edge_attrs(&self, from: &K, to: &K) -> Option<AttrMap> {
        self.graph.edge_attrs(from, to)
    }

    pub fn outgoing(&self, id: &K) -> Vec<(K, f64)> {
        self.graph.outgoing(id)
    }

    pub fn nodes(&self) -> Vec<K> {
        self.graph.nodes()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn subscribe(&self, observer: std::sync::Arc<dyn GraphObserver<K>>) {
        self.graph.subscribe(observer);
    }

    // ========================================================================
    // Traffic
    // ========================================================================

    /// Put `vehicles` onto the edge `from -> to`.
    ///
    /// The pair does not have to exist in the graph yet; demand recorded
    /// ahead of a network reload is kept.
    pub fn add_traffic(&self, from: &K, to: &K, vehicles: u64) {
        if vehicles == 0 {
            return;
        }
        let mut st = self.state.write();
        *st.traffic.entry((from.clone(), to.clone())).or_insert(0) += vehicles;
    }

    /// Take `vehicles` off the edge, saturating at zero.
    pub fn remove_traffic(&self, from: &K, to: &K, vehicles: u64) {
        let mut st = self.state.write();
        let key = (from.clone(), to.clone());
        if let Some(count) = st.traffic.get_mut(&key) {
            *count = count.saturating_sub(vehicles);
            if *count == 0 {
                st.traffic.remove(&key);
            }
        }
    }

    /// Vehicles currently recorded on `from -> to`.
    pub fn traffic(&self, from: &K, to: &K) -> u64 {
        let st = self.state.read();
        st.traffic
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// BPR congestion factor of the edge at current traffic.
    ///
    /// 1.0 for free flow, for a missing edge and for edges whose capacity
    /// works out non-positive.
    pub fn congestion(&self, from: &K, to: &K) -> f64 {
        let g = self.graph.read_inner();
        let Some(edge) = g.edge(from, to) else { return 1.0 };
        let vehicles = {
            let st = self.state.read();
            st.traffic
                .get(&(from.clone(), to.clone()))
                .copied()
                .unwrap_or(0)
        };
        bpr_factor(&edge.attrs, vehicles)
    }

    // ========================================================================
    // Link modes
    // ========================================================================

    /// Mode code registered for an external link id, 0 when none is.
    pub fn link_mode(&self, link_id: i64) -> i32 {
        self.state
            .read()
            .link_modes
            .get(&link_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn set_link_mode(&self, link_id: i64, mode: i32) {
        self.state.write().link_modes.insert(link_id, mode);
    }

    // ========================================================================
    // Routing
    // ========================================================================

    /// Length-weighted shortest path restricted to edges the filter allows.
    ///
    /// Empty when no permitted route exists. The filter sees each candidate
    /// edge's endpoints.
    pub fn find_path_with_constraints<F>(&self, start: &K, end: &K, allow: F) -> Vec<K>
    where
        F: Fn(&K, &K) -> bool,
    {
        let g = self.graph.read_inner();
        let cost = |f: &K, t: &K, e: &EdgeData| if allow(f, t) { Some(e.weight) } else { None };
        dijkstra_in(&g, start, end, &cost)
            .map(|(path, _)| path)
            .unwrap_or_default()
    }

    /// Up to `k` cheapest loopless paths by length, with their costs.
    pub fn k_shortest_paths(&self, start: &K, end: &K, k: usize) -> Vec<(Vec<K>, f64)> {
        k_shortest_in(&self.graph.read_inner(), start, end, k)
    }

    /// Accumulate a metric along a node path.
    ///
    /// Consecutive pairs without an edge are skipped; a path shorter than two
    /// nodes measures 0. The `Time` metric divides each length by the edge's
    /// `free_speed` (default 50) and scales by its congestion factor, so the
    /// same path gets slower as traffic builds.
    pub fn path_metric(&self, path: &[K], metric: Metric) -> f64 {
        if path.len() < 2 {
            return 0.0;
        }
        let g = self.graph.read_inner();
        let st = self.state.read();
        let mut total = 0.0;
        for pair in path.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let Some(edge) = g.edge(from, to) else {
                debug!(%from, %to, "path metric: no edge between consecutive nodes, skipping");
                continue;
            };
            total += match metric {
                Metric::Distance => edge.weight,
                Metric::Cost => {
                    edge.weight * float_attr(&edge.attrs, COST_FACTOR).unwrap_or(DEFAULT_COST_FACTOR)
                }
                Metric::Time => {
                    let speed =
                        positive_attr(&edge.attrs, FREE_SPEED).unwrap_or(DEFAULT_FREE_SPEED);
                    let vehicles = st
                        .traffic
                        .get(&(from.clone(), to.clone()))
                        .copied()
                        .unwrap_or(0);
                    (edge.weight / speed) * bpr_factor(&edge.attrs, vehicles)
                }
            };
        }
        total
    }

    /// Project a node path onto external link ids.
    ///
    /// Reads the `link_id` attribute of each consecutive edge. Pairs without
    /// an edge or without the attribute are omitted, so the result may be
    /// shorter than `path.len() - 1`.
    pub fn node_path_to_link_path(&self, path: &[K]) -> Vec<i64> {
        let g = self.graph.read_inner();
        path.windows(2)
            .filter_map(|pair| {
                let edge = g.edge(&pair[0], &pair[1])?;
                int_attr(&edge.attrs, LINK_ID)
            })
            .collect()
    }
}

impl<K: NodeKey> Default for TransportGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> fmt::Debug for TransportGraph<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.read();
        f.debug_struct("TransportGraph")
            .field("graph", &self.graph)
            .field("congested_edges", &st.traffic.len())
            .field("link_modes", &st.link_modes.len())
            .finish()
    }
}
