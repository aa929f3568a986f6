//! Train network facade.
//!
//! Owns a `Graph<i64>` keyed by vendor node id plus the full vendor records.
//! Links project onto edges as weight = length with `link_id` and `max_speed`
//! attributes; a link with two directions becomes a pair of opposite edges
//! sharing one record. The span index maps each directed edge back to the
//! first link record covering it, so routed paths come back in link ids.

use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::formats;
use crate::graph::{EdgeData, Graph};
use crate::model::attrs::{DWELL_TIME, IS_TERMINAL, LINK_ID, MAX_SPEED, X, Y};
use crate::model::{AttrMap, AttrValue};
use crate::route::dijkstra::dijkstra_in;
use crate::route::Criterion;
use crate::Result;
use super::records::{TrainLink, TrainNode};
use super::{assemble_path_result, NetworkEvent, NetworkObserver, PathResult};

fn node_attrs_of(node: &TrainNode) -> AttrMap {
    [
        (X.to_owned(), AttrValue::Float(node.x)),
        (Y.to_owned(), AttrValue::Float(node.y)),
        (IS_TERMINAL.to_owned(), AttrValue::Bool(node.is_terminal)),
        (DWELL_TIME.to_owned(), AttrValue::Float(node.dwell_time)),
    ]
    .into_iter()
    .collect()
}

fn link_attrs_of(link: &TrainLink) -> AttrMap {
    [
        (LINK_ID.to_owned(), AttrValue::Int(link.user_id)),
        (MAX_SPEED.to_owned(), AttrValue::Float(link.max_speed)),
    ]
    .into_iter()
    .collect()
}

#[derive(Default)]
struct TrainInner {
    nodes: Vec<TrainNode>,
    links: Vec<TrainLink>,
    /// Vendor id → index into `nodes` / `links`. First record wins on
    /// duplicate ids, matching the vendor tools' list walk.
    node_index: HashMap<i64, usize>,
    link_index: HashMap<i64, usize>,
    /// (from, to) → link user id, both directions for bidirectional links.
    span_index: HashMap<(i64, i64), i64>,
    name: Option<String>,
    variables: AttrMap,
}

/// Rail network with vendor records, routing and change notification.
pub struct TrainNetwork {
    graph: Graph<i64>,
    inner: RwLock<TrainInner>,
    observers: Mutex<Vec<Arc<dyn NetworkObserver>>>,
}

impl TrainNetwork {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            inner: RwLock::new(TrainInner::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// The backing graph, for operations the facade does not mirror.
    pub fn graph(&self) -> &Graph<i64> {
        &self.graph
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the network from parsed records.
    ///
    /// The graph is rebuilt with a single `Changed`, the records and indexes
    /// swap in atomically, and the facade emits its three events once each.
    /// On error (a link with an invalid length) nothing is replaced.
    pub fn load(&self, nodes: Vec<TrainNode>, links: Vec<TrainLink>) -> Result<()> {
        let (n_nodes, n_links) = (nodes.len(), links.len());
        {
            let mut inner = self.inner.write();

            let graph_nodes: Vec<(i64, AttrMap)> =
                nodes.iter().map(|n| (n.user_id, node_attrs_of(n))).collect();
            let mut graph_edges = Vec::with_capacity(links.len() * 2);
            for link in &links {
                let attrs = link_attrs_of(link);
                graph_edges.push((link.from_id, link.to_id, link.length, attrs.clone()));
                if link.is_bidirectional() {
                    graph_edges.push((link.to_id, link.from_id, link.length, attrs));
                }
            }
            self.graph.load_batch(graph_nodes, graph_edges)?;

            let mut node_index = HashMap::with_capacity(nodes.len());
            for (i, n) in nodes.iter().enumerate() {
                node_index.entry(n.user_id).or_insert(i);
            }
            let mut link_index = HashMap::with_capacity(links.len());
            let mut span_index = HashMap::with_capacity(links.len() * 2);
            for (i, l) in links.iter().enumerate() {
                link_index.entry(l.user_id).or_insert(i);
                span_index.entry((l.from_id, l.to_id)).or_insert(l.user_id);
                if l.is_bidirectional() {
                    span_index.entry((l.to_id, l.from_id)).or_insert(l.user_id);
                }
            }

            inner.nodes = nodes;
            inner.links = links;
            inner.node_index = node_index;
            inner.link_index = link_index;
            inner.span_index = span_index;
        }
        info!(nodes = n_nodes, links = n_links, "train network loaded");
        self.emit_reloaded();
        Ok(())
    }

    /// Load from vendor node and link files.
    pub fn load_from_files(&self, node_path: &Path, link_path: &Path) -> Result<()> {
        let nodes = formats::train::read_node_file(node_path)?;
        let links = formats::train::read_link_file(link_path)?;
        self.load(nodes, links)
    }

    // ========================================================================
    // Routing
    // ========================================================================

    /// Shortest path between two vendor node ids under `criterion`.
    ///
    /// The whole computation, path search plus length, free-flow time and
    /// link id resolution, runs against one consistent graph snapshot.
    pub fn shortest_path(&self, start: i64, end: i64, criterion: Criterion) -> PathResult {
        let inner = self.inner.read();
        let g = self.graph.read_inner();
        let cost = move |_f: &i64, _t: &i64, e: &EdgeData| Some(criterion.edge_cost(e));
        let Some((node_ids, _)) = dijkstra_in(&g, &start, &end, &cost) else {
            debug!(start, end, %criterion, "no path in train network");
            return PathResult::not_found(criterion);
        };
        assemble_path_result(&g, &inner.span_index, node_ids, criterion)
    }

    /// Nodes with no incoming edges, sorted. Line origins in practice.
    pub fn start_nodes(&self) -> Vec<i64> {
        let g = self.graph.read_inner();
        g.nodes
            .keys()
            .filter(|id| g.inc.get(*id).is_none_or(|s| s.is_empty()))
            .copied()
            .collect()
    }

    /// Nodes with no outgoing edges, sorted.
    pub fn end_nodes(&self) -> Vec<i64> {
        let g = self.graph.read_inner();
        g.nodes
            .keys()
            .filter(|id| g.out.get(*id).is_none_or(|m| m.is_empty()))
            .copied()
            .collect()
    }

    // ========================================================================
    // Record access
    // ========================================================================

    pub fn node_by_id(&self, user_id: i64) -> Option<TrainNode> {
        let inner = self.inner.read();
        inner.node_index.get(&user_id).map(|&i| inner.nodes[i].clone())
    }

    pub fn link_by_id(&self, user_id: i64) -> Option<TrainLink> {
        let inner = self.inner.read();
        inner.link_index.get(&user_id).map(|&i| inner.links[i].clone())
    }

    /// Snapshot of all node records in file order.
    pub fn nodes(&self) -> Vec<TrainNode> {
        self.inner.read().nodes.clone()
    }

    /// Snapshot of all link records in file order.
    pub fn links(&self) -> Vec<TrainLink> {
        self.inner.read().links.clone()
    }

    /// Number of node records (not graph nodes).
    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Number of link records (a bidirectional link counts once).
    pub fn link_count(&self) -> usize {
        self.inner.read().links.len()
    }

    // ========================================================================
    // Name and variables
    // ========================================================================

    pub fn name(&self) -> Option<String> {
        self.inner.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.inner.write().name = Some(name.into());
    }

    /// Free-form named value attached to the network.
    pub fn variable(&self, key: &str) -> Option<AttrValue> {
        self.inner.read().variables.get(key).cloned()
    }

    pub fn set_variable(&self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.inner.write().variables.insert(key.into(), value.into());
    }

    pub fn variables(&self) -> AttrMap {
        self.inner.read().variables.clone()
    }

    // ========================================================================
    // Document export
    // ========================================================================

    /// All records as a JSON document: `{ name, nodes, links }`.
    pub fn to_document(&self) -> Result<serde_json::Value> {
        let inner = self.inner.read();
        let mut doc = serde_json::Map::new();
        doc.insert("name".to_owned(), serde_json::to_value(&inner.name)?);
        doc.insert("nodes".to_owned(), serde_json::to_value(&inner.nodes)?);
        doc.insert("links".to_owned(), serde_json::to_value(&inner.links)?);
        Ok(serde_json::Value::Object(doc))
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn subscribe(&self, observer: Arc<dyn NetworkObserver>) {
        self.observers.lock().push(observer);
    }

    fn emit_reloaded(&self) {
        let observers = self.observers.lock().clone();
        for event in [
            NetworkEvent::NodesChanged,
            NetworkEvent::LinksChanged,
            NetworkEvent::NetworkChanged,
        ] {
            for observer in &observers {
                observer.on_network_event(event);
            }
        }
    }
}

impl Default for TrainNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TrainNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("TrainNetwork")
            .field("name", &inner.name)
            .field("nodes", &inner.nodes.len())
            .field("links", &inner.links.len())
            .finish()
    }
}
