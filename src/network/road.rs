//! Road network facade and its simulation-config pairing.
//!
//! [`RoadNetwork`] mirrors the train facade but backs onto a
//! [`TransportGraph`], so congestion and traffic state come along. Road links
//! are strictly directed; the vendor files model two-way streets as two rows.
//!
//! [`RoadNetworkConfig`] pairs a parsed [`SimulationConfig`] with the network
//! built from the files it names. This is the unit the registry hands out for
//! roads, since consumers usually need the file naming alongside the graph.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::formats;
use crate::graph::EdgeData;
use crate::model::attrs::{COST_FACTOR, FREE_SPEED, LANES, LINK_ID, SATURATION_FLOW, X, Y};
use crate::model::{AttrMap, AttrValue};
use crate::route::dijkstra::dijkstra_in;
use crate::route::yen::k_shortest_in;
use crate::route::Criterion;
use crate::transport::{Metric, TransportGraph};
use crate::Result;
use super::records::{RoadLink, RoadNode, SimulationConfig};
use super::{assemble_path_result, NetworkEvent, NetworkObserver, PathResult};

fn node_attrs_of(node: &RoadNode) -> AttrMap {
    [
        (X.to_owned(), AttrValue::Float(node.x)),
        (Y.to_owned(), AttrValue::Float(node.y)),
    ]
    .into_iter()
    .collect()
}

fn link_attrs_of(link: &RoadLink) -> AttrMap {
    [
        (LINK_ID.to_owned(), AttrValue::Int(link.user_id)),
        (FREE_SPEED.to_owned(), AttrValue::Float(link.free_speed)),
        (LANES.to_owned(), AttrValue::Int(link.num_lanes as i64)),
        (SATURATION_FLOW.to_owned(), AttrValue::Float(link.saturation_flow)),
        (COST_FACTOR.to_owned(), AttrValue::Float(link.cost_factor)),
    ]
    .into_iter()
    .collect()
}

#[derive(Default)]
struct RoadInner {
    nodes: Vec<RoadNode>,
    links: Vec<RoadLink>,
    node_index: HashMap<i64, usize>,
    link_index: HashMap<i64, usize>,
    /// (from, to) → link user id. First record wins on duplicates.
    span_index: HashMap<(i64, i64), i64>,
    name: Option<String>,
    variables: AttrMap,
}

/// Road network with congestion-aware routing over vendor records.
pub struct RoadNetwork {
    transport: TransportGraph<i64>,
    inner: RwLock<RoadInner>,
    observers: Mutex<Vec<Arc<dyn NetworkObserver>>>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self {
            transport: TransportGraph::new(),
            inner: RwLock::new(RoadInner::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// The backing transport graph, for traffic and congestion operations
    /// the facade does not mirror.
    pub fn transport(&self) -> &TransportGraph<i64> {
        &self.transport
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the network from parsed records.
    ///
    /// Rebuilds the transport graph (dropping traffic counters), registers
    /// each link's mode code, swaps the records in atomically and emits the
    /// facade events once each.
    pub fn load(&self, nodes: Vec<RoadNode>, links: Vec<RoadLink>) -> Result<()> {
        let (n_nodes, n_links) = (nodes.len(), links.len());
        {
            let mut inner = self.inner.write();

            let graph_nodes: Vec<(i64, AttrMap)> =
                nodes.iter().map(|n| (n.node_id, node_attrs_of(n))).collect();
            let graph_edges: Vec<(i64, i64, f64, AttrMap)> = links
                .iter()
                .map(|l| (l.from_id, l.to_id, l.length, link_attrs_of(l)))
                .collect();
            self.transport.load_batch(graph_nodes, graph_edges)?;
            for link in &links {
                self.transport.set_link_mode(link.user_id, link.mode);
            }

            let mut node_index = HashMap::with_capacity(nodes.len());
            for (i, n) in nodes.iter().enumerate() {
                node_index.entry(n.node_id).or_insert(i);
            }
            let mut link_index = HashMap::with_capacity(links.len());
            let mut span_index = HashMap::with_capacity(links.len());
            for (i, l) in links.iter().enumerate() {
                link_index.entry(l.user_id).or_insert(i);
                span_index.entry((l.from_id, l.to_id)).or_insert(l.user_id);
            }

            inner.nodes = nodes;
            inner.links = links;
            inner.node_index = node_index;
            inner.link_index = link_index;
            inner.span_index = span_index;
        }
        info!(nodes = n_nodes, links = n_links, "road network loaded");
        self.emit_reloaded();
        Ok(())
    }

    /// Load from vendor node and link files.
    pub fn load_from_files(&self, node_path: &Path, link_path: &Path) -> Result<()> {
        let nodes = formats::road::read_node_file(node_path)?;
        let links = formats::road::read_link_file(link_path)?;
        self.load(nodes, links)
    }

    /// Load from the files a simulation config names in its input folder.
    pub fn load_from_config(&self, config: &SimulationConfig) -> Result<()> {
        let folder = Path::new(&config.input_folder);
        self.load_from_files(
            &folder.join(&config.inputs.node_coordinates),
            &folder.join(&config.inputs.link_structure),
        )
    }

    // ========================================================================
    // Routing
    // ========================================================================

    /// Shortest path between two vendor node ids under `criterion`.
    pub fn shortest_path(&self, start: i64, end: i64, criterion: Criterion) -> PathResult {
        let inner = self.inner.read();
        let g = self.transport.graph().read_inner();
        let cost = move |_f: &i64, _t: &i64, e: &EdgeData| Some(criterion.edge_cost(e));
        let Some((node_ids, _)) = dijkstra_in(&g, &start, &end, &cost) else {
            debug!(start, end, %criterion, "no path in road network");
            return PathResult::not_found(criterion);
        };
        assemble_path_result(&g, &inner.span_index, node_ids, criterion)
    }

    /// Up to `max_paths` distinct loopless routes, cheapest (by length)
    /// first. Empty when the destination is unreachable.
    pub fn multiple_paths(&self, start: i64, end: i64, max_paths: usize) -> Vec<PathResult> {
        let inner = self.inner.read();
        let g = self.transport.graph().read_inner();
        k_shortest_in(&g, &start, &end, max_paths)
            .into_iter()
            .map(|(node_ids, _)| {
                assemble_path_result(&g, &inner.span_index, node_ids, Criterion::Distance)
            })
            .collect()
    }

    /// Nodes with no incoming edges, sorted.
    pub fn start_nodes(&self) -> Vec<i64> {
        let g = self.transport.graph().read_inner();
        g.nodes
            .keys()
            .filter(|id| g.inc.get(*id).is_none_or(|s| s.is_empty()))
            .copied()
            .collect()
    }

    /// Nodes with no outgoing edges, sorted.
    pub fn end_nodes(&self) -> Vec<i64> {
        let g = self.transport.graph().read_inner();
        g.nodes
            .keys()
            .filter(|id| g.out.get(*id).is_none_or(|m| m.is_empty()))
            .copied()
            .collect()
    }

    // ========================================================================
    // Traffic delegation
    // ========================================================================

    pub fn add_traffic(&self, from: i64, to: i64, vehicles: u64) {
        self.transport.add_traffic(&from, &to, vehicles);
    }

    pub fn remove_traffic(&self, from: i64, to: i64, vehicles: u64) {
        self.transport.remove_traffic(&from, &to, vehicles);
    }

    pub fn traffic(&self, from: i64, to: i64) -> u64 {
        self.transport.traffic(&from, &to)
    }

    pub fn congestion(&self, from: i64, to: i64) -> f64 {
        self.transport.congestion(&from, &to)
    }

    pub fn path_metric(&self, path: &[i64], metric: Metric) -> f64 {
        self.transport.path_metric(path, metric)
    }

    pub fn link_mode(&self, link_id: i64) -> i32 {
        self.transport.link_mode(link_id)
    }

    // ========================================================================
    // Record access
    // ========================================================================

    pub fn node_by_id(&self, node_id: i64) -> Option<RoadNode> {
        let inner = self.inner.read();
        inner.node_index.get(&node_id).map(|&i| inner.nodes[i].clone())
    }

    pub fn link_by_id(&self, user_id: i64) -> Option<RoadLink> {
        let inner = self.inner.read();
        inner.link_index.get(&user_id).map(|&i| inner.links[i].clone())
    }

    pub fn nodes(&self) -> Vec<RoadNode> {
        self.inner.read().nodes.clone()
    }

    pub fn links(&self) -> Vec<RoadLink> {
        self.inner.read().links.clone()
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.inner.read().links.len()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.inner.write().name = Some(name.into());
    }

    /// User metadata slot. Nothing in the routing layers reads these.
    pub fn variable(&self, key: &str) -> Option<AttrValue> {
        self.inner.read().variables.get(key).cloned()
    }

    pub fn set_variable(&self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.inner.write().variables.insert(key.into(), value.into());
    }

    pub fn variables(&self) -> AttrMap {
        self.inner.read().variables.clone()
    }

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

impl Default for RoadNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoadNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("RoadNetwork")
            .field("name", &inner.name)
            .field("nodes", &inner.nodes.len())
            .field("links", &inner.links.len())
            .finish()
    }
}

// ============================================================================
// RoadNetworkConfig
// ============================================================================

/// A simulation configuration together with the road network it describes.
#[derive(Debug)]
pub struct RoadNetworkConfig {
    config: SimulationConfig,
    network: Arc<RoadNetwork>,
}

impl RoadNetworkConfig {
    /// Pair an already-built network with its configuration.
    pub fn new(config: SimulationConfig, network: Arc<RoadNetwork>) -> Self {
        Self { config, network }
    }

    /// Parse a config file and load the network from the files it names.
    pub fn from_file(config_path: &Path) -> Result<Self> {
        let config = formats::config::read_config_file(config_path)?;
        let network = Arc::new(RoadNetwork::new());
        network.load_from_config(&config)?;
        Ok(Self { config, network })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn network(&self) -> Arc<RoadNetwork> {
        self.network.clone()
    }

    /// Resolved path of the node coordinates file.
    pub fn node_file_path(&self) -> PathBuf {
        Path::new(&self.config.input_folder).join(&self.config.inputs.node_coordinates)
    }

    /// Resolved path of the link structure file.
    pub fn link_file_path(&self) -> PathBuf {
        Path::new(&self.config.input_folder).join(&self.config.inputs.link_structure)
    }

    /// Reload the network from the configured files.
    pub fn load_network(&self) -> Result<()> {
        self.network
            .load_from_files(&self.node_file_path(), &self.link_file_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::InputFiles;

    fn node(node_id: i64) -> RoadNode {
        RoadNode { node_id, ..RoadNode::default() }
    }

    fn link(user_id: i64, from_id: i64, to_id: i64, length: f64) -> RoadLink {
        RoadLink {
            user_id,
            from_id,
            to_id,
            length,
            num_lanes: 2,
            free_speed: 50.0,
            saturation_flow: 1800.0,
            cost_factor: 1.0,
            mode: 1,
            ..RoadLink::default()
        }
    }

    fn grid() -> RoadNetwork {
        // 1 -> 2 -> 4 and 1 -> 3 -> 4, plus 2 -> 3
        let net = RoadNetwork::new();
        net.load(
            vec![node(1), node(2), node(3), node(4)],
            vec![
                link(10, 1, 2, 1.0),
                link(11, 2, 4, 1.0),
                link(12, 1, 3, 1.0),
                link(13, 3, 4, 1.0),
                link(14, 2, 3, 1.0),
            ],
        )
        .unwrap();
        net
    }

    #[test]
    fn test_links_are_directed_and_projected() {
        let net = grid();
        let tg = net.transport();
        assert_eq!(tg.edge_count(), 5);
        assert!(tg.has_edge(&1, &2));
        assert!(!tg.has_edge(&2, &1));

        let attrs = tg.edge_attrs(&1, &2).unwrap();
        assert_eq!(attrs.get(LINK_ID), Some(&AttrValue::Int(10)));
        assert_eq!(attrs.get(LANES), Some(&AttrValue::Int(2)));
        assert_eq!(attrs.get(FREE_SPEED), Some(&AttrValue::Float(50.0)));

        // Modes registered per link; unregistered ids read as 0
        assert_eq!(net.link_mode(10), 1);
        assert_eq!(net.link_mode(99), 0);
    }

    #[test]
    fn test_multiple_paths_ordering() {
        let net = grid();
        let paths = net.multiple_paths(1, 4, 5);

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0].node_ids, vec![1, 2, 4]);
        assert_eq!(paths[0].link_ids, vec![10, 11]);
        assert_eq!(paths[1].node_ids, vec![1, 3, 4]);
        assert_eq!(paths[2].node_ids, vec![1, 2, 3, 4]);
        assert_eq!(paths[2].total_length, 3.0);
        assert!(paths.iter().all(|p| p.criterion == Criterion::Distance));
    }

    #[test]
    fn test_shortest_path_and_metrics() {
        let net = grid();
        let path = net.shortest_path(1, 4, Criterion::Distance);
        assert_eq!(path.node_ids, vec![1, 2, 4]);
        assert_eq!(path.total_length, 2.0);
        // free_speed 50 on both links
        assert!((path.min_travel_time - 0.04).abs() < 1e-12);

        // Congestion slows the metric but not min_travel_time
        net.add_traffic(1, 2, 3600);
        let congested = net.path_metric(&[1, 2, 4], Metric::Time);
        assert!(congested > 0.04);
        let again = net.shortest_path(1, 4, Criterion::Distance);
        assert!((again.min_travel_time - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_name_and_variables() {
        let net = grid();
        assert_eq!(net.name(), None);
        net.set_name("downtown");
        assert_eq!(net.name(), Some("downtown".to_owned()));

        net.set_variable("demand_year", 2031i64);
        assert_eq!(net.variable("demand_year"), Some(AttrValue::Int(2031)));
        assert_eq!(net.variable("missing"), None);
    }

    #[test]
    fn test_config_paths_resolve_against_input_folder() {
        let config = SimulationConfig {
            input_folder: "/data/networks".into(),
            inputs: InputFiles {
                node_coordinates: "nodes.txt".into(),
                link_structure: "links.txt".into(),
                ..InputFiles::default()
            },
            ..SimulationConfig::default()
        };

        let pair = RoadNetworkConfig::new(config, Arc::new(RoadNetwork::new()));
        assert_eq!(pair.node_file_path(), PathBuf::from("/data/networks/nodes.txt"));
        assert_eq!(pair.link_file_path(), PathBuf::from("/data/networks/links.txt"));
    }
}
