//! Concurrent attributed digraph.
//!
//! This is the storage core every network facade builds on. Simple ordered
//! maps protected by a single `parking_lot::RwLock`, so multi-step mutations
//! (edge insert with endpoint auto-creation, node removal with edge cascade)
//! are atomic and readers always observe a consistent graph.
//!
//! ## Semantics
//!
//! - At most one directed edge per `(from, to)` pair; re-adding updates weight
//!   and attributes in place.
//! - `add_edge` auto-creates missing endpoints with empty attributes.
//! - Weights must be finite and non-negative; violations are rejected before
//!   any state changes.
//! - Removing a node removes every incident edge, including self-loops.
//!
//! ## Events
//!
//! Mutations collect their events under the write lock and dispatch them
//! after it is released, element events first, one `Changed` last. Observers
//! can therefore re-enter the graph freely. The cost is a small window where
//! an event describes a state a later writer has already overwritten; callers
//! that need the exact current state re-read it on receipt.
//!
//! ## Determinism
//!
//! All indexes are ordered maps keyed by node id. Iteration order (and with
//! it neighbor expansion in the routing layer) depends only on graph content,
//! never on insertion history.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use smallvec::{smallvec, SmallVec};

use crate::model::AttrMap;
use crate::{Error, Result};
use super::event::{GraphEvent, GraphObserver};
use super::NodeKey;

/// Weight plus attributes stored per directed edge.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EdgeData {
    pub(crate) weight: f64,
    pub(crate) attrs: AttrMap,
}

/// Buffer for the events of one mutation. Single-element mutations emit at
/// most four events, so this stays on the stack.
type EventBuf<K> = SmallVec<[GraphEvent<K>; 4]>;

// ============================================================================
// GraphInner — all state behind the lock
// ============================================================================

pub(crate) struct GraphInner<K: NodeKey> {
    /// Node registry. A node exists iff it has an entry here.
    pub(crate) nodes: BTreeMap<K, AttrMap>,
    /// from → to → edge. Inner map doubles as the out-adjacency index.
    pub(crate) out: BTreeMap<K, BTreeMap<K, EdgeData>>,
    /// to → set of froms. Reverse index for incoming queries and removal.
    pub(crate) inc: BTreeMap<K, BTreeSet<K>>,
    edge_count: usize,
}

impl<K: NodeKey> GraphInner<K> {
    fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            out: BTreeMap::new(),
            inc: BTreeMap::new(),
            edge_count: 0,
        }
    }

    pub(crate) fn edge(&self, from: &K, to: &K) -> Option<&EdgeData> {
        self.out.get(from).and_then(|m| m.get(to))
    }

    /// Out-neighbors of `from` with their edges, in ascending key order.
    pub(crate) fn out_edges(&self, from: &K) -> impl Iterator<Item = (&K, &EdgeData)> {
        self.out.get(from).into_iter().flatten()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Insert a node only if absent; returns true when created.
    fn insert_node_if_absent(&mut self, id: K) -> bool {
        use std::collections::btree_map::Entry;
        match self.nodes.entry(id) {
            Entry::Vacant(e) => {
                e.insert(AttrMap::new());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Raw edge insert. Endpoints must already exist. Returns true when the
    /// edge is new rather than updated.
    fn insert_edge(&mut self, from: K, to: K, weight: f64, attrs: AttrMap) -> bool {
        self.inc.entry(to.clone()).or_default().insert(from.clone());
        let fresh = self
            .out
            .entry(from)
            .or_default()
            .insert(to, EdgeData { weight, attrs })
            .is_none();
        if fresh {
            self.edge_count += 1;
        }
        fresh
    }

    /// Raw edge removal with index cleanup. Returns true when an edge went.
    fn remove_edge_entry(&mut self, from: &K, to: &K) -> bool {
        let emptied = match self.out.get_mut(from) {
            Some(m) => {
                if m.remove(to).is_none() {
                    return false;
                }
                m.is_empty()
            }
            None => return false,
        };
        if emptied {
            self.out.remove(from);
        }
        self.edge_count -= 1;

        let inc_emptied = self
            .inc
            .get_mut(to)
            .map(|set| {
                set.remove(from);
                set.is_empty()
            })
            .unwrap_or(false);
        if inc_emptied {
            self.inc.remove(to);
        }
        true
    }
}

// ============================================================================
// Graph — the public handle
// ============================================================================

/// Thread-safe attributed digraph with change notification.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Graph<K: NodeKey> {
    inner: RwLock<GraphInner<K>>,
    observers: Mutex<Vec<Arc<dyn GraphObserver<K>>>>,
}

impl<K: NodeKey> Graph<K> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(GraphInner::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Read access to the locked state, for the routing layer.
    pub(crate) fn read_inner(&self) -> RwLockReadGuard<'_, GraphInner<K>> {
        self.inner.read()
    }

    fn check_weight(from: &K, to: &K, weight: f64) -> Result<()> {
        if weight.is_finite() && weight >= 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidWeight {
                from: from.to_string(),
                to: to.to_string(),
                weight,
            })
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert or replace a node. Existing attributes are overwritten.
    pub fn add_node(&self, id: K, attrs: AttrMap) {
        let events: EventBuf<K> = {
            let mut g = self.inner.write();
            let existed = g.nodes.insert(id.clone(), attrs).is_some();
            let event = if existed {
                GraphEvent::NodeModified(id)
            } else {
                GraphEvent::NodeAdded(id)
            };
            smallvec![event, GraphEvent::Changed]
        };
        self.emit(&events);
    }

    /// Insert or update the directed edge `from -> to`.
    ///
    /// Missing endpoints are created with empty attributes. Rejects weights
    /// that are negative, NaN or infinite without touching the graph.
    pub fn add_edge(&self, from: K, to: K, weight: f64, attrs: AttrMap) -> Result<()> {
        Self::check_weight(&from, &to, weight)?;
        let mut events: EventBuf<K> = SmallVec::new();
        {
            let mut g = self.inner.write();
            if g.insert_node_if_absent(from.clone()) {
                events.push(GraphEvent::NodeAdded(from.clone()));
            }
            if to != from && g.insert_node_if_absent(to.clone()) {
                events.push(GraphEvent::NodeAdded(to.clone()));
            }
            let fresh = g.insert_edge(from.clone(), to.clone(), weight, attrs);
            events.push(if fresh {
                GraphEvent::EdgeAdded(from, to)
            } else {
                GraphEvent::EdgeModified(from, to)
            });
            events.push(GraphEvent::Changed);
        }
        self.emit(&events);
        Ok(())
    }

    /// Remove a node and every edge incident to it.
    pub fn remove_node(&self, id: &K) -> bool {
        let mut events: EventBuf<K> = SmallVec::new();
        {
            let mut g = self.inner.write();
            if !g.nodes.contains_key(id) {
                return false;
            }
            if let Some(out_map) = g.out.remove(id) {
                for (to, _) in out_map {
                    g.edge_count -= 1;
                    if &to != id {
                        let emptied = g
                            .inc
                            .get_mut(&to)
                            .map(|s| {
                                s.remove(id);
                                s.is_empty()
                            })
                            .unwrap_or(false);
                        if emptied {
                            g.inc.remove(&to);
                        }
                    }
                    events.push(GraphEvent::EdgeRemoved(id.clone(), to));
                }
            }
            if let Some(froms) = g.inc.remove(id) {
                for from in froms {
                    // Self-loop already went with the outgoing pass.
                    if &from == id {
                        continue;
                    }
                    let (removed, emptied) = match g.out.get_mut(&from) {
                        Some(m) => (m.remove(id).is_some(), m.is_empty()),
                        None => (false, false),
                    };
                    if removed {
                        g.edge_count -= 1;
                        if emptied {
                            g.out.remove(&from);
                        }
                        events.push(GraphEvent::EdgeRemoved(from, id.clone()));
                    }
                }
            }
            g.nodes.remove(id);
            events.push(GraphEvent::NodeRemoved(id.clone()));
            events.push(GraphEvent::Changed);
        }
        self.emit(&events);
        true
    }

    /// Remove the directed edge `from -> to`. Endpoints stay.
    pub fn remove_edge(&self, from: &K, to: &K) -> bool {
        let removed = self.inner.write().remove_edge_entry(from, to);
        if removed {
            let events: EventBuf<K> = smallvec![
                GraphEvent::EdgeRemoved(from.clone(), to.clone()),
                GraphEvent::Changed,
            ];
            self.emit(&events);
        }
        removed
    }

    /// Drop all nodes and edges.
    pub fn clear(&self) {
        {
            let mut g = self.inner.write();
            *g = GraphInner::new();
        }
        let events: EventBuf<K> = smallvec![GraphEvent::Changed];
        self.emit(&events);
    }

    /// Atomically replace the whole graph from prebuilt node and edge lists.
    ///
    /// All weights are validated before anything is touched; on error the
    /// existing contents survive unchanged. Edge endpoints missing from
    /// `nodes` are created with empty attributes. Emits a single `Changed`.
    pub fn load_batch<I, J>(&self, nodes: I, edges: J) -> Result<()>
    where
        I: IntoIterator<Item = (K, AttrMap)>,
        J: IntoIterator<Item = (K, K, f64, AttrMap)>,
    {
        let edges: Vec<(K, K, f64, AttrMap)> = edges.into_iter().collect();
        for (from, to, weight, _) in &edges {
            Self::check_weight(from, to, *weight)?;
        }
        {
            let mut g = self.inner.write();
            *g = GraphInner::new();
            for (id, attrs) in nodes {
                g.nodes.insert(id, attrs);
            }
            for (from, to, weight, attrs) in edges {
                g.insert_node_if_absent(from.clone());
                g.insert_node_if_absent(to.clone());
                g.insert_edge(from, to, weight, attrs);
            }
        }
        let events: EventBuf<K> = smallvec![GraphEvent::Changed];
        self.emit(&events);
        Ok(())
    }

    // ========================================================================
    // Attribute and weight access
    // ========================================================================

    pub fn node_attrs(&self, id: &K) -> Option<AttrMap> {
        self.inner.read().nodes.get(id).cloned()
    }

    /// Replace the attributes of an existing node. False if absent.
    pub fn set_node_attrs(&self, id: &K, attrs: AttrMap) -> bool {
        let updated = {
            let mut g = self.inner.write();
            match g.nodes.get_mut(id) {
                Some(slot) => {
                    *slot = attrs;
                    true
                }
                None => false,
            }
        };
        if updated {
            let events: EventBuf<K> =
                smallvec![GraphEvent::NodeModified(id.clone()), GraphEvent::Changed];
            self.emit(&events);
        }
        updated
    }

    /// Weight of `from -> to`, or `f64::INFINITY` when the edge is absent.
    pub fn edge_weight(&self, from: &K, to: &K) -> f64 {
        self.inner.read().edge(from, to).map_or(f64::INFINITY, |e| e.weight)
    }

    /// Update the weight of an existing edge. `Ok(false)` if the edge is
    /// absent; invalid weights are rejected like in [`Graph::add_edge`].
    pub fn set_edge_weight(&self, from: &K, to: &K, weight: f64) -> Result<bool> {
        Self::check_weight(from, to, weight)?;
        let updated = {
            let mut g = self.inner.write();
            match g.out.get_mut(from).and_then(|m| m.get_mut(to)) {
                Some(edge) => {
                    edge.weight = weight;
                    true
                }
                None => false,
            }
        };
        if updated {
            let events: EventBuf<K> = smallvec![
                GraphEvent::EdgeModified(from.clone(), to.clone()),
                GraphEvent::Changed,
            ];
            self.emit(&events);
        }
        Ok(updated)
    }

    pub fn edge_attrs(&self, from: &K, to: &K) -> Option<AttrMap> {
        self.inner.read().edge(from, to).map(|e| e.attrs.clone())
    }

    /// Replace the attributes of an existing edge. False if absent.
    pub fn set_edge_attrs(&self, from: &K, to: &K, attrs: AttrMap) -> bool {
        let updated = {
            let mut g = self.inner.write();
            match g.out.get_mut(from).and_then(|m| m.get_mut(to)) {
                Some(edge) => {
                    edge.attrs = attrs;
                    true
                }
                None => false,
            }
        };
        if updated {
            let events: EventBuf<K> = smallvec![
                GraphEvent::EdgeModified(from.clone(), to.clone()),
                GraphEvent::Changed,
            ];
            self.emit(&events);
        }
        updated
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn has_node(&self, id: &K) -> bool {
        self.inner.read().nodes.contains_key(id)
    }

    pub fn has_edge(&self, from: &K, to: &K) -> bool {
        self.inner.read().edge(from, to).is_some()
    }

    /// Out-neighbors with edge weights, sorted by node id.
    pub fn outgoing(&self, id: &K) -> Vec<(K, f64)> {
        self.inner
            .read()
            .out_edges(id)
            .map(|(to, e)| (to.clone(), e.weight))
            .collect()
    }

    /// In-neighbors with edge weights, sorted by node id.
    pub fn incoming(&self, id: &K) -> Vec<(K, f64)> {
        let g = self.inner.read();
        g.inc
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|from| g.edge(from, id).map(|e| (from.clone(), e.weight)))
            .collect()
    }

    pub fn out_degree(&self, id: &K) -> usize {
        self.inner.read().out.get(id).map_or(0, |m| m.len())
    }

    pub fn in_degree(&self, id: &K) -> usize {
        self.inner.read().inc.get(id).map_or(0, |s| s.len())
    }

    /// All node ids, sorted.
    pub fn nodes(&self) -> Vec<K> {
        self.inner.read().nodes.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register an observer. Observers are invoked in subscription order.
    pub fn subscribe(&self, observer: Arc<dyn GraphObserver<K>>) {
        self.observers.lock().push(observer);
    }

    /// Dispatch outside the graph lock. The observer list is snapshotted so
    /// a callback may subscribe further observers without deadlocking.
    fn emit(&self, events: &[GraphEvent<K>]) {
        if events.is_empty() {
            return;
        }
        let observers = self.observers.lock().clone();
        for event in events {
            for observer in &observers {
                observer.on_graph_event(event);
            }
        }
    }
}

impl<K: NodeKey> Default for Graph<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> fmt::Debug for Graph<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.inner.read();
        f.debug_struct("Graph")
            .field("nodes", &g.nodes.len())
            .field("edges", &g.edge_count)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
