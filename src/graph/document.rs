//! Whole-graph snapshots as serializable documents.
//!
//! A [`GraphDocument`] captures every node, edge, weight and attribute of a
//! graph. Attribute values keep their tags through the round trip, so a
//! reloaded graph is indistinguishable from the original.

use serde::{Deserialize, Serialize};

use crate::model::AttrMap;
use crate::Result;
use super::digraph::Graph;
use super::NodeKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry<K> {
    pub id: K,
    pub attrs: AttrMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry<K> {
    pub from: K,
    pub to: K,
    pub weight: f64,
    pub attrs: AttrMap,
}

/// Full snapshot of a graph. Nodes sorted by id, edges by `(from, to)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument<K> {
    pub nodes: Vec<NodeEntry<K>>,
    pub edges: Vec<EdgeEntry<K>>,
}

impl<K: NodeKey> Graph<K> {
    /// Snapshot the graph. Output order is deterministic for equal contents.
    pub fn to_document(&self) -> GraphDocument<K> {
        let g = self.read_inner();
        let nodes = g
            .nodes
            .iter()
            .map(|(id, attrs)| NodeEntry { id: id.clone(), attrs: attrs.clone() })
            .collect();
        let edges = g
            .out
            .iter()
            .flat_map(|(from, targets)| {
                targets.iter().map(move |(to, e)| EdgeEntry {
                    from: from.clone(),
                    to: to.clone(),
                    weight: e.weight,
                    attrs: e.attrs.clone(),
                })
            })
            .collect();
        GraphDocument { nodes, edges }
    }

    /// Replace the graph contents from a document. Emits a single `Changed`.
    pub fn from_document(&self, doc: GraphDocument<K>) -> Result<()> {
        self.load_batch(
            doc.nodes.into_iter().map(|n| (n.id, n.attrs)),
            doc.edges.into_iter().map(|e| (e.from, e.to, e.weight, e.attrs)),
        )
    }

    /// [`Graph::to_document`] rendered as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_document())?)
    }

    /// Load from the JSON produced by [`Graph::to_json`].
    pub fn from_json(&self, json: serde_json::Value) -> Result<()> {
        let doc: GraphDocument<K> = serde_json::from_value(json)?;
        self.from_document(doc)
    }
}
