//! Dijkstra search over the locked graph state.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use hashbrown::HashMap;

use crate::graph::{EdgeData, Graph, GraphInner, NodeKey};
use super::Criterion;

/// Per-edge cost callback. Returning `None` prunes the edge from the search;
/// returned costs must be non-negative.
pub(crate) type EdgeCost<'a, K> = dyn Fn(&K, &K, &EdgeData) -> Option<f64> + 'a;

/// Heap entry ordered by cost, then by discovery sequence so that ties pop
/// in first-discovered order regardless of the key type's own ordering.
struct QueueEntry<K> {
    cost: f64,
    seq: u64,
    node: K,
}

impl<K> PartialEq for QueueEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl<K> Eq for QueueEntry<K> {}

impl<K> PartialOrd for QueueEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for QueueEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Cheapest path under `cost_fn`, or `None` when `end` is unreachable or an
/// endpoint does not exist. `start == end` yields the trivial path at cost 0.
pub(crate) fn dijkstra_in<K: NodeKey>(
    g: &GraphInner<K>,
    start: &K,
    end: &K,
    cost_fn: &EdgeCost<'_, K>,
) -> Option<(Vec<K>, f64)> {
    if !g.nodes.contains_key(start) || !g.nodes.contains_key(end) {
        return None;
    }
    if start == end {
        return Some((vec![start.clone()], 0.0));
    }

    let mut dist: HashMap<K, f64> = HashMap::new();
    let mut prev: HashMap<K, K> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<QueueEntry<K>>> = BinaryHeap::new();
    let mut seq = 0u64;

    dist.insert(start.clone(), 0.0);
    heap.push(Reverse(QueueEntry { cost: 0.0, seq, node: start.clone() }));

    while let Some(Reverse(QueueEntry { cost, node, .. })) = heap.pop() {
        if cost > dist.get(&node).copied().unwrap_or(f64::INFINITY) {
            continue; // stale entry, a cheaper route got there first
        }
        if &node == end {
            let mut path = Vec::new();
            let mut cur = node;
            while let Some(p) = prev.get(&cur) {
                path.push(cur.clone());
                cur = p.clone();
            }
            path.push(cur);
            path.reverse();
            return Some((path, cost));
        }
        for (to, edge) in g.out_edges(&node) {
            let Some(step) = cost_fn(&node, to, edge) else { continue };
            let next = cost + step;
            // Strict <: on equal cost the first-discovered predecessor wins
            if next < dist.get(to).copied().unwrap_or(f64::INFINITY) {
                dist.insert(to.clone(), next);
                prev.insert(to.clone(), node.clone());
                seq += 1;
                heap.push(Reverse(QueueEntry { cost: next, seq, node: to.clone() }));
            }
        }
    }
    None
}

/// Shortest path from `start` to `end` under `criterion`.
///
/// Returns the node sequence including both endpoints, or an empty vector
/// when no path exists. Cost lookups happen under a single read lock, so the
/// result is consistent even while writers are active.
pub fn shortest_path<K: NodeKey>(
    graph: &Graph<K>,
    start: &K,
    end: &K,
    criterion: Criterion,
) -> Vec<K> {
    let g = graph.read_inner();
    let cost = move |_f: &K, _t: &K, e: &EdgeData| Some(criterion.edge_cost(e));
    dijkstra_in(&g, start, end, &cost)
        .map(|(path, _)| path)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttrMap;
    use crate::AttrValue;

    fn speed_attrs(max_speed: f64) -> AttrMap {
        [("max_speed".to_owned(), AttrValue::Float(max_speed))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_picks_cheaper_multi_hop_route() {
        let g: Graph<String> = Graph::new();
        g.add_edge("a".into(), "b".into(), 1.0, AttrMap::new()).unwrap();
        g.add_edge("b".into(), "c".into(), 1.0, AttrMap::new()).unwrap();
        g.add_edge("a".into(), "c".into(), 5.0, AttrMap::new()).unwrap();

        let path = shortest_path(&g, &"a".into(), &"c".into(), Criterion::Distance);
        assert_eq!(path, vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
    }

    #[test]
    fn test_time_criterion_can_disagree_with_distance() {
        // Long but fast direct edge vs short but slow detour.
        let g: Graph<String> = Graph::new();
        g.add_edge("a".into(), "c".into(), 100.0, speed_attrs(100.0)).unwrap();
        g.add_edge("a".into(), "b".into(), 30.0, speed_attrs(10.0)).unwrap();
        g.add_edge("b".into(), "c".into(), 30.0, speed_attrs(10.0)).unwrap();

        let by_distance = shortest_path(&g, &"a".into(), &"c".into(), Criterion::Distance);
        assert_eq!(by_distance, vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);

        let by_time = shortest_path(&g, &"a".into(), &"c".into(), Criterion::Time);
        assert_eq!(by_time, vec!["a".to_owned(), "c".to_owned()]);
    }

    #[test]
    fn test_unreachable_and_missing_endpoints() {
        let g: Graph<i64> = Graph::new();
        g.add_edge(1, 2, 1.0, AttrMap::new()).unwrap();
        g.add_node(3, AttrMap::new());

        // Direction matters
        assert!(shortest_path(&g, &2, &1, Criterion::Distance).is_empty());
        assert!(shortest_path(&g, &1, &3, Criterion::Distance).is_empty());
        assert!(shortest_path(&g, &1, &99, Criterion::Distance).is_empty());
        assert!(shortest_path(&g, &99, &1, Criterion::Distance).is_empty());
    }

    #[test]
    fn test_trivial_path() {
        let g: Graph<i64> = Graph::new();
        g.add_node(1, AttrMap::new());
        assert_eq!(shortest_path(&g, &1, &1, Criterion::Distance), vec![1]);
    }

    #[test]
    fn test_equal_cost_tie_is_deterministic() {
        // Diamond with two cost-2 routes; the first-discovered one wins and
        // discovery follows sorted neighbor order, so "b" beats "c".
        let g: Graph<String> = Graph::new();
        g.add_edge("a".into(), "c".into(), 1.0, AttrMap::new()).unwrap();
        g.add_edge("a".into(), "b".into(), 1.0, AttrMap::new()).unwrap();
        g.add_edge("b".into(), "d".into(), 1.0, AttrMap::new()).unwrap();
        g.add_edge("c".into(), "d".into(), 1.0, AttrMap::new()).unwrap();

        for _ in 0..10 {
            let path = shortest_path(&g, &"a".into(), &"d".into(), Criterion::Distance);
            assert_eq!(path, vec!["a".to_owned(), "b".to_owned(), "d".to_owned()]);
        }
    }
}
