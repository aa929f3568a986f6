//! Yen's algorithm for k shortest loopless paths.
//!
//! Classic structure: take the Dijkstra shortest path, then for each accepted
//! path branch at every spur node with the already-used continuations banned,
//! and pull the cheapest candidate off a min-heap. Costs are edge weights
//! (lengths); results come out cheapest first, ties in discovery order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use hashbrown::HashSet;

use crate::graph::{EdgeData, Graph, GraphInner, NodeKey};
use super::dijkstra::dijkstra_in;

struct Candidate<K> {
    cost: f64,
    seq: u64,
    path: Vec<K>,
}

impl<K> PartialEq for Candidate<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl<K> Eq for Candidate<K> {}

impl<K> PartialOrd for Candidate<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Candidate<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

pub(crate) fn k_shortest_in<K: NodeKey>(
    g: &GraphInner<K>,
    start: &K,
    end: &K,
    k: usize,
) -> Vec<(Vec<K>, f64)> {
    if k == 0 {
        return Vec::new();
    }
    let base_cost = |_f: &K, _t: &K, e: &EdgeData| Some(e.weight);
    let Some(first) = dijkstra_in(g, start, end, &base_cost) else {
        return Vec::new();
    };

    let mut accepted: Vec<(Vec<K>, f64)> = vec![first];
    let mut candidates: BinaryHeap<Reverse<Candidate<K>>> = BinaryHeap::new();
    let mut queued: HashSet<Vec<K>> = HashSet::new();
    let mut seq = 0u64;

    while accepted.len() < k {
        let Some((prev_path, _)) = accepted.last().cloned() else { break };

        for i in 0..prev_path.len().saturating_sub(1) {
            let spur = &prev_path[i];
            let root = &prev_path[..=i];

            // Ban the continuation edge of every accepted path sharing this
            // root, and the root's interior nodes, then search for a detour.
            let mut banned_edges: HashSet<(K, K)> = HashSet::new();
            for (p, _) in &accepted {
                if p.len() > i + 1 && p[..=i] == *root {
                    banned_edges.insert((p[i].clone(), p[i + 1].clone()));
                }
            }
            let banned_nodes: HashSet<&K> = root[..i].iter().collect();

            let spur_cost = |f: &K, t: &K, e: &EdgeData| {
                if banned_nodes.contains(f) || banned_nodes.contains(t) {
                    return None;
                }
                if banned_edges.contains(&(f.clone(), t.clone())) {
                    return None;
                }
                Some(e.weight)
            };

            let Some((spur_path, spur_path_cost)) = dijkstra_in(g, spur, end, &spur_cost) else {
                continue;
            };

            let root_cost: f64 = (0..i)
                .map(|j| {
                    g.edge(&prev_path[j], &prev_path[j + 1])
                        .map_or(0.0, |e| e.weight)
                })
                .sum();
            let mut total_path = root[..i].to_vec();
            total_path.extend(spur_path);

            let duplicate = queued.contains(&total_path)
                || accepted.iter().any(|(p, _)| *p == total_path);
            if !duplicate {
                queued.insert(total_path.clone());
                seq += 1;
                candidates.push(Reverse(Candidate {
                    cost: root_cost + spur_path_cost,
                    seq,
                    path: total_path,
                }));
            }
        }

        match candidates.pop() {
            Some(Reverse(c)) => accepted.push((c.path, c.cost)),
            None => break, // candidate pool exhausted before reaching k
        }
    }
    accepted
}

/// Up to `k` cheapest loopless paths from `start` to `end`, with costs.
///
/// Fewer than `k` come back when the graph does not contain that many
/// distinct loopless routes; an empty vector when `end` is unreachable.
pub fn k_shortest_paths<K: NodeKey>(
    graph: &Graph<K>,
    start: &K,
    end: &K,
    k: usize,
) -> Vec<(Vec<K>, f64)> {
    k_shortest_in(&graph.read_inner(), start, end, k)
}
