//! End-to-end routing tests over the public graph API.
//!
//! Each test builds a small graph through `Graph` and routes with
//! `shortest_path` / `k_shortest_paths`, checking exact node sequences and
//! costs rather than just reachability.

use pretty_assertions::assert_eq;

use transnet::model::AttrMap;
use transnet::route::{edge_travel_time, k_shortest_paths, shortest_path};
use transnet::{AttrValue, Criterion, Graph};

fn speed(max_speed: f64) -> AttrMap {
    [("max_speed".to_owned(), AttrValue::Float(max_speed))]
        .into_iter()
        .collect()
}

// ============================================================================
// 1. Linear chain: the only route comes back whole
// ============================================================================

#[test]
fn test_linear_chain() {
    let g: Graph<i64> = Graph::new();
    g.add_edge(1, 2, 10.0, AttrMap::new()).unwrap();
    g.add_edge(2, 3, 10.0, AttrMap::new()).unwrap();
    g.add_edge(3, 4, 10.0, AttrMap::new()).unwrap();

    let path = shortest_path(&g, &1, &4, Criterion::Distance);
    assert_eq!(path, vec![1, 2, 3, 4]);

    let total: f64 = path.windows(2).map(|p| g.edge_weight(&p[0], &p[1])).sum();
    assert_eq!(total, 30.0);
}

// ============================================================================
// 2. Diamond with shortcut: distance and time agree here
// ============================================================================

#[test]
fn test_diamond_with_shortcut() {
    let g: Graph<i64> = Graph::new();
    g.add_edge(1, 2, 5.0, speed(10.0)).unwrap();
    g.add_edge(2, 4, 5.0, speed(10.0)).unwrap();
    g.add_edge(1, 3, 3.0, speed(10.0)).unwrap();
    g.add_edge(3, 4, 1.0, speed(10.0)).unwrap();

    let by_distance = shortest_path(&g, &1, &4, Criterion::Distance);
    assert_eq!(by_distance, vec![1, 3, 4]);
    let total: f64 = by_distance.windows(2).map(|p| g.edge_weight(&p[0], &p[1])).sum();
    assert_eq!(total, 4.0);

    // Uniform speed: time ranks routes like distance does
    let by_time = shortest_path(&g, &1, &4, Criterion::Time);
    assert_eq!(by_time, vec![1, 3, 4]);

    // Lengths 3 + 1 at max_speed 10
    let travel: f64 = by_time
        .windows(2)
        .map(|p| edge_travel_time(g.edge_weight(&p[0], &p[1]), &g.edge_attrs(&p[0], &p[1]).unwrap()))
        .sum();
    assert!((travel - 0.4).abs() < 1e-12);
}

// ============================================================================
// 3. Disconnected target: empty result, no panic
// ============================================================================

#[test]
fn test_disconnected_returns_empty() {
    let g: Graph<i64> = Graph::new();
    g.add_edge(1, 2, 1.0, AttrMap::new()).unwrap();
    g.add_node(3, AttrMap::new());

    assert!(shortest_path(&g, &1, &3, Criterion::Distance).is_empty());
    assert_eq!(g.edge_weight(&1, &3), f64::INFINITY);
}

// ============================================================================
// 4. Yen's k = 3: exact order on the textbook diamond
// ============================================================================

#[test]
fn test_k_shortest_exact_order() {
    let g: Graph<String> = Graph::new();
    for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("b", "c")] {
        g.add_edge(from.into(), to.into(), 1.0, AttrMap::new()).unwrap();
    }

    let paths = k_shortest_paths(&g, &"a".into(), &"d".into(), 3);
    let named = |p: &[&str]| p.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();

    assert_eq!(paths.len(), 3);
    assert_eq!(paths[0], (named(&["a", "b", "d"]), 2.0));
    assert_eq!(paths[1], (named(&["a", "c", "d"]), 2.0));
    assert_eq!(paths[2], (named(&["a", "b", "c", "d"]), 3.0));

    // Costs never decrease, paths are mutually distinct
    for w in paths.windows(2) {
        assert!(w[0].1 <= w[1].1);
        assert!(w[0].0 != w[1].0);
    }
}

// ============================================================================
// 5. Routing sees writes: remove the best edge, get the detour
// ============================================================================

#[test]
fn test_routing_follows_mutation() {
    let g: Graph<i64> = Graph::new();
    g.add_edge(1, 2, 1.0, AttrMap::new()).unwrap();
    g.add_edge(2, 3, 1.0, AttrMap::new()).unwrap();
    g.add_edge(1, 3, 1.5, AttrMap::new()).unwrap();

    assert_eq!(shortest_path(&g, &1, &3, Criterion::Distance), vec![1, 3]);

    assert!(g.remove_edge(&1, &3));
    assert_eq!(shortest_path(&g, &1, &3, Criterion::Distance), vec![1, 2, 3]);

    g.set_edge_weight(&1, &2, 10.0).unwrap();
    assert!(shortest_path(&g, &1, &3, Criterion::Distance).len() == 3);
    assert!(g.remove_node(&2));
    assert!(shortest_path(&g, &1, &3, Criterion::Distance).is_empty());
}

// ============================================================================
// 6. Criterion parsing: exact lowercase names only
// ============================================================================

#[test]
fn test_criterion_parsing() {
    assert_eq!("distance".parse::<Criterion>().unwrap(), Criterion::Distance);
    assert_eq!("time".parse::<Criterion>().unwrap(), Criterion::Time);

    // Alternate spellings are unknown names, same as anything else
    assert!("TIME".parse::<Criterion>().is_err());
    assert!("Distance".parse::<Criterion>().is_err());
    let err = "speed".parse::<Criterion>().unwrap_err();
    assert!(matches!(err, transnet::Error::InvalidCriterion(ref s) if s == "speed"));
}

// ============================================================================
// 7. Time criterion falls back to distance without a speed attribute
// ============================================================================

#[test]
fn test_time_without_speed_falls_back_to_length() {
    let g: Graph<i64> = Graph::new();
    // Fast long edge vs slow-looking short chain with no speed at all
    g.add_edge(1, 3, 100.0, speed(100.0)).unwrap();
    g.add_edge(1, 2, 0.4, AttrMap::new()).unwrap();
    g.add_edge(2, 3, 0.4, AttrMap::new()).unwrap();

    // Chain costs 0.4 + 0.4 = 0.8 raw length, direct edge 100/100 = 1.0
    let path = shortest_path(&g, &1, &3, Criterion::Time);
    assert_eq!(path, vec![1, 2, 3]);
}
