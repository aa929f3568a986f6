//! End-to-end registry tests: shared handles across lookups, conflicts and
//! both network kinds.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use transnet::network::SimulationConfig;
use transnet::{Criterion, Registry, RoadNetwork, RoadNetworkConfig, TrainNetwork};

fn train_fixture() -> Arc<TrainNetwork> {
    use transnet::network::{TrainLink, TrainNode};
    let net = TrainNetwork::new();
    net.load(
        vec![
            TrainNode { user_id: 1, description: "ND".into(), ..TrainNode::default() },
            TrainNode { user_id: 2, description: "ND".into(), ..TrainNode::default() },
        ],
        vec![TrainLink {
            user_id: 10,
            from_id: 1,
            to_id: 2,
            length: 5.0,
            max_speed: 50.0,
            num_directions: 1,
            region: "ND Region".into(),
            ..TrainLink::default()
        }],
    )
    .unwrap();
    Arc::new(net)
}

// ============================================================================
// 1. Lookup returns the very handle that was added
// ============================================================================

#[test]
fn test_add_then_lookup_is_same_handle() {
    let registry = Registry::new();
    let net = train_fixture();
    registry.add_train_network("north", "metro", net.clone()).unwrap();

    let held = registry.train_network("north", "metro").unwrap();
    assert!(Arc::ptr_eq(&held, &net));

    // The handle is live: routing works through the registry copy
    let path = held.shortest_path(1, 2, Criterion::Distance);
    assert_eq!(path.node_ids, vec![1, 2]);
    assert_eq!(path.link_ids, vec![10]);

    assert!(registry.train_network("north", "other").is_none());
    assert!(registry.train_network("south", "metro").is_none());
}

// ============================================================================
// 2. A taken key refuses the add and keeps the original
// ============================================================================

#[test]
fn test_conflicting_add_is_refused() {
    let registry = Registry::new();
    let original = train_fixture();
    registry.add_train_network("north", "metro", original.clone()).unwrap();

    let usurper = Arc::new(TrainNetwork::new());
    let handed_back = registry
        .add_train_network("north", "metro", usurper.clone())
        .unwrap_err();
    assert!(Arc::ptr_eq(&handed_back, &usurper));
    assert!(Arc::ptr_eq(
        &registry.train_network("north", "metro").unwrap(),
        &original
    ));
    assert_eq!(registry.train_network_count(), 1);
}

// ============================================================================
// 3. Regions partition the name space; removal frees the key
// ============================================================================

#[test]
fn test_regions_partition_names() {
    let registry = Registry::new();
    registry.add_train_network("north", "metro", train_fixture()).unwrap();
    registry.add_train_network("south", "metro", train_fixture()).unwrap();
    registry.add_train_network("south", "freight", train_fixture()).unwrap();

    let north: Vec<String> = registry
        .train_networks_in_region("north")
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(north, vec!["metro".to_owned()]);
    let south: Vec<String> = registry
        .train_networks_in_region("south")
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(south, vec!["freight".to_owned(), "metro".to_owned()]);
    assert_eq!(registry.train_network_count(), 3);

    assert!(registry.remove_train_network("south", "metro"));
    assert!(registry.train_network("south", "metro").is_none());
    // The northern one is untouched
    assert!(registry.train_network("north", "metro").is_some());

    // Freed key can be taken again
    registry.add_train_network("south", "metro", train_fixture()).unwrap();
    assert_eq!(registry.train_network_count(), 3);
}

// ============================================================================
// 4. Road configs register alongside trains without interference
// ============================================================================

#[test]
fn test_road_and_train_share_a_region() {
    let registry = Registry::new();

    let road = Arc::new(RoadNetwork::new());
    road.set_name("downtown");
    let pair = Arc::new(RoadNetworkConfig::new(SimulationConfig::default(), road.clone()));

    registry.add_train_network("metro", "rail", train_fixture()).unwrap();
    registry.add_road_network_config("metro", "rail", pair.clone()).unwrap();

    // Same (region, name) on different kinds does not conflict
    assert!(registry.train_network("metro", "rail").is_some());
    let looked_up = registry.road_network("metro", "rail").unwrap();
    assert!(Arc::ptr_eq(&looked_up, &road));
    assert_eq!(looked_up.name().as_deref(), Some("downtown"));

    assert_eq!(registry.regions(), vec!["metro".to_owned()]);
    assert!(registry.remove_road_network_config("metro", "rail"));
    assert!(registry.road_network_config("metro", "rail").is_none());
    // Trains unaffected by road removal
    assert_eq!(registry.train_network_count(), 1);
}

// ============================================================================
// 5. Region listings carry the handles, not just the names
// ============================================================================

#[test]
fn test_region_listing_is_one_snapshot() {
    let registry = Registry::new();
    let metro = train_fixture();
    let freight = train_fixture();
    registry.add_train_network("south", "metro", metro.clone()).unwrap();
    registry.add_train_network("south", "freight", freight.clone()).unwrap();

    let road = Arc::new(RoadNetworkConfig::new(
        SimulationConfig::default(),
        Arc::new(RoadNetwork::new()),
    ));
    registry.add_road_network_config("south", "grid", road.clone()).unwrap();

    // Handles ride along with the names; no per-name re-lookup
    let listing = registry.train_networks_in_region("south");
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].0, "freight");
    assert!(Arc::ptr_eq(&listing[0].1, &freight));
    assert_eq!(listing[1].0, "metro");
    assert!(Arc::ptr_eq(&listing[1].1, &metro));

    let roads = registry.road_network_configs_in_region("south");
    assert_eq!(roads.len(), 1);
    assert!(Arc::ptr_eq(&roads[0].1, &road));

    // A removal after the capture does not reach into the listing
    assert!(registry.remove_train_network("south", "metro"));
    assert!(registry.train_network("south", "metro").is_none());
    assert!(Arc::ptr_eq(&listing[1].1, &metro));
    assert_eq!(listing[1].1.node_count(), 2);
}

// ============================================================================
// 6. Registered networks stay live: mutations show through every handle
// ============================================================================

#[test]
fn test_registered_network_is_shared_state() {
    let registry = Registry::new();
    registry.add_train_network("north", "metro", train_fixture()).unwrap();

    let a = registry.train_network("north", "metro").unwrap();
    let b = registry.train_network("north", "metro").unwrap();
    a.set_variable("schedule_rev", 12i64);

    assert_eq!(
        b.variable("schedule_rev"),
        Some(transnet::AttrValue::Int(12))
    );
}
