//! Multi-level route propagation tests

use crate::test_utils::*;
use hiernet_mesh::{Coordinator, ManagedEntity, Node, QosCapabilities, CLUSTER_PUSH_HOP_COUNT};
use std::sync::Arc;

#[test]
fn test_gateway_route_reaches_cluster_members() {
    init_test_logging();

    // Cluster 1.1 with gateway n1 towards 2.3.7 and a member n2 that does
    // not neighbour n1, in a two-level tree so "2.3.7" aggregates to "2"
    let coordinator = Arc::new(Coordinator::with_height(addr("1.1"), 0, 2));
    let n1 = Arc::new(Node::new(addr("1.1.1")));
    let n2 = Arc::new(Node::new(addr("1.1.2")));
    let foreign = Node::new(addr("2.3.7"));
    Node::connect(&n1, &foreign, default_qos()).unwrap();
    coordinator.add_cluster_member(n1.clone()).unwrap();
    coordinator.add_cluster_member(n2.clone()).unwrap();

    n1.add_rib_entry(addr("2.3.7"), addr("1.1.1"), 1, default_qos());
    let rib = coordinator.rib();
    assert_eq!(rib.len(), 1);
    assert_eq!(rib.entries()[0].destination, addr("2"));
    assert_eq!(rib.entries()[0].next_hop, addr("1.1.1"));
    assert_eq!(rib.entries()[0].hop_count, 1);

    coordinator.update_routing();
    let learned = n2.rib().first_to(&addr("2")).cloned().unwrap();
    assert_eq!(learned.next_hop, addr("1.1.1"));
    assert_eq!(learned.hop_count, 2);
}

#[test]
fn test_routes_cross_sibling_clusters() {
    init_test_logging();
    let topology = cluster_line().build(3);

    let report = topology.update_routing();

    // Level 0: neighbouring clusters are learned through the local gateway
    let to_neighbour = route(&topology, "1.1.1", "1.2").unwrap();
    assert_eq!(to_neighbour.next_hop, addr("1.1.2"));
    assert_eq!(to_neighbour.hop_count, CLUSTER_PUSH_HOP_COUNT);

    // Level 1: cluster 1.3 learns 1.1 through cluster 1.2
    let at_gateway = route(&topology, "1.3.1", "1.1").unwrap();
    assert_eq!(at_gateway.next_hop, addr("1.2"));
    assert_eq!(at_gateway.hop_count, 3);
    let at_member = route(&topology, "1.3.2", "1.1").unwrap();
    assert_eq!(at_member.next_hop, addr("1.2"));
    assert_eq!(at_member.hop_count, 4);

    // And the other way round. The first aggregate 1.2 offers towards 1.3
    // was itself pushed inside 1.2, so it starts one hop further out
    let at_gateway = route(&topology, "1.1.2", "1.3").unwrap();
    assert_eq!(at_gateway.next_hop, addr("1.2"));
    assert_eq!(at_gateway.hop_count, 4);
    assert_eq!(route(&topology, "1.1.1", "1.3").unwrap().hop_count, 5);

    // Cluster 1.3 has no aggregate towards 1.1 for "1.2 via 1.1"
    let level1 = report.find(&addr("1")).unwrap();
    assert_eq!(level1.accepted, 5);
    assert_eq!(level1.rejected, 1);

    // Everything stays inside domain "1", so the root has nothing to share
    assert!(topology.coordinator(&addr("1")).unwrap().rib().is_empty());
    assert_eq!(report.pushed(), 0);
}

#[test]
fn test_middle_cluster_learns_nothing_new() {
    let topology = cluster_line().build(3);
    let report = topology.update_routing();

    // Both neighbours name 1.2 itself as the destination, which is skipped
    let level1 = report.find(&addr("1")).unwrap();
    assert!(level1.push_table(&addr("1.2")).unwrap().is_empty());
    assert!(route(&topology, "1.2.1", "1.1").is_none());
    assert_eq!(
        route(&topology, "1.2.2", "1.1").unwrap().hop_count,
        CLUSTER_PUSH_HOP_COUNT
    );
}

#[test]
fn test_routes_descend_through_higher_coordinators() {
    init_test_logging();
    let topology = domain_line().build(3);

    let report = topology.update_routing();

    // Domain 3 reaches domain 1 through domain 2, forwarded from the root via
    // coordinator "3" into cluster "3.1"
    let learned = route(&topology, "3.1.1", "1").unwrap();
    assert_eq!(learned.next_hop, addr("2.1"));
    assert_eq!(learned.hop_count, 4);

    let learned = route(&topology, "1.1.1", "3").unwrap();
    assert_eq!(learned.next_hop, addr("2.1"));
    assert_eq!(learned.hop_count, 5);

    assert_eq!(report.accepted, 5);
    assert_eq!(report.rejected, 1);
    // "2 via 1" is offered to domain 3 but it knows no route to domain 1
    let offered = report.push_table(&addr("3")).unwrap();
    assert_eq!(offered.entries()[0].destination, addr("2"));
    assert_eq!(offered.entries()[0].next_hop, addr("1"));
}

#[test]
fn test_loop_is_refused_by_receiving_cluster() {
    let topology = domain_line().build(3);
    topology.update_routing();

    let one = topology.coordinator(&addr("1")).unwrap();
    let before = topology.snapshot();

    // A route whose next cluster lies inside "1" would loop back
    assert!(!one.distribute_rib_entry(&addr("3"), &addr("1.1"), 2, QosCapabilities::default()));
    assert_eq!(topology.snapshot(), before);
}

#[test]
fn test_passes_are_repeatable() {
    let topology = domain_line().build(3);

    let first = topology.update_routing();
    let first_snapshot = topology.snapshot();
    let second = topology.update_routing();

    assert_eq!(first, second);
    assert_eq!(topology.snapshot(), first_snapshot);
}

#[test]
fn test_isolated_cluster_stays_quiet() {
    let topology = SpecBuilder::new()
        .nodes(&["1.1.1", "1.1.2", "2.1.1"])
        .link("1.1.1", "1.1.2")
        .build(3);

    let report = topology.update_routing();

    assert_eq!(report.total_accepted(), 0);
    assert!(topology.coordinator(&addr("1.1")).unwrap().rib().is_empty());
    assert!(route(&topology, "2.1.1", "1").is_none());
    assert_eq!(route(&topology, "1.1.1", "1.1.2").unwrap().hop_count, 1);
}
