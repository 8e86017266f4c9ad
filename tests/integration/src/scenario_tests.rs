//! Scenario files as read by `hiernet-sim`

use crate::test_utils::*;
use hiernet_core::MIN_HIERARCHY_HEIGHT;
use hiernet_mesh::{MeshError, Scenario};

const SAMPLE_SCENARIO: &str = include_str!("../../../services/hiernet-sim/scenario.toml");

fn parse(raw: &str) -> Scenario {
    toml::from_str(raw).unwrap()
}

#[test]
fn test_sample_scenario_runs() {
    init_test_logging();
    let scenario = parse(SAMPLE_SCENARIO);
    assert_eq!(scenario.config.routing.hierarchy_height, 2);
    assert_eq!(scenario.topology.nodes.len(), 6);

    let topology = scenario.build().unwrap();
    let report = topology.update_routing();
    assert_eq!(report.accepted, 5);
    assert_eq!(report.rejected, 1);

    // The route to domain 3 keeps the QoS of the 2.2 -- 3.1 link
    let to_three = route(&topology, "1.1", "3").unwrap();
    assert_eq!(to_three.next_hop, addr("2"));
    assert_eq!(to_three.hop_count, 4);
    assert_eq!(to_three.qos.delay_ms, 80);
    assert!(to_three.qos.lossless);
    assert_eq!(route(&topology, "1.2", "3").unwrap().hop_count, 5);

    let to_one = route(&topology, "3.1", "1").unwrap();
    assert_eq!(to_one.next_hop, addr("2"));
    assert_eq!(to_one.hop_count, 3);
    assert_eq!(route(&topology, "3.2", "1").unwrap().hop_count, 4);
}

#[test]
fn test_scenario_defaults() {
    let scenario = parse(
        r#"
[[topology.nodes]]
address = "1.1.1"
"#,
    );
    assert_eq!(scenario.config.routing.hierarchy_height, 3);
    assert_eq!(scenario.config.simulation.passes, 1);
    assert!(!scenario.config.logging.json);
    assert!(scenario.topology.links.is_empty());
    assert!(scenario.build().is_ok());
}

#[test]
fn test_invalid_scenarios_are_rejected() {
    let too_flat = parse(&format!(
        "[routing]\nhierarchy_height = {}\n[[topology.nodes]]\naddress = \"1\"\n",
        MIN_HIERARCHY_HEIGHT - 1
    ));
    assert!(matches!(too_flat.build(), Err(MeshError::Config(_))));

    let wrong_depth = parse("[[topology.nodes]]\naddress = \"1.1\"\n");
    assert!(matches!(
        wrong_depth.build(),
        Err(MeshError::InvalidTopology(_))
    ));

    let dangling = parse(
        r#"
[[topology.nodes]]
address = "1.1.1"

[[topology.links]]
a = "1.1.1"
b = "2.1.1"
"#,
    );
    assert!(matches!(dangling.build(), Err(MeshError::UnknownNode { .. })));

    assert!(toml::from_str::<Scenario>("[[topology.nodes]]\naddress = \"1..1\"\n").is_err());
}

#[test]
fn test_snapshot_serializes_addresses_as_strings() {
    let topology = parse(SAMPLE_SCENARIO).build().unwrap();
    topology.update_routing();

    let json = topology.snapshot().to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let table = value["nodes"]["1.2"].as_array().unwrap();
    assert_eq!(table[0]["destination"], "1.1");
    assert_eq!(table[0]["hop_count"], 1);
}
