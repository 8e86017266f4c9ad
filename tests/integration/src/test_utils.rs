//! Test utilities for routing integration tests

use hiernet_mesh::{
    DomainAddress, LinkSpec, NodeSpec, QosCapabilities, RibEntry, Topology, TopologySpec,
};
use std::sync::Once;

static LOGGING: Once = Once::new();

/// Route test logs through the test harness writer, once per process.
///
/// `RUST_LOG=hiernet_mesh=debug` shows individual routing decisions.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Parse a domain address, panicking on malformed test input
pub fn addr(s: &str) -> DomainAddress {
    DomainAddress::parse(s).unwrap()
}

/// QoS used for links that do not need distinct capabilities
pub fn default_qos() -> QosCapabilities {
    QosCapabilities::new(1000, 10, false)
}

/// Fluent builder for [`TopologySpec`]s
#[derive(Debug, Default)]
pub struct SpecBuilder {
    spec: TopologySpec,
}

impl SpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(mut self, addresses: &[&str]) -> Self {
        self.spec
            .nodes
            .extend(addresses.iter().map(|a| NodeSpec { address: addr(a) }));
        self
    }

    pub fn link(self, a: &str, b: &str) -> Self {
        self.link_with(a, b, default_qos())
    }

    pub fn link_with(mut self, a: &str, b: &str, qos: QosCapabilities) -> Self {
        self.spec.links.push(LinkSpec {
            a: addr(a),
            b: addr(b),
            qos,
        });
        self
    }

    pub fn spec(self) -> TopologySpec {
        self.spec
    }

    pub fn build(self, hierarchy_height: usize) -> Topology {
        Topology::build(&self.spec, hierarchy_height).unwrap()
    }
}

/// Three clusters of domain "1" joined in a line: 1.1 -- 1.2 -- 1.3.
pub fn cluster_line() -> SpecBuilder {
    SpecBuilder::new()
        .nodes(&["1.1.1", "1.1.2", "1.2.1", "1.2.2", "1.3.1", "1.3.2"])
        .link("1.1.1", "1.1.2")
        .link("1.1.2", "1.2.1")
        .link("1.2.1", "1.2.2")
        .link("1.2.2", "1.3.1")
        .link("1.3.1", "1.3.2")
}

/// Three top-level domains joined in a line: 1 -- 2 -- 3.
pub fn domain_line() -> SpecBuilder {
    SpecBuilder::new()
        .nodes(&["1.1.1", "2.1.1", "2.1.2", "3.1.1"])
        .link("1.1.1", "2.1.1")
        .link("2.1.1", "2.1.2")
        .link("2.1.2", "3.1.1")
}

/// First route of `node` towards `destination`
pub fn route(topology: &Topology, node: &str, destination: &str) -> Option<RibEntry> {
    use hiernet_mesh::ManagedEntity;

    topology
        .node(&addr(node))
        .unwrap()
        .rib()
        .first_to(&addr(destination))
        .cloned()
}
