//! hiernet Mesh - Hierarchical routing-information distribution
//!
//! Leaf nodes discover their direct links; coordinators aggregate the
//! reachability of their cluster and push it to members and sibling clusters.
//!
//! # Core Components
//!
//! - **Domain addresses**: dot-separated paths in a fixed-depth tree
//! - **RIB tables**: ordered, non de-duplicating route lists
//! - **Nodes**: leaf entities behind the [`ManagedEntity`] contract
//! - **Coordinators**: per-cluster aggregation, propagation and loop-guarded
//!   single-entry forwarding
//! - **Topologies**: build a whole hierarchy from a declarative description
//!
//! # Example Usage
//!
//! ```rust
//! use hiernet_mesh::{DomainAddress, LinkSpec, NodeSpec, QosCapabilities, Topology, TopologySpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let addr = |s: &str| DomainAddress::parse(s);
//! let spec = TopologySpec {
//!     nodes: vec![
//!         NodeSpec { address: addr("1.1.1")? },
//!         NodeSpec { address: addr("1.1.2")? },
//!         NodeSpec { address: addr("1.2.1")? },
//!     ],
//!     links: vec![LinkSpec {
//!         a: addr("1.1.1")?,
//!         b: addr("1.2.1")?,
//!         qos: QosCapabilities::default(),
//!     }],
//! };
//!
//! let topology = Topology::build(&spec, 3)?;
//! let report = topology.update_routing();
//! println!("accepted {} routes", report.total_accepted());
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod node;
pub mod routing;
mod sync;
pub mod topology;

// Re-export main types
pub use address::{DomainAddress, HIERARCHY_HEIGHT};
pub use coordinator::{Coordinator, Members, CLUSTER_PUSH_HOP_COUNT, PushTable, RoutingPassReport};
pub use entity::ManagedEntity;
pub use error::{MeshError, MeshResult};
pub use node::{Link, Node};
pub use routing::{QosCapabilities, RibEntry, RibTable};
pub use topology::{LinkSpec, NodeSpec, RoutingSnapshot, Scenario, Topology, TopologySpec};
