//! Declarative topologies
//!
//! A [`TopologySpec`] lists leaf nodes and links. [`Topology::build`] turns it
//! into live [`Node`]s plus one [`Coordinator`] per domain prefix at every
//! level, wired up to a single root coordinator for the empty domain.

use crate::address::DomainAddress;
use crate::coordinator::{Coordinator, RoutingPassReport};
use crate::entity::ManagedEntity;
use crate::error::{MeshError, MeshResult};
use crate::node::Node;
use crate::routing::{QosCapabilities, RibTable};
use hiernet_core::{Config, RoutingConfig, MIN_HIERARCHY_HEIGHT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Serialisable description of a network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySpec {
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub address: DomainAddress,
}

/// Bidirectional link between two declared nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub a: DomainAddress,
    pub b: DomainAddress,
    #[serde(default)]
    pub qos: QosCapabilities,
}

/// Simulation scenario: configuration tables plus a `[topology]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub config: Config,
    #[serde(default)]
    pub topology: TopologySpec,
}

impl Scenario {
    /// Validate the configuration and build the described topology.
    pub fn build(&self) -> MeshResult<Topology> {
        self.config.validate()?;
        Topology::from_config(&self.topology, &self.config.routing)
    }
}

/// Routing tables of every node after a pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutingSnapshot {
    pub nodes: BTreeMap<DomainAddress, RibTable>,
}

impl RoutingSnapshot {
    pub fn to_json_pretty(&self) -> MeshResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total number of routes held across all nodes
    pub fn route_count(&self) -> usize {
        self.nodes.values().map(RibTable::len).sum()
    }
}

/// Live network built from a [`TopologySpec`]
#[derive(Debug)]
pub struct Topology {
    hierarchy_height: usize,
    root: Arc<Coordinator>,
    nodes: BTreeMap<DomainAddress, Arc<Node>>,
    coordinators: BTreeMap<DomainAddress, Arc<Coordinator>>,
}

impl Topology {
    /// Build with the hierarchy height from the routing configuration.
    pub fn from_config(spec: &TopologySpec, config: &RoutingConfig) -> MeshResult<Self> {
        Self::build(spec, config.hierarchy_height)
    }

    /// Validate `spec` and build nodes, links and the coordinator tree.
    pub fn build(spec: &TopologySpec, hierarchy_height: usize) -> MeshResult<Self> {
        if hierarchy_height < MIN_HIERARCHY_HEIGHT {
            return Err(MeshError::InvalidTopology(format!(
                "hierarchy height {} is below {}",
                hierarchy_height, MIN_HIERARCHY_HEIGHT
            )));
        }
        if spec.nodes.is_empty() {
            return Err(MeshError::InvalidTopology("no nodes declared".to_string()));
        }

        let mut nodes: BTreeMap<DomainAddress, Arc<Node>> = BTreeMap::new();
        let mut node_order = Vec::with_capacity(spec.nodes.len());
        for node_spec in &spec.nodes {
            let address = &node_spec.address;
            if address.depth() != hierarchy_height {
                return Err(MeshError::InvalidTopology(format!(
                    "node {} needs {} address components",
                    address, hierarchy_height
                )));
            }
            if nodes.contains_key(address) {
                return Err(MeshError::DuplicateNode {
                    address: address.to_string(),
                });
            }
            let node = Arc::new(Node::new(address.clone()));
            nodes.insert(address.clone(), Arc::clone(&node));
            node_order.push(node);
        }

        for link in &spec.links {
            let a = lookup(&nodes, &link.a)?;
            let b = lookup(&nodes, &link.b)?;
            Node::connect(a, b, link.qos)?;
        }

        let mut coordinators: BTreeMap<DomainAddress, Arc<Coordinator>> = BTreeMap::new();

        // Level 0 keeps the declaration order of its nodes
        let leaf_depth = hierarchy_height - 1;
        let mut level: BTreeMap<DomainAddress, Arc<Coordinator>> = BTreeMap::new();
        for node in &node_order {
            let domain = node.address().domain(leaf_depth);
            let coordinator = level.entry(domain.clone()).or_insert_with(|| {
                Arc::new(Coordinator::with_height(domain, 0, hierarchy_height))
            });
            coordinator.add_cluster_member(Arc::clone(node) as Arc<dyn ManagedEntity>)?;
        }

        for hierarchy_level in 1..hierarchy_height {
            let depth = hierarchy_height - 1 - hierarchy_level;
            let mut parents: BTreeMap<DomainAddress, Arc<Coordinator>> = BTreeMap::new();
            for (address, child) in &level {
                let domain = address.domain(depth);
                let parent = parents.entry(domain.clone()).or_insert_with(|| {
                    Arc::new(Coordinator::with_height(
                        domain,
                        hierarchy_level,
                        hierarchy_height,
                    ))
                });
                parent.add_child_coordinator(Arc::clone(child))?;
            }
            coordinators.extend(level);
            level = parents;
        }

        let root = level
            .remove(&DomainAddress::root())
            .ok_or_else(|| MeshError::InvalidTopology("no root domain".to_string()))?;
        coordinators.insert(root.cluster_address().clone(), Arc::clone(&root));

        info!(
            nodes = nodes.len(),
            links = spec.links.len(),
            coordinators = coordinators.len(),
            hierarchy_height,
            "Topology built"
        );

        Ok(Self {
            hierarchy_height,
            root,
            nodes,
            coordinators,
        })
    }

    pub fn hierarchy_height(&self) -> usize {
        self.hierarchy_height
    }

    /// Coordinator of the empty root domain
    pub fn root(&self) -> &Arc<Coordinator> {
        &self.root
    }

    pub fn node(&self, address: &DomainAddress) -> MeshResult<&Arc<Node>> {
        lookup(&self.nodes, address)
    }

    pub fn coordinator(&self, address: &DomainAddress) -> Option<&Arc<Coordinator>> {
        self.coordinators.get(address)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.values()
    }

    pub fn coordinators(&self) -> impl Iterator<Item = &Arc<Coordinator>> {
        self.coordinators.values()
    }

    /// Run one routing pass from the root.
    pub fn update_routing(&self) -> RoutingPassReport {
        self.root.update_routing()
    }

    pub fn snapshot(&self) -> RoutingSnapshot {
        RoutingSnapshot {
            nodes: self
                .nodes
                .iter()
                .map(|(address, node)| (address.clone(), node.rib()))
                .collect(),
        }
    }
}

fn lookup<'a>(
    nodes: &'a BTreeMap<DomainAddress, Arc<Node>>,
    address: &DomainAddress,
) -> MeshResult<&'a Arc<Node>> {
    nodes.get(address).ok_or_else(|| MeshError::UnknownNode {
        address: address.to_string(),
    })
}
