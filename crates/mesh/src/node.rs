//! Leaf nodes
//!
//! A [`Node`] knows its direct links and keeps its own routing table. A
//! refresh rebuilds the table from the links; coordinators then append the
//! aggregated routes they learned for the cluster.

use crate::address::DomainAddress;
use crate::coordinator::Coordinator;
use crate::entity::ManagedEntity;
use crate::error::{MeshError, MeshResult};
use crate::routing::{QosCapabilities, RibTable};
use crate::sync::{read_lock, write_lock};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock, RwLock, Weak};
use tracing::{debug, trace};

/// Direct link to another node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Address of the node at the far end
    pub peer: DomainAddress,
    /// Capabilities of the link
    pub qos: QosCapabilities,
}

#[derive(Debug, Default)]
struct NodeState {
    links: Vec<Link>,
    rib: RibTable,
}

/// Leaf participant of the simulated network
#[derive(Debug)]
pub struct Node {
    address: DomainAddress,
    coordinator: OnceLock<Weak<Coordinator>>,
    state: RwLock<NodeState>,
}

impl Node {
    /// Create an unconnected node
    pub fn new(address: DomainAddress) -> Self {
        Self {
            address,
            coordinator: OnceLock::new(),
            state: RwLock::new(NodeState::default()),
        }
    }

    /// Link two nodes in both directions.
    ///
    /// Re-linking an existing pair replaces the link's QoS.
    pub fn connect(a: &Node, b: &Node, qos: QosCapabilities) -> MeshResult<()> {
        if a.address == b.address {
            return Err(MeshError::InvalidTopology(format!(
                "node {} cannot link to itself",
                a.address
            )));
        }
        a.add_link(b.address.clone(), qos);
        b.add_link(a.address.clone(), qos);
        Ok(())
    }

    fn add_link(&self, peer: DomainAddress, qos: QosCapabilities) {
        let mut state = write_lock(&self.state, self.address.as_str());
        match state.links.iter_mut().find(|l| l.peer == peer) {
            Some(existing) => existing.qos = qos,
            None => {
                debug!(node = %self.address, peer = %peer, "Link established");
                state.links.push(Link { peer, qos });
            }
        }
    }

    /// Snapshot of the node's links
    pub fn links(&self) -> Vec<Link> {
        read_lock(&self.state, self.address.as_str()).links.clone()
    }

    /// Domain the node considers its own cluster.
    ///
    /// Falls back to the parent of the node's address until a coordinator is
    /// attached.
    pub fn cluster_domain(&self) -> DomainAddress {
        match self.coordinator() {
            Some(coordinator) => coordinator.cluster_address().clone(),
            None => self.address.parent().unwrap_or_default(),
        }
    }

    /// Append a route to an explicit table on behalf of `target`.
    ///
    /// Used when building per-member push tables for a node that is not
    /// mutated directly.
    pub fn add_rib_entry_to(
        target: &DomainAddress,
        table: &mut RibTable,
        destination: DomainAddress,
        next_hop: DomainAddress,
        hop_count: u32,
        qos: QosCapabilities,
    ) {
        trace!(
            node = %target,
            destination = %destination,
            next_hop = %next_hop,
            hop_count,
            "Queueing RIB entry"
        );
        table.add_entry(destination, next_hop, hop_count, qos);
    }
}

impl ManagedEntity for Node {
    fn address(&self) -> &DomainAddress {
        &self.address
    }

    fn is_gateway(&self) -> bool {
        let domain = self.cluster_domain();
        read_lock(&self.state, self.address.as_str())
            .links
            .iter()
            .any(|link| !link.peer.is_in_domain(&domain))
    }

    fn is_neighbor(&self, address: &DomainAddress) -> bool {
        read_lock(&self.state, self.address.as_str())
            .links
            .iter()
            .any(|link| &link.peer == address)
    }

    fn rib(&self) -> RibTable {
        read_lock(&self.state, self.address.as_str()).rib.clone()
    }

    fn add_rib_entry(
        &self,
        destination: DomainAddress,
        next_hop: DomainAddress,
        hop_count: u32,
        qos: QosCapabilities,
    ) {
        let mut state = write_lock(&self.state, self.address.as_str());
        Node::add_rib_entry_to(
            &self.address,
            &mut state.rib,
            destination,
            next_hop,
            hop_count,
            qos,
        );
    }

    fn update_routing(&self) {
        let mut state = write_lock(&self.state, self.address.as_str());
        let NodeState { links, rib } = &mut *state;

        rib.clear();
        for link in links.iter() {
            rib.add_entry(link.peer.clone(), link.peer.clone(), 1, link.qos);
        }

        debug!(node = %self.address, routes = rib.len(), "Node routing refreshed");
    }

    fn set_coordinator(&self, coordinator: Weak<Coordinator>) -> MeshResult<()> {
        self.coordinator
            .set(coordinator)
            .map_err(|_| MeshError::AlreadyAttached {
                address: self.address.to_string(),
            })
    }

    fn coordinator(&self) -> Option<Arc<Coordinator>> {
        self.coordinator.get().and_then(Weak::upgrade)
    }
}
