//! Boundary contract between a level-0 coordinator and the leaf entities it
//! manages.

use crate::address::DomainAddress;
use crate::coordinator::Coordinator;
use crate::error::MeshResult;
use crate::routing::{QosCapabilities, RibTable};
use std::fmt;
use std::sync::{Arc, Weak};

/// A leaf participant that owns its locally discovered routes.
///
/// Implementations must be safe to call from several threads. A coordinator
/// only ever calls into an entity while holding its own membership lock, so an
/// entity must not take that lock from inside these methods (no `rib`,
/// `update_routing` or attach calls on its coordinator). Lock-free reads such
/// as [`Coordinator::cluster_address`] through [`Self::coordinator`] are fine.
pub trait ManagedEntity: Send + Sync + fmt::Debug {
    /// Leaf address of this entity
    fn address(&self) -> &DomainAddress;

    /// True if at least one link leaves the entity's cluster domain
    fn is_gateway(&self) -> bool;

    /// True if `address` is reachable without intermediate hops
    fn is_neighbor(&self, address: &DomainAddress) -> bool;

    /// Snapshot of the entity's routing table
    fn rib(&self) -> RibTable;

    /// Append a route to the entity's routing table
    fn add_rib_entry(
        &self,
        destination: DomainAddress,
        next_hop: DomainAddress,
        hop_count: u32,
        qos: QosCapabilities,
    );

    /// Refresh locally discovered routes
    fn update_routing(&self);

    /// Record the managing coordinator. Succeeds at most once.
    fn set_coordinator(&self, coordinator: Weak<Coordinator>) -> MeshResult<()>;

    /// Managing coordinator, if attached and still alive
    fn coordinator(&self) -> Option<Arc<Coordinator>>;
}
