//! Cluster coordinators
//!
//! A [`Coordinator`] manages either leaf entities (hierarchy level 0) or child
//! coordinators (level > 0). It aggregates the external reachability of its
//! cluster ([`Coordinator::rib`]) and pushes routes discovered by one member to
//! every other member ([`Coordinator::update_routing`]).
//!
//! # Locking
//!
//! Each coordinator has a single mutex over its membership. A routing pass
//! holds it from the recursive descent through delivery, so readers see either
//! the state before or after a pass. Nested calls only ever lock children, and
//! membership is a tree, so locks are always taken parent first.

use crate::address::{DomainAddress, HIERARCHY_HEIGHT};
use crate::entity::ManagedEntity;
use crate::error::{MeshError, MeshResult};
use crate::node::Node;
use crate::routing::{QosCapabilities, RibEntry, RibTable};
use crate::sync::lock_mutex;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::{debug, error, info, trace, warn};

/// Hop count of a route pushed from a gateway to the rest of its cluster:
/// one hop to the gateway, one across the cluster boundary.
pub const CLUSTER_PUSH_HOP_COUNT: u32 = 2;

/// Members of a cluster, keyed by hierarchy level.
#[derive(Debug)]
pub enum Members {
    /// Leaf entities of a level-0 cluster
    Entities(Vec<Arc<dyn ManagedEntity>>),
    /// Child clusters of a higher coordinator
    Coordinators(Vec<Arc<Coordinator>>),
}

impl Members {
    fn for_level(level: usize) -> Self {
        if level == 0 {
            Members::Entities(Vec::new())
        } else {
            Members::Coordinators(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Members::Entities(entities) => entities.len(),
            Members::Coordinators(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entries queued for one member during a routing pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushTable {
    pub member: DomainAddress,
    pub entries: RibTable,
}

/// Outcome of one [`Coordinator::update_routing`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingPassReport {
    pub cluster: DomainAddress,
    pub hierarchy_level: usize,
    /// One table per member, in member order
    pub push_tables: Vec<PushTable>,
    /// Entries that reached a member
    pub accepted: usize,
    /// Entries a child refused as a loop or as unusable
    pub rejected: usize,
    /// Reports of child coordinators, updated before this level
    pub children: Vec<RoutingPassReport>,
}

impl RoutingPassReport {
    /// Entries queued at this level
    pub fn pushed(&self) -> usize {
        self.push_tables.iter().map(|t| t.entries.len()).sum()
    }

    /// Entries accepted at this level and below
    pub fn total_accepted(&self) -> usize {
        self.accepted + self.children.iter().map(Self::total_accepted).sum::<usize>()
    }

    /// Report of the pass at `cluster`, searching this subtree
    pub fn find(&self, cluster: &DomainAddress) -> Option<&RoutingPassReport> {
        if &self.cluster == cluster {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(cluster))
    }

    /// Push table prepared for `member`
    pub fn push_table(&self, member: &DomainAddress) -> Option<&RibTable> {
        self.push_tables
            .iter()
            .find(|t| &t.member == member)
            .map(|t| &t.entries)
    }
}

/// Routing coordinator of one cluster
pub struct Coordinator {
    cluster_address: DomainAddress,
    hierarchy_level: usize,
    hierarchy_height: usize,
    superior: OnceLock<Weak<Coordinator>>,
    members: Mutex<Members>,
}

impl Coordinator {
    /// Coordinator for a tree of the default [`HIERARCHY_HEIGHT`].
    pub fn new(cluster_address: DomainAddress, hierarchy_level: usize) -> Self {
        Self::with_height(cluster_address, hierarchy_level, HIERARCHY_HEIGHT)
    }

    /// Coordinator for a tree whose leaf addresses have `hierarchy_height`
    /// components.
    pub fn with_height(
        cluster_address: DomainAddress,
        hierarchy_level: usize,
        hierarchy_height: usize,
    ) -> Self {
        let expected_depth = hierarchy_height.saturating_sub(1 + hierarchy_level);
        if cluster_address.depth() != expected_depth {
            warn!(
                cluster = %cluster_address,
                level = hierarchy_level,
                expected_depth,
                "Cluster address depth does not match hierarchy level"
            );
        }
        info!(
            cluster = %cluster_address,
            level = hierarchy_level,
            "Creating coordinator"
        );

        Self {
            cluster_address,
            hierarchy_level,
            hierarchy_height,
            superior: OnceLock::new(),
            members: Mutex::new(Members::for_level(hierarchy_level)),
        }
    }

    pub fn cluster_address(&self) -> &DomainAddress {
        &self.cluster_address
    }

    pub fn hierarchy_level(&self) -> usize {
        self.hierarchy_level
    }

    pub fn hierarchy_height(&self) -> usize {
        self.hierarchy_height
    }

    /// Superior coordinator; `None` at the root or once it has been dropped.
    pub fn superior(&self) -> Option<Arc<Coordinator>> {
        self.superior.get().and_then(Weak::upgrade)
    }

    /// Depth at which this cluster names destinations it exposes upwards.
    pub fn aggregation_depth(&self) -> usize {
        self.hierarchy_height.saturating_sub(1 + self.hierarchy_level)
    }

    /// True if `address` lies outside this cluster's domain.
    pub fn is_foreign_address(&self, address: &DomainAddress) -> bool {
        !address.is_in_domain(&self.cluster_address)
    }

    fn lock_members(&self) -> std::sync::MutexGuard<'_, Members> {
        lock_mutex(&self.members, self.cluster_address.as_str())
    }

    /// Copy of the leaf members; empty above level 0.
    pub fn cluster_members(&self) -> Vec<Arc<dyn ManagedEntity>> {
        match &*self.lock_members() {
            Members::Entities(entities) => entities.clone(),
            Members::Coordinators(_) => Vec::new(),
        }
    }

    /// Copy of the child coordinators; empty at level 0.
    pub fn child_coordinators(&self) -> Vec<Arc<Coordinator>> {
        match &*self.lock_members() {
            Members::Entities(_) => Vec::new(),
            Members::Coordinators(children) => children.clone(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.lock_members().len()
    }

    /// Other children of this coordinator's superior.
    ///
    /// Takes the superior's lock, so it must not be called from inside a
    /// routing pass running at the superior.
    pub fn siblings(&self) -> Vec<Arc<Coordinator>> {
        match self.superior() {
            Some(superior) => superior
                .child_coordinators()
                .into_iter()
                .filter(|c| c.cluster_address != self.cluster_address)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Attach a leaf entity to this level-0 cluster.
    pub fn add_cluster_member(
        self: &Arc<Self>,
        member: Arc<dyn ManagedEntity>,
    ) -> MeshResult<()> {
        let mut members = self.lock_members();

        let entities = match &mut *members {
            Members::Entities(entities) => entities,
            Members::Coordinators(_) => {
                return Err(self.reject_attach(MeshError::LevelMismatch {
                    member: member.address().to_string(),
                    cluster: self.cluster_address.to_string(),
                    level: self.hierarchy_level,
                    reason: "leaf entities belong to level 0".to_string(),
                }));
            }
        };

        if self.is_foreign_address(member.address()) {
            return Err(self.reject_attach(MeshError::OutsideDomain {
                member: member.address().to_string(),
                cluster: self.cluster_address.to_string(),
            }));
        }

        if let Err(err) = member.set_coordinator(Arc::downgrade(self)) {
            return Err(self.reject_attach(err));
        }

        info!(
            node = %member.address(),
            cluster = %self.cluster_address,
            level = self.hierarchy_level,
            "Adding node to cluster"
        );
        entities.push(member);
        Ok(())
    }

    /// Attach a child cluster one level below this one.
    pub fn add_child_coordinator(self: &Arc<Self>, child: Arc<Coordinator>) -> MeshResult<()> {
        if Arc::ptr_eq(self, &child) {
            return Err(self.reject_attach(MeshError::LevelMismatch {
                member: child.cluster_address.to_string(),
                cluster: self.cluster_address.to_string(),
                level: self.hierarchy_level,
                reason: "a coordinator cannot be its own child".to_string(),
            }));
        }
        if child.hierarchy_level + 1 != self.hierarchy_level
            || child.hierarchy_height != self.hierarchy_height
        {
            return Err(self.reject_attach(MeshError::LevelMismatch {
                member: child.cluster_address.to_string(),
                cluster: self.cluster_address.to_string(),
                level: self.hierarchy_level,
                reason: format!(
                    "child is at level {} of a height-{} tree",
                    child.hierarchy_level, child.hierarchy_height
                ),
            }));
        }
        if self.is_foreign_address(&child.cluster_address) {
            return Err(self.reject_attach(MeshError::OutsideDomain {
                member: child.cluster_address.to_string(),
                cluster: self.cluster_address.to_string(),
            }));
        }

        let mut members = self.lock_members();
        let Members::Coordinators(children) = &mut *members else {
            // Unreachable while levels agree, kept for a level-0 parent
            return Err(self.reject_attach(MeshError::LevelMismatch {
                member: child.cluster_address.to_string(),
                cluster: self.cluster_address.to_string(),
                level: self.hierarchy_level,
                reason: "level-0 clusters hold leaf entities".to_string(),
            }));
        };

        if child.superior.set(Arc::downgrade(self)).is_err() {
            return Err(self.reject_attach(MeshError::AlreadyAttached {
                address: child.cluster_address.to_string(),
            }));
        }

        info!(
            child = %child.cluster_address,
            cluster = %self.cluster_address,
            level = self.hierarchy_level,
            "Adding child coordinator"
        );
        children.push(child);
        Ok(())
    }

    fn reject_attach(&self, err: MeshError) -> MeshError {
        error!(cluster = %self.cluster_address, error = %err, "Attach rejected");
        err
    }

    /// Aggregated routes leading out of this cluster.
    ///
    /// Level 0 reads the tables of gateway members, higher levels query the
    /// children's own aggregates. Destinations inside this domain are dropped
    /// and the rest are truncated to [`Self::aggregation_depth`]. Duplicates
    /// are kept.
    pub fn rib(&self) -> RibTable {
        let members = self.lock_members();
        let mut result = RibTable::new();

        match &*members {
            Members::Entities(entities) => {
                for entity in entities.iter().filter(|e| e.is_gateway()) {
                    self.collect_foreign(entity.address(), entity.rib(), &mut result);
                }
            }
            Members::Coordinators(children) => {
                for child in children {
                    self.collect_foreign(child.cluster_address(), child.rib(), &mut result);
                }
            }
        }

        trace!(
            cluster = %self.cluster_address,
            level = self.hierarchy_level,
            routes = result.len(),
            "Aggregated cluster RIB"
        );
        result
    }

    fn collect_foreign(&self, source: &DomainAddress, table: RibTable, out: &mut RibTable) {
        let depth = self.aggregation_depth();
        for entry in table {
            if !self.is_foreign_address(&entry.destination) {
                continue;
            }
            let domain = entry.destination.domain(depth);
            trace!(
                cluster = %self.cluster_address,
                source = %source,
                destination = %entry.destination,
                domain = %domain,
                "Found route to foreign domain"
            );
            out.push(RibEntry {
                destination: domain,
                ..entry
            });
        }
    }

    /// Run a routing pass over this cluster and everything below it.
    ///
    /// Members are refreshed first, then routes learned by one member are
    /// queued for every other member and delivered. The membership lock is held
    /// for the whole pass.
    pub fn update_routing(&self) -> RoutingPassReport {
        let members = self.lock_members();
        debug!(
            cluster = %self.cluster_address,
            level = self.hierarchy_level,
            members = members.len(),
            "Updating routing"
        );

        match &*members {
            Members::Entities(entities) => self.update_entities(entities),
            Members::Coordinators(children) => self.update_children(children),
        }
    }

    fn update_entities(&self, entities: &[Arc<dyn ManagedEntity>]) -> RoutingPassReport {
        for entity in entities {
            entity.update_routing();
        }

        let depth = self.aggregation_depth();
        let mut push_tables = vec![RibTable::new(); entities.len()];

        for gateway in entities.iter().filter(|e| e.is_gateway()) {
            let gateway_address = gateway.address();

            for entry in gateway.rib() {
                if !self.is_foreign_address(&entry.destination) {
                    continue;
                }
                let destination = entry.destination.domain(depth);
                debug!(
                    cluster = %self.cluster_address,
                    gateway = %gateway_address,
                    destination = %entry.destination,
                    next_hop = %entry.next_hop,
                    "Found gateway route"
                );

                for (member, table) in entities.iter().zip(push_tables.iter_mut()) {
                    if member.address() == gateway_address {
                        continue;
                    }
                    Node::add_rib_entry_to(
                        member.address(),
                        table,
                        destination.clone(),
                        gateway_address.clone(),
                        CLUSTER_PUSH_HOP_COUNT,
                        entry.qos,
                    );
                }
            }
        }

        let mut accepted = 0;
        for (member, table) in entities.iter().zip(&push_tables) {
            for entry in table {
                member.add_rib_entry(
                    entry.destination.clone(),
                    entry.next_hop.clone(),
                    entry.hop_count,
                    entry.qos,
                );
                accepted += 1;
            }
        }

        debug!(
            cluster = %self.cluster_address,
            accepted,
            "Cluster topology distributed"
        );

        RoutingPassReport {
            cluster: self.cluster_address.clone(),
            hierarchy_level: self.hierarchy_level,
            push_tables: entities
                .iter()
                .zip(push_tables)
                .map(|(member, entries)| PushTable {
                    member: member.address().clone(),
                    entries,
                })
                .collect(),
            accepted,
            rejected: 0,
            children: Vec::new(),
        }
    }

    fn update_children(&self, children: &[Arc<Coordinator>]) -> RoutingPassReport {
        let child_reports: Vec<RoutingPassReport> =
            children.iter().map(|child| child.update_routing()).collect();

        let foreign_depth = self.aggregation_depth();
        let sibling_depth = foreign_depth + 1;
        let mut push_tables = vec![RibTable::new(); children.len()];

        for source in children {
            let source_address = source.cluster_address();

            // Explicit node-to-node routes stay inside the child cluster
            for entry in source.rib().into_iter().filter(|e| !e.is_explicit()) {
                let domain = if self.is_foreign_address(&entry.destination) {
                    entry.destination.domain(foreign_depth)
                } else {
                    entry.destination.domain(sibling_depth)
                };
                debug!(
                    cluster = %self.cluster_address,
                    child = %source_address,
                    destination = %entry.destination,
                    domain = %domain,
                    "Found child cluster route"
                );

                for (target, table) in children.iter().zip(push_tables.iter_mut()) {
                    let target_address = target.cluster_address();
                    if target_address == source_address || *target_address == domain {
                        continue;
                    }
                    trace!(
                        target = %target_address,
                        domain = %domain,
                        via = %source_address,
                        "Queueing cluster route"
                    );
                    // One hop across this level, one across the source cluster
                    table.add_entry(
                        domain.clone(),
                        source_address.clone(),
                        entry.hop_count + 2,
                        entry.qos,
                    );
                }
            }
        }

        let mut accepted = 0;
        let mut rejected = 0;
        for (target, table) in children.iter().zip(&push_tables) {
            for entry in table {
                if target.distribute_rib_entry(
                    &entry.destination,
                    &entry.next_hop,
                    entry.hop_count,
                    entry.qos,
                ) {
                    accepted += 1;
                } else {
                    rejected += 1;
                }
            }
        }

        debug!(
            cluster = %self.cluster_address,
            accepted,
            rejected,
            "Coordinator topology distributed"
        );

        RoutingPassReport {
            cluster: self.cluster_address.clone(),
            hierarchy_level: self.hierarchy_level,
            push_tables: children
                .iter()
                .zip(push_tables)
                .map(|(child, entries)| PushTable {
                    member: child.cluster_address().clone(),
                    entries,
                })
                .collect(),
            accepted,
            rejected,
            children: child_reports,
        }
    }

    /// Offer one route to this cluster from outside.
    ///
    /// The route is refused if `next_cluster` lies inside this domain (it
    /// would loop back) or if no existing aggregate leads to `next_cluster`.
    /// Only a single existing route is composed with the offered one, so
    /// paths needing two or more intermediate clusters are dropped.
    ///
    /// Returns `true` if the route was distributed to the members.
    pub fn distribute_rib_entry(
        &self,
        destination: &DomainAddress,
        next_cluster: &DomainAddress,
        hop_count: u32,
        qos: QosCapabilities,
    ) -> bool {
        if !self.is_foreign_address(next_cluster) {
            debug!(
                cluster = %self.cluster_address,
                destination = %destination,
                next_cluster = %next_cluster,
                "Routing loop detected, dropping entry"
            );
            return false;
        }

        let rib = self.rib();
        let Some(via) = rib.first_to(next_cluster).map(|e| e.next_hop.clone()) else {
            debug!(
                cluster = %self.cluster_address,
                destination = %destination,
                next_cluster = %next_cluster,
                "No route towards next cluster, ignoring entry"
            );
            return false;
        };

        debug!(
            cluster = %self.cluster_address,
            destination = %destination,
            next_cluster = %next_cluster,
            via = %via,
            "Distributing entry"
        );

        match &*self.lock_members() {
            Members::Entities(entities) => {
                for entity in entities {
                    let hops = if entity.is_neighbor(&via) {
                        hop_count
                    } else {
                        // Reaching the intermediate hop crosses this cluster
                        hop_count + 1
                    };
                    entity.add_rib_entry(destination.clone(), next_cluster.clone(), hops, qos);
                }
            }
            Members::Coordinators(children) => {
                for child in children {
                    let child_rib = child.rib();
                    match child_rib.first_within(next_cluster) {
                        Some(entry) => {
                            child.distribute_rib_entry(
                                destination,
                                &entry.destination,
                                hop_count + 1,
                                qos,
                            );
                        }
                        None => trace!(
                            child = %child.cluster_address,
                            next_cluster = %next_cluster,
                            "Child has no link towards next cluster"
                        ),
                    }
                }
            }
        }

        true
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("cluster_address", &self.cluster_address)
            .field("hierarchy_level", &self.hierarchy_level)
            .field("hierarchy_height", &self.hierarchy_height)
            .field("has_superior", &self.superior().is_some())
            .finish_non_exhaustive()
    }
}
