//! Routing Information Base
//!
//! A [`RibTable`] is an ordered list of [`RibEntry`] rows. Tables never
//! de-duplicate: a shorter and a longer route to the same destination are
//! both retained, and lookups return the first usable match.

use crate::address::DomainAddress;
use serde::{Deserialize, Serialize};

/// QoS capabilities advertised along a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QosCapabilities {
    /// Sustainable data rate in kbit/s
    pub data_rate_kbit: u32,
    /// One-way delay in milliseconds
    pub delay_ms: u32,
    /// Whether the path delivers without loss
    pub lossless: bool,
}

impl QosCapabilities {
    /// Create a capability set
    pub fn new(data_rate_kbit: u32, delay_ms: u32, lossless: bool) -> Self {
        Self {
            data_rate_kbit,
            delay_ms,
            lossless,
        }
    }
}

/// Route entry in the routing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibEntry {
    /// Destination node or aggregated domain
    pub destination: DomainAddress,
    /// Next hop node or cluster
    pub next_hop: DomainAddress,
    /// Number of hops to destination
    pub hop_count: u32,
    /// Capabilities of the path
    pub qos: QosCapabilities,
}

impl RibEntry {
    /// Create a route entry
    pub fn new(
        destination: DomainAddress,
        next_hop: DomainAddress,
        hop_count: u32,
        qos: QosCapabilities,
    ) -> Self {
        Self {
            destination,
            next_hop,
            hop_count,
            qos,
        }
    }

    /// Explicit node-to-node route, as opposed to an aggregated link
    pub fn is_explicit(&self) -> bool {
        self.destination == self.next_hop
    }
}

/// Ordered routing table that keeps duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RibTable {
    entries: Vec<RibEntry>,
}

impl RibTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end
    pub fn push(&mut self, entry: RibEntry) {
        self.entries.push(entry);
    }

    /// Build and append an entry
    pub fn add_entry(
        &mut self,
        destination: DomainAddress,
        next_hop: DomainAddress,
        hop_count: u32,
        qos: QosCapabilities,
    ) {
        self.push(RibEntry::new(destination, next_hop, hop_count, qos));
    }

    /// First entry whose destination is exactly `destination`
    pub fn first_to(&self, destination: &DomainAddress) -> Option<&RibEntry> {
        self.entries.iter().find(|e| &e.destination == destination)
    }

    /// First entry whose destination lies inside `domain`
    pub fn first_within(&self, domain: &DomainAddress) -> Option<&RibEntry> {
        self.entries
            .iter()
            .find(|e| e.destination.is_in_domain(domain))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RibEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[RibEntry] {
        &self.entries
    }
}

impl IntoIterator for RibTable {
    type Item = RibEntry;
    type IntoIter = std::vec::IntoIter<RibEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a RibTable {
    type Item = &'a RibEntry;
    type IntoIter = std::slice::Iter<'a, RibEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<RibEntry> for RibTable {
    fn from_iter<I: IntoIterator<Item = RibEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<RibEntry> for RibTable {
    fn extend<I: IntoIterator<Item = RibEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
