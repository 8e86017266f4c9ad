//! Hierarchical domain addresses
//!
//! A [`DomainAddress`] is a dot-separated path in a fixed-depth tree. Leaf
//! nodes use the full depth (`"1.1.1"` for a height of 3), clusters use a
//! prefix of their members' addresses (`"1.1"`, `"1"`), and the empty
//! address is the root domain that contains everything.

use crate::error::{MeshError, MeshResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default tree depth, re-exported from the core configuration.
pub const HIERARCHY_HEIGHT: usize = hiernet_core::DEFAULT_HIERARCHY_HEIGHT;

const SEPARATOR: char = '.';

/// Opaque hierarchical address of a node or a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainAddress(String);

impl DomainAddress {
    /// Parse an address, rejecting empty or whitespace components.
    ///
    /// The empty string parses to the root domain.
    pub fn parse(input: &str) -> MeshResult<Self> {
        if input.is_empty() {
            return Ok(Self::root());
        }

        for component in input.split(SEPARATOR) {
            if component.is_empty() {
                return Err(MeshError::InvalidAddress {
                    address: input.to_string(),
                    reason: "empty component".to_string(),
                });
            }
            if component.chars().any(char::is_whitespace) {
                return Err(MeshError::InvalidAddress {
                    address: input.to_string(),
                    reason: format!("component '{}' contains whitespace", component),
                });
            }
        }

        Ok(Self(input.to_string()))
    }

    /// The root domain
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path components from the top of the tree downwards.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|c| !c.is_empty())
    }

    /// Number of components; zero for the root.
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// True if this address lies in the subtree rooted at `domain`.
    ///
    /// Matching is per component, so `"1.10.2"` is not inside `"1.1"`.
    pub fn is_in_domain(&self, domain: &DomainAddress) -> bool {
        let mut own = self.components();
        domain.components().all(|c| own.next() == Some(c))
    }

    /// Ancestor domain at `depth`, or the address itself if it is not deeper.
    pub fn domain(&self, depth: usize) -> DomainAddress {
        if depth >= self.depth() {
            return self.clone();
        }
        let prefix: Vec<&str> = self.components().take(depth).collect();
        Self(prefix.join("."))
    }

    /// Enclosing domain, `None` for the root.
    pub fn parent(&self) -> Option<DomainAddress> {
        match self.depth() {
            0 => None,
            depth => Some(self.domain(depth - 1)),
        }
    }
}

impl fmt::Display for DomainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl FromStr for DomainAddress {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DomainAddress {
    type Error = MeshError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for DomainAddress {
    type Error = MeshError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DomainAddress> for String {
    fn from(address: DomainAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for DomainAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
