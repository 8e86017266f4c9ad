//! Error types for hiernet mesh operations.
//!
//! Routing policy outcomes (loops, unusable routes) are not errors and are
//! reported through return values. The variants here cover malformed input
//! and structural misuse of the hierarchy.

use thiserror::Error;

/// Errors that can occur in mesh operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Address string could not be parsed
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// Offending input
        address: String,
        /// What is wrong with it
        reason: String,
    },

    /// Entity or coordinator already has a superior
    #[error("{address} is already attached to a coordinator")]
    AlreadyAttached {
        /// Address of the entity being attached
        address: String,
    },

    /// Attach does not fit the coordinator's level
    #[error("Cannot attach {member} to {cluster} at hierarchy level {level}: {reason}")]
    LevelMismatch {
        /// Address of the rejected member
        member: String,
        /// Address of the receiving cluster
        cluster: String,
        /// Level of the receiving cluster
        level: usize,
        /// Why the attach was refused
        reason: String,
    },

    /// Member address lies outside the cluster's domain
    #[error("{member} is not inside domain {cluster}")]
    OutsideDomain {
        /// Address of the rejected member
        member: String,
        /// Address of the receiving cluster
        cluster: String,
    },

    /// Node lookup failed
    #[error("Unknown node: {address}")]
    UnknownNode {
        /// Address that was looked up
        address: String,
    },

    /// Node declared twice in a topology
    #[error("Duplicate node: {address}")]
    DuplicateNode {
        /// Address declared more than once
        address: String,
    },

    /// Topology description is inconsistent
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] hiernet_core::CoreError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
