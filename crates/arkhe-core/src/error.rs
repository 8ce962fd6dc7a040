//! Error types for Arkhe core operations

use thiserror::Error;

use crate::hypergraph::NodeId;

/// Reference and contract errors raised by the hypergraph.
///
/// Every variant is fatal to the single call that produced it; the graph is
/// left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HypergraphError {
    /// An edge (or snapshot record) referenced a node that does not exist
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// A node with this identifier is already registered
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// A hyperedge needs at least two distinct members
    #[error("Degenerate edge: {members} distinct member(s), need at least 2")]
    DegenerateEdge { members: usize },

    /// Edge weights must be finite
    #[error("Invalid edge weight: {0}")]
    InvalidWeight(f64),

    /// Snapshot could not be (de)serialized
    #[error("Snapshot serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HypergraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised while loading or validating an [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Cannot parse {key}={value}")]
    Parse { key: String, value: String },
}

/// Integrity failures reported by
/// [`EvolutionLedger::verify`](crate::ledger::EvolutionLedger::verify)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Block {index}: content hash mismatch")]
    HashMismatch { index: u64 },
    #[error("Block {index}: previous-hash link broken")]
    BrokenLink { index: u64 },
    #[error("Block {index}: out of sequence")]
    OutOfSequence { index: u64 },
}
