//! # Arkhe Core
//!
//! Building blocks of an adaptive population simulation:
//! - [`Hypergraph`]: weighted hyperedges over nodes, derived coherence
//! - [`Node`]: a state vector evolving under a swappable [`Strategy`]
//! - [`SpectralAnalyzer`]: integration measure Φ from a [`HistoryWindow`]
//! - [`LocalController`] / [`PopulationController`]: metamorphosis policies
//! - [`EvolutionLedger`]: hashed, append-only record of transitions
//!
//! Everything here is synchronous and free of I/O. The tick loop that ties
//! these together lives in `arkhe-runtime`.

pub mod config;
pub mod error;
pub mod handover;
pub mod hash;
pub mod history;
pub mod hypergraph;
pub mod ledger;
pub mod metamorphosis;
pub mod node;
pub mod numerics;
pub mod spectral;
pub mod strategy;

pub use config::EngineConfig;
pub use error::{ConfigError, HypergraphError, LedgerError};
pub use handover::{Handover, HandoverLog, HandoverProvider, PreservationProtocol};
pub use hash::ContentHash;
pub use history::HistoryWindow;
pub use hypergraph::{
    EdgeId, EdgeRecord, GraphNode, Hyperedge, Hypergraph, HypergraphSnapshot, NodeId,
};
pub use ledger::{EvolutionLedger, HashLinkage, LedgerBlock};
pub use metamorphosis::{HysteresisConfig, LocalController, LocalThresholds, PopulationController};
pub use node::{Node, NodeRules};
pub use spectral::{SpectralAnalyzer, SpectralConfig};
pub use strategy::{PopulationMode, Strategy, UnknownTag};
