//! Node: one dynamical unit of the population
//!
//! A node owns its state vector, its active [`Strategy`], the last computed
//! integration measure and a bounded history of snapshots. Nodes never hold
//! references to each other; coupling arrives through the field passed into
//! [`Node::step`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::history::HistoryWindow;
use crate::hypergraph::NodeId;
use crate::metamorphosis::LocalController;
use crate::numerics::shannon_entropy;
use crate::spectral::SpectralAnalyzer;
use crate::strategy::Strategy;

/// Histogram resolution for [`Node::state_entropy`]
const STATE_ENTROPY_BINS: usize = 10;

/// Parameters shared by every node of a population
#[derive(Debug, Clone)]
pub struct NodeRules {
    /// Integration step
    pub dt: f64,
    /// Ticks between spectral analyses (and metamorphosis proposals)
    pub analysis_interval: u64,
    pub analyzer: SpectralAnalyzer,
    pub controller: LocalController,
}

impl NodeRules {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            dt: config.dt,
            analysis_interval: config.analysis_interval.max(1),
            analyzer: SpectralAnalyzer::new(config.spectral),
            controller: LocalController::new(config.local),
        }
    }
}

impl Default for NodeRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// A single evolving state vector
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    state: Vec<f64>,
    strategy: Strategy,
    integration: f64,
    measured: bool,
    history: HistoryWindow,
    ticks: u64,
    rng: StdRng,
}

impl Node {
    /// Create a node with a uniformly random state in `[0, 1)`
    pub fn new(id: NodeId, dim: usize, history_capacity: usize, mut rng: StdRng) -> Self {
        let state = (0..dim).map(|_| rng.gen::<f64>()).collect();
        Self {
            id,
            state,
            strategy: Strategy::default(),
            integration: 0.0,
            measured: false,
            history: HistoryWindow::new(history_capacity),
            ticks: 0,
            rng,
        }
    }

    /// Deterministic node for a given seed
    pub fn with_seed(id: NodeId, dim: usize, history_capacity: usize, seed: u64) -> Self {
        Self::new(id, dim, history_capacity, StdRng::seed_from_u64(seed))
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Last computed integration measure
    pub fn integration(&self) -> f64 {
        self.integration
    }

    /// Whether an integration measure has been computed from a full enough
    /// window at least once
    pub fn is_measured(&self) -> bool {
        self.measured
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Normalised histogram entropy of the current state
    pub fn state_entropy(&self) -> f64 {
        shannon_entropy(&self.state, STATE_ENTROPY_BINS)
    }

    /// Mean of the state vector
    pub fn mean_state(&self) -> f64 {
        crate::numerics::mean(&self.state)
    }

    /// Advance one tick under the active strategy.
    ///
    /// Every `analysis_interval` ticks the integration measure is refreshed
    /// from the history window and the local controller is consulted; a
    /// returned strategy is a proposal the caller may apply with
    /// [`Node::apply_strategy`]. While the window holds fewer than
    /// `min_samples` snapshots the previous measure is kept and nothing is
    /// proposed.
    pub fn step(&mut self, field: &[f64], external: f64, rules: &NodeRules) -> Option<Strategy> {
        let complexity = SpectralAnalyzer::normalised(self.integration, self.history.capacity());
        self.state = self.strategy.apply(
            &self.state,
            field,
            external,
            rules.dt,
            complexity,
            &mut self.rng,
        );
        self.history.push(self.state.clone());
        self.ticks += 1;

        if self.ticks % rules.analysis_interval != 0
            || self.history.len() < rules.analyzer.config.min_samples
        {
            return None;
        }

        self.integration = rules.analyzer.integration(&self.history);
        self.measured = true;
        rules
            .controller
            .propose(self.strategy, self.integration, self.state_entropy())
    }

    /// Swap the active strategy, returning the previous one
    pub fn apply_strategy(&mut self, strategy: Strategy) -> Strategy {
        std::mem::replace(&mut self.strategy, strategy)
    }

    /// Reinitialise the state to fresh random values in place.
    ///
    /// Identity, strategy and the last integration measure are kept; the
    /// history restarts so the next analysis only sees post-reset snapshots.
    pub fn reinitialize(&mut self) {
        for v in &mut self.state {
            *v = self.rng.gen::<f64>();
        }
        self.history.clear();
    }
}
