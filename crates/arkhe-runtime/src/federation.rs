//! Federation - owns a population and drives it tick by tick
//!
//! Per tick:
//! 1. sample the environmental signal (clamped to `[0, 1]`)
//! 2. take the mean field of the previous tick's node states
//! 3. evolve that field under the current population mode
//! 4. step every node in parallel against the evolved field
//! 5. apply proposed metamorphoses serially, in node order, recording each
//! 6. refresh graph coherence and, once per analysis cycle, consult the
//!    population controller (only after every node has a measured Φ)
//! 7. hand a [`TickReport`] to every observer

use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use arkhe_core::numerics::{mean, mean_field, standard_deviation};
use arkhe_core::{
    ConfigError, EdgeId, EngineConfig, EvolutionLedger, HandoverProvider, Hypergraph,
    HypergraphError, LedgerBlock, Node, NodeId, NodeRules, PopulationController, PopulationMode,
    SpectralAnalyzer,
};

use crate::observer::{TickObserver, TracingObserver};
use crate::signal::{sanitize, EntropySource};

/// Ledger subject used for population mode switches
pub const FEDERATION_SUBJECT: &str = "federation";

/// Errors surfaced by the federation
#[derive(Debug, Error)]
pub enum FederationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Hypergraph error: {0}")]
    Graph(#[from] HypergraphError),
}

/// Aggregate status after one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    /// 1-based tick number
    pub tick: u64,
    /// Mean of the nodes' last integration measures
    pub average_integration: f64,
    /// Mean per-node coherence
    pub average_coherence: f64,
    /// Coherence with dissipation and integration terms applied
    pub global_coherence: f64,
    /// Population mode after this tick
    pub mode: PopulationMode,
    /// Environmental signal used for this tick (after clamping)
    pub external_input: f64,
    /// Ledger blocks appended during this tick
    pub transitions: Vec<LedgerBlock>,
}

/// A population of nodes sharing one hypergraph and one ledger
pub struct Federation {
    config: EngineConfig,
    rules: NodeRules,
    nodes: Vec<Node>,
    graph: Arc<RwLock<Hypergraph>>,
    ledger: EvolutionLedger,
    controller: PopulationController,
    handover: Option<Arc<dyn HandoverProvider>>,
    observers: Vec<Box<dyn TickObserver>>,
    mean_field: Vec<f64>,
    rng: StdRng,
    tick: u64,
}

impl Federation {
    /// Build a population from a validated configuration.
    ///
    /// Every node is registered in the hypergraph with its state dimension
    /// as attributes. A [`TracingObserver`] is attached when
    /// `report_interval` is non-zero.
    pub fn new(config: EngineConfig) -> Result<Self, FederationError> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut graph = Hypergraph::new(FEDERATION_SUBJECT)
            .with_coherence_window(Duration::seconds(config.coherence_window_secs));

        let mut nodes = Vec::with_capacity(config.node_count);
        for i in 0..config.node_count {
            let id = NodeId::new(format!("node-{:03}", i));
            graph.add_node(Some(id.clone()), json!({ "dimension": config.state_dim }))?;
            let node_rng = StdRng::seed_from_u64(rng.gen());
            nodes.push(Node::new(id, config.state_dim, config.history_capacity, node_rng));
        }

        let states: Vec<&[f64]> = nodes.iter().map(|n| n.state()).collect();
        let field = mean_field(&states);

        let mut observers: Vec<Box<dyn TickObserver>> = Vec::new();
        if config.report_interval > 0 {
            observers.push(Box::new(TracingObserver::new(config.report_interval)));
        }

        tracing::info!(
            nodes = config.node_count,
            state_dim = config.state_dim,
            history = config.history_capacity,
            seed,
            "Federation initialised"
        );

        Ok(Self {
            rules: NodeRules::from_config(&config),
            controller: PopulationController::new(config.global),
            config,
            nodes,
            graph: Arc::new(RwLock::new(graph)),
            ledger: EvolutionLedger::new(),
            handover: None,
            observers,
            mean_field: field,
            rng,
            tick: 0,
        })
    }

    /// Derive coherence from handover rate × intensity instead of edge weights
    pub fn with_handover_provider(mut self, provider: Arc<dyn HandoverProvider>) -> Self {
        self.handover = Some(provider);
        self
    }

    /// Replace the ledger (e.g. to pick a different hash linkage)
    pub fn with_ledger(mut self, ledger: EvolutionLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn TickObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn mode(&self) -> PopulationMode {
        self.controller.mode()
    }

    /// Elementwise mean of node states as of the last completed tick
    pub fn mean_field(&self) -> &[f64] {
        &self.mean_field
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn ledger(&self) -> &EvolutionLedger {
        &self.ledger
    }

    pub fn recent_transitions(&self, n: usize) -> &[LedgerBlock] {
        self.ledger.recent(n)
    }

    /// Shared handle to the hypergraph
    pub fn graph(&self) -> Arc<RwLock<Hypergraph>> {
        Arc::clone(&self.graph)
    }

    /// Add a weighted hyperedge between population members
    pub fn connect<I>(&self, members: I, weight: f64) -> Result<EdgeId, FederationError>
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        Ok(self.write_graph().add_edge(members, weight, None)?)
    }

    /// Reinitialise every node's state in place.
    ///
    /// Strategies, identities and the population mode are untouched.
    pub fn trauma(&mut self) {
        for node in &mut self.nodes {
            node.reinitialize();
        }
        self.mean_field = self.current_mean_field();

        metrics::counter!("arkhe_trauma_events_total").increment(1);
        tracing::info!(
            tick = self.tick,
            nodes = self.nodes.len(),
            "Trauma: node states reinitialised"
        );
    }

    /// Advance the whole population by one tick
    pub fn tick(&mut self, external: f64) -> TickReport {
        self.tick += 1;
        let tick = self.tick;
        let external = sanitize(external, tick);

        // Barrier: the field is complete before any node moves
        let complexity = SpectralAnalyzer::normalised(
            self.average_integration(),
            self.config.history_capacity,
        );
        let mode = self.controller.mode();
        let field = mode.apply(
            &self.mean_field,
            external,
            self.rules.dt,
            complexity,
            &mut self.rng,
        );

        let rules = &self.rules;
        let proposals: Vec<_> = self
            .nodes
            .par_iter_mut()
            .map(|node| node.step(&field, external, rules))
            .collect();

        let mut transitions = Vec::new();
        for (node, proposal) in self.nodes.iter_mut().zip(proposals) {
            let Some(next) = proposal else { continue };
            tracing::debug!(
                node = %node.id(),
                proposed = %next,
                phi = node.integration(),
                "Metamorphosis proposed"
            );
            if next == node.strategy() {
                continue;
            }
            let previous = node.apply_strategy(next);
            let block = self
                .ledger
                .record(node.id().as_str(), previous, next, node.integration());
            tracing::info!(
                node = %node.id(),
                transition = %block.transition,
                phi = node.integration(),
                hash = %block.hash,
                "Node metamorphosis"
            );
            metrics::counter!("arkhe_node_metamorphoses_total").increment(1);
            transitions.push(block.clone());
        }

        self.mean_field = self.current_mean_field();
        let average_integration = self.average_integration();
        let node_means: Vec<f64> = self.nodes.iter().map(|n| n.mean_state()).collect();
        let dissipation = standard_deviation(&node_means);

        let (average_coherence, global_coherence) = {
            let mut graph = self.write_graph();
            for node in &self.nodes {
                graph.set_node_integration(node.id(), node.integration());
            }
            graph.set_dissipation(dissipation);
            graph.set_integration(average_integration);
            graph.update_coherence(self.handover.as_deref());
            (graph.average_coherence(), graph.global_coherence())
        };

        // Warm-up zeros must not seed the smoothed population measure
        let measured = self.nodes.iter().all(|n| n.is_measured());
        if measured && tick % self.rules.analysis_interval == 0 {
            if let Some((from, to)) = self.controller.observe(average_integration) {
                let block = self
                    .ledger
                    .record(FEDERATION_SUBJECT, from, to, average_integration);
                tracing::info!(
                    transition = %block.transition,
                    phi = average_integration,
                    smoothed = self.controller.smoothed().unwrap_or(average_integration),
                    "Population mode switch"
                );
                metrics::counter!("arkhe_population_mode_switches_total").increment(1);
                transitions.push(block.clone());
            }
        }

        metrics::gauge!("arkhe_average_integration").set(average_integration);
        metrics::gauge!("arkhe_average_coherence").set(average_coherence);

        let report = TickReport {
            tick,
            average_integration,
            average_coherence,
            global_coherence,
            mode: self.controller.mode(),
            external_input: external,
            transitions,
        };
        for observer in &mut self.observers {
            observer.on_tick(&report);
        }
        report
    }

    /// Run `ticks` ticks, sampling the signal once per tick
    pub fn run<S>(&mut self, ticks: u64, source: &mut S) -> Vec<TickReport>
    where
        S: EntropySource + ?Sized,
    {
        let mut reports = Vec::with_capacity(ticks as usize);
        self.run_with(ticks, source, |report| reports.push(report.clone()));
        reports
    }

    /// Run `ticks` ticks, streaming each report to `f`
    pub fn run_with<S, F>(&mut self, ticks: u64, source: &mut S, mut f: F)
    where
        S: EntropySource + ?Sized,
        F: FnMut(&TickReport),
    {
        for _ in 0..ticks {
            let external = source.sample(self.tick + 1);
            let report = self.tick(external);
            f(&report);
        }
    }

    fn average_integration(&self) -> f64 {
        let values: Vec<f64> = self.nodes.iter().map(|n| n.integration()).collect();
        mean(&values)
    }

    fn current_mean_field(&self) -> Vec<f64> {
        let states: Vec<&[f64]> = self.nodes.iter().map(|n| n.state()).collect();
        mean_field(&states)
    }

    fn write_graph(&self) -> RwLockWriteGuard<'_, Hypergraph> {
        match self.graph.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Read access to the hypergraph
    pub fn read_graph(&self) -> RwLockReadGuard<'_, Hypergraph> {
        match self.graph.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        EngineConfig::new()
            .with_nodes(4)
            .with_state_dim(16)
            .with_history(10)
            .with_seed(21)
            .with_report_interval(0)
    }

    #[test]
    fn test_new_registers_nodes() {
        let fed = Federation::new(small_config()).unwrap();
        assert_eq!(fed.nodes().len(), 4);
        let graph = fed.read_graph();
        assert_eq!(graph.node_count(), 4);
        let node = graph.node(&NodeId::from("node-000")).unwrap();
        assert_eq!(node.attributes["dimension"], 16);
        assert_eq!(fed.mean_field().len(), 16);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Federation::new(EngineConfig::new().with_nodes(0));
        assert!(matches!(result, Err(FederationError::Config(_))));
    }

    #[test]
    fn test_connect_unknown_node_fails() {
        let fed = Federation::new(small_config()).unwrap();
        assert!(fed.connect(["node-000", "node-001"], 0.5).is_ok());
        let err = fed.connect(["node-000", "ghost"], 0.5).unwrap_err();
        assert!(matches!(
            err,
            FederationError::Graph(HypergraphError::UnknownNode(_))
        ));
        assert_eq!(fed.read_graph().edge_count(), 1);
    }

    #[test]
    fn test_tick_numbering_and_clamped_input() {
        let mut fed = Federation::new(small_config()).unwrap();
        let report = fed.tick(3.0);
        assert_eq!(report.tick, 1);
        assert_eq!(report.external_input, 1.0);
        assert_eq!(fed.tick(0.5).tick, 2);
        assert_eq!(fed.ticks(), 2);
    }

    #[test]
    fn test_trauma_keeps_strategies_and_mode() {
        let mut fed = Federation::new(small_config()).unwrap();
        for _ in 0..12 {
            fed.tick(0.5);
        }
        let strategies: Vec<_> = fed.nodes().iter().map(|n| n.strategy()).collect();
        let mode = fed.mode();
        let ledger_len = fed.ledger().len();

        fed.trauma();

        let after: Vec<_> = fed.nodes().iter().map(|n| n.strategy()).collect();
        assert_eq!(strategies, after);
        assert_eq!(fed.mode(), mode);
        assert_eq!(fed.ledger().len(), ledger_len);
        assert!(fed.nodes().iter().all(|n| n.history().is_empty()));
    }
}
