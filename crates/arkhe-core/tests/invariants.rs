use arkhe_core::hypergraph::{Hypergraph, NodeId};
use arkhe_core::metamorphosis::{HysteresisConfig, PopulationController};
use arkhe_core::node::{Node, NodeRules};
use arkhe_core::spectral::SpectralAnalyzer;
use arkhe_core::strategy::{PopulationMode, Strategy};
use arkhe_core::{EvolutionLedger, HistoryWindow, HypergraphError};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

fn strategy_tag() -> impl proptest::strategy::Strategy<Value = Strategy> {
    prop::sample::select(Strategy::ALL.to_vec())
}

fn mode_tag() -> impl proptest::strategy::Strategy<Value = PopulationMode> {
    prop::sample::select(PopulationMode::ALL.to_vec())
}

proptest! {
    /// Whatever the inputs, a strategy step keeps every element in [0, 1]
    #[test]
    fn prop_strategy_output_in_unit_range(
        tag in strategy_tag(),
        state in prop::collection::vec(0.0f64..=1.0, 1..64),
        neighbor in prop::collection::vec(-10.0f64..10.0, 0..64),
        external in -5.0f64..5.0,
        dt in 0.0f64..2.0,
        complexity in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let next = tag.apply(&state, &neighbor, external, dt, complexity, &mut rng);
        prop_assert_eq!(next.len(), state.len());
        prop_assert!(next.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn prop_population_mode_output_in_unit_range(
        mode in mode_tag(),
        field in prop::collection::vec(0.0f64..=1.0, 1..64),
        external in -5.0f64..5.0,
        dt in 0.0f64..2.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let next = mode.apply(&field, external, dt, 1.0, &mut rng);
        prop_assert!(next.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    /// A node stays in range across ticks, including through metamorphoses
    #[test]
    fn prop_node_ticks_stay_bounded(seed in any::<u64>(), external in 0.0f64..=1.0) {
        let rules = NodeRules { analysis_interval: 3, ..Default::default() };
        let mut node = Node::with_seed(NodeId::from("p"), 16, 10, seed);
        let field = vec![0.5; 16];
        for _ in 0..30 {
            if let Some(next) = node.step(&field, external, &rules) {
                node.apply_strategy(next);
            }
            prop_assert!(node.state().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    /// A rejected edge leaves node and edge counts untouched
    #[test]
    fn prop_unknown_member_is_rejected(
        known in 2usize..8,
        ghost in "[x-z]{3}",
        weight in 0.0f64..1.0,
    ) {
        let mut g = Hypergraph::new("prop");
        for i in 0..known {
            g.add_node(Some(NodeId::new(format!("n{}", i))), Value::Null).unwrap();
        }
        g.add_edge(["n0", "n1"], 0.5, None).unwrap();

        let result = g.add_edge(["n0".to_string(), ghost.clone()], weight, None);
        prop_assert_eq!(result, Err(HypergraphError::UnknownNode(NodeId::new(ghost))));
        prop_assert_eq!(g.node_count(), known);
        prop_assert_eq!(g.edge_count(), 1);
    }

    /// Samples inside the band never switch the population mode
    #[test]
    fn prop_hysteresis_band_is_stable(
        samples in prop::collection::vec(0.0f64..1.0, 1..100),
    ) {
        let config = HysteresisConfig::default();
        let (lower, upper) = config.band();
        let mut ctl = PopulationController::new(config);
        for s in samples {
            let phi = lower + (upper - lower) * s;
            prop_assert_eq!(ctl.observe(phi), None);
        }
        prop_assert_eq!(ctl.mode(), PopulationMode::Exploration);
    }
}

#[test]
fn test_constant_window_has_near_zero_integration() {
    let mut window = HistoryWindow::new(20);
    for _ in 0..20 {
        window.push(vec![0.5; 64]);
    }
    let phi = SpectralAnalyzer::default().integration(&window);
    assert!(phi < 0.1, "got {}", phi);
}

#[test]
fn test_random_window_beats_constant_window() {
    let analyzer = SpectralAnalyzer::default();
    let mut rng = StdRng::seed_from_u64(3);

    let mut constant = HistoryWindow::new(20);
    let mut random = HistoryWindow::new(20);
    for _ in 0..20 {
        constant.push(vec![0.5; 64]);
        random.push((0..64).map(|_| rng.gen::<f64>()).collect());
    }

    let flat = analyzer.integration(&constant);
    let rich = analyzer.integration(&random);
    assert!(rich > 0.0);
    assert!(rich > flat + 1.0, "random {} vs constant {}", rich, flat);
}

#[test]
fn test_ledger_tracks_node_transitions() {
    let rules = NodeRules {
        analysis_interval: 2,
        ..Default::default()
    };
    let mut ledger = EvolutionLedger::new();
    let mut node = Node::with_seed(NodeId::from("solo"), 32, 10, 77);
    let field = vec![0.5; 32];

    for _ in 0..200 {
        if let Some(next) = node.step(&field, 0.4, &rules) {
            let previous = node.apply_strategy(next);
            ledger.record(node.id().as_str(), previous, next, node.integration());
        }
    }

    for (i, block) in ledger.iter().enumerate() {
        assert_eq!(block.index, i as u64);
        assert_eq!(block.subject, "solo");
        assert_eq!(block.transition, format!("{} -> {}", block.from, block.to));
        assert_ne!(block.from, block.to);
    }
    assert!(ledger.verify().is_ok());
}
