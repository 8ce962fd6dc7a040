use arkhe_core::node::{Node, NodeRules};
use arkhe_core::strategy::{PopulationMode, Strategy};
use arkhe_core::NodeId;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("Strategy::apply");
    let mut rng = StdRng::seed_from_u64(7);
    let state: Vec<f64> = (0..256).map(|_| rng.gen::<f64>()).collect();
    let neighbor = vec![0.5; 256];

    for strategy in Strategy::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &strategy, |b, s| {
            b.iter(|| s.apply(black_box(&state), &neighbor, 0.3, 0.1, 0.5, &mut rng))
        });
    }
    group.finish();
}

fn bench_population_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("PopulationMode::apply");
    let mut rng = StdRng::seed_from_u64(7);
    let field: Vec<f64> = (0..256).map(|_| rng.gen::<f64>()).collect();

    for mode in PopulationMode::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(mode), &mode, |b, m| {
            b.iter(|| m.apply(black_box(&field), 0.3, 0.1, 0.5, &mut rng))
        });
    }
    group.finish();
}

fn bench_node_step(c: &mut Criterion) {
    let rules = NodeRules::default();
    let field = vec![0.5; 64];
    let mut node = Node::with_seed(NodeId::from("bench"), 64, 20, 1);

    c.bench_function("Node::step/64", |b| {
        b.iter(|| node.step(black_box(&field), 0.2, &rules))
    });
}

criterion_group!(benches, bench_strategies, bench_population_modes, bench_node_step);
criterion_main!(benches);
