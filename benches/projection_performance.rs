//! Benchmarks for projection queries and scenario sweeps

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::num::NonZeroUsize;
use std::sync::Arc;

use roic_levers::application::{
    baseline_factory, linspace, roic_sensitivity, ScenarioRunner, Sensitivity,
};
use roic_levers::domain::{Assumptions, FactTable, Lever, TaxRate};
use roic_levers::Model;

fn baseline_model() -> Model {
    let facts = Arc::new(FactTable::baseline().to_facts().expect("valid baseline"));
    let mut model = Model::new(facts, Assumptions::default()).expect("valid metrics");
    model.initialize_levers().expect("levers initialize");
    model
}

fn benchmark_single_projection(c: &mut Criterion) {
    let mut model = baseline_model();

    c.bench_function("new_roic_baseline", |b| {
        b.iter(|| black_box(model.new_roic()))
    });

    c.bench_function("project_full_snapshot", |b| {
        b.iter(|| black_box(model.project()))
    });

    c.bench_function("lever_edit_then_roic", |b| {
        let mut lifts = 10.0;
        b.iter(|| {
            lifts = if lifts > 18.0 { 10.0 } else { lifts + 0.5 };
            model
                .set_lever(Lever::LiftsPerTruckDay, black_box(lifts))
                .expect("valid lever");
            black_box(model.new_roic())
        })
    });
}

fn benchmark_sweeps(c: &mut Criterion) {
    let facts = Arc::new(FactTable::baseline().to_facts().expect("valid baseline"));
    let runner = ScenarioRunner::new(baseline_factory(
        facts,
        Assumptions::default(),
        TaxRate::default(),
    ));
    let values = linspace(10.0, 18.0, 256);

    c.bench_function("sweep_256_sequential", |b| {
        b.iter(|| {
            roic_sensitivity(
                &runner,
                Sensitivity::LiftsPerTruckDay,
                black_box(values.clone()),
                NonZeroUsize::MIN,
            )
        })
    });

    c.bench_function("sweep_256_four_workers", |b| {
        let workers = NonZeroUsize::new(4).expect("non-zero");
        b.iter(|| {
            roic_sensitivity(
                &runner,
                Sensitivity::LiftsPerTruckDay,
                black_box(values.clone()),
                workers,
            )
        })
    });
}

criterion_group!(benches, benchmark_single_projection, benchmark_sweeps);
criterion_main!(benches);
