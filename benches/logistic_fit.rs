/// Regression and hypothesis test benchmarks
///
/// Measures the Part II and Part III hot paths on the 5,000-row sample:
/// Newton-Raphson logistic fits, VIF tables and the null simulation.
use abtest_report::dataset::Dataset;
use abtest_report::hypothesis::simulate_null;
use abtest_report::regression::{encode, fit_logit, vif_table, EncodedData, REDUCED_MODELS};
use abtest_report::stats::ArmCounts;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

fn sample() -> Dataset {
    Dataset::from_reader(include_str!("../tests/fixtures/landing_page_sample.csv").as_bytes())
        .expect("sample fixture parses")
}

fn encoded() -> EncodedData {
    encode(&sample())
}

fn bench_encode(c: &mut Criterion) {
    let dataset = sample();
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(dataset.len() as u64));

    group.bench_function("one_hot_5000", |b| {
        b.iter(|| encode(black_box(&dataset)));
    });

    group.finish();
}

fn bench_logit(c: &mut Criterion) {
    let encoded = encoded();
    let mut group = c.benchmark_group("fit_logit");
    group.measurement_time(Duration::from_secs(10));

    for spec in REDUCED_MODELS {
        let design = encoded
            .design
            .select(spec.predictors)
            .expect("predictors exist");
        group.bench_with_input(BenchmarkId::from_parameter(spec.name), &design, |b, design| {
            b.iter(|| fit_logit(black_box(design), black_box(&encoded.outcome)));
        });
    }

    group.finish();
}

fn bench_vif(c: &mut Criterion) {
    let encoded = encoded();
    let mut group = c.benchmark_group("vif_table");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("full_design", |b| {
        b.iter(|| vif_table(black_box(&encoded.design)));
    });

    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let treatment = ArmCounts {
        observations: 2500,
        conversions: 583,
    };
    let control = ArmCounts {
        observations: 2500,
        conversions: 554,
    };
    let mut group = c.benchmark_group("simulate_null");

    for trials in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(trials as u64));
        group.bench_with_input(BenchmarkId::from_parameter(trials), &trials, |b, &trials| {
            b.iter(|| simulate_null(treatment, control, trials, Some(42), 30));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_logit,
    bench_vif,
    bench_simulation
);

criterion_main!(benches);
