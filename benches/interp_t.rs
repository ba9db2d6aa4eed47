use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spinmodel::{
    builder::SpinModelBuilder, config::SpinModelConfig, constants::CorrectionLevel,
    correction::PhaseCorrection, telemetry::SegmentRecord, SpinModel,
};

/// Epoch of the synthetic day (2023-11-14T22:13:20 UTC).
const DAY_START: f64 = 1.7e9;

/// One day of ~3 s spins split into segments of 20 to 60 spins with slowly
/// drifting rates, and a multi-spin gap every 50 segments so that bridges are
/// exercised.
fn build_day(rng: &mut StdRng) -> SpinModel {
    let mut records = Vec::new();
    let mut tend = DAY_START;
    for i in 0..2_000 {
        let spinper: f64 = rng.random_range(2.9..3.1);
        let c: f64 = rng.random_range(-1e-6..1e-6);
        let nspins: i64 = rng.random_range(20..=60);
        let gap = if i % 50 == 49 { 4.0 * spinper } else { 0.0 };

        // Duration of `nspins` spins from rate b with quadratic coefficient c
        let b = 360.0 / spinper;
        let phi = 360.0 * nspins as f64;
        let duration = 2.0 * phi / (b + (b * b + 4.0 * c * phi).sqrt());

        tend += gap + duration;
        records.push(SegmentRecord {
            tend,
            spinper,
            c,
            phaserr: 1e-4,
            nspins,
            npts: nspins as u32,
            maxgap: 0.0,
            initial_delta_phi: 0.0,
            idpu_spinper: 0.0,
            segflags: 0,
        });
    }

    let correction_times: Vec<f64> = (0..=100)
        .map(|i| DAY_START + (tend - DAY_START) * i as f64 / 100.0)
        .collect();
    let correction_values = correction_times
        .iter()
        .map(|_| rng.random_range(-1.0..1.0))
        .collect();

    SpinModelBuilder::from_records(&records, SpinModelConfig::default())
        .unwrap()
        .finish(
            "tha",
            CorrectionLevel::WaveformCorrected,
            PhaseCorrection::new(correction_times, correction_values).unwrap(),
        )
        .unwrap()
}

fn bench_interp_t(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let model = build_day(&mut rng);
    let (start, end) = model.get_timerange();
    let samples = 100_000usize;

    c.bench_function("interp_t/random_times", |b| {
        b.iter_batched(
            || {
                (0..samples)
                    .map(|_| rng.random_range(start - 60.0..end + 60.0))
                    .collect::<Vec<_>>()
            },
            |times| black_box(model.interp_t(black_box(&times), true)),
            BatchSize::LargeInput,
        )
    });

    let sorted: Vec<f64> = (0..samples)
        .map(|i| start + (end - start) * i as f64 / samples as f64)
        .collect();
    c.bench_function("interp_t/sorted_times", |b| {
        b.iter(|| black_box(model.interp_t(black_box(&sorted), false)))
    });
}

fn bench_interp_n(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let model = build_day(&mut rng);
    let last_count = model.columns().c2[model.len() - 1] as f64;

    c.bench_function("interp_n/random_counts", |b| {
        b.iter_batched(
            || {
                (0..10_000)
                    .map(|_| rng.random_range(0.0..last_count))
                    .collect::<Vec<_>>()
            },
            |counts| black_box(model.interp_n(black_box(&counts))),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_interp_t, bench_interp_n
);
criterion_main!(benches);
