use criterion::{black_box, criterion_group, criterion_main, Criterion};
use house_price_intervals::binning::bin_matrix;
use house_price_intervals::data::Matrix;
use house_price_intervals::{Backend, QuantileBooster};
use rand::distributions::Uniform;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::time::Duration;

// Column major features in [0, 1) and a noisy linear target.
fn create_data(n_samples: usize, n_features: usize) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(1903);
    let feature_distribution = Uniform::new(0.0, 1.0);
    let noise_distribution = Uniform::new(-1.0, 1.0);
    let weights: Vec<f64> = (0..n_features).map(|_| rng.sample(noise_distribution)).collect();

    let data: Vec<f64> = (0..n_samples * n_features)
        .map(|_| rng.sample(feature_distribution))
        .collect();
    let y = (0..n_samples)
        .map(|i| {
            let linear: f64 = (0..n_features).map(|j| data[j * n_samples + i] * weights[j]).sum();
            linear + rng.sample(noise_distribution)
        })
        .collect();
    (data, y)
}

pub fn binning_benchmark(c: &mut Criterion) {
    let (data, _) = create_data(10_000, 20);
    let matrix = Matrix::new(&data, 10_000, 20);
    c.bench_function("bin_matrix_10k_x_20", |b| {
        b.iter(|| bin_matrix(black_box(&matrix), black_box(255)).unwrap())
    });
}

pub fn booster_benchmark(c: &mut Criterion) {
    let (data, y) = create_data(5_000, 20);
    let matrix = Matrix::new(&data, 5_000, 20);

    let mut group = c.benchmark_group("train_quantile_booster");
    group.warm_up_time(Duration::from_secs(5));
    group.sample_size(10);
    for backend in Backend::all() {
        let mut cfg = backend.booster_config(0.9, 42);
        cfg.iterations = 50;
        group.bench_function(backend.name(), |b| {
            b.iter(|| {
                let mut booster = QuantileBooster::new(cfg.clone()).unwrap();
                booster.fit(black_box(&matrix), black_box(&y)).unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, binning_benchmark, booster_benchmark);
criterion_main!(benches);
