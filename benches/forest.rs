use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use machinelearne_pipeline::{
    metrics::mean_absolute_error,
    model::{FittedEstimator, RandomForestRegressor},
    model_selection::{CrossValidator, KFold},
    pipeline::Pipeline,
    preprocessing::{ColumnRouter, ImputeStrategy, OneHotEncoder, SimpleImputer},
    table::{Column, Table},
};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SUBURBS: [&str; 6] = ["Richmond", "Carlton", "Kew", "Brunswick", "Fitzroy", "Hawthorn"];

/// Synthetic regression matrix with a few informative features.
fn synthetic_matrix(n_rows: usize, n_features: usize) -> (Array2<f64>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let features = Array2::from_shape_fn((n_rows, n_features), |_| rng.random_range(0.0..10.0));
    let labels = features
        .rows()
        .into_iter()
        .map(|row| 3.0 * row[0] - 2.0 * row[1] + row[n_features - 1] * row[0])
        .collect();
    (features, labels)
}

/// Housing-like table with gaps in every column.
fn synthetic_table(n_rows: usize) -> (Table, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut rooms = Vec::with_capacity(n_rows);
    let mut land = Vec::with_capacity(n_rows);
    let mut suburb = Vec::with_capacity(n_rows);
    let mut price = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let r = rng.random_range(1..6) as f64;
        let l = rng.random_range(100.0..900.0);
        let s = rng.random_range(0..SUBURBS.len());
        price.push(200.0 * r + 0.5 * l + 100.0 * s as f64);
        rooms.push((rng.random::<f64>() > 0.1).then_some(r));
        land.push((rng.random::<f64>() > 0.2).then_some(l));
        suburb.push((rng.random::<f64>() > 0.05).then_some(SUBURBS[s]));
    }
    let table = Table::new()
        .with_column("rooms", Column::numeric(rooms))
        .and_then(|t| t.with_column("landsize", Column::numeric(land)))
        .and_then(|t| t.with_column("suburb", Column::categorical(suburb)))
        .expect("Failed to build table");
    (table, price)
}

fn housing_pipeline() -> machinelearne_pipeline::Result<Pipeline> {
    let categorical = Pipeline::new()
        .add_transformer("impute", SimpleImputer::new(ImputeStrategy::MostFrequent))?
        .add_transformer("onehot", OneHotEncoder::new())?;
    let preprocessor = ColumnRouter::new()
        .add_group("num", SimpleImputer::new(ImputeStrategy::Median), &["rooms", "landsize"])?
        .add_group("cat", categorical, &["suburb"])?;
    Pipeline::new()
        .add_transformer("preprocessor", preprocessor)?
        .add_estimator(
            "model",
            RandomForestRegressor::new().with_n_estimators(20).with_seed(0),
        )
}

fn bench_forest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_fit");
    group.sample_size(10);

    for n_rows in [200, 1000].iter() {
        let (features, labels) = synthetic_matrix(*n_rows, 8);
        for parallel in [false, true] {
            let forest = RandomForestRegressor::new()
                .with_n_estimators(50)
                .with_seed(1)
                .with_parallel(parallel);
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, n_rows), n_rows, |b, _| {
                b.iter(|| {
                    let fitted = forest
                        .fit(black_box(features.view()), black_box(&labels))
                        .expect("Failed to fit forest");
                    black_box(fitted);
                });
            });
        }
    }
    group.finish();
}

fn bench_forest_predict(c: &mut Criterion) {
    let (features, labels) = synthetic_matrix(1000, 8);
    let fitted = RandomForestRegressor::new()
        .with_n_estimators(50)
        .fit(features.view(), &labels)
        .expect("Failed to fit forest");

    c.bench_function("forest_predict_1000", |b| {
        b.iter(|| {
            let predictions = fitted
                .predict(black_box(features.view()))
                .expect("Failed to predict");
            black_box(predictions);
        });
    });
}

fn bench_cross_validation(c: &mut Criterion) {
    let (x, y) = synthetic_table(500);
    let mut group = c.benchmark_group("cross_validation");
    group.sample_size(10);

    for parallel in [false, true] {
        let validator = CrossValidator::new(KFold::new(5)).with_parallel(parallel);
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| {
                let scores = validator
                    .evaluate(housing_pipeline, black_box(&x), &y, mean_absolute_error)
                    .expect("Failed to cross-validate");
                black_box(scores);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_forest_fit,
    bench_forest_predict,
    bench_cross_validation
);
criterion_main!(benches);
