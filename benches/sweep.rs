use cardio_predict::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_classification_data(n_rows: usize, n_features: usize) -> (DataFrame, Array1<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut columns: Vec<Column> = (0..n_features)
        .map(|i| {
            let values: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();

    let groups: Vec<&str> = (0..n_rows)
        .map(|_| if rng.gen_bool(0.5) { "a" } else { "b" })
        .collect();
    columns.push(Column::new("group".into(), groups));

    // Roughly one positive in four
    let labels: Array1<i64> = (0..n_rows)
        .map(|_| if rng.gen_bool(0.25) { 1 } else { 0 })
        .collect();

    (DataFrame::new(columns).unwrap(), labels)
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_sweep");
    group.sample_size(10);

    for n_rows in [200, 1000].iter() {
        let (df, y) = create_classification_data(*n_rows, 8);
        let preprocessor = ColumnTransformer::new();

        group.bench_with_input(BenchmarkId::new("evaluate", n_rows), &(df, y), |b, (df, y)| {
            b.iter(|| {
                let config = SweepConfig::new()
                    .with_n_neighbors([1, 5, 15])
                    .with_n_folds(5)
                    .with_scoring(["accuracy", "recall"]);
                KnnSweep::new(config)
                    .with_features(black_box(df))
                    .with_labels(y)
                    .with_preprocessor(&preprocessor)
                    .evaluate()
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_knn_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_predict");

    for n_rows in [1000, 5000].iter() {
        let (df, y) = create_classification_data(*n_rows, 8);
        let mut preprocessor = ColumnTransformer::new();
        let x = preprocessor.fit_transform(&df).unwrap();
        let mut model = KNNClassifier::with_k(5);
        model.fit(&x, &y).unwrap();

        group.bench_with_input(BenchmarkId::new("predict", n_rows), &x, |b, x| {
            b.iter(|| model.predict(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sweep, bench_knn_predict);
criterion_main!(benches);
