use criterion::{black_box, criterion_group, criterion_main, Criterion};
use id3_core::{Column, Dataset};
use id3_trainer::{fit, TrainingParams};

fn synthetic_dataset(rows: usize) -> Dataset {
    // Two continuous features and one categorical feature; the label depends
    // on a threshold over their sum and on the category.
    let xs: Vec<f64> = (0..rows).map(|i| ((i * 37) % 101) as f64).collect();
    let ys: Vec<f64> = (0..rows).map(|i| ((i * 53) % 89) as f64 / 10.0).collect();
    let zone: Vec<&str> = (0..rows).map(|i| ["north", "south", "east"][i % 3]).collect();
    let labels: Vec<&str> = (0..rows)
        .map(|i| {
            if xs[i] + ys[i] > 60.0 || zone[i] == "east" {
                "high"
            } else {
                "low"
            }
        })
        .collect();

    Dataset::new(vec![
        Column::continuous("x", xs),
        Column::continuous("y", ys),
        Column::categorical("zone", vec!["north", "south", "east"], zone),
        Column::nominal("label", labels),
    ])
    .expect("valid synthetic dataset")
}

fn bench_fit(c: &mut Criterion) {
    let dataset = synthetic_dataset(2_000);
    let params = TrainingParams::default().with_bin_count(Some(16));

    c.bench_function("id3_fit_2000_rows", |b| {
        b.iter(|| {
            let model = fit(black_box(&dataset), &params).expect("training succeeds");
            black_box(model);
        });
    });
}

fn bench_predict(c: &mut Criterion) {
    let dataset = synthetic_dataset(2_000);
    let params = TrainingParams::default().with_bin_count(Some(16));
    let model = fit(&dataset, &params).expect("training succeeds");

    c.bench_function("id3_predict_2000_rows", |b| {
        b.iter(|| black_box(model.predict(black_box(&dataset))));
    });

    c.bench_function("id3_predict_par_2000_rows", |b| {
        b.iter(|| black_box(model.predict_par(black_box(&dataset))));
    });
}

criterion_group!(id3_benches, bench_fit, bench_predict);
criterion_main!(id3_benches);
