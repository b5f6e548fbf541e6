use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_validator::ApprenticeInput;
use feature_engine::{Cell, FeatureMapping, FeatureReconstructor, ReferenceDataset};

fn reference_dataset(features: usize, rows: usize) -> ReferenceDataset {
    let mut columns = vec![
        "Edad".to_string(),
        "Cantidad de quejas".to_string(),
        "Estrato".to_string(),
    ];
    columns.extend((0..features).map(|i| format!("Variable {}", i)));
    columns.push("Estado Aprendiz".to_string());

    let data = (0..rows)
        .map(|r| {
            let mut row: Vec<Cell> = (0..columns.len() - 1)
                .map(|c| Cell::Number(((r * 7 + c * 3) % 50) as f64))
                .collect();
            row.push(Cell::Text("Activo".to_string()));
            row
        })
        .collect();

    ReferenceDataset::new(columns, data).expect("valid dataset")
}

fn bench_reconstruct(c: &mut Criterion) {
    let dataset = reference_dataset(60, 5_000);
    let reconstructor =
        FeatureReconstructor::from_dataset(&dataset, "Estado Aprendiz", &FeatureMapping::default())
            .expect("reconstructor");
    let expected = reconstructor.feature_names();
    let input = ApprenticeInput {
        age: 25,
        complaints: 0,
        stratum: 2,
    };

    c.bench_function("reconstruct_63_features", |b| {
        b.iter(|| reconstructor.reconstruct(black_box(&input), black_box(&expected)))
    });

    c.bench_function("prepare_defaults_5000_rows", |b| {
        b.iter(|| {
            FeatureReconstructor::from_dataset(
                black_box(&dataset),
                "Estado Aprendiz",
                &FeatureMapping::default(),
            )
        })
    });
}

criterion_group!(benches, bench_reconstruct);
criterion_main!(benches);
