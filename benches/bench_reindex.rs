use std::time::Duration;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use eavindex::{
    Engine, FullReindex, ReindexSettings,
    bench_utils::{CatalogDataset, generate_catalog, load_catalog},
};

const CATALOG_SEED: u64 = 0xCA7A;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

struct BenchCase {
    id: String,
    dataset: CatalogDataset,
}

fn bench_scales() -> &'static [usize] {
    #[cfg(feature = "bench-ci")]
    {
        &[200, 1_000]
    }
    #[cfg(not(feature = "bench-ci"))]
    {
        &[1_000, 5_000, 20_000]
    }
}

fn bench_cases() -> Vec<BenchCase> {
    bench_scales()
        .iter()
        .map(|&entities| BenchCase {
            id: format!("catalog_{entities}"),
            dataset: generate_catalog(entities, 3, CATALOG_SEED + entities as u64),
        })
        .collect()
}

fn loaded_engine(dataset: &CatalogDataset) -> Engine {
    let engine = Engine::open_in_memory(ReindexSettings::default()).expect("engine");
    load_catalog(&engine, dataset).expect("load catalog");
    engine
}

fn bench_full_reindex(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_reindex");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for case in bench_cases() {
        let engine = loaded_engine(&case.dataset);
        let action = FullReindex::standard();
        group.bench_function(BenchmarkId::from_parameter(case.id.clone()), |b| {
            b.iter(|| {
                action.execute_full(&engine).expect("reindex");
            });
        });
    }
    group.finish();
}

fn bench_fixed_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_size");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    let dataset = generate_catalog(2_000, 3, CATALOG_SEED);
    for rows in [100usize, 500, 2_000] {
        let settings = ReindexSettings::default().with_rows_per_batch(rows);
        let engine = Engine::open_in_memory(settings).expect("engine");
        load_catalog(&engine, &dataset).expect("load catalog");
        let action = FullReindex::standard();
        group.bench_function(BenchmarkId::from_parameter(rows), |b| {
            b.iter(|| {
                action.execute_full(&engine).expect("reindex");
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = reindex_benches;
    config = Criterion::default();
    targets = bench_full_reindex, bench_fixed_batch_sizes
);
criterion_main!(reindex_benches);
