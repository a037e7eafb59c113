//! # Allocator Benchmarks
//!
//! Performance benchmarks for asset number allocation.
//!
//! Run with: `cargo bench -p stash-core`

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stash_core::{
    AllocatorConfig, AssetDraft, AssetNumber, IdentifierAllocator, Registry, SequenceStrategy,
    StorageBackend,
};
use std::hint::black_box;

fn allocator(strategy: SequenceStrategy) -> IdentifierAllocator {
    IdentifierAllocator::new(AllocatorConfig {
        strategy,
        ..AllocatorConfig::default()
    })
}

/// Registry holding `size` assets spread over ten brands.
fn populated_registry(strategy: SequenceStrategy, size: usize) -> Registry {
    let mut registry = Registry::with_backend(StorageBackend::default(), allocator(strategy));
    for i in 0..size {
        let draft = AssetDraft::new(format!("Brand{}", i % 10), "Model", format!("SN{i}"));
        let _ = registry.create_asset(draft);
    }
    registry
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_create_asset(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_asset");

    for strategy in [SequenceStrategy::Counter, SequenceStrategy::Scan] {
        for size in [100, 1000, 10000].iter() {
            let id = BenchmarkId::new(format!("{strategy:?}"), size);
            group.bench_with_input(id, size, |b, &size| {
                b.iter_batched(
                    || populated_registry(strategy, size),
                    |mut registry| {
                        black_box(registry.create_asset(AssetDraft::new("Brand0", "Model", "fresh")))
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }

    group.finish();
}

fn bench_maintenance_reference(c: &mut Criterion) {
    let allocator = IdentifierAllocator::default();
    let asset = AssetNumber::new("DELL-LATITUDE_5420-SN123-000001");
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap_or_default();

    c.bench_function("maintenance_reference", |b| {
        b.iter(|| black_box(allocator.allocate_maintenance_reference(&asset, date)));
    });
}

criterion_group!(benches, bench_create_asset, bench_maintenance_reference);
criterion_main!(benches);
