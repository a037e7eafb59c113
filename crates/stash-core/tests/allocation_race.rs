//! # Allocation Race Tests
//!
//! Two callers allocating an asset number for the same prefix at the same
//! time. A barrier forces both reads to happen before either insert.

use chrono::{TimeZone, Utc};
use stash_core::{
    AllocatorConfig, AssetNumber, AssetRecord, IdentifierAllocator, MemoryStore, RecordStore,
    RedbStore, SequenceStrategy, StashError,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

fn record(number: AssetNumber, serial: &str) -> AssetRecord {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("timestamp");
    AssetRecord {
        asset_number: number,
        brand: "Dell".into(),
        model: "XPS".into(),
        serial_number: serial.into(),
        asset_type: String::new(),
        processor: String::new(),
        ram: String::new(),
        storage: String::new(),
        purchase_date: None,
        amount_cents: None,
        remarks: String::new(),
        created_by: String::new(),
        created_at: at,
        updated_at: at,
    }
}

fn allocator(strategy: SequenceStrategy) -> IdentifierAllocator {
    IdentifierAllocator::new(AllocatorConfig {
        strategy,
        ..AllocatorConfig::default()
    })
}

/// Allocate under the lock, wait for the other caller, then insert.
fn interleaved(
    strategy: SequenceStrategy,
) -> Vec<(AssetNumber, Result<(), StashError>)> {
    let store = Arc::new(Mutex::new(MemoryStore::new()));
    let barrier = Arc::new(Barrier::new(2));
    let allocator = Arc::new(allocator(strategy));

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let allocator = Arc::clone(&allocator);
            thread::spawn(move || {
                let number = {
                    let mut guard = store.lock().expect("lock");
                    allocator
                        .allocate_asset_number(&mut *guard, "Dell", "XPS", "SN1")
                        .expect("allocate")
                };
                barrier.wait();
                let result = store
                    .lock()
                    .expect("lock")
                    .insert_asset(record(number.clone(), &format!("copy-{i}")));
                (number, result)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect()
}

#[test]
fn scan_strategy_computes_the_same_number_twice() {
    let results = interleaved(SequenceStrategy::Scan);

    assert_eq!(results[0].0, results[1].0);
    assert_eq!(results[0].0.as_str(), "DELL-XPS-SN1-000001");

    let rejected = results
        .iter()
        .filter(|(_, r)| matches!(r, Err(StashError::DuplicateAssetNumber(_))))
        .count();
    assert_eq!(rejected, 1, "uniqueness constraint must reject one insert");
}

#[test]
fn scan_loser_recovers_by_reallocating() {
    let mut store = MemoryStore::new();
    let scan = allocator(SequenceStrategy::Scan);

    let first = scan
        .allocate_asset_number(&mut store, "Dell", "XPS", "SN1")
        .expect("allocate");
    let second = scan
        .allocate_asset_number(&mut store, "Dell", "XPS", "SN1")
        .expect("allocate");
    assert_eq!(first, second);

    store.insert_asset(record(first, "a")).expect("insert");
    let err = store
        .insert_asset(record(second, "b"))
        .expect_err("duplicate");
    assert!(matches!(err, StashError::DuplicateAssetNumber(_)));

    let retried = scan
        .allocate_asset_number(&mut store, "Dell", "XPS", "SN1")
        .expect("allocate");
    assert_eq!(retried.as_str(), "DELL-XPS-SN1-000002");
    store.insert_asset(record(retried, "b")).expect("insert");
}

#[test]
fn counter_strategy_hands_out_distinct_numbers() {
    let results = interleaved(SequenceStrategy::Counter);

    assert_ne!(results[0].0, results[1].0);
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    let suffixes: BTreeSet<&str> = results
        .iter()
        .map(|(n, _)| n.as_str().rsplit('-').next().unwrap_or_default())
        .collect();
    assert_eq!(
        suffixes,
        BTreeSet::from(["000001", "000002"])
    );
}

#[test]
fn counter_on_redb_is_unique_under_contention() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 25;

    let temp = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(Mutex::new(
        RedbStore::open(temp.path().join("race.redb")).expect("open db"),
    ));
    let barrier = Arc::new(Barrier::new(THREADS));
    let counter = Arc::new(allocator(SequenceStrategy::Counter));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|_| {
                        let mut guard = store.lock().expect("lock");
                        counter
                            .allocate_asset_number(&mut *guard, "Dell", "XPS", "SN1")
                            .expect("allocate")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = BTreeSet::new();
    for handle in handles {
        for number in handle.join().expect("thread") {
            assert!(all.insert(number), "number issued twice");
        }
    }

    assert_eq!(all.len(), THREADS * PER_THREAD);
    let last = format!("DELL-XPS-SN1-{:06}", THREADS * PER_THREAD);
    assert!(all.contains(&AssetNumber::new(last)));
}
