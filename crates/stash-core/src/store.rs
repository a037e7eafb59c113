//! # Record Store
//!
//! The document-store seam of Stash.
//!
//! This module defines the `RecordStore` trait and `MemoryStore`, its
//! in-memory implementation. All collections use `BTreeMap` so listings come
//! back in a stable order and asset numbers of one prefix sit next to each
//! other, which makes the "highest suffix for a prefix" query a range scan.

use crate::normalize::{sequence_key_prefix, suffix_of};
use crate::{
    AssetNumber, AssetPrefix, AssetRecord, Assignment, AssignmentId, MaintenanceRecord,
    MaintenanceReference, SequenceCounter, StashError,
};
use std::collections::BTreeMap;
use std::ops::Bound;

// =============================================================================
// RECORDSTORE TRAIT
// =============================================================================

/// Persistence operations the registry and allocator rely on.
///
/// Implementations must enforce two uniqueness constraints:
/// - `insert_asset` fails with `DuplicateAssetNumber` for an existing key
/// - `insert_maintenance` fails with `DuplicateMaintenanceReference`
///
/// `next_sequence` must be an atomic increment-and-fetch: no two calls for
/// the same prefix may return the same value.
pub trait RecordStore {
    /// Highest existing asset number matching `prefix-<digits>`.
    ///
    /// Equivalent to "find by prefix pattern, sort descending, limit 1", with
    /// suffixes compared numerically.
    fn last_asset_number(&self, prefix: &AssetPrefix) -> Result<Option<AssetNumber>, StashError>;

    /// Increment the counter for `prefix` and return the new value.
    ///
    /// The counter never falls behind the highest existing suffix for the
    /// prefix, so sequences started by a scan-based allocator carry on.
    fn next_sequence(&mut self, prefix: &AssetPrefix) -> Result<u64, StashError>;

    /// All sequence counters, ordered by prefix.
    fn counters(&self) -> Result<Vec<SequenceCounter>, StashError>;

    /// Insert a new inventory record.
    fn insert_asset(&mut self, record: AssetRecord) -> Result<(), StashError>;

    /// Look up an inventory record by asset number.
    fn get_asset(&self, number: &AssetNumber) -> Result<Option<AssetRecord>, StashError>;

    /// Find the inventory record holding `serial` (exact match).
    fn find_asset_by_serial(&self, serial: &str) -> Result<Option<AssetRecord>, StashError>;

    /// All inventory records, ordered by asset number.
    fn assets(&self) -> Result<Vec<AssetRecord>, StashError>;

    /// Overwrite an existing inventory record. Fails with `AssetNotFound`.
    fn replace_asset(&mut self, record: AssetRecord) -> Result<(), StashError>;

    /// Remove an inventory record. Counters are left untouched.
    fn remove_asset(&mut self, number: &AssetNumber) -> Result<Option<AssetRecord>, StashError>;

    /// Number of inventory records.
    fn asset_count(&self) -> Result<usize, StashError>;

    /// Insert a new maintenance entry.
    fn insert_maintenance(&mut self, record: MaintenanceRecord) -> Result<(), StashError>;

    /// Look up a maintenance entry by reference.
    fn get_maintenance(
        &self,
        reference: &MaintenanceReference,
    ) -> Result<Option<MaintenanceRecord>, StashError>;

    /// Maintenance entries of one asset, ordered by reference.
    fn maintenance_for_asset(
        &self,
        number: &AssetNumber,
    ) -> Result<Vec<MaintenanceRecord>, StashError>;

    /// All maintenance entries, ordered by reference.
    fn maintenance(&self) -> Result<Vec<MaintenanceRecord>, StashError>;

    /// Remove a maintenance entry.
    fn remove_maintenance(
        &mut self,
        reference: &MaintenanceReference,
    ) -> Result<Option<MaintenanceRecord>, StashError>;

    /// Number of maintenance entries.
    fn maintenance_count(&self) -> Result<usize, StashError>;

    /// Store an assignment under a fresh id. The `id` field of the argument
    /// is ignored and replaced.
    fn insert_assignment(&mut self, assignment: Assignment) -> Result<AssignmentId, StashError>;

    /// All assignments, ordered by id.
    fn assignments(&self) -> Result<Vec<Assignment>, StashError>;

    /// Number of assignments.
    fn assignment_count(&self) -> Result<usize, StashError>;
}

/// Pick the numerically highest suffix among keys of the prefix's range.
pub(crate) fn highest_matching<'a>(
    keys: impl Iterator<Item = &'a str>,
    prefix: &AssetPrefix,
) -> Option<(u64, &'a str)> {
    keys.filter_map(|key| suffix_of(key, prefix).map(|suffix| (suffix, key)))
        .max_by_key(|(suffix, _)| *suffix)
}

/// Key prefix shared by every maintenance reference derived from `number`.
pub(crate) fn reference_key_prefix(number: &AssetNumber) -> String {
    sequence_key_prefix(&AssetPrefix(number.as_str().to_string()))
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory record store.
///
/// Volatile: contents are lost when the value is dropped. Use
/// [`crate::RedbStore`] for persistence.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Inventory: asset number -> record.
    assets: BTreeMap<String, AssetRecord>,

    /// Maintenance log: reference -> record.
    maintenance: BTreeMap<String, MaintenanceRecord>,

    /// Assignments: id -> record.
    assignments: BTreeMap<u64, Assignment>,

    /// Sequence counters: prefix -> last issued suffix.
    counters: BTreeMap<AssetPrefix, u64>,

    /// Next assignment id.
    next_assignment_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            assets: BTreeMap::new(),
            maintenance: BTreeMap::new(),
            assignments: BTreeMap::new(),
            counters: BTreeMap::new(),
            next_assignment_id: 1,
        }
    }
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn highest_suffix(&self, prefix: &AssetPrefix) -> Option<(u64, &str)> {
        let key = sequence_key_prefix(prefix);
        let keys = self
            .assets
            .range::<str, _>((Bound::Included(key.as_str()), Bound::Unbounded))
            .map(|(k, _)| k.as_str())
            .take_while(|k| k.starts_with(&key));
        highest_matching(keys, prefix)
    }
}

impl RecordStore for MemoryStore {
    fn last_asset_number(&self, prefix: &AssetPrefix) -> Result<Option<AssetNumber>, StashError> {
        Ok(self
            .highest_suffix(prefix)
            .map(|(_, key)| AssetNumber::new(key)))
    }

    fn next_sequence(&mut self, prefix: &AssetPrefix) -> Result<u64, StashError> {
        let existing = self.highest_suffix(prefix).map_or(0, |(suffix, _)| suffix);
        let counter = self.counters.entry(prefix.clone()).or_insert(0);
        let next = (*counter).max(existing).saturating_add(1);
        *counter = next;
        Ok(next)
    }

    fn counters(&self) -> Result<Vec<SequenceCounter>, StashError> {
        Ok(self
            .counters
            .iter()
            .map(|(prefix, last)| SequenceCounter {
                prefix: prefix.clone(),
                last_issued: *last,
            })
            .collect())
    }

    fn insert_asset(&mut self, record: AssetRecord) -> Result<(), StashError> {
        let key = record.asset_number.as_str().to_string();
        if self.assets.contains_key(&key) {
            return Err(StashError::DuplicateAssetNumber(key));
        }
        self.assets.insert(key, record);
        Ok(())
    }

    fn get_asset(&self, number: &AssetNumber) -> Result<Option<AssetRecord>, StashError> {
        Ok(self.assets.get(number.as_str()).cloned())
    }

    fn find_asset_by_serial(&self, serial: &str) -> Result<Option<AssetRecord>, StashError> {
        Ok(self
            .assets
            .values()
            .find(|record| record.serial_number == serial)
            .cloned())
    }

    fn assets(&self) -> Result<Vec<AssetRecord>, StashError> {
        Ok(self.assets.values().cloned().collect())
    }

    fn replace_asset(&mut self, record: AssetRecord) -> Result<(), StashError> {
        match self.assets.get_mut(record.asset_number.as_str()) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StashError::AssetNotFound(record.asset_number.0)),
        }
    }

    fn remove_asset(&mut self, number: &AssetNumber) -> Result<Option<AssetRecord>, StashError> {
        Ok(self.assets.remove(number.as_str()))
    }

    fn asset_count(&self) -> Result<usize, StashError> {
        Ok(self.assets.len())
    }

    fn insert_maintenance(&mut self, record: MaintenanceRecord) -> Result<(), StashError> {
        let key = record.reference.as_str().to_string();
        if self.maintenance.contains_key(&key) {
            return Err(StashError::DuplicateMaintenanceReference(key));
        }
        self.maintenance.insert(key, record);
        Ok(())
    }

    fn get_maintenance(
        &self,
        reference: &MaintenanceReference,
    ) -> Result<Option<MaintenanceRecord>, StashError> {
        Ok(self.maintenance.get(reference.as_str()).cloned())
    }

    fn maintenance_for_asset(
        &self,
        number: &AssetNumber,
    ) -> Result<Vec<MaintenanceRecord>, StashError> {
        let key = reference_key_prefix(number);
        Ok(self
            .maintenance
            .range::<str, _>((Bound::Included(key.as_str()), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(&key))
            .filter(|(_, record)| &record.asset_number == number)
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn maintenance(&self) -> Result<Vec<MaintenanceRecord>, StashError> {
        Ok(self.maintenance.values().cloned().collect())
    }

    fn remove_maintenance(
        &mut self,
        reference: &MaintenanceReference,
    ) -> Result<Option<MaintenanceRecord>, StashError> {
        Ok(self.maintenance.remove(reference.as_str()))
    }

    fn maintenance_count(&self) -> Result<usize, StashError> {
        Ok(self.maintenance.len())
    }

    fn insert_assignment(&mut self, mut assignment: Assignment) -> Result<AssignmentId, StashError> {
        let id = AssignmentId(self.next_assignment_id);
        self.next_assignment_id = self.next_assignment_id.saturating_add(1);
        assignment.id = id;
        self.assignments.insert(id.0, assignment);
        Ok(id)
    }

    fn assignments(&self) -> Result<Vec<Assignment>, StashError> {
        Ok(self.assignments.values().cloned().collect())
    }

    fn assignment_count(&self) -> Result<usize, StashError> {
        Ok(self.assignments.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::fixtures::{asset, assignment, entry};
    use super::*;

    fn prefix(s: &str) -> AssetPrefix {
        AssetPrefix(s.to_string())
    }

    #[test]
    fn last_asset_number_empty_store() {
        let store = MemoryStore::new();
        assert!(store
            .last_asset_number(&prefix("DELL-XPS-SN1"))
            .expect("query")
            .is_none());
    }

    #[test]
    fn last_asset_number_picks_highest_suffix() {
        let mut store = MemoryStore::new();
        for n in ["DELL-XPS-SN1-000002", "DELL-XPS-SN1-000010", "DELL-XPS-SN1-000003"] {
            store.insert_asset(asset(n, n)).expect("insert");
        }
        let last = store
            .last_asset_number(&prefix("DELL-XPS-SN1"))
            .expect("query");
        assert_eq!(last, Some(AssetNumber::new("DELL-XPS-SN1-000010")));
    }

    #[test]
    fn last_asset_number_compares_widened_suffixes_numerically() {
        let mut store = MemoryStore::new();
        store
            .insert_asset(asset("A-B-C-999999", "s1"))
            .expect("insert");
        store
            .insert_asset(asset("A-B-C-1000000", "s2"))
            .expect("insert");
        let last = store.last_asset_number(&prefix("A-B-C")).expect("query");
        assert_eq!(last, Some(AssetNumber::new("A-B-C-1000000")));
    }

    #[test]
    fn last_asset_number_ignores_longer_prefixes() {
        let mut store = MemoryStore::new();
        store
            .insert_asset(asset("A-B-C-X-000009", "s1"))
            .expect("insert");
        store
            .insert_asset(asset("A-B-C-000001", "s2"))
            .expect("insert");
        let last = store.last_asset_number(&prefix("A-B-C")).expect("query");
        assert_eq!(last, Some(AssetNumber::new("A-B-C-000001")));
    }

    #[test]
    fn next_sequence_increments_per_prefix() {
        let mut store = MemoryStore::new();
        assert_eq!(store.next_sequence(&prefix("A")).expect("seq"), 1);
        assert_eq!(store.next_sequence(&prefix("A")).expect("seq"), 2);
        assert_eq!(store.next_sequence(&prefix("B")).expect("seq"), 1);
        assert_eq!(store.next_sequence(&prefix("A")).expect("seq"), 3);
    }

    #[test]
    fn next_sequence_seeds_from_existing_records() {
        let mut store = MemoryStore::new();
        store
            .insert_asset(asset("A-B-C-000007", "s1"))
            .expect("insert");
        assert_eq!(store.next_sequence(&prefix("A-B-C")).expect("seq"), 8);
    }

    #[test]
    fn next_sequence_survives_removal() {
        let mut store = MemoryStore::new();
        let p = prefix("A-B-C");
        let n = store.next_sequence(&p).expect("seq");
        let number = format!("A-B-C-{:06}", n);
        store.insert_asset(asset(&number, "s1")).expect("insert");
        store
            .remove_asset(&AssetNumber::new(number))
            .expect("remove");
        assert_eq!(store.next_sequence(&p).expect("seq"), 2);
    }

    #[test]
    fn insert_asset_rejects_duplicate_number() {
        let mut store = MemoryStore::new();
        store
            .insert_asset(asset("A-B-C-000001", "s1"))
            .expect("insert");
        let err = store
            .insert_asset(asset("A-B-C-000001", "s2"))
            .expect_err("duplicate");
        assert!(matches!(err, StashError::DuplicateAssetNumber(_)));
        assert_eq!(store.asset_count().expect("count"), 1);
    }

    #[test]
    fn find_by_serial_exact_match() {
        let mut store = MemoryStore::new();
        store
            .insert_asset(asset("A-B-C-000001", "SN-1"))
            .expect("insert");
        assert!(store.find_asset_by_serial("SN-1").expect("find").is_some());
        assert!(store.find_asset_by_serial("sn-1").expect("find").is_none());
    }

    #[test]
    fn replace_missing_asset_fails() {
        let mut store = MemoryStore::new();
        let err = store
            .replace_asset(asset("A-B-C-000001", "s1"))
            .expect_err("missing");
        assert!(matches!(err, StashError::AssetNotFound(_)));
    }

    #[test]
    fn maintenance_rejects_duplicate_reference() {
        let mut store = MemoryStore::new();
        store
            .insert_maintenance(entry("A-000001-20240305-111111", "A-000001"))
            .expect("insert");
        let err = store
            .insert_maintenance(entry("A-000001-20240305-111111", "A-000001"))
            .expect_err("duplicate");
        assert!(matches!(err, StashError::DuplicateMaintenanceReference(_)));
    }

    #[test]
    fn maintenance_for_asset_filters_exactly() {
        let mut store = MemoryStore::new();
        store
            .insert_maintenance(entry("A-000001-20240305-111111", "A-000001"))
            .expect("insert");
        store
            .insert_maintenance(entry("A-000001-20240306-222222", "A-000001"))
            .expect("insert");
        // Asset number that extends the first one.
        store
            .insert_maintenance(entry("A-000001-X-000001-20240305-333333", "A-000001-X-000001"))
            .expect("insert");

        let entries = store
            .maintenance_for_asset(&AssetNumber::new("A-000001"))
            .expect("query");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.asset_number.as_str() == "A-000001"));
    }

    #[test]
    fn assignment_ids_are_sequential() {
        let mut store = MemoryStore::new();
        let first = store.insert_assignment(assignment("A-000001")).expect("insert");
        let second = store.insert_assignment(assignment("A-000002")).expect("insert");
        assert_eq!(first, AssignmentId(1));
        assert_eq!(second, AssignmentId(2));

        let stored = store.assignments().expect("list");
        assert_eq!(stored[0].id, first);
        assert_eq!(stored[1].id, second);
    }
}
