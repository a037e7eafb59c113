//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database.
//!
//! redb gives the properties the allocator depends on:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! The single-writer model is what makes `next_sequence` an atomic
//! increment-and-fetch: the counter read, the seed scan and the counter
//! write all happen inside one write transaction.

use crate::normalize::sequence_key_prefix;
use crate::store::{RecordStore, highest_matching, reference_key_prefix};
use crate::{
    AssetNumber, AssetPrefix, AssetRecord, Assignment, AssignmentId, MaintenanceRecord,
    MaintenanceReference, SequenceCounter, StashError,
};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Inventory: asset number -> postcard AssetRecord.
const ASSETS: TableDefinition<&str, &[u8]> = TableDefinition::new("inventory");

/// Maintenance log: reference -> postcard MaintenanceRecord.
const MAINTENANCE: TableDefinition<&str, &[u8]> = TableDefinition::new("maintenance_logs");

/// Assignments: id -> postcard Assignment.
const ASSIGNMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("assigned_assets");

/// Sequence counters: prefix -> last issued suffix.
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("sequence_counters");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_ASSIGNMENT_ID: &str = "next_assignment_id";

fn io_err(e: impl std::fmt::Display) -> StashError {
    StashError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StashError> {
    postcard::to_allocvec(value).map_err(|e| StashError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StashError> {
    postcard::from_bytes(bytes).map_err(|e| StashError::SerializationError(e.to_string()))
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StashError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(ASSETS).map_err(io_err)?;
            let _ = write_txn.open_table(MAINTENANCE).map_err(io_err)?;
            let _ = write_txn.open_table(ASSIGNMENTS).map_err(io_err)?;
            let _ = write_txn.open_table(COUNTERS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), StashError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    fn read_all<T: DeserializeOwned>(
        &self,
        definition: TableDefinition<&str, &[u8]>,
    ) -> Result<Vec<T>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(definition).map_err(io_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }

    fn count(&self, definition: TableDefinition<&str, &[u8]>) -> Result<usize, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(definition).map_err(io_err)?;
        Ok(table.len().map_err(io_err)? as usize)
    }

    fn highest_in<T: ReadableTable<&'static str, &'static [u8]>>(
        table: &T,
        prefix: &AssetPrefix,
    ) -> Result<Option<(u64, String)>, StashError> {
        let key = sequence_key_prefix(prefix);
        let mut keys = Vec::new();
        for entry in table.range(key.as_str()..).map_err(io_err)? {
            let (k, _) = entry.map_err(io_err)?;
            let k = k.value();
            if !k.starts_with(&key) {
                break;
            }
            keys.push(k.to_string());
        }
        Ok(highest_matching(keys.iter().map(String::as_str), prefix)
            .map(|(suffix, number)| (suffix, number.to_string())))
    }
}

// =============================================================================
// RECORDSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl RecordStore for RedbStore {
    fn last_asset_number(&self, prefix: &AssetPrefix) -> Result<Option<AssetNumber>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSETS).map_err(io_err)?;
        Ok(Self::highest_in(&table, prefix)?.map(|(_, number)| AssetNumber(number)))
    }

    fn next_sequence(&mut self, prefix: &AssetPrefix) -> Result<u64, StashError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let next = {
            let assets = write_txn.open_table(ASSETS).map_err(io_err)?;
            let existing = Self::highest_in(&assets, prefix)?.map_or(0, |(suffix, _)| suffix);

            let mut counters = write_txn.open_table(COUNTERS).map_err(io_err)?;
            let current = counters
                .get(prefix.as_str())
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(0);
            let next = current.max(existing).saturating_add(1);
            counters.insert(prefix.as_str(), next).map_err(io_err)?;
            next
        };
        write_txn.commit().map_err(io_err)?;
        Ok(next)
    }

    fn counters(&self) -> Result<Vec<SequenceCounter>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(COUNTERS).map_err(io_err)?;

        let mut counters = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            counters.push(SequenceCounter {
                prefix: AssetPrefix(key.value().to_string()),
                last_issued: value.value(),
            });
        }
        Ok(counters)
    }

    fn insert_asset(&mut self, record: AssetRecord) -> Result<(), StashError> {
        let bytes = encode(&record)?;
        let key = record.asset_number.as_str();

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(ASSETS).map_err(io_err)?;
            if table.get(key).map_err(io_err)?.is_some() {
                return Err(StashError::DuplicateAssetNumber(key.to_string()));
            }
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn get_asset(&self, number: &AssetNumber) -> Result<Option<AssetRecord>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSETS).map_err(io_err)?;

        match table.get(number.as_str()).map_err(io_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn find_asset_by_serial(&self, serial: &str) -> Result<Option<AssetRecord>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSETS).map_err(io_err)?;

        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            let record: AssetRecord = decode(value.value())?;
            if record.serial_number == serial {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn assets(&self) -> Result<Vec<AssetRecord>, StashError> {
        self.read_all(ASSETS)
    }

    fn replace_asset(&mut self, record: AssetRecord) -> Result<(), StashError> {
        let bytes = encode(&record)?;
        let key = record.asset_number.as_str();

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(ASSETS).map_err(io_err)?;
            if table.get(key).map_err(io_err)?.is_none() {
                return Err(StashError::AssetNotFound(key.to_string()));
            }
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn remove_asset(&mut self, number: &AssetNumber) -> Result<Option<AssetRecord>, StashError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(ASSETS).map_err(io_err)?;
            let removed = table.remove(number.as_str()).map_err(io_err)?;
            match removed {
                Some(data) => Some(decode::<AssetRecord>(data.value())?),
                None => None,
            }
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn asset_count(&self) -> Result<usize, StashError> {
        self.count(ASSETS)
    }

    fn insert_maintenance(&mut self, record: MaintenanceRecord) -> Result<(), StashError> {
        let bytes = encode(&record)?;
        let key = record.reference.as_str();

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(MAINTENANCE).map_err(io_err)?;
            if table.get(key).map_err(io_err)?.is_some() {
                return Err(StashError::DuplicateMaintenanceReference(key.to_string()));
            }
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn get_maintenance(
        &self,
        reference: &MaintenanceReference,
    ) -> Result<Option<MaintenanceRecord>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(MAINTENANCE).map_err(io_err)?;

        match table.get(reference.as_str()).map_err(io_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn maintenance_for_asset(
        &self,
        number: &AssetNumber,
    ) -> Result<Vec<MaintenanceRecord>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(MAINTENANCE).map_err(io_err)?;
        let key = reference_key_prefix(number);

        let mut entries = Vec::new();
        for entry in table.range(key.as_str()..).map_err(io_err)? {
            let (k, value) = entry.map_err(io_err)?;
            if !k.value().starts_with(&key) {
                break;
            }
            let record: MaintenanceRecord = decode(value.value())?;
            if &record.asset_number == number {
                entries.push(record);
            }
        }
        Ok(entries)
    }

    fn maintenance(&self) -> Result<Vec<MaintenanceRecord>, StashError> {
        self.read_all(MAINTENANCE)
    }

    fn remove_maintenance(
        &mut self,
        reference: &MaintenanceReference,
    ) -> Result<Option<MaintenanceRecord>, StashError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(MAINTENANCE).map_err(io_err)?;
            let removed = table.remove(reference.as_str()).map_err(io_err)?;
            match removed {
                Some(data) => Some(decode::<MaintenanceRecord>(data.value())?),
                None => None,
            }
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn maintenance_count(&self) -> Result<usize, StashError> {
        self.count(MAINTENANCE)
    }

    fn insert_assignment(&mut self, mut assignment: Assignment) -> Result<AssignmentId, StashError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let id = {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            let id = meta
                .get(NEXT_ASSIGNMENT_ID)
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(1);
            meta.insert(NEXT_ASSIGNMENT_ID, id.saturating_add(1))
                .map_err(io_err)?;

            assignment.id = AssignmentId(id);
            let bytes = encode(&assignment)?;
            let mut table = write_txn.open_table(ASSIGNMENTS).map_err(io_err)?;
            table.insert(id, bytes.as_slice()).map_err(io_err)?;
            AssignmentId(id)
        };
        write_txn.commit().map_err(io_err)?;
        Ok(id)
    }

    fn assignments(&self) -> Result<Vec<Assignment>, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSIGNMENTS).map_err(io_err)?;

        let mut assignments = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            assignments.push(decode(value.value())?);
        }
        Ok(assignments)
    }

    fn assignment_count(&self) -> Result<usize, StashError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(ASSIGNMENTS).map_err(io_err)?;
        Ok(table.len().map_err(io_err)? as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
