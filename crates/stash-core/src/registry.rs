//! # Registry Module
//!
//! The record-creation layer: validates input, allocates identifiers and
//! writes records through a [`RecordStore`].
//!
//! ## Storage Backends
//!
//! Registry supports two storage backends:
//! - `InMemory`: Uses `MemoryStore` (fast, volatile)
//! - `Persistent`: Uses `RedbStore` for disk-backed ACID storage
//!
//! ## Conflict handling
//!
//! Identifiers are protected by the store's uniqueness constraints. When an
//! insert is rejected as a duplicate, the registry allocates a fresh
//! identifier and tries again, up to `AllocatorConfig::max_attempts` times
//! per record. Any other store error is returned unchanged.

use crate::allocator::IdentifierAllocator;
use crate::normalize::{identifying_field, required_field, text_field};
use crate::storage::RedbStore;
use crate::store::{MemoryStore, RecordStore};
use crate::{
    AssetDraft, AssetNumber, AssetPatch, AssetRecord, Assignment, AssignmentDraft, AssignmentId,
    DEFAULT_ASSET_CREATOR, DEFAULT_ASSIGNMENT_CREATOR, DEFAULT_ASSIGNMENT_STATUS,
    MaintenanceDraft, MaintenanceFilter, MaintenanceRecord, MaintenanceReference, MaintenanceView,
    RegistryStats, SequenceCounter, StashError,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::path::Path;

/// Storage backend for a Registry.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn RecordStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn RecordStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }
}

/// Creates and manages inventory, maintenance and assignment records.
#[derive(Debug, Default)]
pub struct Registry {
    /// The storage backend (in-memory or persistent).
    backend: StorageBackend,
    /// Derives asset numbers and maintenance references.
    allocator: IdentifierAllocator,
    /// Duplicate-key retries since construction (volatile).
    retries: u64,
}

impl Registry {
    /// Create an empty in-memory registry with the default allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry over an existing backend.
    #[must_use]
    pub fn with_backend(backend: StorageBackend, allocator: IdentifierAllocator) -> Self {
        Self {
            backend,
            allocator,
            retries: 0,
        }
    }

    /// Create a registry with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(
        path: impl AsRef<Path>,
        allocator: IdentifierAllocator,
    ) -> Result<Self, StashError> {
        let store = RedbStore::open(path)?;
        Ok(Self::with_backend(StorageBackend::Persistent(store), allocator))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn allocator(&self) -> &IdentifierAllocator {
        &self.allocator
    }

    // =========================================================================
    // INVENTORY
    // =========================================================================

    /// Create an inventory record under a freshly allocated asset number.
    pub fn create_asset(&mut self, draft: AssetDraft) -> Result<AssetRecord, StashError> {
        let mut draft = clean_asset_draft(draft)?;
        self.ensure_serial_free(&draft.serial_number, None)?;
        if draft.created_by.is_empty() {
            draft.created_by = DEFAULT_ASSET_CREATOR.to_string();
        }
        self.insert_new_asset(&draft)
    }

    /// Look up an inventory record.
    pub fn asset(&self, number: &AssetNumber) -> Result<AssetRecord, StashError> {
        self.backend
            .store()
            .get_asset(number)?
            .ok_or_else(|| StashError::AssetNotFound(number.to_string()))
    }

    /// All inventory records, ordered by asset number.
    pub fn assets(&self) -> Result<Vec<AssetRecord>, StashError> {
        self.backend.store().assets()
    }

    /// Inventory records older than [`crate::DISPOSAL_AGE_YEARS`] on `today`.
    pub fn disposal_candidates(&self, today: NaiveDate) -> Result<Vec<AssetRecord>, StashError> {
        let mut assets = self.backend.store().assets()?;
        assets.retain(|record| record.is_disposal_candidate(today));
        Ok(assets)
    }

    /// Change descriptive fields of an inventory record.
    ///
    /// The asset number stays as issued even when brand, model or serial
    /// change. A new serial must not belong to another record.
    pub fn update_asset(
        &mut self,
        number: &AssetNumber,
        patch: AssetPatch,
    ) -> Result<AssetRecord, StashError> {
        let mut record = self.asset(number)?;
        if patch.is_empty() {
            return Ok(record);
        }

        if let Some(serial) = patch.serial_number {
            let serial = required_field(&serial, "serial_number")?;
            if serial != record.serial_number {
                self.ensure_serial_free(&serial, Some(number))?;
            }
            record.serial_number = serial;
        }
        if let Some(brand) = patch.brand {
            record.brand = identifying_field(&brand, "brand")?;
        }
        if let Some(model) = patch.model {
            record.model = identifying_field(&model, "model")?;
        }
        if let Some(asset_type) = patch.asset_type {
            record.asset_type = text_field(&asset_type, "asset_type")?;
        }
        if let Some(processor) = patch.processor {
            record.processor = text_field(&processor, "processor")?;
        }
        if let Some(ram) = patch.ram {
            record.ram = text_field(&ram, "ram")?;
        }
        if let Some(storage) = patch.storage {
            record.storage = text_field(&storage, "storage")?;
        }
        if let Some(remarks) = patch.remarks {
            record.remarks = text_field(&remarks, "remarks")?;
        }
        if let Some(purchase_date) = patch.purchase_date {
            record.purchase_date = purchase_date;
        }
        if patch.amount_cents.is_some() {
            record.amount_cents = patch.amount_cents;
        }
        record.updated_at = Utc::now();

        self.backend.store_mut().replace_asset(record.clone())?;
        Ok(record)
    }

    /// Remove an inventory record.
    ///
    /// Refused while maintenance entries or assignments reference the asset.
    /// The sequence counter of the prefix is left as it is.
    pub fn delete_asset(&mut self, number: &AssetNumber) -> Result<AssetRecord, StashError> {
        self.asset(number)?;

        let store = self.backend.store();
        let entries = store.maintenance_for_asset(number)?.len();
        if entries > 0 {
            return Err(StashError::AssetInUse {
                asset: number.to_string(),
                entries,
            });
        }
        let assignments = store
            .assignments()?
            .iter()
            .filter(|a| &a.asset_number == number)
            .count();
        if assignments > 0 {
            return Err(StashError::AssetAssigned {
                asset: number.to_string(),
                assignments,
            });
        }

        self.backend
            .store_mut()
            .remove_asset(number)?
            .ok_or_else(|| StashError::AssetNotFound(number.to_string()))
    }

    // =========================================================================
    // ASSIGNMENT
    // =========================================================================

    /// Add a new asset to the inventory and assign it to an employee.
    ///
    /// Brand and model are optional here; the serial number is required and
    /// must not already be in the inventory.
    pub fn assign_asset(
        &mut self,
        draft: AssignmentDraft,
    ) -> Result<(AssetRecord, Assignment), StashError> {
        let mut asset = clean_asset_draft(draft.asset)?;
        let reference_id = text_field(&draft.reference_id, "reference_id")?;
        let first_name = text_field(&draft.first_name, "first_name")?;
        let last_name = text_field(&draft.last_name, "last_name")?;
        let position = text_field(&draft.position, "position")?;
        let department = text_field(&draft.department, "department")?;
        let location = text_field(&draft.location, "location")?;
        let mut status = text_field(&draft.status, "status")?;
        if status.is_empty() {
            status = DEFAULT_ASSIGNMENT_STATUS.to_string();
        }

        self.ensure_serial_free(&asset.serial_number, None)?;
        if asset.created_by.is_empty() {
            asset.created_by = DEFAULT_ASSIGNMENT_CREATOR.to_string();
        }
        let record = self.insert_new_asset(&asset)?;

        let mut assignment = Assignment {
            id: AssignmentId::default(),
            asset_number: record.asset_number.clone(),
            serial_number: record.serial_number.clone(),
            reference_id,
            first_name,
            last_name,
            position,
            department,
            location,
            status,
            created_by: record.created_by.clone(),
            created_at: record.created_at,
        };
        assignment.id = self
            .backend
            .store_mut()
            .insert_assignment(assignment.clone())?;

        Ok((record, assignment))
    }

    /// All assignments, ordered by id.
    pub fn assignments(&self) -> Result<Vec<Assignment>, StashError> {
        self.backend.store().assignments()
    }

    // =========================================================================
    // MAINTENANCE
    // =========================================================================

    /// Record a maintenance event for an existing asset.
    pub fn log_maintenance(
        &mut self,
        draft: MaintenanceDraft,
    ) -> Result<MaintenanceRecord, StashError> {
        let asset_number = text_field(&draft.asset_number, "asset_number")?;
        if asset_number.is_empty() {
            return Err(StashError::MissingField("asset_number"));
        }
        let asset_number = AssetNumber(asset_number);
        let performed_by = text_field(&draft.performed_by, "performed_by")?;
        let remarks = text_field(&draft.remarks, "remarks")?;
        let status = text_field(&draft.status, "status")?;

        self.asset(&asset_number)?;

        let max_attempts = self.allocator.config().max_attempts;
        let created_at = Utc::now();
        for _ in 0..max_attempts {
            let reference = self
                .allocator
                .allocate_maintenance_reference(&asset_number, draft.maintenance_date);
            let record = MaintenanceRecord {
                reference,
                asset_number: asset_number.clone(),
                maintenance_date: draft.maintenance_date,
                scheduled_date: draft.scheduled_date,
                performed_by: performed_by.clone(),
                remarks: remarks.clone(),
                status: status.clone(),
                created_at,
            };
            match self.backend.store_mut().insert_maintenance(record.clone()) {
                Ok(()) => return Ok(record),
                Err(StashError::DuplicateMaintenanceReference(_)) => self.retries += 1,
                Err(e) => return Err(e),
            }
        }

        Err(StashError::AllocationConflict {
            attempts: max_attempts,
        })
    }

    /// Maintenance entries joined with their inventory records.
    ///
    /// A `from` bound later than `to` is rejected as an invalid range.
    pub fn maintenance_log(
        &self,
        filter: &MaintenanceFilter,
    ) -> Result<Vec<MaintenanceView>, StashError> {
        if let Some((from, to)) = filter.from.zip(filter.to).filter(|(from, to)| from > to) {
            return Err(StashError::InvalidDate(format!(
                "range start {} is after its end {}",
                from, to
            )));
        }

        let store = self.backend.store();
        let mut entries = match &filter.asset_number {
            Some(number) => store.maintenance_for_asset(number)?,
            None => store.maintenance()?,
        };
        entries.retain(|entry| filter.matches(entry));

        let mut assets: BTreeMap<AssetNumber, Option<AssetRecord>> = BTreeMap::new();
        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let asset = match assets.get(&entry.asset_number) {
                Some(cached) => cached.clone(),
                None => {
                    let loaded = store.get_asset(&entry.asset_number)?;
                    assets.insert(entry.asset_number.clone(), loaded.clone());
                    loaded
                }
            };
            views.push(MaintenanceView { entry, asset });
        }
        Ok(views)
    }

    /// Remove a maintenance entry.
    pub fn delete_maintenance(
        &mut self,
        reference: &MaintenanceReference,
    ) -> Result<MaintenanceRecord, StashError> {
        self.backend
            .store_mut()
            .remove_maintenance(reference)?
            .ok_or_else(|| StashError::MaintenanceNotFound(reference.to_string()))
    }

    // =========================================================================
    // INTROSPECTION
    // =========================================================================

    /// All sequence counters, ordered by prefix.
    pub fn counters(&self) -> Result<Vec<SequenceCounter>, StashError> {
        self.backend.store().counters()
    }

    /// Record counts and the retry tally.
    pub fn stats(&self) -> Result<RegistryStats, StashError> {
        let store = self.backend.store();
        Ok(RegistryStats {
            assets: store.asset_count()?,
            maintenance_entries: store.maintenance_count()?,
            assignments: store.assignment_count()?,
            counters: store.counters()?.len(),
            allocation_retries: self.retries,
        })
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn ensure_serial_free(
        &self,
        serial: &str,
        owner: Option<&AssetNumber>,
    ) -> Result<(), StashError> {
        match self.backend.store().find_asset_by_serial(serial)? {
            Some(existing) if Some(&existing.asset_number) != owner => {
                Err(StashError::DuplicateSerial(serial.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Allocate and insert, re-allocating on duplicate asset numbers.
    fn insert_new_asset(&mut self, draft: &AssetDraft) -> Result<AssetRecord, StashError> {
        let max_attempts = self.allocator.config().max_attempts;
        let now = Utc::now();
        for _ in 0..max_attempts {
            let number = self.allocator.allocate_asset_number(
                self.backend.store_mut(),
                &draft.brand,
                &draft.model,
                &draft.serial_number,
            )?;
            let record = asset_record(number, draft, now);
            match self.backend.store_mut().insert_asset(record.clone()) {
                Ok(()) => return Ok(record),
                Err(StashError::DuplicateAssetNumber(_)) => self.retries += 1,
                Err(e) => return Err(e),
            }
        }

        Err(StashError::AllocationConflict {
            attempts: max_attempts,
        })
    }
}

/// Trim and bound every field of an asset draft.
fn clean_asset_draft(draft: AssetDraft) -> Result<AssetDraft, StashError> {
    Ok(AssetDraft {
        brand: identifying_field(&draft.brand, "brand")?,
        model: identifying_field(&draft.model, "model")?,
        serial_number: required_field(&draft.serial_number, "serial_number")?,
        asset_type: text_field(&draft.asset_type, "asset_type")?,
        processor: text_field(&draft.processor, "processor")?,
        ram: text_field(&draft.ram, "ram")?,
        storage: text_field(&draft.storage, "storage")?,
        purchase_date: draft.purchase_date,
        amount_cents: draft.amount_cents,
        remarks: text_field(&draft.remarks, "remarks")?,
        created_by: text_field(&draft.created_by, "created_by")?,
    })
}

fn asset_record(number: AssetNumber, draft: &AssetDraft, now: DateTime<Utc>) -> AssetRecord {
    AssetRecord {
        asset_number: number,
        brand: draft.brand.clone(),
        model: draft.model.clone(),
        serial_number: draft.serial_number.clone(),
        asset_type: draft.asset_type.clone(),
        processor: draft.processor.clone(),
        ram: draft.ram.clone(),
        storage: draft.storage.clone(),
        purchase_date: draft.purchase_date,
        amount_cents: draft.amount_cents,
        remarks: draft.remarks.clone(),
        created_by: draft.created_by.clone(),
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// TESTS
// =============================================================================
