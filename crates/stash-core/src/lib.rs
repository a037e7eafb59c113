//! # stash-core
//!
//! Identifier allocation and record storage for the Stash asset inventory.
//!
//! Every inventory asset carries an asset number of the form
//! `BRAND-MODEL-SERIAL-000001`; every maintenance event carries a reference
//! of the form `<ASSET NUMBER>-YYYYMMDD-NNNNNN`. This crate derives those
//! identifiers and makes sure two records never end up with the same one.
//!
//! ## Layout
//!
//! - `normalize`: input cleaning and prefix derivation
//! - `allocator`: asset numbers and maintenance references
//! - `store` / `storage`: the `RecordStore` seam, in memory and on redb
//! - `registry`: record creation with uniqueness checks and bounded retry
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Ordered collections only, so listings are stable
//! - Reports problems through `StashError`; logging is left to the caller

// =============================================================================
// MODULES
// =============================================================================

pub mod allocator;
pub mod normalize;
pub mod primitives;
pub mod registry;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AssetDraft, AssetNumber, AssetPatch, AssetPrefix, AssetRecord, Assignment, AssignmentDraft,
    AssignmentId, DEFAULT_ASSET_CREATOR, DEFAULT_ASSIGNMENT_CREATOR, DEFAULT_ASSIGNMENT_STATUS,
    DISPOSAL_AGE_YEARS, MaintenanceDraft, MaintenanceFilter, MaintenanceRecord,
    MaintenanceReference, MaintenanceView, RegistryStats, SequenceCounter, StashError,
};

// =============================================================================
// RE-EXPORTS: Allocation and Storage
// =============================================================================

pub use allocator::{
    AllocatorConfig, IdentifierAllocator, ScriptedSuffixes, SequenceStrategy, SuffixOverflow,
    SuffixSource, ThreadRngSource,
};
pub use normalize::{asset_prefix, parse_calendar_date};
pub use registry::{Registry, StorageBackend};
pub use storage::RedbStore;
pub use store::{MemoryStore, RecordStore};
