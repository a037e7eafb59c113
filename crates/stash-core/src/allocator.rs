//! # Identifier Allocator
//!
//! Produces asset numbers and maintenance references.
//!
//! ## Asset numbers
//!
//! `BRAND-MODEL-SERIAL-000001`: the normalised prefix followed by a
//! zero-padded suffix that is strictly increasing per prefix. Where the
//! next suffix comes from is governed by [`SequenceStrategy`]:
//!
//! - `Counter` asks the store for an atomic increment of a per-prefix
//!   counter. Two callers can never receive the same suffix, and suffixes
//!   of deleted assets are never handed out again.
//! - `Scan` reads the highest existing asset number and adds one. Two
//!   callers that read before either inserts compute the same number; the
//!   store's uniqueness constraint rejects the second insert.
//!
//! ## Maintenance references
//!
//! `<ASSET NUMBER>-YYYYMMDD-NNNNNN` with a random six-digit tail drawn from a
//! [`SuffixSource`]. No store read is involved; collisions are caught by the
//! store's uniqueness constraint and resolved by drawing again.

use crate::normalize::{asset_prefix, compact_date, suffix_of};
use crate::primitives::{
    DEFAULT_MAX_ATTEMPTS, MAINTENANCE_SUFFIX_MAX, MAINTENANCE_SUFFIX_MIN, MAX_FIXED_SUFFIX,
    SEPARATOR, SUFFIX_WIDTH,
};
use crate::store::RecordStore;
use crate::{AssetNumber, AssetPrefix, MaintenanceReference, StashError};
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// How the next asset number suffix for a prefix is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceStrategy {
    /// Atomic per-prefix counter held by the store.
    #[default]
    Counter,
    /// Highest existing asset number plus one.
    Scan,
}

/// What happens when a suffix no longer fits in six digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixOverflow {
    /// Refuse with `SuffixExhausted`.
    #[default]
    Fail,
    /// Let the suffix grow past six digits.
    Widen,
}

/// Allocator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    pub strategy: SequenceStrategy,
    pub overflow: SuffixOverflow,
    /// Attempts per record before a duplicate key becomes `AllocationConflict`.
    pub max_attempts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            strategy: SequenceStrategy::default(),
            overflow: SuffixOverflow::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AllocatorConfig {
    /// Reject settings the registry cannot work with.
    pub fn validate(&self) -> Result<(), StashError> {
        if self.max_attempts == 0 {
            return Err(StashError::ConfigError(
                "allocator.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// SUFFIX SOURCE
// =============================================================================

/// Source of the random tail of maintenance references.
///
/// Swapping the source makes reference generation deterministic in tests.
pub trait SuffixSource: Send + Sync {
    /// A value in `MAINTENANCE_SUFFIX_MIN..=MAINTENANCE_SUFFIX_MAX`.
    fn next_suffix(&self) -> u32;
}

/// Uniform draws from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSource;

impl SuffixSource for ThreadRngSource {
    fn next_suffix(&self) -> u32 {
        rand::thread_rng().gen_range(MAINTENANCE_SUFFIX_MIN..=MAINTENANCE_SUFFIX_MAX)
    }
}

/// Replays a fixed list of suffixes, cycling when exhausted.
///
/// Values outside the valid range are clamped into it.
#[derive(Debug, Default)]
pub struct ScriptedSuffixes {
    values: Vec<u32>,
    cursor: AtomicUsize,
}

impl ScriptedSuffixes {
    /// Create a source that yields `values` in order.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            cursor: AtomicUsize::new(0),
        }
    }
}

impl SuffixSource for ScriptedSuffixes {
    fn next_suffix(&self) -> u32 {
        if self.values.is_empty() {
            return MAINTENANCE_SUFFIX_MIN;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[index].clamp(MAINTENANCE_SUFFIX_MIN, MAINTENANCE_SUFFIX_MAX)
    }
}

// =============================================================================
// ALLOCATOR
// =============================================================================

/// Derives asset numbers and maintenance references.
#[derive(Clone)]
pub struct IdentifierAllocator {
    config: AllocatorConfig,
    suffixes: Arc<dyn SuffixSource>,
}

impl std::fmt::Debug for IdentifierAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierAllocator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

impl IdentifierAllocator {
    /// Create an allocator drawing reference suffixes from the thread RNG.
    #[must_use]
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            suffixes: Arc::new(ThreadRngSource),
        }
    }

    /// Replace the source of maintenance reference suffixes.
    #[must_use]
    pub fn with_suffix_source(mut self, source: Arc<dyn SuffixSource>) -> Self {
        self.suffixes = source;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Allocate the next asset number for the given identifying fields.
    ///
    /// Validation runs before the store is touched, so a rejected input
    /// never consumes a counter value.
    pub fn allocate_asset_number<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        brand: &str,
        model: &str,
        serial: &str,
    ) -> Result<AssetNumber, StashError> {
        let prefix = asset_prefix(brand, model, serial)?;

        let suffix = match self.config.strategy {
            SequenceStrategy::Counter => store.next_sequence(&prefix)?,
            SequenceStrategy::Scan => match store.last_asset_number(&prefix)? {
                Some(last) => suffix_of(last.as_str(), &prefix)
                    .map_or(1, |suffix| suffix.saturating_add(1)),
                None => 1,
            },
        };

        self.format_asset_number(&prefix, suffix)
    }

    /// Render `prefix-suffix`, applying the overflow policy.
    pub fn format_asset_number(
        &self,
        prefix: &AssetPrefix,
        suffix: u64,
    ) -> Result<AssetNumber, StashError> {
        if suffix > MAX_FIXED_SUFFIX && self.config.overflow == SuffixOverflow::Fail {
            return Err(StashError::SuffixExhausted {
                prefix: prefix.to_string(),
            });
        }
        Ok(AssetNumber(format!(
            "{prefix}{SEPARATOR}{suffix:0width$}",
            width = SUFFIX_WIDTH
        )))
    }

    /// Build a maintenance reference for `asset_number` on `date`.
    #[must_use]
    pub fn allocate_maintenance_reference(
        &self,
        asset_number: &AssetNumber,
        date: NaiveDate,
    ) -> MaintenanceReference {
        let tail = self.suffixes.next_suffix();
        MaintenanceReference(format!(
            "{asset_number}{SEPARATOR}{}{SEPARATOR}{tail}",
            compact_date(date)
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================
