//! # Core Type Definitions
//!
//! This module contains the core types for the Stash inventory:
//! - Derived identifiers (`AssetPrefix`, `AssetNumber`, `MaintenanceReference`)
//! - Store-assigned identifiers (`AssignmentId`)
//! - Record and draft structures (`records` submodule)
//! - Error types (`StashError`)
//!
//! ## Identifier Guarantees
//!
//! Derived identifiers are plain strings, generated once when the owning
//! record is created. Nothing in this crate rewrites an identifier after
//! the record has been stored.

mod records;

pub use records::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// DERIVED IDENTIFIERS
// =============================================================================

/// Normalised `BRAND-MODEL-SERIAL` part of an asset number.
///
/// Built by [`crate::normalize::asset_prefix`]. Two different assets may share
/// a prefix; the numeric suffix keeps their asset numbers apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetPrefix(pub String);

impl AssetPrefix {
    /// Get the prefix as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable asset identifier: `<PREFIX>-<suffix>`.
///
/// The suffix is at least six digits, zero-padded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetNumber(pub String);

impl AssetNumber {
    /// Create an asset number from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the asset number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maintenance event identifier: `<ASSET NUMBER>-<YYYYMMDD>-<NNNNNN>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaintenanceReference(pub String);

impl MaintenanceReference {
    /// Create a reference from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaintenanceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned identifier of an assignment record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AssignmentId(pub u64);

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Stash system.
///
/// - Validation errors are raised before any identifier is allocated
/// - Duplicate-key errors come from the store's uniqueness constraints
/// - Storage errors are propagated to the caller unchanged, never retried
#[derive(Debug, Error)]
pub enum StashError {
    /// A required field is missing or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field exceeds its length limit.
    #[error("Field {field} exceeds maximum length of {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },

    /// A date could not be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The referenced asset does not exist.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The referenced maintenance entry does not exist.
    #[error("Maintenance entry not found: {0}")]
    MaintenanceNotFound(String),

    /// An inventory record with this serial number already exists.
    #[error("Asset with serial number \"{0}\" already exists in inventory")]
    DuplicateSerial(String),

    /// The store already holds a record under this asset number.
    #[error("Duplicate asset number: {0}")]
    DuplicateAssetNumber(String),

    /// The store already holds a maintenance entry under this reference.
    #[error("Duplicate maintenance reference: {0}")]
    DuplicateMaintenanceReference(String),

    /// The asset is still referenced by maintenance entries.
    #[error("Asset {asset} is referenced by {entries} maintenance entries")]
    AssetInUse { asset: String, entries: usize },

    /// The asset is still held by an employee assignment.
    #[error("Asset {asset} is held by {assignments} assignment(s)")]
    AssetAssigned { asset: String, assignments: usize },

    /// The fixed-width suffix space for a prefix is used up.
    #[error("Asset number suffix exhausted for prefix {prefix}")]
    SuffixExhausted { prefix: String },

    /// Every allocation attempt collided with an existing identifier.
    #[error("Identifier allocation failed after {attempts} attempts")]
    AllocationConflict { attempts: u32 },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StashError {
    /// Whether the error was caused by the caller's input rather than the system.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::FieldTooLong { .. } | Self::InvalidDate(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_display_as_plain_strings() {
        let number = AssetNumber::new("DELL-XPS-SN1-000001");
        assert_eq!(number.to_string(), "DELL-XPS-SN1-000001");

        let reference = MaintenanceReference::new("DELL-XPS-SN1-000001-20240305-123456");
        assert_eq!(reference.as_str(), "DELL-XPS-SN1-000001-20240305-123456");
    }

    #[test]
    fn asset_numbers_order_lexicographically() {
        let a = AssetNumber::new("A-B-C-000002");
        let b = AssetNumber::new("A-B-C-000010");
        assert!(a < b);
    }

    #[test]
    fn validation_errors_are_classified() {
        assert!(StashError::MissingField("serial_number").is_validation());
        assert!(StashError::InvalidDate("x".into()).is_validation());
        assert!(!StashError::IoError("disk".into()).is_validation());
        assert!(!StashError::DuplicateSerial("SN".into()).is_validation());
    }

    #[test]
    fn duplicate_serial_message_names_the_serial() {
        let err = StashError::DuplicateSerial("SN123".into());
        assert_eq!(
            err.to_string(),
            "Asset with serial number \"SN123\" already exists in inventory"
        );
    }
}
