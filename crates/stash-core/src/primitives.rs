//! # Allocation Primitives
//!
//! Fixed constants for identifier derivation and input validation.
//!
//! These are compiled into the binary and are immutable at runtime.
//! Anything an operator may want to tune lives in `AllocatorConfig` instead.

/// Separator between identifier components.
///
/// - Asset number: `BRAND-MODEL-SERIAL-000001`
/// - Maintenance reference: `<ASSET NUMBER>-YYYYMMDD-NNNNNN`
pub const SEPARATOR: char = '-';

/// Replacement for each run of whitespace inside a prefix.
pub const WHITESPACE_FILLER: &str = "_";

/// Placeholder used when an asset has no brand.
pub const UNKNOWN_BRAND: &str = "UNK";

/// Placeholder used when an asset has no model.
pub const GENERIC_MODEL: &str = "GEN";

/// Minimum width of the asset number suffix. Shorter values are zero-padded.
pub const SUFFIX_WIDTH: usize = 6;

/// Largest suffix representable in `SUFFIX_WIDTH` digits.
pub const MAX_FIXED_SUFFIX: u64 = 999_999;

/// Inclusive bounds of the random maintenance reference suffix.
pub const MAINTENANCE_SUFFIX_MIN: u32 = 100_000;

/// See `MAINTENANCE_SUFFIX_MIN`.
pub const MAINTENANCE_SUFFIX_MAX: u32 = 999_999;

/// Default number of allocation attempts before giving up on a duplicate key.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length in bytes for brand, model and serial number.
///
/// Longer values are rejected before an identifier is derived from them.
pub const MAX_FIELD_LENGTH: usize = 256;

/// Maximum length in bytes for free-text fields (remarks, names, specs).
pub const MAX_TEXT_LENGTH: usize = 4096;
