//! # Normalisation
//!
//! Input cleaning and the string shapes identifiers are built from.
//!
//! - Trim and bound descriptive fields before they reach an identifier
//! - Build the `BRAND-MODEL-SERIAL` prefix
//! - Recognise `prefix-<digits>` suffixes when scanning existing numbers
//! - Parse and compact calendar dates

use crate::primitives::{
    GENERIC_MODEL, MAX_FIELD_LENGTH, MAX_TEXT_LENGTH, SEPARATOR, SUFFIX_WIDTH, UNKNOWN_BRAND,
    WHITESPACE_FILLER,
};
use crate::{AssetPrefix, StashError};
use chrono::{DateTime, NaiveDate, Utc};

/// Trim an identifying field and enforce `MAX_FIELD_LENGTH`.
pub fn identifying_field(value: &str, field: &'static str) -> Result<String, StashError> {
    let trimmed = value.trim();
    if trimmed.len() > MAX_FIELD_LENGTH {
        return Err(StashError::FieldTooLong {
            field,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Trim an identifying field that must not be blank.
pub fn required_field(value: &str, field: &'static str) -> Result<String, StashError> {
    let cleaned = identifying_field(value, field)?;
    if cleaned.is_empty() {
        return Err(StashError::MissingField(field));
    }
    Ok(cleaned)
}

/// Trim a free-text field and enforce `MAX_TEXT_LENGTH`.
pub fn text_field(value: &str, field: &'static str) -> Result<String, StashError> {
    let trimmed = value.trim();
    if trimmed.len() > MAX_TEXT_LENGTH {
        return Err(StashError::FieldTooLong {
            field,
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Build the normalised asset number prefix.
///
/// `BRAND-MODEL-SERIAL`, upper-cased, each whitespace run replaced by `_`.
/// Blank brand and model become `UNK` and `GEN`; a blank serial is rejected.
///
/// Different assets can map to the same prefix (e.g. brand `"A-B"` with
/// model `"C"` and brand `"A"` with model `"B-C"`). They then share one
/// suffix sequence, which keeps their asset numbers distinct.
pub fn asset_prefix(brand: &str, model: &str, serial: &str) -> Result<AssetPrefix, StashError> {
    let serial = required_field(serial, "serial_number")?;
    let brand = identifying_field(brand, "brand")?;
    let model = identifying_field(model, "model")?;

    let brand = if brand.is_empty() {
        UNKNOWN_BRAND
    } else {
        brand.as_str()
    };
    let model = if model.is_empty() {
        GENERIC_MODEL
    } else {
        model.as_str()
    };

    let raw = format!("{brand}{SEPARATOR}{model}{SEPARATOR}{serial}");
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(WHITESPACE_FILLER);

    Ok(AssetPrefix(collapsed.to_uppercase()))
}

/// The key prefix under which all asset numbers of `prefix` sort together.
#[must_use]
pub fn sequence_key_prefix(prefix: &AssetPrefix) -> String {
    format!("{}{}", prefix.as_str(), SEPARATOR)
}

/// Extract the numeric suffix of `asset_number` if it belongs to `prefix`.
///
/// Matches `prefix-` followed by at least `SUFFIX_WIDTH` ASCII digits and
/// nothing else. Numbers of a longer prefix that merely starts with the same
/// text (`PREFIX-X-000001`) do not match.
#[must_use]
pub fn suffix_of(asset_number: &str, prefix: &AssetPrefix) -> Option<u64> {
    let rest = asset_number.strip_prefix(&sequence_key_prefix(prefix))?;
    if rest.len() < SUFFIX_WIDTH || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp; timestamps are converted
/// to their UTC calendar date.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, StashError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StashError::InvalidDate("empty date".to_string()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| StashError::InvalidDate(trimmed.to_string()))
}

/// Format a date as compact `YYYYMMDD`.
#[must_use]
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

// =============================================================================
// TESTS
// =============================================================================
