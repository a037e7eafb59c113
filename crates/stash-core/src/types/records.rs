//! Inventory, maintenance and assignment records, plus the drafts callers
//! submit to create or change them.

use super::{AssetNumber, AssetPrefix, AssignmentId, MaintenanceReference};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// INVENTORY
// =============================================================================

/// A piece of hardware in the inventory, keyed by its asset number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_number: AssetNumber,
    pub brand: String,
    pub model: String,
    /// Unique business key among live inventory records.
    pub serial_number: String,
    pub asset_type: String,
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub purchase_date: Option<NaiveDate>,
    /// Purchase amount in minor currency units.
    pub amount_cents: Option<u64>,
    pub remarks: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assets older than this many whole years are disposal candidates.
pub const DISPOSAL_AGE_YEARS: u32 = 5;

impl AssetRecord {
    /// Whole years between the purchase date and `today`.
    ///
    /// `None` when no purchase date is recorded or it lies after `today`.
    #[must_use]
    pub fn age_years(&self, today: NaiveDate) -> Option<u32> {
        self.purchase_date.and_then(|bought| today.years_since(bought))
    }

    /// Whether the asset is older than [`DISPOSAL_AGE_YEARS`] on `today`.
    #[must_use]
    pub fn is_disposal_candidate(&self, today: NaiveDate) -> bool {
        self.age_years(today).is_some_and(|years| years > DISPOSAL_AGE_YEARS)
    }
}

/// Input for creating an inventory record.
///
/// Blank `brand` / `model` fall back to placeholders when the asset number
/// is derived; `serial_number` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDraft {
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub asset_type: String,
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub purchase_date: Option<NaiveDate>,
    pub amount_cents: Option<u64>,
    pub remarks: String,
    pub created_by: String,
}

impl AssetDraft {
    /// Create a draft with only the identifying fields set.
    #[must_use]
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            serial_number: serial_number.into(),
            ..Self::default()
        }
    }
}

/// Creator recorded on an inventory record that names none.
pub const DEFAULT_ASSET_CREATOR: &str = "Unknown";

/// Changes to the descriptive fields of an inventory record.
///
/// The asset number is never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPatch {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub asset_type: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    /// `Some(None)` clears the recorded date.
    pub purchase_date: Option<Option<NaiveDate>>,
    pub amount_cents: Option<u64>,
    pub remarks: Option<String>,
}

impl AssetPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// =============================================================================
// MAINTENANCE
// =============================================================================

/// A maintenance event against an inventory asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub reference: MaintenanceReference,
    pub asset_number: AssetNumber,
    pub maintenance_date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
    pub performed_by: String,
    pub remarks: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Input for logging a maintenance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceDraft {
    pub asset_number: String,
    pub maintenance_date: NaiveDate,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub performed_by: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub status: String,
}

impl MaintenanceDraft {
    /// Create a draft for the given asset and date.
    #[must_use]
    pub fn new(asset_number: impl Into<String>, maintenance_date: NaiveDate) -> Self {
        Self {
            asset_number: asset_number.into(),
            maintenance_date,
            scheduled_date: None,
            performed_by: String::new(),
            remarks: String::new(),
            status: String::new(),
        }
    }
}

/// Narrows a maintenance listing.
///
/// Date bounds are inclusive and apply to `maintenance_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceFilter {
    pub asset_number: Option<AssetNumber>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MaintenanceFilter {
    /// Every entry of one asset.
    #[must_use]
    pub fn for_asset(asset_number: AssetNumber) -> Self {
        Self {
            asset_number: Some(asset_number),
            ..Self::default()
        }
    }

    /// Whether `entry` falls inside the filter.
    #[must_use]
    pub fn matches(&self, entry: &MaintenanceRecord) -> bool {
        self.asset_number
            .as_ref()
            .is_none_or(|number| number == &entry.asset_number)
            && self.from.is_none_or(|from| entry.maintenance_date >= from)
            && self.to.is_none_or(|to| entry.maintenance_date <= to)
    }
}

/// A maintenance entry joined with the inventory record it refers to.
///
/// `asset` is `None` when the inventory record has since been removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceView {
    pub entry: MaintenanceRecord,
    pub asset: Option<AssetRecord>,
}

// =============================================================================
// ASSIGNMENT
// =============================================================================

/// Status given to an assignment created without one.
pub const DEFAULT_ASSIGNMENT_STATUS: &str = "Active";

/// Creator recorded when an assignment names none.
pub const DEFAULT_ASSIGNMENT_CREATOR: &str = "Stash";

/// An asset handed to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub asset_number: AssetNumber,
    pub serial_number: String,
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
    pub location: String,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Input for assigning a new asset to an employee.
///
/// The asset itself is created in the inventory as part of the assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentDraft {
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
    pub location: String,
    pub status: String,
    pub asset: AssetDraft,
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Record counts across the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub assets: usize,
    pub maintenance_entries: usize,
    pub assignments: usize,
    pub counters: usize,
    /// Duplicate-key retries since the registry was opened. Not persisted.
    pub allocation_retries: u64,
}

/// Last issued suffix of one asset-number sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    pub prefix: AssetPrefix,
    pub last_issued: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_detected() {
        assert!(AssetPatch::default().is_empty());
        let patch = AssetPatch {
            remarks: Some("rebuilt".into()),
            ..AssetPatch::default()
        };
        assert!(!patch.is_empty());

        let clear = AssetPatch {
            purchase_date: Some(None),
            ..AssetPatch::default()
        };
        assert!(!clear.is_empty());
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn bought_on(purchase_date: Option<NaiveDate>) -> AssetRecord {
        let now = Utc::now();
        AssetRecord {
            asset_number: AssetNumber::new("DELL-XPS-SN1-000001"),
            brand: "Dell".into(),
            model: "XPS".into(),
            serial_number: "SN1".into(),
            asset_type: String::new(),
            processor: String::new(),
            ram: String::new(),
            storage: String::new(),
            purchase_date,
            amount_cents: None,
            remarks: String::new(),
            created_by: DEFAULT_ASSET_CREATOR.into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn age_counts_completed_years_only() {
        let record = bought_on(Some(day(2019, 3, 15)));
        assert_eq!(record.age_years(day(2024, 3, 14)), Some(4));
        assert_eq!(record.age_years(day(2024, 3, 15)), Some(5));
        assert_eq!(record.age_years(day(2019, 3, 15)), Some(0));
    }

    #[test]
    fn age_unknown_without_past_purchase_date() {
        assert_eq!(bought_on(None).age_years(day(2024, 1, 1)), None);
        assert_eq!(
            bought_on(Some(day(2025, 1, 1))).age_years(day(2024, 1, 1)),
            None
        );
    }

    #[test]
    fn disposal_needs_more_than_five_years() {
        let record = bought_on(Some(day(2018, 6, 1)));
        assert!(!record.is_disposal_candidate(day(2023, 6, 1)));
        assert!(!record.is_disposal_candidate(day(2024, 5, 31)));
        assert!(record.is_disposal_candidate(day(2024, 6, 1)));
        assert!(!bought_on(None).is_disposal_candidate(day(2030, 1, 1)));
    }

    #[test]
    fn maintenance_filter_bounds_are_inclusive() {
        let entry = MaintenanceRecord {
            reference: MaintenanceReference::new("DELL-XPS-SN1-000001-20240305-123456"),
            asset_number: AssetNumber::new("DELL-XPS-SN1-000001"),
            maintenance_date: day(2024, 3, 5),
            scheduled_date: None,
            performed_by: String::new(),
            remarks: String::new(),
            status: String::new(),
            created_at: Utc::now(),
        };

        assert!(MaintenanceFilter::default().matches(&entry));
        let on_the_day = MaintenanceFilter {
            from: Some(day(2024, 3, 5)),
            to: Some(day(2024, 3, 5)),
            ..MaintenanceFilter::default()
        };
        assert!(on_the_day.matches(&entry));
        let later = MaintenanceFilter {
            from: Some(day(2024, 3, 6)),
            ..MaintenanceFilter::default()
        };
        assert!(!later.matches(&entry));
        let other = MaintenanceFilter::for_asset(AssetNumber::new("HP-ELITE-SN2-000001"));
        assert!(!other.matches(&entry));
    }
}
