//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Requests carry dates as strings (`YYYY-MM-DD` or RFC 3339) and are
//! turned into core drafts by their `to_*` methods, which also enforce the
//! fields each endpoint requires.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stash_core::{
    AssetDraft, AssetNumber, AssetPatch, AssetRecord, Assignment, AssignmentDraft,
    MaintenanceDraft, MaintenanceFilter, MaintenanceRecord, MaintenanceView, RegistryStats,
    StashError, parse_calendar_date,
};

/// Trimmed `value`, or `MissingField` when blank.
fn require(value: &str, field: &'static str) -> Result<String, StashError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StashError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Parse an optional date; blank counts as absent.
fn optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, StashError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => parse_calendar_date(v).map(Some),
        _ => Ok(None),
    }
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of a failed request that has no richer response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Registry status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub persistent: bool,
    pub assets: usize,
    pub maintenance_entries: usize,
    pub assignments: usize,
    pub counters: usize,
    pub allocation_retries: u64,
}

impl StatusResponse {
    pub fn new(stats: RegistryStats, persistent: bool) -> Self {
        Self {
            persistent,
            assets: stats.assets,
            maintenance_entries: stats.maintenance_entries,
            assignments: stats.assignments,
            counters: stats.counters,
            allocation_retries: stats.allocation_retries,
        }
    }
}

// =============================================================================
// INVENTORY REQUESTS
// =============================================================================

/// Inventory creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAssetRequest {
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub asset_type: String,
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub purchase_date: Option<String>,
    pub amount_cents: Option<u64>,
    pub remarks: String,
    pub created_by: String,
}

impl CreateAssetRequest {
    /// Convert to an asset draft.
    ///
    /// Brand, model and serial number are all required on this endpoint.
    pub fn to_draft(&self) -> Result<AssetDraft, StashError> {
        Ok(AssetDraft {
            brand: require(&self.brand, "brand")?,
            model: require(&self.model, "model")?,
            serial_number: require(&self.serial_number, "serial_number")?,
            asset_type: self.asset_type.clone(),
            processor: self.processor.clone(),
            ram: self.ram.clone(),
            storage: self.storage.clone(),
            purchase_date: optional_date(self.purchase_date.as_deref())?,
            amount_cents: self.amount_cents,
            remarks: self.remarks.clone(),
            created_by: self.created_by.clone(),
        })
    }
}

/// Inventory update request. Absent fields are left unchanged; a blank
/// `purchase_date` clears the recorded date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateAssetRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub asset_type: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub purchase_date: Option<String>,
    pub amount_cents: Option<u64>,
    pub remarks: Option<String>,
}

impl UpdateAssetRequest {
    pub fn to_patch(&self) -> Result<AssetPatch, StashError> {
        Ok(AssetPatch {
            brand: self.brand.clone(),
            model: self.model.clone(),
            serial_number: self.serial_number.clone(),
            asset_type: self.asset_type.clone(),
            processor: self.processor.clone(),
            ram: self.ram.clone(),
            storage: self.storage.clone(),
            purchase_date: self
                .purchase_date
                .as_deref()
                .map(|date| optional_date(Some(date)))
                .transpose()?,
            amount_cents: self.amount_cents,
            remarks: self.remarks.clone(),
        })
    }
}

/// Single inventory record response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetResponse {
    pub success: bool,
    pub asset: Option<AssetRecord>,
    pub error: Option<String>,
}

impl AssetResponse {
    pub fn success(asset: AssetRecord) -> Self {
        Self {
            success: true,
            asset: Some(asset),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            asset: None,
            error: Some(msg.into()),
        }
    }
}

/// Query string of the inventory listing.
///
/// `disposal=true` keeps only assets older than the disposal age, measured
/// on `as_of` (default: today, UTC).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryQuery {
    pub disposal: bool,
    pub as_of: Option<String>,
}

impl InventoryQuery {
    /// The day disposal age is measured on.
    pub fn reference_day(&self) -> Result<NaiveDate, StashError> {
        let as_of = optional_date(self.as_of.as_deref())?;
        Ok(as_of.unwrap_or_else(|| chrono::Utc::now().date_naive()))
    }
}

/// Inventory listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetListResponse {
    pub success: bool,
    pub assets: Vec<AssetRecord>,
    pub error: Option<String>,
}

impl AssetListResponse {
    pub fn success(assets: Vec<AssetRecord>) -> Self {
        Self {
            success: true,
            assets,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            assets: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ASSIGNMENT REQUEST/RESPONSE
// =============================================================================

/// Assignment request: employee details plus the asset being handed out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignAssetRequest {
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
    pub location: String,
    pub status: String,
    pub brand: String,
    pub model: String,
    pub serial_number: String,
    pub asset_type: String,
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub purchase_date: Option<String>,
    pub amount_cents: Option<u64>,
    pub remarks: String,
    pub created_by: String,
}

impl AssignAssetRequest {
    /// Convert to an assignment draft. Only the serial number is required.
    pub fn to_draft(&self) -> Result<AssignmentDraft, StashError> {
        Ok(AssignmentDraft {
            reference_id: self.reference_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            position: self.position.clone(),
            department: self.department.clone(),
            location: self.location.clone(),
            status: self.status.clone(),
            asset: AssetDraft {
                brand: self.brand.clone(),
                model: self.model.clone(),
                serial_number: require(&self.serial_number, "serial_number")?,
                asset_type: self.asset_type.clone(),
                processor: self.processor.clone(),
                ram: self.ram.clone(),
                storage: self.storage.clone(),
                purchase_date: optional_date(self.purchase_date.as_deref())?,
                amount_cents: self.amount_cents,
                remarks: self.remarks.clone(),
                created_by: self.created_by.clone(),
            },
        })
    }
}

/// Assignment response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub success: bool,
    pub asset_number: Option<AssetNumber>,
    pub assignment: Option<Assignment>,
    pub error: Option<String>,
}

impl AssignmentResponse {
    pub fn success(assignment: Assignment) -> Self {
        Self {
            success: true,
            asset_number: Some(assignment.asset_number.clone()),
            assignment: Some(assignment),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            asset_number: None,
            assignment: None,
            error: Some(msg.into()),
        }
    }
}

/// Assignment listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentListResponse {
    pub success: bool,
    pub assignments: Vec<Assignment>,
    pub error: Option<String>,
}

impl AssignmentListResponse {
    pub fn success(assignments: Vec<Assignment>) -> Self {
        Self {
            success: true,
            assignments,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            assignments: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// MAINTENANCE REQUEST/RESPONSE
// =============================================================================

/// Maintenance log request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogMaintenanceRequest {
    pub asset_number: String,
    pub maintenance_date: String,
    pub scheduled_date: Option<String>,
    pub performed_by: String,
    pub remarks: String,
    pub status: String,
}

impl LogMaintenanceRequest {
    /// Convert to a maintenance draft. Asset number and date are required.
    pub fn to_draft(&self) -> Result<MaintenanceDraft, StashError> {
        let asset_number = require(&self.asset_number, "asset_number")?;
        let date = require(&self.maintenance_date, "maintenance_date")?;
        Ok(MaintenanceDraft {
            asset_number,
            maintenance_date: parse_calendar_date(&date)?,
            scheduled_date: optional_date(self.scheduled_date.as_deref())?,
            performed_by: self.performed_by.clone(),
            remarks: self.remarks.clone(),
            status: self.status.clone(),
        })
    }
}

/// Query string of the maintenance listing. `from` and `to` are inclusive
/// bounds on the maintenance date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceQuery {
    pub asset_number: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl MaintenanceQuery {
    /// Convert to a core filter; blank values count as absent.
    pub fn to_filter(&self) -> Result<MaintenanceFilter, StashError> {
        Ok(MaintenanceFilter {
            asset_number: self
                .asset_number
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(AssetNumber::new),
            from: optional_date(self.from.as_deref())?,
            to: optional_date(self.to.as_deref())?,
        })
    }
}

/// Single maintenance entry response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceResponse {
    pub success: bool,
    pub entry: Option<MaintenanceRecord>,
    pub error: Option<String>,
}

impl MaintenanceResponse {
    pub fn success(entry: MaintenanceRecord) -> Self {
        Self {
            success: true,
            entry: Some(entry),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entry: None,
            error: Some(msg.into()),
        }
    }
}

/// Maintenance listing response, each entry joined with its asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceListResponse {
    pub success: bool,
    pub entries: Vec<MaintenanceView>,
    pub error: Option<String>,
}

impl MaintenanceListResponse {
    pub fn success(entries: Vec<MaintenanceView>) -> Self {
        Self {
            success: true,
            entries,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            entries: vec![],
            error: Some(msg.into()),
        }
    }
}
