//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use stash::api::{
    AssetResponse, AssignAssetRequest, CreateAssetRequest, HealthResponse, InventoryQuery,
    LogMaintenanceRequest, MaintenanceQuery, StatusResponse, UpdateAssetRequest,
};
use stash_core::{MaintenanceFilter, RegistryStats, StashError};

// =============================================================================
// HEALTH / STATUS RESPONSES
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_from_stats() {
    let stats = RegistryStats {
        assets: 12,
        maintenance_entries: 4,
        assignments: 3,
        counters: 9,
        allocation_retries: 1,
    };
    let status = StatusResponse::new(stats, true);

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"persistent\":true"));
    assert!(json.contains("\"assets\":12"));
    assert!(json.contains("\"maintenance_entries\":4"));
    assert!(json.contains("\"allocation_retries\":1"));
}

// =============================================================================
// INVENTORY REQUESTS
// =============================================================================

#[test]
fn test_create_request_deserializes_with_defaults() {
    let json = r#"{"brand":"HP","model":"EliteBook 840","serial_number":"5CG1"}"#;
    let request: CreateAssetRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.brand, "HP");
    assert!(request.purchase_date.is_none());
    assert!(request.remarks.is_empty());
}

#[test]
fn test_create_request_trims_required_fields() {
    let request = CreateAssetRequest {
        brand: "  HP ".into(),
        model: "EliteBook 840".into(),
        serial_number: " 5CG1 ".into(),
        purchase_date: Some("2023-06-30T22:30:00-02:00".into()),
        ..CreateAssetRequest::default()
    };
    let draft = request.to_draft().unwrap();

    assert_eq!(draft.brand, "HP");
    assert_eq!(draft.serial_number, "5CG1");
    // RFC 3339 timestamps land on their UTC calendar day.
    assert_eq!(
        draft.purchase_date.map(|d| d.to_string()).as_deref(),
        Some("2023-07-01")
    );
}

#[test]
fn test_create_request_blank_model_is_missing() {
    let request = CreateAssetRequest {
        brand: "HP".into(),
        model: "   ".into(),
        serial_number: "5CG1".into(),
        ..CreateAssetRequest::default()
    };
    assert!(matches!(
        request.to_draft(),
        Err(StashError::MissingField("model"))
    ));
}

#[test]
fn test_update_request_blank_date_clears() {
    let request = UpdateAssetRequest {
        purchase_date: Some(" ".into()),
        remarks: Some("dented lid".into()),
        ..UpdateAssetRequest::default()
    };
    let patch = request.to_patch().unwrap();
    assert_eq!(patch.purchase_date, Some(None));
    assert_eq!(patch.remarks.as_deref(), Some("dented lid"));
    assert!(patch.brand.is_none());
}

#[test]
fn test_update_request_absent_date_is_untouched() {
    let request: UpdateAssetRequest = serde_json::from_str(r#"{"ram":"32GB"}"#).unwrap();
    let patch = request.to_patch().unwrap();
    assert!(patch.purchase_date.is_none());

    let request = UpdateAssetRequest {
        purchase_date: Some("2022-08-01".into()),
        ..UpdateAssetRequest::default()
    };
    let date = request.to_patch().unwrap().purchase_date.flatten();
    assert_eq!(date.map(|d| d.to_string()).as_deref(), Some("2022-08-01"));
}

#[test]
fn test_inventory_query_reference_day() {
    let query: InventoryQuery = serde_json::from_str("{}").unwrap();
    assert!(!query.disposal);

    let query = InventoryQuery {
        disposal: true,
        as_of: Some("2030-01-01".into()),
    };
    assert_eq!(query.reference_day().unwrap().to_string(), "2030-01-01");

    let query = InventoryQuery {
        as_of: Some("soon".into()),
        ..InventoryQuery::default()
    };
    assert!(matches!(query.reference_day(), Err(StashError::InvalidDate(_))));
}

#[test]
fn test_asset_error_response_shape() {
    let response = AssetResponse::error("Asset not found: X");
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], false);
    assert!(value["asset"].is_null());
    assert_eq!(value["error"], "Asset not found: X");
}

// =============================================================================
// ASSIGNMENT REQUEST
// =============================================================================

#[test]
fn test_assign_request_only_needs_serial() {
    let json = r#"{"first_name":"Grace","serial_number":"C02X"}"#;
    let request: AssignAssetRequest = serde_json::from_str(json).unwrap();
    let draft = request.to_draft().unwrap();

    assert_eq!(draft.first_name, "Grace");
    assert_eq!(draft.asset.serial_number, "C02X");
    assert!(draft.asset.brand.is_empty());
    assert!(draft.status.is_empty());
}

#[test]
fn test_assign_request_without_serial_fails() {
    let request = AssignAssetRequest {
        first_name: "Grace".into(),
        ..AssignAssetRequest::default()
    };
    assert!(matches!(
        request.to_draft(),
        Err(StashError::MissingField("serial_number"))
    ));
}

// =============================================================================
// MAINTENANCE REQUEST
// =============================================================================

#[test]
fn test_maintenance_request_parses_dates() {
    let request = LogMaintenanceRequest {
        asset_number: "HP-ELITEBOOK_840-5CG1-000001".into(),
        maintenance_date: "2024-02-29".into(),
        scheduled_date: Some("2024-02-15".into()),
        ..LogMaintenanceRequest::default()
    };
    let draft = request.to_draft().unwrap();
    assert_eq!(draft.maintenance_date.to_string(), "2024-02-29");
    assert_eq!(
        draft.scheduled_date.map(|d| d.to_string()).as_deref(),
        Some("2024-02-15")
    );
}

#[test]
fn test_maintenance_request_invalid_date() {
    let request = LogMaintenanceRequest {
        asset_number: "X-000001".into(),
        maintenance_date: "2023-02-29".into(),
        ..LogMaintenanceRequest::default()
    };
    assert!(matches!(
        request.to_draft(),
        Err(StashError::InvalidDate(_))
    ));
}

#[test]
fn test_maintenance_query_optional() {
    let query: MaintenanceQuery = serde_json::from_str("{}").unwrap();
    assert!(query.asset_number.is_none());
    assert_eq!(query.to_filter().unwrap(), MaintenanceFilter::default());
}

#[test]
fn test_maintenance_query_range() {
    let query = MaintenanceQuery {
        asset_number: Some("  ".into()),
        from: Some("2024-01-01".into()),
        to: Some("".into()),
    };
    let filter = query.to_filter().unwrap();
    assert!(filter.asset_number.is_none());
    assert_eq!(filter.from.map(|d| d.to_string()).as_deref(), Some("2024-01-01"));
    assert!(filter.to.is_none());

    let query = MaintenanceQuery {
        to: Some("2024-13-01".into()),
        ..MaintenanceQuery::default()
    };
    assert!(matches!(query.to_filter(), Err(StashError::InvalidDate(_))));
}
