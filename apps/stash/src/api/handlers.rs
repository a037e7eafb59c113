//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every handler answers with a JSON body carrying `success` and, on
//! failure, `error`. The status code comes from [`error_status`].

use super::{
    AppState,
    types::{
        AssetListResponse, AssetResponse, AssignAssetRequest, AssignmentListResponse,
        AssignmentResponse, CreateAssetRequest, ErrorResponse, HealthResponse, InventoryQuery,
        LogMaintenanceRequest, MaintenanceListResponse, MaintenanceQuery, MaintenanceResponse,
        StatusResponse, UpdateAssetRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use stash_core::{AssetNumber, MaintenanceReference, StashError};

/// HTTP status for a core error.
pub fn error_status(error: &StashError) -> StatusCode {
    match error {
        StashError::MissingField(_)
        | StashError::FieldTooLong { .. }
        | StashError::InvalidDate(_) => StatusCode::BAD_REQUEST,
        StashError::AssetNotFound(_) | StashError::MaintenanceNotFound(_) => StatusCode::NOT_FOUND,
        StashError::DuplicateSerial(_)
        | StashError::DuplicateAssetNumber(_)
        | StashError::DuplicateMaintenanceReference(_)
        | StashError::AssetInUse { .. }
        | StashError::AssetAssigned { .. }
        | StashError::AllocationConflict { .. } => StatusCode::CONFLICT,
        StashError::SuffixExhausted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StashError::SerializationError(_) | StashError::IoError(_) | StashError::ConfigError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Map an error to its status, logging the ones an operator should see.
fn failure(context: &str, error: &StashError) -> StatusCode {
    let status = error_status(error);
    match error {
        StashError::AllocationConflict { attempts } => {
            tracing::warn!(
                event = "allocation_conflict",
                attempts = *attempts,
                "{} gave up: {}",
                context,
                error
            );
        }
        StashError::SuffixExhausted { prefix } => {
            tracing::warn!(event = "suffix_exhausted", prefix = %prefix, "{}: {}", context, error);
        }
        _ if status.is_server_error() => {
            tracing::error!("{} failed: {}", context, error);
        }
        _ => {
            tracing::debug!("{} rejected: {}", context, error);
        }
    }
    status
}

// =============================================================================
// HEALTH / STATUS HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Record counts of the registry.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.stats() {
        Ok(stats) => (
            StatusCode::OK,
            Json(StatusResponse::new(stats, registry.is_persistent())),
        )
            .into_response(),
        Err(e) => (failure("Status", &e), Json(ErrorResponse::new(e.to_string()))).into_response(),
    }
}

// =============================================================================
// INVENTORY HANDLERS
// =============================================================================

/// Create an inventory record.
pub async fn create_asset_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateAssetRequest>,
) -> impl IntoResponse {
    let draft = match request.to_draft() {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AssetResponse::error(format!("Invalid asset: {}", e))),
            );
        }
    };

    let mut registry = state.registry.write().await;
    match registry.create_asset(draft) {
        Ok(record) => {
            tracing::info!(asset_number = %record.asset_number, "Asset created");
            (StatusCode::CREATED, Json(AssetResponse::success(record)))
        }
        Err(e) => (
            failure("Create asset", &e),
            Json(AssetResponse::error(e.to_string())),
        ),
    }
}

/// List inventory records, or only the disposal candidates.
pub async fn list_assets_handler(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    let listing = if query.disposal {
        query
            .reference_day()
            .and_then(|today| registry.disposal_candidates(today))
    } else {
        registry.assets()
    };
    match listing {
        Ok(assets) => (StatusCode::OK, Json(AssetListResponse::success(assets))),
        Err(e) => (
            failure("List assets", &e),
            Json(AssetListResponse::error(e.to_string())),
        ),
    }
}

/// Show one inventory record.
pub async fn get_asset_handler(
    State(state): State<AppState>,
    Path(asset_number): Path<String>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.asset(&AssetNumber(asset_number)) {
        Ok(record) => (StatusCode::OK, Json(AssetResponse::success(record))),
        Err(e) => (
            failure("Show asset", &e),
            Json(AssetResponse::error(e.to_string())),
        ),
    }
}

/// Update descriptive fields of an inventory record.
pub async fn update_asset_handler(
    State(state): State<AppState>,
    Path(asset_number): Path<String>,
    Json(request): Json<UpdateAssetRequest>,
) -> impl IntoResponse {
    let patch = match request.to_patch() {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AssetResponse::error(format!("Invalid update: {}", e))),
            );
        }
    };

    let mut registry = state.registry.write().await;
    match registry.update_asset(&AssetNumber(asset_number), patch) {
        Ok(record) => (StatusCode::OK, Json(AssetResponse::success(record))),
        Err(e) => (
            failure("Update asset", &e),
            Json(AssetResponse::error(e.to_string())),
        ),
    }
}

/// Delete an inventory record.
pub async fn delete_asset_handler(
    State(state): State<AppState>,
    Path(asset_number): Path<String>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.delete_asset(&AssetNumber(asset_number)) {
        Ok(record) => {
            tracing::info!(asset_number = %record.asset_number, "Asset deleted");
            (StatusCode::OK, Json(AssetResponse::success(record)))
        }
        Err(e) => (
            failure("Delete asset", &e),
            Json(AssetResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// ASSIGNMENT HANDLERS
// =============================================================================

/// Add an asset to the inventory and assign it.
pub async fn assign_asset_handler(
    State(state): State<AppState>,
    Json(request): Json<AssignAssetRequest>,
) -> impl IntoResponse {
    let draft = match request.to_draft() {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(AssignmentResponse::error(format!("Invalid assignment: {}", e))),
            );
        }
    };

    let mut registry = state.registry.write().await;
    match registry.assign_asset(draft) {
        Ok((_, assignment)) => {
            tracing::info!(
                asset_number = %assignment.asset_number,
                assignment_id = assignment.id.0,
                "Asset assigned"
            );
            (
                StatusCode::CREATED,
                Json(AssignmentResponse::success(assignment)),
            )
        }
        Err(e) => (
            failure("Assign asset", &e),
            Json(AssignmentResponse::error(e.to_string())),
        ),
    }
}

/// List assignments.
pub async fn list_assignments_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match registry.assignments() {
        Ok(assignments) => (
            StatusCode::OK,
            Json(AssignmentListResponse::success(assignments)),
        ),
        Err(e) => (
            failure("List assignments", &e),
            Json(AssignmentListResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// MAINTENANCE HANDLERS
// =============================================================================

/// Log a maintenance event.
pub async fn log_maintenance_handler(
    State(state): State<AppState>,
    Json(request): Json<LogMaintenanceRequest>,
) -> impl IntoResponse {
    let draft = match request.to_draft() {
        Ok(d) => d,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(MaintenanceResponse::error(format!(
                    "Invalid maintenance log: {}",
                    e
                ))),
            );
        }
    };

    let mut registry = state.registry.write().await;
    match registry.log_maintenance(draft) {
        Ok(entry) => {
            tracing::info!(reference = %entry.reference, "Maintenance logged");
            (StatusCode::CREATED, Json(MaintenanceResponse::success(entry)))
        }
        Err(e) => (
            failure("Log maintenance", &e),
            Json(MaintenanceResponse::error(e.to_string())),
        ),
    }
}

/// Maintenance entries joined with their inventory records.
pub async fn list_maintenance_handler(
    State(state): State<AppState>,
    Query(query): Query<MaintenanceQuery>,
) -> impl IntoResponse {
    let registry = state.registry.read().await;
    match query
        .to_filter()
        .and_then(|filter| registry.maintenance_log(&filter))
    {
        Ok(entries) => (
            StatusCode::OK,
            Json(MaintenanceListResponse::success(entries)),
        ),
        Err(e) => (
            failure("List maintenance", &e),
            Json(MaintenanceListResponse::error(e.to_string())),
        ),
    }
}

/// Delete a maintenance entry.
pub async fn delete_maintenance_handler(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> impl IntoResponse {
    let mut registry = state.registry.write().await;
    match registry.delete_maintenance(&MaintenanceReference(reference)) {
        Ok(entry) => (StatusCode::OK, Json(MaintenanceResponse::success(entry))),
        Err(e) => (
            failure("Delete maintenance", &e),
            Json(MaintenanceResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
