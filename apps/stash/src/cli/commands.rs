//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command prints a human-readable report, or a JSON document when
//! `--json-mode` is set.

use super::AssetArgs;
use crate::api;
use crate::config::{BackendKind, StashConfig};
use serde::Serialize;
use chrono::Utc;
use stash_core::{
    AssetDraft, AssetNumber, AssetRecord, AssignmentDraft, MaintenanceDraft, MaintenanceFilter,
    MaintenanceReference, RedbStore, Registry, StashError, normalize::required_field,
    parse_calendar_date,
};

/// Employee side of an `assign` invocation.
#[derive(Debug, Clone, Default)]
pub struct EmployeeArgs {
    pub reference_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
    pub location: String,
    pub status: String,
}

/// Arguments of a `log-maintenance` invocation.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceArgs {
    pub asset_number: String,
    pub date: String,
    pub scheduled: Option<String>,
    pub performed_by: String,
    pub remarks: String,
    pub status: String,
}

// =============================================================================
// HELPERS
// =============================================================================

fn print_json(value: &impl Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_asset(record: &AssetRecord) {
    println!("Asset Number: {}", record.asset_number);
    println!("  Brand:    {}", record.brand);
    println!("  Model:    {}", record.model);
    println!("  Serial:   {}", record.serial_number);
    if !record.asset_type.is_empty() {
        println!("  Type:     {}", record.asset_type);
    }
    if let Some(date) = record.purchase_date {
        match record.age_years(Utc::now().date_naive()) {
            Some(years) => println!("  Purchased: {} ({}y)", date, years),
            None => println!("  Purchased: {}", date),
        }
    }
    println!("  Created by {} at {}", record.created_by, record.created_at);
}

/// Build an asset draft from command-line fields.
pub fn asset_draft(args: &AssetArgs) -> Result<AssetDraft, StashError> {
    let purchase_date = args
        .purchase_date
        .as_deref()
        .map(parse_calendar_date)
        .transpose()?;
    Ok(AssetDraft {
        brand: args.brand.clone(),
        model: args.model.clone(),
        serial_number: args.serial.clone(),
        asset_type: args.asset_type.clone(),
        processor: args.processor.clone(),
        ram: args.ram.clone(),
        storage: args.storage.clone(),
        purchase_date,
        amount_cents: args.amount_cents,
        remarks: args.remarks.clone(),
        created_by: args.created_by.clone(),
    })
}

/// Build a maintenance draft from command-line fields.
pub fn maintenance_draft(args: &MaintenanceArgs) -> Result<MaintenanceDraft, StashError> {
    let mut draft = MaintenanceDraft::new(
        required_field(&args.asset_number, "asset_number")?,
        parse_calendar_date(&args.date)?,
    );
    draft.scheduled_date = args
        .scheduled
        .as_deref()
        .map(parse_calendar_date)
        .transpose()?;
    draft.performed_by = args.performed_by.clone();
    draft.remarks = args.remarks.clone();
    draft.status = args.status.clone();
    Ok(draft)
}

// =============================================================================
// SERVER / INIT / STATUS
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &StashConfig) -> Result<(), StashError> {
    let registry = config.open_registry()?;

    println!("Stash Asset Inventory Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.server.address());
    println!("  Backend:  {:?}", config.storage.backend);
    println!("  Database: {:?}", config.storage.path);
    println!("  Strategy: {:?}", config.allocator.strategy);
    println!(
        "  Auth:     {}",
        if config.api_key().is_some() {
            "api key"
        } else {
            "disabled"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET/POST        /inventory");
    println!("  GET/PUT/DELETE  /inventory/{{asset_number}}");
    println!("  GET/POST        /assigned-asset");
    println!("  GET/POST        /maintenance");
    println!("  DELETE          /maintenance/{{reference}}");
    println!("  GET             /status, /health");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config, registry).await
}

/// Initialize a new empty database.
pub fn cmd_init(config: &StashConfig, force: bool) -> Result<(), StashError> {
    if config.storage.backend == BackendKind::Memory {
        println!("Memory backend selected; nothing to initialize");
        return Ok(());
    }

    let path = &config.storage.path;
    if path.exists() {
        if !force {
            return Err(StashError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(path)
            .map_err(|e| StashError::IoError(format!("Remove {:?}: {}", path, e)))?;
    }

    RedbStore::open(path)?;
    println!("Initialized new redb database at {:?}", path);
    Ok(())
}

/// Show record counts.
pub fn cmd_status(config: &StashConfig, json_mode: bool) -> Result<(), StashError> {
    let registry = config.open_registry()?;
    let stats = registry.stats()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.storage.path.to_string_lossy(),
            "persistent": registry.is_persistent(),
            "assets": stats.assets,
            "maintenance_entries": stats.maintenance_entries,
            "assignments": stats.assignments,
            "counters": stats.counters,
        }));
        return Ok(());
    }

    println!("Stash Registry Status");
    println!("=====================");
    println!("Database:    {:?}", config.storage.path);
    println!("Persistent:  {}", registry.is_persistent());
    println!();
    println!("Assets:      {}", stats.assets);
    println!("Maintenance: {}", stats.maintenance_entries);
    println!("Assignments: {}", stats.assignments);
    println!("Sequences:   {}", stats.counters);
    Ok(())
}

// =============================================================================
// INVENTORY COMMANDS
// =============================================================================

/// Add an inventory record. Brand, model and serial are required here.
pub fn cmd_add_asset(
    config: &StashConfig,
    json_mode: bool,
    args: &AssetArgs,
) -> Result<(), StashError> {
    required_field(&args.brand, "brand")?;
    required_field(&args.model, "model")?;
    let draft = asset_draft(args)?;

    let mut registry = config.open_registry()?;
    let record = registry.create_asset(draft)?;
    report_retries(&registry);

    if json_mode {
        print_json(&record);
    } else {
        println!("Asset created");
        print_asset(&record);
    }
    Ok(())
}

/// List inventory records, or only the disposal candidates.
pub fn cmd_list_assets(
    config: &StashConfig,
    json_mode: bool,
    disposal: bool,
) -> Result<(), StashError> {
    let registry = config.open_registry()?;
    let today = Utc::now().date_naive();
    let assets = if disposal {
        registry.disposal_candidates(today)?
    } else {
        registry.assets()?
    };

    if json_mode {
        print_json(&assets);
        return Ok(());
    }

    if assets.is_empty() {
        println!("No assets");
    }
    for record in &assets {
        let age = record
            .age_years(today)
            .map(|years| format!("  {}y", years))
            .unwrap_or_default();
        println!(
            "{}  {} {}  ({}){}",
            record.asset_number, record.brand, record.model, record.serial_number, age
        );
    }
    Ok(())
}

/// Show one inventory record.
pub fn cmd_show_asset(
    config: &StashConfig,
    json_mode: bool,
    asset_number: &str,
) -> Result<(), StashError> {
    let record = config
        .open_registry()?
        .asset(&AssetNumber::new(asset_number.trim()))?;

    if json_mode {
        print_json(&record);
    } else {
        print_asset(&record);
    }
    Ok(())
}

/// Delete an inventory record.
pub fn cmd_delete_asset(
    config: &StashConfig,
    json_mode: bool,
    asset_number: &str,
) -> Result<(), StashError> {
    let record = config
        .open_registry()?
        .delete_asset(&AssetNumber::new(asset_number.trim()))?;

    if json_mode {
        print_json(&record);
    } else {
        println!("Deleted {}", record.asset_number);
    }
    Ok(())
}

// =============================================================================
// ASSIGNMENT COMMANDS
// =============================================================================

/// Add an asset and assign it to an employee.
pub fn cmd_assign(
    config: &StashConfig,
    json_mode: bool,
    asset: &AssetArgs,
    employee: EmployeeArgs,
) -> Result<(), StashError> {
    let draft = AssignmentDraft {
        reference_id: employee.reference_id,
        first_name: employee.first_name,
        last_name: employee.last_name,
        position: employee.position,
        department: employee.department,
        location: employee.location,
        status: employee.status,
        asset: asset_draft(asset)?,
    };

    let mut registry = config.open_registry()?;
    let (record, assignment) = registry.assign_asset(draft)?;
    report_retries(&registry);

    if json_mode {
        print_json(&serde_json::json!({
            "asset": record,
            "assignment": assignment,
        }));
        return Ok(());
    }

    println!(
        "Assigned {} to {} {} (assignment #{}, {})",
        assignment.asset_number,
        assignment.first_name,
        assignment.last_name,
        assignment.id.0,
        assignment.status
    );
    Ok(())
}

/// List assignments.
pub fn cmd_list_assignments(config: &StashConfig, json_mode: bool) -> Result<(), StashError> {
    let assignments = config.open_registry()?.assignments()?;

    if json_mode {
        print_json(&assignments);
        return Ok(());
    }

    if assignments.is_empty() {
        println!("No assignments");
    }
    for a in &assignments {
        println!(
            "#{:<5} {}  {} {}  {}",
            a.id.0, a.asset_number, a.first_name, a.last_name, a.status
        );
    }
    Ok(())
}

// =============================================================================
// MAINTENANCE COMMANDS
// =============================================================================

/// Log a maintenance event.
pub fn cmd_log_maintenance(
    config: &StashConfig,
    json_mode: bool,
    args: MaintenanceArgs,
) -> Result<(), StashError> {
    let draft = maintenance_draft(&args)?;

    let mut registry = config.open_registry()?;
    let entry = registry.log_maintenance(draft)?;
    report_retries(&registry);

    if json_mode {
        print_json(&entry);
    } else {
        println!("Maintenance logged: {}", entry.reference);
    }
    Ok(())
}

/// Build a maintenance filter from command-line fields.
pub fn maintenance_filter(
    asset_number: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<MaintenanceFilter, StashError> {
    Ok(MaintenanceFilter {
        asset_number: asset_number
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(AssetNumber::new),
        from: from.map(parse_calendar_date).transpose()?,
        to: to.map(parse_calendar_date).transpose()?,
    })
}

/// List maintenance entries, optionally for one asset or a date range.
pub fn cmd_list_maintenance(
    config: &StashConfig,
    json_mode: bool,
    filter: &MaintenanceFilter,
) -> Result<(), StashError> {
    let entries = config.open_registry()?.maintenance_log(filter)?;

    if json_mode {
        print_json(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No maintenance entries");
    }
    for view in &entries {
        let device = view
            .asset
            .as_ref()
            .map(|a| format!("{} {}", a.brand, a.model))
            .unwrap_or_else(|| "(removed)".to_string());
        println!(
            "{}  {}  {}  {}",
            view.entry.reference, view.entry.maintenance_date, device, view.entry.status
        );
    }
    Ok(())
}

/// Delete a maintenance entry.
pub fn cmd_delete_maintenance(
    config: &StashConfig,
    json_mode: bool,
    reference: &str,
) -> Result<(), StashError> {
    let entry = config
        .open_registry()?
        .delete_maintenance(&MaintenanceReference::new(reference.trim()))?;

    if json_mode {
        print_json(&entry);
    } else {
        println!("Deleted {}", entry.reference);
    }
    Ok(())
}

// =============================================================================
// SEQUENCES / MAINTENANCE OF THE DATABASE
// =============================================================================

/// Show asset-number sequence counters.
pub fn cmd_counters(config: &StashConfig, json_mode: bool) -> Result<(), StashError> {
    let counters = config.open_registry()?.counters()?;

    if json_mode {
        print_json(&counters);
        return Ok(());
    }

    if counters.is_empty() {
        println!("No sequences yet");
    }
    for counter in &counters {
        println!("{:<48} {:06}", counter.prefix.as_str(), counter.last_issued);
    }
    Ok(())
}

/// Compact the redb database file.
pub fn cmd_compact(config: &StashConfig) -> Result<(), StashError> {
    if config.storage.backend != BackendKind::Redb {
        return Err(StashError::ConfigError(
            "compact requires the redb backend".to_string(),
        ));
    }
    let mut store = RedbStore::open(&config.storage.path)?;
    store.compact()?;
    println!("Compacted {:?}", config.storage.path);
    Ok(())
}

fn report_retries(registry: &Registry) {
    let retries = registry.stats().map(|s| s.allocation_retries).unwrap_or(0);
    if retries > 0 {
        tracing::warn!(
            event = "allocation_retry",
            retries,
            "Identifier collided and was reallocated"
        );
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::StorageConfig;
    use tempfile::TempDir;

    fn redb_config(dir: &TempDir) -> StashConfig {
        StashConfig {
            storage: StorageConfig {
                backend: BackendKind::Redb,
                path: dir.path().join("stash.db"),
            },
            ..StashConfig::default()
        }
    }

    fn laptop(serial: &str) -> AssetArgs {
        AssetArgs {
            brand: "Dell".into(),
            model: "Latitude 5420".into(),
            serial: serial.into(),
            ..AssetArgs::default()
        }
    }

    #[test]
    fn asset_draft_parses_purchase_date() {
        let mut args = laptop("SN1");
        args.purchase_date = Some("2023-11-02".into());
        let draft = asset_draft(&args).unwrap();
        assert_eq!(draft.purchase_date.map(|d| d.to_string()).as_deref(), Some("2023-11-02"));

        args.purchase_date = Some("02/11/2023".into());
        assert!(matches!(asset_draft(&args), Err(StashError::InvalidDate(_))));
    }

    #[test]
    fn maintenance_draft_requires_asset_number() {
        let args = MaintenanceArgs {
            asset_number: "  ".into(),
            date: "2024-03-05".into(),
            ..MaintenanceArgs::default()
        };
        assert!(matches!(
            maintenance_draft(&args),
            Err(StashError::MissingField("asset_number"))
        ));
    }

    #[test]
    fn maintenance_filter_parses_range() {
        let filter =
            maintenance_filter(Some(" DELL-XPS-SN1-000001 "), Some("2024-01-01"), None).unwrap();
        assert_eq!(filter.asset_number, Some(AssetNumber::new("DELL-XPS-SN1-000001")));
        assert_eq!(filter.from.map(|d| d.to_string()).as_deref(), Some("2024-01-01"));
        assert!(filter.to.is_none());

        assert!(matches!(
            maintenance_filter(None, None, Some("31/01/2024")),
            Err(StashError::InvalidDate(_))
        ));
    }

    #[test]
    fn list_commands_accept_disposal_and_range() {
        let dir = TempDir::new().unwrap();
        let config = redb_config(&dir);
        let mut old = laptop("SN1");
        old.purchase_date = Some("2012-01-15".into());
        cmd_add_asset(&config, true, &old).unwrap();

        cmd_list_assets(&config, true, true).unwrap();
        assert_eq!(
            config
                .open_registry()
                .unwrap()
                .disposal_candidates(Utc::now().date_naive())
                .unwrap()
                .len(),
            1
        );

        let inverted = maintenance_filter(None, Some("2024-03-01"), Some("2024-02-01")).unwrap();
        assert!(matches!(
            cmd_list_maintenance(&config, true, &inverted),
            Err(StashError::InvalidDate(_))
        ));
    }

    #[test]
    fn add_asset_requires_brand() {
        let dir = TempDir::new().unwrap();
        let mut args = laptop("SN1");
        args.brand.clear();
        assert!(matches!(
            cmd_add_asset(&redb_config(&dir), true, &args),
            Err(StashError::MissingField("brand"))
        ));
    }

    #[test]
    fn commands_share_the_database_file() {
        let dir = TempDir::new().unwrap();
        let config = redb_config(&dir);

        cmd_init(&config, false).unwrap();
        assert!(cmd_init(&config, false).is_err());

        cmd_add_asset(&config, true, &laptop("SN1")).unwrap();
        cmd_add_asset(&config, true, &laptop("SN2")).unwrap();

        let registry = config.open_registry().unwrap();
        let numbers: Vec<String> = registry
            .assets()
            .unwrap()
            .into_iter()
            .map(|a| a.asset_number.0)
            .collect();
        assert_eq!(numbers.len(), 2);
        assert!(numbers.iter().any(|n| n.ends_with("-000001")));
        drop(registry);

        cmd_compact(&config).unwrap();
        cmd_init(&config, true).unwrap();
        assert_eq!(config.open_registry().unwrap().stats().unwrap().assets, 0);
    }

    #[test]
    fn compact_rejects_memory_backend() {
        let config = StashConfig {
            storage: StorageConfig {
                backend: BackendKind::Memory,
                ..StorageConfig::default()
            },
            ..StashConfig::default()
        };
        assert!(matches!(cmd_compact(&config), Err(StashError::ConfigError(_))));
    }
}
