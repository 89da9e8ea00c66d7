mod cli;
mod json;

pub use cli::{print_checklist, print_inventory_table, print_pending_table, print_report_table};
pub use json::{print_inventory_json, print_report_json};

use crate::model::{DeletionReport, InventorySnapshot};
use anyhow::Result;

/// Output format for inventories and deletion reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

pub fn print_inventory(snapshot: &InventorySnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_inventory_table(snapshot),
        OutputFormat::Json => print_inventory_json(snapshot),
    }
}

pub fn print_report(report: &DeletionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_report_table(report),
        OutputFormat::Json => print_report_json(report),
    }
}

/// Format an inventory to string for file output
pub fn format_inventory_to_string(snapshot: &InventorySnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}
