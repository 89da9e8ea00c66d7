use crate::model::{DeletionReport, InventorySnapshot};
use anyhow::Result;

pub fn print_inventory_json(snapshot: &InventorySnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    println!("{}", json);
    Ok(())
}

pub fn print_report_json(report: &DeletionReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}
