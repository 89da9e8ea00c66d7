use crate::model::{
    BrowserFamily, DeletionReport, DeletionResult, ExtensionRecord, InventorySnapshot,
    ParseStatus,
};
use crate::selection::SelectionSet;
use anyhow::Result;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "#")]
    index: String,
    #[tabled(rename = "Browser")]
    family: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Browser")]
    family: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub fn print_inventory_table(snapshot: &InventorySnapshot) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        snapshot.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    print_checklist(snapshot, None);
    print_diagnostics(snapshot);

    println!();
    print_summary(snapshot);

    Ok(())
}

/// Numbered listing of the snapshot. With a selection, the index column
/// doubles as a checkbox.
pub fn print_checklist(snapshot: &InventorySnapshot, selection: Option<&SelectionSet>) {
    if snapshot.is_empty() {
        println!("No browser extensions found for Chrome, Edge, or Firefox.");
        return;
    }

    let rows: Vec<ExtensionRow> = snapshot
        .records()
        .enumerate()
        .map(|(i, record)| {
            let index = match selection {
                Some(selection) if selection.contains(&record.identity) => {
                    format!("[x] {}", i + 1)
                }
                Some(_) => format!("[ ] {}", i + 1),
                None => (i + 1).to_string(),
            };
            extension_row(index, record)
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Lists the records awaiting confirmation.
pub fn print_pending_table(pending: &[ExtensionRecord]) -> Result<()> {
    println!(
        "The following {} extension(s) will be permanently deleted:",
        pending.len()
    );
    println!();

    let rows: Vec<ExtensionRow> = pending
        .iter()
        .enumerate()
        .map(|(i, record)| extension_row((i + 1).to_string(), record))
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

pub fn print_report_table(report: &DeletionReport) -> Result<()> {
    if report.is_empty() {
        println!("Nothing was deleted.");
        return Ok(());
    }

    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            family: o.identity.family.display_name().to_string(),
            name: truncate(o.display_name.as_deref().unwrap_or("-"), 40),
            result: format_result(&o.result),
            path: o.identity.path.display().to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    println!(
        "Deleted {} of {} extension(s).",
        report.deleted(),
        report.len()
    );

    Ok(())
}

fn extension_row(index: String, record: &ExtensionRecord) -> ExtensionRow {
    ExtensionRow {
        index,
        family: record.family().display_name().to_string(),
        name: truncate(&record.display_name, 40),
        version: record.version.clone().unwrap_or_else(|| "-".to_string()),
        status: format_status(record),
        size: format_size(record.size_bytes),
        id: truncate(&record.extension_id, 40),
    }
}

fn print_diagnostics(snapshot: &InventorySnapshot) {
    let errors: Vec<_> = snapshot.errors().collect();
    let skipped: Vec<_> = snapshot.skipped().collect();

    if errors.is_empty() && skipped.is_empty() {
        return;
    }

    println!();
    for (family, error) in errors {
        println!("  {}: {}", family, error);
    }
    for (family, item) in skipped {
        println!(
            "  {}: skipped {} ({})",
            family,
            item.path.display(),
            item.reason
        );
    }
}

fn print_summary(snapshot: &InventorySnapshot) {
    let mut by_family: BTreeMap<BrowserFamily, usize> = BTreeMap::new();
    let mut total_size = 0;
    for record in snapshot.records() {
        *by_family.entry(record.family()).or_default() += 1;
        total_size += record.size_bytes;
    }

    println!("Summary:");
    println!(
        "  Total extensions: {} ({})",
        snapshot.len(),
        format_size(total_size)
    );

    if by_family.len() > 1 {
        let family_summary: Vec<String> = by_family
            .iter()
            .map(|(f, c)| format!("{} {}", c, f.display_name()))
            .collect();
        println!("  By browser: {}", family_summary.join(", "));
    }
}

fn format_status(record: &ExtensionRecord) -> String {
    match record.parse_status {
        ParseStatus::Ok if record.profile.is_some() => {
            format!("xpi ({})", truncate(record.profile.as_deref().unwrap_or(""), 20))
        }
        ParseStatus::Ok => "ok".to_string(),
        ParseStatus::MissingDescriptor => "\x1b[33mno manifest\x1b[0m".to_string(),
        ParseStatus::MalformedDescriptor => "\x1b[33mbad manifest\x1b[0m".to_string(),
    }
}

fn format_result(result: &DeletionResult) -> String {
    match result {
        DeletionResult::Deleted => "\x1b[32mdeleted\x1b[0m".to_string(),
        DeletionResult::NotFound => "\x1b[33mnot found\x1b[0m".to_string(),
        DeletionResult::PermissionDenied => "\x1b[31mpermission denied\x1b[0m".to_string(),
        DeletionResult::OtherFailure(detail) => {
            format!("\x1b[31mfailed\x1b[0m: {}", truncate(detail, 40))
        }
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
