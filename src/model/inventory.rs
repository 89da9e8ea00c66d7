use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{BrowserFamily, ExtensionIdentity, ExtensionRecord};
use crate::error::FamilyError;

/// An entry the scanner could not read and left out of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Scan result for a single browser family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyInventory {
    pub records: Vec<ExtensionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FamilyError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedItem>,
}

impl FamilyInventory {
    pub fn failed(error: FamilyError) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
            skipped: Vec::new(),
        }
    }
}

/// One complete, internally consistent scan.
///
/// A snapshot is never patched. Every scan builds a new one and the previous
/// value is dropped, so records from different scans can never be mixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub scanned_at: DateTime<Utc>,
    pub families: BTreeMap<BrowserFamily, FamilyInventory>,
}

impl InventorySnapshot {
    pub fn new(families: BTreeMap<BrowserFamily, FamilyInventory>) -> Self {
        Self {
            scanned_at: Utc::now(),
            families,
        }
    }

    /// A snapshot with no families at all.
    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    pub fn family(&self, family: BrowserFamily) -> Option<&FamilyInventory> {
        self.families.get(&family)
    }

    /// All records, Chrome first, then Edge, then Firefox.
    pub fn records(&self) -> impl Iterator<Item = &ExtensionRecord> {
        self.families.values().flat_map(|f| f.records.iter())
    }

    pub fn find(&self, identity: &ExtensionIdentity) -> Option<&ExtensionRecord> {
        self.families
            .get(&identity.family)?
            .records
            .iter()
            .find(|r| &r.identity == identity)
    }

    pub fn contains(&self, identity: &ExtensionIdentity) -> bool {
        self.find(identity).is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = (BrowserFamily, &FamilyError)> {
        self.families
            .iter()
            .filter_map(|(family, inv)| inv.error.as_ref().map(|e| (*family, e)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (BrowserFamily, &SkippedItem)> {
        self.families
            .iter()
            .flat_map(|(family, inv)| inv.skipped.iter().map(move |s| (*family, s)))
    }

    pub fn len(&self) -> usize {
        self.families.values().map(|f| f.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
