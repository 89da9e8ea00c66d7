use std::path::Path;

use crate::error::FamilyError;
use crate::manifest::ManifestReader;
use crate::model::{BrowserFamily, FamilyInventory};

pub struct EdgeScanner;

impl super::FamilyScanner for EdgeScanner {
    fn name(&self) -> &'static str {
        "Edge Extensions"
    }

    fn family(&self) -> BrowserFamily {
        BrowserFamily::Edge
    }

    fn scan_root(
        &self,
        root: &Path,
        reader: &ManifestReader,
    ) -> Result<FamilyInventory, FamilyError> {
        // Edge uses the same Chromium extension format
        super::chrome::scan_chromium_extensions(root, BrowserFamily::Edge, reader)
    }
}
