use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::FamilyError;
use crate::manifest::ManifestReader;
use crate::model::{
    BrowserFamily, ExtensionIdentity, ExtensionRecord, FamilyInventory, SkippedItem,
};

/// Suffix of packaged Firefox add-ons.
pub const PACKAGE_SUFFIX: &str = ".xpi";

pub struct FirefoxScanner;

impl super::FamilyScanner for FirefoxScanner {
    fn name(&self) -> &'static str {
        "Firefox Add-ons"
    }

    fn family(&self) -> BrowserFamily {
        BrowserFamily::Firefox
    }

    fn scan_root(
        &self,
        profiles_dir: &Path,
        reader: &ManifestReader,
    ) -> Result<FamilyInventory, FamilyError> {
        let entries = fs::read_dir(profiles_dir).map_err(|e| FamilyError::RootUnreadable {
            path: profiles_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut inventory = FamilyInventory::default();

        // Every directory here is a profile (*.default, *.default-release, ...)
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %profiles_dir.display(), error = %e, "skipping unreadable profile entry");
                    inventory.skipped.push(SkippedItem::new(profiles_dir, e));
                    continue;
                }
            };

            let profile_path = entry.path();
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => {}
                Ok(file_type) => {
                    if file_type.is_symlink() {
                        debug!(path = %profile_path.display(), "not following symlinked profile");
                    }
                    continue;
                }
                Err(e) => {
                    warn!(path = %profile_path.display(), error = %e, "skipping unreadable profile");
                    inventory.skipped.push(SkippedItem::new(&profile_path, e));
                    continue;
                }
            }

            let profile = entry.file_name().to_string_lossy().into_owned();
            scan_firefox_profile(&profile_path, &profile, reader, &mut inventory);
        }

        Ok(inventory)
    }
}

fn scan_firefox_profile(
    profile_path: &Path,
    profile: &str,
    reader: &ManifestReader,
    inventory: &mut FamilyInventory,
) {
    let extensions_dir = profile_path.join("extensions");
    let entries = match fs::read_dir(&extensions_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(path = %extensions_dir.display(), error = %e, "skipping unreadable extensions directory");
            inventory.skipped.push(SkippedItem::new(&extensions_dir, e));
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %extensions_dir.display(), error = %e, "skipping unreadable add-on entry");
                inventory.skipped.push(SkippedItem::new(&extensions_dir, e));
                continue;
            }
        };

        // XPI files are named {extension-id}.xpi
        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(id) = filename.strip_suffix(PACKAGE_SUFFIX) else {
            continue;
        };

        let path = entry.path();
        let descriptor = reader.read_package(&path);
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        let record = ExtensionRecord::new(
            ExtensionIdentity::new(BrowserFamily::Firefox, &path),
            id,
            descriptor.name,
            descriptor.kind,
        )
        .with_profile(profile)
        .with_size(size);

        inventory.records.push(record);
    }
}
