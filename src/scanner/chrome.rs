use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::bundle_size;
use crate::error::{DescriptorError, FamilyError};
use crate::manifest::{ManifestReader, UNKNOWN_NAME};
use crate::model::{
    BrowserFamily, ExtensionIdentity, ExtensionKind, ExtensionRecord, FamilyInventory,
    ParseStatus, SkippedItem,
};

pub struct ChromeScanner;

impl super::FamilyScanner for ChromeScanner {
    fn name(&self) -> &'static str {
        "Chrome Extensions"
    }

    fn family(&self) -> BrowserFamily {
        BrowserFamily::Chrome
    }

    fn scan_root(
        &self,
        root: &Path,
        reader: &ManifestReader,
    ) -> Result<FamilyInventory, FamilyError> {
        scan_chromium_extensions(root, BrowserFamily::Chrome, reader)
    }
}

/// Lists a Chromium `Extensions` directory: one record per `<extension-id>`
/// subdirectory, named by its first parsable version.
pub(crate) fn scan_chromium_extensions(
    extensions_dir: &Path,
    family: BrowserFamily,
    reader: &ManifestReader,
) -> Result<FamilyInventory, FamilyError> {
    let entries = fs::read_dir(extensions_dir).map_err(|e| FamilyError::RootUnreadable {
        path: extensions_dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut inventory = FamilyInventory::default();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%family, dir = %extensions_dir.display(), error = %e, "skipping unreadable entry");
                inventory.skipped.push(SkippedItem::new(extensions_dir, e));
                continue;
            }
        };

        let ext_path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_dir() => {}
            Ok(file_type) => {
                if file_type.is_symlink() {
                    debug!(%family, path = %ext_path.display(), "not following symlinked extension");
                }
                continue;
            }
            Err(e) => {
                warn!(%family, path = %ext_path.display(), error = %e, "skipping unreadable entry");
                inventory.skipped.push(SkippedItem::new(&ext_path, e));
                continue;
            }
        }

        let extension_id = entry.file_name().to_string_lossy().into_owned();
        let identity = ExtensionIdentity::new(family, &ext_path);

        let record = match reader.read_bundle(&ext_path) {
            Ok(descriptor) => {
                if reader.suppresses(&descriptor) {
                    debug!(%family, id = %extension_id, name = %descriptor.name, "skipping localized placeholder name");
                    continue;
                }
                ExtensionRecord::new(
                    identity,
                    &extension_id,
                    descriptor.name,
                    ExtensionKind::DirectoryBundle,
                )
                .with_version(descriptor.version)
            }
            Err(DescriptorError::Missing) => {
                debug!(%family, id = %extension_id, "no manifest found");
                ExtensionRecord::new(
                    identity,
                    &extension_id,
                    UNKNOWN_NAME,
                    ExtensionKind::DirectoryBundle,
                )
                .with_status(ParseStatus::MissingDescriptor)
            }
            Err(e @ DescriptorError::Malformed { .. }) => {
                warn!(%family, error = %e, "listing extension under its id");
                ExtensionRecord::new(
                    identity,
                    &extension_id,
                    &extension_id,
                    ExtensionKind::DirectoryBundle,
                )
                .with_status(ParseStatus::MalformedDescriptor)
            }
            Err(e @ DescriptorError::Io { .. }) => {
                warn!(%family, id = %extension_id, error = %e, "skipping unreadable extension");
                inventory.skipped.push(SkippedItem::new(&ext_path, e));
                continue;
            }
        };

        inventory.records.push(record.with_size(bundle_size(&ext_path)));
    }

    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FamilyScanner;

    #[test]
    fn test_files_in_root_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Preferences"), "{}").unwrap();
        let version = dir.path().join("abcd").join("1.0");
        fs::create_dir_all(&version).unwrap();
        fs::write(version.join("manifest.json"), r#"{"name":"Ad Blocker"}"#).unwrap();

        let inventory = ChromeScanner
            .scan_root(dir.path(), &ManifestReader::default())
            .unwrap();

        assert_eq!(inventory.records.len(), 1);
        assert!(inventory.skipped.is_empty());
    }

    #[test]
    fn test_unreadable_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Extensions");

        let err = ChromeScanner
            .scan_root(&missing, &ManifestReader::default())
            .unwrap_err();
        assert!(matches!(err, FamilyError::RootUnreadable { .. }));
    }

    #[test]
    fn test_version_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let version = dir.path().join("abcd").join("5.2.1_0");
        fs::create_dir_all(&version).unwrap();
        fs::write(version.join("manifest.json"), r#"{"name":"X","version":"5.2.1"}"#).unwrap();

        let inventory = ChromeScanner
            .scan_root(dir.path(), &ManifestReader::default())
            .unwrap();

        assert_eq!(inventory.records[0].version.as_deref(), Some("5.2.1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_extension_not_followed() {
        let outside = tempfile::tempdir().unwrap();
        let version = outside.path().join("1.0");
        fs::create_dir_all(&version).unwrap();
        fs::write(version.join("manifest.json"), r#"{"name":"Linked"}"#).unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("efgh")).unwrap();

        let inventory = ChromeScanner
            .scan_root(dir.path(), &ManifestReader::default())
            .unwrap();

        assert!(inventory.records.is_empty());
        assert!(inventory.skipped.is_empty());
    }
}
