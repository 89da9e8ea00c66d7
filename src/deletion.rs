//! Removal of selected extensions.
//!
//! Every requested identity is attempted, in order, and produces exactly one
//! [`DeletionOutcome`]. A locked or vanished item never stops the rest of the
//! batch.

use std::fs;
use std::io;
use tracing::{info, warn};

use crate::model::{
    DeletionOutcome, DeletionReport, DeletionResult, ExtensionIdentity, ExtensionKind,
    ExtensionRecord, InventorySnapshot,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct DeletionEngine;

impl DeletionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Deletes the backing storage of each identity in `selection`.
    ///
    /// Identities not present in `snapshot` are reported as
    /// [`DeletionResult::NotFound`] without touching the filesystem. The
    /// snapshot is not refreshed; that is up to the caller.
    pub fn delete(
        &self,
        selection: &[ExtensionIdentity],
        snapshot: &InventorySnapshot,
    ) -> DeletionReport {
        let outcomes = selection
            .iter()
            .map(|identity| {
                let record = snapshot.find(identity);
                let result = match record {
                    Some(record) => remove_record(record),
                    None => DeletionResult::NotFound,
                };

                match &result {
                    DeletionResult::Deleted => {
                        info!(family = %identity.family, path = %identity.path.display(), "deleted extension");
                    }
                    failure => {
                        warn!(family = %identity.family, path = %identity.path.display(), result = %failure, "extension not deleted");
                    }
                }

                DeletionOutcome {
                    identity: identity.clone(),
                    display_name: record.map(|r| r.display_name.clone()),
                    result,
                }
            })
            .collect();

        DeletionReport { outcomes }
    }
}

fn remove_record(record: &ExtensionRecord) -> DeletionResult {
    let path = record.path();

    // symlink_metadata so a link is never followed out of the browser's tree
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return classify(e),
    };

    let removed = match record.kind {
        ExtensionKind::DirectoryBundle => {
            if !metadata.is_dir() {
                return DeletionResult::OtherFailure(format!(
                    "{} is no longer a directory",
                    path.display()
                ));
            }
            fs::remove_dir_all(path)
        }
        ExtensionKind::SingleFilePackage => {
            if !metadata.is_file() {
                return DeletionResult::OtherFailure(format!(
                    "{} is no longer a regular file",
                    path.display()
                ));
            }
            fs::remove_file(path)
        }
    };

    match removed {
        Ok(()) => DeletionResult::Deleted,
        Err(e) => classify(e),
    }
}

fn classify(error: io::Error) -> DeletionResult {
    match error.kind() {
        io::ErrorKind::NotFound => DeletionResult::NotFound,
        io::ErrorKind::PermissionDenied => DeletionResult::PermissionDenied,
        _ => DeletionResult::OtherFailure(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BrowserFamily, FamilyInventory};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    fn bundle(root: &Path, id: &str) -> ExtensionRecord {
        let path = root.join(id);
        fs::create_dir_all(path.join("1.0")).unwrap();
        fs::write(path.join("1.0").join("manifest.json"), r#"{"name":"x"}"#).unwrap();
        ExtensionRecord::new(
            ExtensionIdentity::new(BrowserFamily::Chrome, &path),
            id,
            id,
            ExtensionKind::DirectoryBundle,
        )
    }

    fn package(root: &Path, name: &str) -> ExtensionRecord {
        let path = root.join(name);
        fs::write(&path, b"PK").unwrap();
        ExtensionRecord::new(
            ExtensionIdentity::new(BrowserFamily::Firefox, &path),
            name,
            name,
            ExtensionKind::SingleFilePackage,
        )
    }

    fn snapshot(records: Vec<ExtensionRecord>) -> InventorySnapshot {
        let mut families: BTreeMap<BrowserFamily, FamilyInventory> = BTreeMap::new();
        for record in records {
            families
                .entry(record.family())
                .or_default()
                .records
                .push(record);
        }
        InventorySnapshot::new(families)
    }

    #[test]
    fn test_deletes_bundles_and_packages() {
        let dir = tempfile::tempdir().unwrap();
        let a = bundle(dir.path(), "aaaa");
        let b = package(dir.path(), "b@example.com.xpi");
        let selection = vec![a.identity.clone(), b.identity.clone()];
        let snapshot = snapshot(vec![a.clone(), b.clone()]);

        let report = DeletionEngine::new().delete(&selection, &snapshot);

        assert_eq!(report.deleted(), 2);
        assert!(!a.path().exists());
        assert!(!b.path().exists());
        assert_eq!(report.outcomes[0].display_name.as_deref(), Some("aaaa"));
    }

    #[test]
    fn test_vanished_item_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            bundle(dir.path(), "aaaa"),
            bundle(dir.path(), "bbbb"),
            bundle(dir.path(), "cccc"),
        ];
        let selection: Vec<_> = records.iter().map(|r| r.identity.clone()).collect();
        let snapshot = snapshot(records.clone());

        fs::remove_dir_all(records[1].path()).unwrap();

        let report = DeletionEngine::new().delete(&selection, &snapshot);
        let results: Vec<_> = report.outcomes.iter().map(|o| o.result.clone()).collect();

        assert_eq!(
            results,
            vec![
                DeletionResult::Deleted,
                DeletionResult::NotFound,
                DeletionResult::Deleted
            ]
        );
        let order: Vec<_> = report.outcomes.iter().map(|o| o.identity.clone()).collect();
        assert_eq!(order, selection);
    }

    #[test]
    fn test_stale_identity_leaves_filesystem_alone() {
        let dir = tempfile::tempdir().unwrap();
        let untracked = dir.path().join("untracked");
        fs::create_dir_all(&untracked).unwrap();

        let stale = ExtensionIdentity::new(BrowserFamily::Chrome, &untracked);
        let report = DeletionEngine::new().delete(&[stale], &InventorySnapshot::empty());

        assert_eq!(report.outcomes[0].result, DeletionResult::NotFound);
        assert_eq!(report.outcomes[0].display_name, None);
        assert!(untracked.exists());
    }

    #[test]
    fn test_kind_mismatch_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let record = bundle(dir.path(), "aaaa");
        let path: PathBuf = record.path().to_path_buf();
        fs::remove_dir_all(&path).unwrap();
        fs::write(&path, "now a file").unwrap();

        let report = DeletionEngine::new().delete(&[record.identity.clone()], &snapshot(vec![record]));

        assert!(matches!(
            report.outcomes[0].result,
            DeletionResult::OtherFailure(_)
        ));
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_bundle_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("precious");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.txt"), "data").unwrap();

        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let record = ExtensionRecord::new(
            ExtensionIdentity::new(BrowserFamily::Chrome, &link),
            "link",
            "link",
            ExtensionKind::DirectoryBundle,
        );

        let report = DeletionEngine::new().delete(&[record.identity.clone()], &snapshot(vec![record]));

        assert!(matches!(
            report.outcomes[0].result,
            DeletionResult::OtherFailure(_)
        ));
        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn test_classify_errors() {
        assert_eq!(
            classify(io::Error::from(io::ErrorKind::NotFound)),
            DeletionResult::NotFound
        );
        assert_eq!(
            classify(io::Error::from(io::ErrorKind::PermissionDenied)),
            DeletionResult::PermissionDenied
        );
        assert!(matches!(
            classify(io::Error::new(io::ErrorKind::Other, "busy")),
            DeletionResult::OtherFailure(detail) if detail == "busy"
        ));
    }
}
