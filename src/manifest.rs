//! Extension descriptor reading.
//!
//! Chromium browsers unpack every extension into
//! `<extension-id>/<version>/manifest.json`. Firefox keeps each add-on as a
//! single `.xpi` archive, which is never opened here: the file name stands in
//! for the display name.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::DescriptorError;
use crate::model::ExtensionKind;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Name used when a descriptor has no `name` field, or no descriptor exists.
pub const UNKNOWN_NAME: &str = "Unknown Extension";

/// Marker of a Chrome i18n reference such as `__MSG_appName__`.
pub const PLACEHOLDER_MARKER: &str = "__MSG_";

const FALLBACK_LOCALES: [&str; 3] = ["en", "en_US", "en_GB"];

/// How names that are localization placeholders are treated.
///
/// The policy is applied to every bundle the reader sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderPolicy {
    /// Look the message up in the bundle's `_locales`; keep the raw
    /// placeholder if no translation is found.
    #[default]
    Resolve,
    /// Show the raw placeholder.
    Keep,
    /// Leave the extension out of the inventory.
    Skip,
}

/// What a descriptor says about one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub kind: ExtensionKind,
    pub version: Option<String>,
    /// Version directory the descriptor was read from. Bundles only.
    pub version_dir: Option<PathBuf>,
    /// The name is still an unresolved localization placeholder.
    pub placeholder: bool,
}

#[derive(Deserialize)]
struct BundleManifest {
    name: Option<String>,
    version: Option<String>,
    default_locale: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestReader {
    policy: PlaceholderPolicy,
}

impl ManifestReader {
    pub fn new(policy: PlaceholderPolicy) -> Self {
        Self { policy }
    }

    /// Reads whatever descriptor backs `path`: a bundle directory or a
    /// single package file.
    pub fn read_descriptor(&self, path: &Path) -> Result<Descriptor, DescriptorError> {
        if path.is_dir() {
            self.read_bundle(path)
        } else {
            Ok(self.read_package(path))
        }
    }

    /// Reads the descriptor of an unpacked extension directory.
    ///
    /// Version subdirectories are probed in listing order and the first one
    /// holding a parsable `manifest.json` wins. When none does, the first
    /// malformed descriptor is reported, then the first read failure, and
    /// finally [`DescriptorError::Missing`].
    pub fn read_bundle(&self, extension_dir: &Path) -> Result<Descriptor, DescriptorError> {
        let entries = fs::read_dir(extension_dir).map_err(|e| DescriptorError::Io {
            path: extension_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let item = extension_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut malformed = None;
        let mut io_error = None;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(dir = %extension_dir.display(), error = %e, "unreadable version entry");
                    continue;
                }
            };

            let version_dir = entry.path();
            if !version_dir.is_dir() {
                continue;
            }

            let manifest_path = version_dir.join(MANIFEST_FILE);
            let content = match fs::read_to_string(&manifest_path) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    malformed.get_or_insert(DescriptorError::Malformed {
                        item: item.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    io_error.get_or_insert(DescriptorError::Io {
                        path: manifest_path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let manifest: BundleManifest =
                match serde_json::from_str(content.trim_start_matches('\u{feff}')) {
                    Ok(manifest) => manifest,
                    Err(e) => {
                        debug!(manifest = %manifest_path.display(), error = %e, "malformed manifest");
                        malformed.get_or_insert(DescriptorError::Malformed {
                            item: item.clone(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

            return Ok(self.bundle_descriptor(manifest, version_dir));
        }

        Err(malformed
            .or(io_error)
            .unwrap_or(DescriptorError::Missing))
    }

    /// Describes a packaged add-on without opening it.
    pub fn read_package(&self, path: &Path) -> Descriptor {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        Descriptor {
            name,
            kind: ExtensionKind::SingleFilePackage,
            version: None,
            version_dir: None,
            placeholder: false,
        }
    }

    /// Whether the configured policy hides this descriptor's extension.
    pub fn suppresses(&self, descriptor: &Descriptor) -> bool {
        self.policy == PlaceholderPolicy::Skip && descriptor.placeholder
    }

    fn bundle_descriptor(&self, manifest: BundleManifest, version_dir: PathBuf) -> Descriptor {
        let mut name = manifest.name.unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let mut placeholder = name.contains(PLACEHOLDER_MARKER);

        if placeholder && self.policy == PlaceholderPolicy::Resolve {
            if let Some(localized) =
                localized_name(&version_dir, &name, manifest.default_locale.as_deref())
            {
                name = localized;
                placeholder = false;
            }
        }

        let version = manifest.version.or_else(|| {
            version_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });

        Descriptor {
            name,
            kind: ExtensionKind::DirectoryBundle,
            version,
            version_dir: Some(version_dir),
            placeholder,
        }
    }
}

/// Looks up `__MSG_key__` in `_locales/<locale>/messages.json`, trying the
/// manifest's default locale before the English fallbacks. Keys match
/// case-insensitively, as in Chromium.
fn localized_name(version_dir: &Path, placeholder: &str, default_locale: Option<&str>) -> Option<String> {
    let key = placeholder
        .strip_prefix(PLACEHOLDER_MARKER)?
        .strip_suffix("__")?;

    let locales_dir = version_dir.join("_locales");

    let locales = default_locale
        .into_iter()
        .chain(FALLBACK_LOCALES.iter().copied());

    for locale in locales {
        let messages_path = locales_dir.join(locale).join("messages.json");
        let Ok(content) = fs::read_to_string(&messages_path) else {
            continue;
        };
        let Ok(serde_json::Value::Object(messages)) =
            serde_json::from_str::<serde_json::Value>(content.trim_start_matches('\u{feff}'))
        else {
            continue;
        };

        let message = messages
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.get("message"))
            .and_then(|m| m.as_str());

        if let Some(message) = message {
            return Some(message.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(ext_dir: &Path, version: &str, content: &str) -> PathBuf {
        let version_dir = ext_dir.join(version);
        fs::create_dir_all(&version_dir).unwrap();
        fs::write(version_dir.join(MANIFEST_FILE), content).unwrap();
        version_dir
    }

    #[test]
    fn test_reads_name_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("abcd");
        write_manifest(&ext, "1.0", r#"{"name":"Ad Blocker","version":"1.0.3"}"#);

        let descriptor = ManifestReader::default().read_bundle(&ext).unwrap();
        assert_eq!(descriptor.name, "Ad Blocker");
        assert_eq!(descriptor.version.as_deref(), Some("1.0.3"));
        assert_eq!(descriptor.kind, ExtensionKind::DirectoryBundle);
        assert!(!descriptor.placeholder);
    }

    #[test]
    fn test_missing_name_is_placeholder_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("abcd");
        write_manifest(&ext, "2.1", r#"{"manifest_version":3}"#);

        let descriptor = ManifestReader::default().read_bundle(&ext).unwrap();
        assert_eq!(descriptor.name, UNKNOWN_NAME);
        // falls back to the directory name
        assert_eq!(descriptor.version.as_deref(), Some("2.1"));
    }

    #[test]
    fn test_malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("broken");
        write_manifest(&ext, "1.0", "{ not json");

        let err = ManifestReader::default().read_bundle(&ext).unwrap_err();
        match err {
            DescriptorError::Malformed { item, .. } => assert_eq!(item, "broken"),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("typed");
        write_manifest(&ext, "1.0", r#"{"name": 42}"#);

        assert!(matches!(
            ManifestReader::default().read_bundle(&ext),
            Err(DescriptorError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parsable_version_wins_over_malformed_one() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("multi");
        write_manifest(&ext, "1.0", "garbage");
        write_manifest(&ext, "2.0", r#"{"name":"Good One"}"#);

        let descriptor = ManifestReader::default().read_bundle(&ext).unwrap();
        assert_eq!(descriptor.name, "Good One");
        assert_eq!(descriptor.version_dir, Some(ext.join("2.0")));
    }

    #[test]
    fn test_no_manifest_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("empty");
        fs::create_dir_all(ext.join("1.0")).unwrap();
        fs::write(ext.join("stray.txt"), "x").unwrap();

        assert_eq!(
            ManifestReader::default().read_bundle(&ext),
            Err(DescriptorError::Missing)
        );
    }

    #[test]
    fn test_unlistable_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");

        assert!(matches!(
            ManifestReader::default().read_bundle(&gone),
            Err(DescriptorError::Io { .. })
        ));
    }

    #[test]
    fn test_byte_order_mark_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("bom");
        write_manifest(&ext, "1.0", "\u{feff}{\"name\":\"With BOM\"}");

        let descriptor = ManifestReader::default().read_bundle(&ext).unwrap();
        assert_eq!(descriptor.name, "With BOM");
    }

    #[test]
    fn test_placeholder_resolved_from_locales() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("i18n");
        let version_dir = write_manifest(
            &ext,
            "3.4",
            r#"{"name":"__MSG_appName__","default_locale":"de"}"#,
        );
        let de = version_dir.join("_locales").join("de");
        fs::create_dir_all(&de).unwrap();
        fs::write(
            de.join("messages.json"),
            r#"{"APPNAME":{"message":"Werbeblocker"}}"#,
        )
        .unwrap();

        let descriptor = ManifestReader::new(PlaceholderPolicy::Resolve)
            .read_bundle(&ext)
            .unwrap();
        assert_eq!(descriptor.name, "Werbeblocker");
        assert!(!descriptor.placeholder);
    }

    #[test]
    fn test_unresolvable_placeholder_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("i18n");
        write_manifest(&ext, "1.0", r#"{"name":"__MSG_extName__"}"#);

        let reader = ManifestReader::new(PlaceholderPolicy::Resolve);
        let descriptor = reader.read_bundle(&ext).unwrap();
        assert_eq!(descriptor.name, "__MSG_extName__");
        assert!(descriptor.placeholder);
        assert!(!reader.suppresses(&descriptor));
    }

    #[test]
    fn test_keep_and_skip_policies() {
        let dir = tempfile::tempdir().unwrap();
        let ext = dir.path().join("i18n");
        let version_dir = write_manifest(&ext, "1.0", r#"{"name":"__MSG_extName__"}"#);
        let en = version_dir.join("_locales").join("en");
        fs::create_dir_all(&en).unwrap();
        fs::write(en.join("messages.json"), r#"{"extName":{"message":"Reader"}}"#).unwrap();

        let keep = ManifestReader::new(PlaceholderPolicy::Keep);
        let kept = keep.read_bundle(&ext).unwrap();
        assert_eq!(kept.name, "__MSG_extName__");
        assert!(!keep.suppresses(&kept));

        let skip = ManifestReader::new(PlaceholderPolicy::Skip);
        let skipped = skip.read_bundle(&ext).unwrap();
        assert!(skip.suppresses(&skipped));
    }

    #[test]
    fn test_package_is_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        let xpi = dir.path().join("uBlock0@raymondhill.net.xpi");
        fs::write(&xpi, b"PK\x03\x04 not really a zip").unwrap();

        let descriptor = ManifestReader::default().read_descriptor(&xpi).unwrap();
        assert_eq!(descriptor.name, "uBlock0@raymondhill.net.xpi");
        assert_eq!(descriptor.kind, ExtensionKind::SingleFilePackage);
    }
}
