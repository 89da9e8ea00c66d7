use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::BrowserFamily;

/// Composite key naming one on-disk extension.
///
/// Display names collide freely (the same extension installed in Chrome and
/// Edge, or two unrelated extensions both called "Translate"), so the backing
/// path is what makes an identity unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtensionIdentity {
    pub family: BrowserFamily,
    pub path: PathBuf,
}

impl ExtensionIdentity {
    pub fn new(family: BrowserFamily, path: impl Into<PathBuf>) -> Self {
        Self {
            family,
            path: path.into(),
        }
    }
}

impl std::fmt::Display for ExtensionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.family.as_str(), self.path.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    /// A directory holding one or more unpacked version directories.
    DirectoryBundle,
    /// A single opaque package file (`.xpi`).
    SingleFilePackage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Ok,
    MissingDescriptor,
    MalformedDescriptor,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Ok => "ok",
            ParseStatus::MissingDescriptor => "missing manifest",
            ParseStatus::MalformedDescriptor => "malformed manifest",
        }
    }
}

/// One extension found by a scan. Immutable; the next scan supersedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub identity: ExtensionIdentity,
    /// Opaque store identifier: the extension directory name, or the package
    /// file stem for `.xpi` files.
    pub extension_id: String,
    pub display_name: String,
    pub kind: ExtensionKind,
    pub parse_status: ParseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Firefox profile directory the package was found in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub size_bytes: u64,
}

impl ExtensionRecord {
    pub fn new(
        identity: ExtensionIdentity,
        extension_id: impl Into<String>,
        display_name: impl Into<String>,
        kind: ExtensionKind,
    ) -> Self {
        Self {
            identity,
            extension_id: extension_id.into(),
            display_name: display_name.into(),
            kind,
            parse_status: ParseStatus::Ok,
            version: None,
            profile: None,
            size_bytes: 0,
        }
    }

    pub fn with_status(mut self, status: ParseStatus) -> Self {
        self.parse_status = status;
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn family(&self) -> BrowserFamily {
        self.identity.family
    }

    pub fn path(&self) -> &Path {
        &self.identity.path
    }
}
