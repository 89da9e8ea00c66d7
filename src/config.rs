//! Configuration file handling.
//!
//! This module provides loading and saving of extsweep configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/extsweep/config.toml`
//! - macOS: `~/Library/Application Support/extsweep/config.toml`
//! - Windows: `%APPDATA%\extsweep\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! profile = "Default"
//! placeholder_policy = "resolve"
//! parallel = true
//! family_timeout_secs = 30
//! default_format = "table"
//! families = ["chrome", "edge", "firefox"]
//!
//! [roots]
//! firefox = "/opt/portable-firefox/Profiles"
//!
//! [ignore]
//! extensions = ["nmmhkkegccagdldgiimedpiccmgmieda", "*@mozilla.org"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::manifest::PlaceholderPolicy;
use crate::model::BrowserFamily;
use crate::platform::config_dir;

/// Application configuration.
///
/// This struct represents all configurable options for extsweep.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use extsweep::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Chromium profile: {}", config.profile);
/// println!("Parallel scan: {}", config.parallel);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chromium profile directory to inspect for Chrome and Edge.
    ///
    /// Default: "Default"
    pub profile: String,

    /// What to do with `__MSG_key__` localized extension names.
    ///
    /// Valid values: "resolve", "keep", "skip"
    /// Default: "resolve"
    pub placeholder_policy: PlaceholderPolicy,

    /// Whether to scan browser families concurrently.
    ///
    /// Default: true
    pub parallel: bool,

    /// Per-family time limit for concurrent scans, in seconds. 0 disables it.
    ///
    /// Default: 30
    pub family_timeout_secs: u64,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Which browser families to scan when no `--family` flag is provided.
    ///
    /// Default: all families
    pub families: Vec<BrowserFamily>,

    /// Explicit storage roots that replace the conventional locations.
    #[serde(default)]
    pub roots: RootOverrides,

    /// Ignore list for extensions that should never be listed or removed.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Per-family root overrides, for portable installs or non-standard layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootOverrides {
    /// Replaces the Chrome `Extensions` directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome: Option<PathBuf>,
    /// Replaces the Edge `Extensions` directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<PathBuf>,
    /// Replaces the Firefox profiles directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firefox: Option<PathBuf>,
}

impl RootOverrides {
    pub fn get(&self, family: BrowserFamily) -> Option<&Path> {
        match family {
            BrowserFamily::Chrome => self.chrome.as_deref(),
            BrowserFamily::Edge => self.edge.as_deref(),
            BrowserFamily::Firefox => self.firefox.as_deref(),
        }
    }
}

/// Configuration for ignoring specific extensions.
///
/// Ignored extensions are left out of every inventory, which also keeps them
/// out of reach of deletion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Extension IDs to exclude from scanning.
    ///
    /// Matched against the extension directory name (Chrome, Edge) or the
    /// package file stem (Firefox). Supports glob patterns (e.g. "*@mozilla.org").
    pub extensions: Vec<String>,
}

impl IgnoreConfig {
    /// Whether `extension_id` matches any ignore pattern.
    pub fn should_ignore_extension(&self, extension_id: &str) -> bool {
        self.extensions
            .iter()
            .any(|pattern| glob_match(pattern, extension_id))
    }
}

/// Glob with `*` as the only wildcard. Literal segments must appear in
/// order, and the first and last are anchored to the ends of `text`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let mut segments = pattern.split('*');
    let head = segments.next().unwrap_or_default();
    let Some(rest) = text.strip_prefix(head) else {
        return false;
    };

    let later: Vec<&str> = segments.collect();
    let Some((tail, inner)) = later.split_last() else {
        return rest.is_empty();
    };
    let Some(mut rest) = rest.strip_suffix(tail) else {
        return false;
    };

    for segment in inner {
        match rest.find(segment) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: "Default".to_string(),
            placeholder_policy: PlaceholderPolicy::default(),
            parallel: true,
            family_timeout_secs: 30,
            default_format: "table".to_string(),
            families: BrowserFamily::ALL.to_vec(),
            roots: RootOverrides::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Reads `config.toml` from the user's config directory. A missing file
    /// means defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path, with the same
    /// missing-file behavior as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Writes `config.toml`, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Per-family scan time limit, if one is configured.
    pub fn family_timeout(&self) -> Option<std::time::Duration> {
        match self.family_timeout_secs {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}
