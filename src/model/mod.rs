//! Core data types for extensions, inventories and deletion reports.
//!
//! This module contains the fundamental types used throughout extsweep:
//!
//! - [`BrowserFamily`] - One of the supported browser storage conventions
//! - [`Platform`] - Operating system platform
//! - [`ExtensionIdentity`] - The `(family, path)` key of one installed extension
//! - [`ExtensionRecord`] - A discovered extension
//! - [`InventorySnapshot`] - One complete scan result
//! - [`DeletionReport`] - Per-item outcomes of a deletion batch
//!
//! # Example
//!
//! ```
//! use extsweep::model::{BrowserFamily, ExtensionIdentity};
//!
//! let id = ExtensionIdentity::new(BrowserFamily::Chrome, "/tmp/Extensions/abcd");
//! assert_eq!(id.family, BrowserFamily::Chrome);
//! ```

mod extension;
mod inventory;
mod report;

pub use extension::*;
pub use inventory::*;
pub use report::*;

use serde::{Deserialize, Serialize};

/// Browser storage convention. Declaration order is the presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
}

impl BrowserFamily {
    pub const ALL: [BrowserFamily; 3] = [
        BrowserFamily::Chrome,
        BrowserFamily::Edge,
        BrowserFamily::Firefox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "chrome",
            BrowserFamily::Edge => "edge",
            BrowserFamily::Firefox => "firefox",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "Chrome",
            BrowserFamily::Edge => "Edge",
            BrowserFamily::Firefox => "Firefox",
        }
    }
}

impl std::fmt::Display for BrowserFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for BrowserFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" => Ok(BrowserFamily::Chrome),
            "edge" => Ok(BrowserFamily::Edge),
            "firefox" => Ok(BrowserFamily::Firefox),
            _ => Err(format!(
                "Unknown browser family: {}. Use: chrome, edge, firefox",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOS,
    Windows,
}

impl Platform {
    /// The host platform, or `None` when no browser storage convention is
    /// known for it.
    pub fn current() -> Option<Self> {
        #[cfg(target_os = "linux")]
        return Some(Platform::Linux);
        #[cfg(target_os = "macos")]
        return Some(Platform::MacOS);
        #[cfg(target_os = "windows")]
        return Some(Platform::Windows);
        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        return None;
    }
}
