//! Per-user, per-browser path resolution.
//!
//! This module finds the directories where each browser family keeps its
//! installed extensions for a given user account.
//!
//! Every location is derived from the [`UserContext`] home directory rather
//! than the process's own environment, so the same resolver works for any
//! account it is pointed at.

use std::path::{Path, PathBuf};

use crate::config::RootOverrides;
use crate::model::{BrowserFamily, Platform};

/// The account whose extensions are being inventoried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub username: String,
    pub home: PathBuf,
}

impl UserContext {
    pub fn new(username: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            username: username.into(),
            home: home.into(),
        }
    }

    /// The account running this process.
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn current() -> Option<Self> {
        let home = dirs::home_dir()?;
        let username = std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .ok()
            .or_else(|| {
                home.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Some(Self { username, home })
    }

    /// A named account, with its home at the platform's conventional place.
    ///
    /// - Windows: `C:\Users\<name>`
    /// - macOS: `/Users/<name>` (`/var/root` for `root`)
    /// - Linux: `/home/<name>` (`/root` for `root`)
    pub fn for_user(username: &str, platform: Platform) -> Self {
        let home = match (platform, username) {
            (Platform::Windows, _) => PathBuf::from(r"C:\Users").join(username),
            (Platform::MacOS, "root") => PathBuf::from("/var/root"),
            (Platform::MacOS, _) => PathBuf::from("/Users").join(username),
            (Platform::Linux, "root") => PathBuf::from("/root"),
            (Platform::Linux, _) => PathBuf::from("/home").join(username),
        };
        Self::new(username, home)
    }
}

/// Where a family's extensions live for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootResolution {
    /// Existing roots. One extensions directory for Chrome and Edge; the
    /// profiles directory for Firefox.
    Found(Vec<PathBuf>),
    /// The conventional location does not exist, usually because the
    /// browser was never installed.
    NotFound(PathBuf),
    /// The host platform has no known storage convention.
    Unsupported,
}

impl RootResolution {
    pub fn roots(&self) -> &[PathBuf] {
        match self {
            RootResolution::Found(roots) => roots,
            _ => &[],
        }
    }
}

/// Resolves per-family storage roots.
#[derive(Debug, Clone)]
pub struct PathResolver {
    platform: Option<Platform>,
    profile: String,
    overrides: RootOverrides,
}

impl PathResolver {
    /// A resolver for the host platform using the `Default` Chromium profile.
    pub fn new() -> Self {
        Self::for_platform(Platform::current())
    }

    pub fn for_platform(platform: Option<Platform>) -> Self {
        Self {
            platform,
            profile: "Default".to_string(),
            overrides: RootOverrides::default(),
        }
    }

    /// Use a Chromium profile directory other than `Default`.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Explicit roots that replace the conventional locations.
    pub fn with_overrides(mut self, overrides: RootOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// Resolves the search roots for `family`.
    ///
    /// Never fails: a missing directory is [`RootResolution::NotFound`] and an
    /// unknown host platform is [`RootResolution::Unsupported`].
    pub fn resolve_roots(&self, family: BrowserFamily, user: &UserContext) -> RootResolution {
        let expected = match self.overrides.get(family) {
            Some(path) => path.to_path_buf(),
            None => match self.expected_root(family, user) {
                Some(path) => path,
                None => return RootResolution::Unsupported,
            },
        };

        if expected.is_dir() {
            RootResolution::Found(vec![expected])
        } else {
            RootResolution::NotFound(expected)
        }
    }

    /// The conventional root for `family`, whether or not it exists.
    ///
    /// Platform-specific locations, relative to the user's home:
    ///
    /// | Family | Windows | macOS | Linux |
    /// |--------|---------|-------|-------|
    /// | Chrome | `AppData\Local\Google\Chrome\User Data\<profile>\Extensions` | `Library/Application Support/Google/Chrome/<profile>/Extensions` | `.config/google-chrome/<profile>/Extensions` |
    /// | Edge | `AppData\Local\Microsoft\Edge\User Data\<profile>\Extensions` | `Library/Application Support/Microsoft Edge/<profile>/Extensions` | `.config/microsoft-edge/<profile>/Extensions` |
    /// | Firefox | `AppData\Roaming\Mozilla\Firefox\Profiles` | `Library/Application Support/Firefox/Profiles` | `.mozilla/firefox` |
    pub fn expected_root(&self, family: BrowserFamily, user: &UserContext) -> Option<PathBuf> {
        let platform = self.platform?;
        let home = &user.home;

        let path = match (family, platform) {
            (BrowserFamily::Chrome, Platform::Windows) => chromium_profile(
                local_app_data(home).join("Google").join("Chrome").join("User Data"),
                &self.profile,
            ),
            (BrowserFamily::Chrome, Platform::MacOS) => chromium_profile(
                application_support(home).join("Google").join("Chrome"),
                &self.profile,
            ),
            (BrowserFamily::Chrome, Platform::Linux) => chromium_profile(
                home.join(".config").join("google-chrome"),
                &self.profile,
            ),
            (BrowserFamily::Edge, Platform::Windows) => chromium_profile(
                local_app_data(home).join("Microsoft").join("Edge").join("User Data"),
                &self.profile,
            ),
            (BrowserFamily::Edge, Platform::MacOS) => chromium_profile(
                application_support(home).join("Microsoft Edge"),
                &self.profile,
            ),
            (BrowserFamily::Edge, Platform::Linux) => chromium_profile(
                home.join(".config").join("microsoft-edge"),
                &self.profile,
            ),
            (BrowserFamily::Firefox, Platform::Windows) => home
                .join("AppData")
                .join("Roaming")
                .join("Mozilla")
                .join("Firefox")
                .join("Profiles"),
            (BrowserFamily::Firefox, Platform::MacOS) => {
                application_support(home).join("Firefox").join("Profiles")
            }
            (BrowserFamily::Firefox, Platform::Linux) => home.join(".mozilla").join("firefox"),
        };

        Some(path)
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn chromium_profile(user_data: PathBuf, profile: &str) -> PathBuf {
    user_data.join(profile).join("Extensions")
}

fn local_app_data(home: &Path) -> PathBuf {
    home.join("AppData").join("Local")
}

fn application_support(home: &Path) -> PathBuf {
    home.join("Library").join("Application Support")
}

/// Returns the configuration directory for extsweep.
///
/// Falls back to the working directory if no configuration directory can be
/// determined.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("extsweep")
}
