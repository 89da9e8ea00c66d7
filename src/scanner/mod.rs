//! Extension enumeration.
//!
//! This module provides the [`FamilyScanner`] trait, one implementation per
//! browser family, and the [`Enumerator`] that drives them into a single
//! [`InventorySnapshot`].
//!
//! # Available Scanners
//!
//! | Scanner | Family | Layout |
//! |---------|--------|--------|
//! | [`ChromeScanner`] | Chrome | `Extensions/<id>/<version>/manifest.json` |
//! | [`EdgeScanner`] | Edge | `Extensions/<id>/<version>/manifest.json` |
//! | [`FirefoxScanner`] | Firefox | `Profiles/<profile>/extensions/<id>.xpi` |
//!
//! # Example
//!
//! ```no_run
//! use extsweep::platform::UserContext;
//! use extsweep::scanner::Enumerator;
//!
//! let user = UserContext::current().expect("no home directory");
//! let snapshot = Enumerator::default().scan(&user);
//! for record in snapshot.records() {
//!     println!("{}: {}", record.family(), record.display_name);
//! }
//! ```

mod chrome;
mod edge;
mod firefox;

pub use chrome::ChromeScanner;
pub use edge::EdgeScanner;
pub use firefox::FirefoxScanner;

use futures::future::join_all;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{Config, IgnoreConfig};
use crate::error::FamilyError;
use crate::manifest::ManifestReader;
use crate::model::{BrowserFamily, FamilyInventory, InventorySnapshot};
use crate::platform::{PathResolver, RootResolution, UserContext};

/// Walks one browser family's on-disk layout.
///
/// Implementations never fail on a single entry: unreadable items are
/// returned as [`SkippedItem`](crate::model::SkippedItem)s alongside the
/// records that could be read. Only a root that cannot be listed at all is
/// an error.
pub trait FamilyScanner: Send + Sync {
    /// Returns the human-readable name of this scanner.
    fn name(&self) -> &'static str;

    /// Returns the family this scanner handles.
    fn family(&self) -> BrowserFamily;

    /// Lists the extensions below one resolved root.
    fn scan_root(
        &self,
        root: &Path,
        reader: &ManifestReader,
    ) -> Result<FamilyInventory, FamilyError>;
}

/// Returns a scanner for every supported family, in presentation order.
///
/// ```
/// use extsweep::scanner::all_scanners;
///
/// assert_eq!(all_scanners().len(), 3);
/// ```
pub fn all_scanners() -> Vec<Box<dyn FamilyScanner>> {
    BrowserFamily::ALL.into_iter().map(get_scanner).collect()
}

/// Returns the scanner for a specific family.
///
/// ```
/// use extsweep::model::BrowserFamily;
/// use extsweep::scanner::get_scanner;
///
/// let scanner = get_scanner(BrowserFamily::Firefox);
/// assert_eq!(scanner.name(), "Firefox Add-ons");
/// ```
pub fn get_scanner(family: BrowserFamily) -> Box<dyn FamilyScanner> {
    match family {
        BrowserFamily::Chrome => Box::new(ChromeScanner),
        BrowserFamily::Edge => Box::new(EdgeScanner),
        BrowserFamily::Firefox => Box::new(FirefoxScanner),
    }
}

/// Total size of the regular files below `path`. Unreadable entries count
/// as zero.
pub(crate) fn bundle_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Produces inventory snapshots for a user.
///
/// Each family is scanned independently: a missing root, an unreadable root
/// or a corrupt extension in one family never hides anything in another.
#[derive(Debug, Clone)]
pub struct Enumerator {
    resolver: PathResolver,
    reader: ManifestReader,
    ignore: IgnoreConfig,
    families: Vec<BrowserFamily>,
}

impl Enumerator {
    pub fn new(resolver: PathResolver, reader: ManifestReader) -> Self {
        Self {
            resolver,
            reader,
            ignore: IgnoreConfig::default(),
            families: BrowserFamily::ALL.to_vec(),
        }
    }

    /// Builds an enumerator for the host platform from configuration.
    pub fn from_config(config: &Config) -> Self {
        let resolver = PathResolver::new()
            .with_profile(config.profile.clone())
            .with_overrides(config.roots.clone());

        Self::new(resolver, ManifestReader::new(config.placeholder_policy))
            .with_families(config.families.clone())
            .with_ignore(config.ignore.clone())
    }

    /// Restricts scanning to `families`.
    pub fn with_families(mut self, families: Vec<BrowserFamily>) -> Self {
        self.families = families;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreConfig) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn families(&self) -> &[BrowserFamily] {
        &self.families
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Scans every configured family, one after another.
    pub fn scan(&self, user: &UserContext) -> InventorySnapshot {
        let families = self
            .families
            .iter()
            .map(|&family| (family, self.scan_family(family, user)))
            .collect();

        InventorySnapshot::new(families)
    }

    /// Scans every configured family on its own blocking worker and joins
    /// the results into one snapshot.
    ///
    /// A family that does not finish within `timeout` is reported as
    /// [`FamilyError::TimedOut`]; the others are unaffected. The timed-out
    /// worker itself cannot be cancelled and keeps running until its
    /// filesystem call returns, so runtimes should be shut down with
    /// `shutdown_background` rather than dropped.
    pub async fn scan_concurrent(
        &self,
        user: &UserContext,
        timeout: Option<Duration>,
    ) -> InventorySnapshot {
        let tasks = self.families.iter().map(|&family| {
            let enumerator = self.clone();
            let user = user.clone();

            async move {
                let handle =
                    tokio::task::spawn_blocking(move || enumerator.scan_family(family, &user));

                let joined = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            warn!(%family, seconds = limit.as_secs(), "family scan timed out");
                            return (
                                family,
                                FamilyInventory::failed(FamilyError::TimedOut {
                                    seconds: limit.as_secs(),
                                }),
                            );
                        }
                    },
                    None => handle.await,
                };

                let inventory = joined.unwrap_or_else(|e| {
                    warn!(%family, error = %e, "family scan worker failed");
                    FamilyInventory::failed(FamilyError::WorkerFailed {
                        message: e.to_string(),
                    })
                });

                (family, inventory)
            }
        });

        let families = join_all(tasks).await.into_iter().collect();
        InventorySnapshot::new(families)
    }

    /// Scans a single family.
    pub fn scan_family(&self, family: BrowserFamily, user: &UserContext) -> FamilyInventory {
        let scanner = get_scanner(family);

        let roots = match self.resolver.resolve_roots(family, user) {
            RootResolution::Found(roots) => roots,
            RootResolution::NotFound(path) => {
                debug!(%family, path = %path.display(), "extensions directory not found");
                return FamilyInventory::failed(FamilyError::RootNotFound { path });
            }
            RootResolution::Unsupported => {
                debug!(%family, "no storage convention for this platform");
                return FamilyInventory::default();
            }
        };

        let mut inventory = FamilyInventory::default();

        for root in roots {
            debug!(scanner = scanner.name(), root = %root.display(), "scanning");

            match scanner.scan_root(&root, &self.reader) {
                Ok(found) => {
                    inventory
                        .records
                        .extend(found.records.into_iter().filter(|record| {
                            let ignored = self.ignore.should_ignore_extension(&record.extension_id);
                            if ignored {
                                debug!(%family, id = %record.extension_id, "ignored by configuration");
                            }
                            !ignored
                        }));
                    inventory.skipped.extend(found.skipped);
                }
                Err(e) => {
                    warn!(%family, error = %e, "failed to scan extensions root");
                    inventory.error = Some(e);
                }
            }
        }

        inventory
    }
}

impl Default for Enumerator {
    fn default() -> Self {
        Self::new(PathResolver::new(), ManifestReader::default())
    }
}
