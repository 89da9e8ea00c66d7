//! Scan → select → confirm → delete → rescan orchestration.
//!
//! [`InventorySession`] is the only way the presentation layer reaches the
//! engine. Deletion can only be entered from [`SessionState::Confirming`]
//! with an explicit [`Confirmation::Approve`], and every scan or deletion
//! replaces the snapshot and empties the selection.

use std::time::Duration;
use tracing::{debug, info};

use crate::deletion::DeletionEngine;
use crate::error::SessionError;
use crate::model::{DeletionReport, ExtensionIdentity, ExtensionRecord, InventorySnapshot};
use crate::platform::UserContext;
use crate::scanner::Enumerator;
use crate::selection::SelectionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    Ready,
    Confirming,
    Deleting,
}

/// How the last scan was run. Rescans after a deletion, or through
/// [`InventorySession::rescan`], repeat it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
    #[default]
    Sequential,
    /// Families on blocking workers, each with an optional time limit.
    Concurrent(Option<Duration>),
}

/// The operator's answer to a pending deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Approve,
    Decline,
}

pub struct InventorySession {
    enumerator: Enumerator,
    engine: DeletionEngine,
    user: UserContext,
    state: SessionState,
    scan_mode: ScanMode,
    snapshot: InventorySnapshot,
    selection: SelectionSet,
    last_report: Option<DeletionReport>,
}

impl InventorySession {
    pub fn new(enumerator: Enumerator, user: UserContext) -> Self {
        Self {
            enumerator,
            engine: DeletionEngine::new(),
            user,
            state: SessionState::Idle,
            scan_mode: ScanMode::Sequential,
            snapshot: InventorySnapshot::empty(),
            selection: SelectionSet::default(),
            last_report: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> &UserContext {
        &self.user
    }

    pub fn scan_mode(&self) -> ScanMode {
        self.scan_mode
    }

    /// The current snapshot. Empty until the first scan.
    pub fn snapshot(&self) -> &InventorySnapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn last_report(&self) -> Option<&DeletionReport> {
        self.last_report.as_ref()
    }

    /// Scans all families and replaces the snapshot.
    ///
    /// Allowed from any state; a pending confirmation is abandoned.
    pub fn scan(&mut self) -> &InventorySnapshot {
        self.scan_mode = ScanMode::Sequential;
        self.scan_blocking()
    }

    /// Like [`scan`](Self::scan), with families scanned concurrently.
    pub async fn scan_concurrent(&mut self, timeout: Option<Duration>) -> &InventorySnapshot {
        self.scan_mode = ScanMode::Concurrent(timeout);
        self.begin_scan();
        let snapshot = self.enumerator.scan_concurrent(&self.user, timeout).await;
        self.finish_scan(snapshot)
    }

    /// Scans again the same way as the last scan.
    pub async fn rescan(&mut self) -> &InventorySnapshot {
        match self.scan_mode {
            ScanMode::Sequential => self.scan(),
            ScanMode::Concurrent(timeout) => self.scan_concurrent(timeout).await,
        }
    }

    /// Selects `id`. Returns whether the selection changed; identities not in
    /// the snapshot, or calls outside [`SessionState::Ready`], change nothing.
    pub fn select(&mut self, id: &ExtensionIdentity) -> bool {
        self.state == SessionState::Ready && self.selection.add(id)
    }

    pub fn deselect(&mut self, id: &ExtensionIdentity) -> bool {
        self.state == SessionState::Ready && self.selection.remove(id)
    }

    pub fn toggle(&mut self, id: &ExtensionIdentity) -> bool {
        self.state == SessionState::Ready && self.selection.toggle(id)
    }

    /// Selects every record in the snapshot.
    pub fn select_all(&mut self) -> usize {
        if self.state != SessionState::Ready {
            return 0;
        }
        let ids: Vec<_> = self.snapshot.records().map(|r| r.identity.clone()).collect();
        ids.iter().filter(|id| self.selection.add(id)).count()
    }

    pub fn clear_selection(&mut self) {
        if self.state == SessionState::Ready {
            self.selection.clear();
        }
    }

    /// Freezes the selection and waits for [`confirm`](Self::confirm).
    ///
    /// Returns the records that would be deleted, in selection order.
    pub fn request_deletion(&mut self) -> Result<Vec<ExtensionRecord>, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::InvalidState(self.state));
        }
        if self.selection.is_empty() {
            return Err(SessionError::NothingSelected);
        }

        self.state = SessionState::Confirming;
        debug!(count = self.selection.len(), "awaiting confirmation");

        Ok(self.pending())
    }

    /// Records that are awaiting confirmation. Empty outside
    /// [`SessionState::Confirming`].
    pub fn pending(&self) -> Vec<ExtensionRecord> {
        if self.state != SessionState::Confirming {
            return Vec::new();
        }
        self.selection
            .members()
            .iter()
            .filter_map(|id| self.snapshot.find(id).cloned())
            .collect()
    }

    /// Resolves a pending deletion.
    ///
    /// Declining returns to [`SessionState::Ready`] with the selection
    /// intact. Approving deletes every selected item, re-scans, and returns
    /// the report; the new snapshot starts with an empty selection.
    ///
    /// The re-scan is always sequential. Use
    /// [`confirm_async`](Self::confirm_async) to repeat a concurrent scan.
    pub fn confirm(
        &mut self,
        confirmation: Confirmation,
    ) -> Result<Option<DeletionReport>, SessionError> {
        let report = self.resolve(confirmation)?;
        if report.is_some() {
            self.scan_blocking();
        }
        Ok(self.record_report(report))
    }

    /// Like [`confirm`](Self::confirm), re-scanning in the current
    /// [`ScanMode`].
    pub async fn confirm_async(
        &mut self,
        confirmation: Confirmation,
    ) -> Result<Option<DeletionReport>, SessionError> {
        let report = self.resolve(confirmation)?;
        if report.is_some() {
            self.rescan().await;
        }
        Ok(self.record_report(report))
    }

    /// Applies the confirmation without re-scanning.
    fn resolve(
        &mut self,
        confirmation: Confirmation,
    ) -> Result<Option<DeletionReport>, SessionError> {
        if self.state != SessionState::Confirming {
            return Err(SessionError::InvalidState(self.state));
        }

        match confirmation {
            Confirmation::Decline => {
                debug!("deletion declined");
                self.state = SessionState::Ready;
                Ok(None)
            }
            Confirmation::Approve => {
                self.state = SessionState::Deleting;
                let report = self.engine.delete(self.selection.members(), &self.snapshot);
                info!(
                    requested = report.len(),
                    deleted = report.deleted(),
                    "deletion batch finished"
                );
                Ok(Some(report))
            }
        }
    }

    fn record_report(&mut self, report: Option<DeletionReport>) -> Option<DeletionReport> {
        if let Some(report) = &report {
            self.last_report = Some(report.clone());
        }
        report
    }

    fn scan_blocking(&mut self) -> &InventorySnapshot {
        self.begin_scan();
        let snapshot = self.enumerator.scan(&self.user);
        self.finish_scan(snapshot)
    }

    fn begin_scan(&mut self) {
        self.state = SessionState::Scanning;
        self.selection.clear();
    }

    fn finish_scan(&mut self, snapshot: InventorySnapshot) -> &InventorySnapshot {
        debug!(records = snapshot.len(), "scan finished");
        self.selection = SelectionSet::scoped_to(&snapshot);
        self.snapshot = snapshot;
        self.state = SessionState::Ready;
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestReader;
    use crate::model::{BrowserFamily, DeletionResult, Platform};
    use crate::platform::PathResolver;
    use std::fs;
    use std::path::Path;

    fn install(home: &Path, id: &str, name: &str) {
        let dir = home
            .join(".config")
            .join("google-chrome")
            .join("Default")
            .join("Extensions")
            .join(id)
            .join("1.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("manifest.json"),
            format!(r#"{{"name":"{}"}}"#, name),
        )
        .unwrap();
    }

    fn session(home: &Path) -> InventorySession {
        let enumerator = Enumerator::new(
            PathResolver::for_platform(Some(Platform::Linux)),
            ManifestReader::default(),
        );
        InventorySession::new(enumerator, UserContext::new("alice", home))
    }

    fn identity_of(session: &InventorySession, id: &str) -> ExtensionIdentity {
        session
            .snapshot()
            .records()
            .find(|r| r.extension_id == id)
            .unwrap()
            .identity
            .clone()
    }

    #[test]
    fn test_starts_idle_and_ignores_selection() {
        let home = tempfile::tempdir().unwrap();
        let mut session = session(home.path());

        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.select(&ExtensionIdentity::new(BrowserFamily::Chrome, "/x")));
        assert_eq!(
            session.request_deletion(),
            Err(SessionError::InvalidState(SessionState::Idle))
        );
    }

    #[test]
    fn test_scan_enters_ready() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());

        assert_eq!(session.scan().len(), 1);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_rescan_clears_selection() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());
        session.scan();

        let id = identity_of(&session, "abcd");
        assert!(session.select(&id));
        session.scan();

        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_nothing_selected() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());
        session.scan();

        assert_eq!(session.request_deletion(), Err(SessionError::NothingSelected));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_confirm_requires_confirming_state() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());
        session.scan();
        let id = identity_of(&session, "abcd");
        session.select(&id);

        assert_eq!(
            session.confirm(Confirmation::Approve),
            Err(SessionError::InvalidState(SessionState::Ready))
        );
        assert!(id.path.exists());
    }

    #[test]
    fn test_decline_keeps_everything() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());
        session.scan();
        let id = identity_of(&session, "abcd");
        session.select(&id);

        let pending = session.request_deletion().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(session.state(), SessionState::Confirming);
        // frozen while confirming
        assert!(!session.deselect(&id));

        assert_eq!(session.confirm(Confirmation::Decline), Ok(None));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.selection().contains(&id));
        assert!(id.path.exists());
    }

    #[test]
    fn test_approve_deletes_and_rescans() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        install(home.path(), "efgh", "Password Helper");
        let mut session = session(home.path());
        session.scan();
        let id = identity_of(&session, "abcd");
        session.select(&id);
        session.request_deletion().unwrap();

        let report = session.confirm(Confirmation::Approve).unwrap().unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].result, DeletionResult::Deleted);
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.selection().is_empty());
        assert!(!session.snapshot().contains(&id));
        assert_eq!(session.snapshot().len(), 1);
        assert_eq!(session.last_report(), Some(&report));
    }

    #[test]
    fn test_select_all() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "One");
        install(home.path(), "efgh", "Two");
        let mut session = session(home.path());
        session.scan();

        assert_eq!(session.select_all(), 2);
        assert_eq!(session.select_all(), 0);
        session.clear_selection();
        assert!(session.selection().is_empty());
    }

    #[tokio::test]
    async fn test_async_confirm_repeats_concurrent_scan() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        install(home.path(), "efgh", "Password Helper");
        let mut session = session(home.path());
        let limit = Some(Duration::from_secs(5));

        session.scan_concurrent(limit).await;
        assert_eq!(session.scan_mode(), ScanMode::Concurrent(limit));

        let id = identity_of(&session, "abcd");
        session.select(&id);
        session.request_deletion().unwrap();
        let report = session
            .confirm_async(Confirmation::Approve)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.deleted(), 1);
        assert_eq!(session.scan_mode(), ScanMode::Concurrent(limit));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.snapshot().len(), 1);
        assert_eq!(session.last_report(), Some(&report));
    }

    #[tokio::test]
    async fn test_rescan_keeps_mode() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());

        session.scan();
        assert_eq!(session.scan_mode(), ScanMode::Sequential);
        session.scan_concurrent(None).await;
        install(home.path(), "efgh", "Password Helper");

        assert_eq!(session.rescan().await.len(), 2);
        assert_eq!(session.scan_mode(), ScanMode::Concurrent(None));
    }

    #[test]
    fn test_sync_confirm_does_not_change_mode() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());
        session.scan();
        session.select_all();
        session.request_deletion().unwrap();

        session.confirm(Confirmation::Approve).unwrap();
        assert_eq!(session.scan_mode(), ScanMode::Sequential);
        assert!(session.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_scan_enters_ready() {
        let home = tempfile::tempdir().unwrap();
        install(home.path(), "abcd", "Ad Blocker");
        let mut session = session(home.path());

        let count = session.scan_concurrent(None).await.len();
        assert_eq!(count, 1);
        assert_eq!(session.state(), SessionState::Ready);
    }
}
