use serde::{Deserialize, Serialize};

use super::ExtensionIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum DeletionResult {
    Deleted,
    NotFound,
    PermissionDenied,
    OtherFailure(String),
}

impl DeletionResult {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeletionResult::Deleted)
    }
}

impl std::fmt::Display for DeletionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletionResult::Deleted => write!(f, "deleted"),
            DeletionResult::NotFound => write!(f, "not found"),
            DeletionResult::PermissionDenied => write!(f, "permission denied"),
            DeletionResult::OtherFailure(detail) => write!(f, "failed: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub identity: ExtensionIdentity,
    /// Name from the snapshot, absent when the identity was stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub result: DeletionResult,
}

/// Outcomes of one deletion batch, in the order the identities were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub outcomes: Vec<DeletionOutcome>,
}

impl DeletionReport {
    pub fn deleted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_deleted()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_deleted())
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
