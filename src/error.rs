//! Typed diagnostics for scanning, descriptor parsing and session misuse.
//!
//! Item- and family-level errors are values stored inside snapshots and
//! reports. Only [`SessionError`] is ever returned to a caller as an `Err`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionState;

/// Why a whole browser family produced no (or a partial) listing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FamilyError {
    #[error("extensions directory not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("failed to read {}: {message}", path.display())]
    RootUnreadable { path: PathBuf, message: String },

    #[error("scan timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("scan worker failed: {message}")]
    WorkerFailed { message: String },
}

/// Failure to obtain a descriptor for a single extension.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("no manifest.json found")]
    Missing,

    #[error("failed to parse manifest for {item}: {message}")]
    Malformed { item: String, message: String },

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
}

/// Orchestration misuse. These indicate a bug in the presentation layer,
/// not a problem with the scanned extensions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("operation not allowed while session is {0:?}")]
    InvalidState(SessionState),

    #[error("no extensions selected for deletion")]
    NothingSelected,
}
