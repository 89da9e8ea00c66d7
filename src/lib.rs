pub mod config;
pub mod deletion;
pub mod error;
pub mod manifest;
pub mod model;
pub mod output;
pub mod platform;
pub mod scanner;
pub mod selection;
pub mod session;

pub use config::Config;
pub use deletion::DeletionEngine;
pub use error::{DescriptorError, FamilyError, SessionError};
pub use manifest::{ManifestReader, PlaceholderPolicy};
pub use model::{
    BrowserFamily, DeletionReport, DeletionResult, ExtensionIdentity, ExtensionKind,
    ExtensionRecord, InventorySnapshot, ParseStatus, Platform,
};
pub use platform::{PathResolver, UserContext};
pub use scanner::Enumerator;
pub use selection::SelectionSet;
pub use session::{Confirmation, InventorySession, ScanMode, SessionState};
