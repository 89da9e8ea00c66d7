//! The user's current selection over one inventory snapshot.

use std::collections::HashSet;

use crate::model::{ExtensionIdentity, InventorySnapshot};

/// An ordered set of identities, restricted to those present in the
/// snapshot it was created for.
///
/// Requests for identities outside that snapshot are ignored rather than
/// rejected, so a presentation layer can forward clicks without checking.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    known: HashSet<ExtensionIdentity>,
    members: Vec<ExtensionIdentity>,
}

impl SelectionSet {
    /// An empty selection over every record in `snapshot`.
    pub fn scoped_to(snapshot: &InventorySnapshot) -> Self {
        Self {
            known: snapshot.records().map(|r| r.identity.clone()).collect(),
            members: Vec::new(),
        }
    }

    /// Adds `id`. Returns `false` if it was already selected or is not part
    /// of the snapshot.
    pub fn add(&mut self, id: &ExtensionIdentity) -> bool {
        if !self.known.contains(id) || self.contains(id) {
            return false;
        }
        self.members.push(id.clone());
        true
    }

    /// Removes `id`. Returns `false` if it was not selected.
    pub fn remove(&mut self, id: &ExtensionIdentity) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        self.members.len() != before
    }

    /// Flips `id`. Returns `false` only when `id` is not part of the snapshot.
    pub fn toggle(&mut self, id: &ExtensionIdentity) -> bool {
        self.remove(id) || self.add(id)
    }

    pub fn contains(&self, id: &ExtensionIdentity) -> bool {
        self.members.contains(id)
    }

    /// Selected identities in the order they were added.
    pub fn members(&self) -> &[ExtensionIdentity] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
