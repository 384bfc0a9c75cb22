use super::VersionedRecord;
use crate::transaction::TransactionId;
use std::collections::HashMap;

/// Key -> version list, in creation order.
///
/// Versions are only ever appended or tombstoned, so the history of a key
/// is never truncated.
#[derive(Debug, Default)]
pub struct VersionedStore {
    keys: HashMap<String, Vec<VersionedRecord>>,
}

impl VersionedStore {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Append a new version created by `creator`
    pub fn append(&mut self, key: &str, creator: TransactionId, payload: impl Into<String>) {
        self.keys
            .entry(key.to_string())
            .or_default()
            .push(VersionedRecord::new(creator, payload));
    }

    /// Newest version of `key` accepted by `visible`
    pub fn latest_visible<F>(&self, key: &str, visible: F) -> Option<&VersionedRecord>
    where
        F: Fn(&VersionedRecord) -> bool,
    {
        self.keys
            .get(key)?
            .iter()
            .rev()
            .find(|&record| visible(record))
    }

    /// Set `deleter` on every version of `key` accepted by `visible`.
    ///
    /// Returns whether anything was tombstoned.
    pub fn tombstone<F>(&mut self, key: &str, deleter: TransactionId, visible: F) -> bool
    where
        F: Fn(&VersionedRecord) -> bool,
    {
        let Some(versions) = self.keys.get_mut(key) else {
            return false;
        };

        let mut tombstoned = false;
        for record in versions.iter_mut() {
            if visible(&*record) {
                record.deleter = Some(deleter);
                tombstoned = true;
            }
        }
        tombstoned
    }

    /// All versions of `key`, oldest first
    pub fn versions(&self, key: &str) -> &[VersionedRecord] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn version_count(&self) -> usize {
        self.keys.values().map(Vec::len).sum()
    }
}
