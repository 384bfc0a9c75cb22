// ============================================================================
// Transaction Manager
// ============================================================================

use super::isolation::{self, ConflictCheck};
use super::{Transaction, TransactionId, TransactionRegistry, TransactionState};
use crate::core::{DbError, IsolationLevel, Result};
use crate::storage::VersionedStore;
use serde::Serialize;
use std::sync::RwLock;
use tracing::{debug, trace, warn};

/// Sole mutator of stored versions and transaction state.
///
/// Locks are always taken registry first, then store.
pub struct TransactionManager {
    registry: RwLock<TransactionRegistry>,
    store: RwLock<VersionedStore>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(TransactionRegistry::new()),
            store: RwLock::new(VersionedStore::new()),
        }
    }

    pub fn begin(&self, isolation_level: IsolationLevel) -> Result<TransactionId> {
        let mut registry = self.registry.write()?;
        let id = registry.begin(isolation_level);
        debug!(txn = %id, isolation = %isolation_level, "new transaction");
        Ok(id)
    }

    /// Fails unless `id` names a registered transaction that is still in progress.
    pub fn validate_active(&self, id: Option<TransactionId>) -> Result<()> {
        let registry = self.registry.read()?;
        Self::active_in(&registry, id).map(|_| ())
    }

    /// Commit or abort.
    ///
    /// Committing a Snapshot or Serializable transaction first validates it
    /// against every overlapping committed transaction. On conflict the
    /// transaction is aborted and the conflict returned as the error.
    pub fn complete(&self, id: TransactionId, target: TransactionState) -> Result<()> {
        let mut registry = self.registry.write()?;
        let tx = Self::active_in(&registry, Some(id))?;
        debug!(txn = %id, target = %target, "completing transaction");

        if target == TransactionState::Committed
            && let Some((checks, conflict)) = isolation::commit_validation(tx.isolation_level())
            && checks.iter().any(|check| Self::has_overlap(&registry, tx, *check))
        {
            warn!(txn = %id, %conflict, "aborting transaction on commit");
            Self::transition(&mut registry, id, TransactionState::Aborted)?;
            return Err(conflict.into());
        }

        Self::transition(&mut registry, id, target)
    }

    pub fn record_read(&self, id: TransactionId, key: &str) -> Result<()> {
        let mut registry = self.registry.write()?;
        Self::active_mut(&mut registry, id)?.record_read(key)
    }

    pub fn record_write(&self, id: TransactionId, key: &str) -> Result<()> {
        let mut registry = self.registry.write()?;
        Self::active_mut(&mut registry, id)?.record_write(key)
    }

    /// Append a new version of `key` created by `id`.
    pub fn upsert(&self, id: TransactionId, key: &str, value: &str) -> Result<()> {
        let registry = self.registry.read()?;
        Self::active_in(&registry, Some(id))?;

        let mut store = self.store.write()?;
        store.append(key, id, value);
        trace!(txn = %id, key, "appended version");
        Ok(())
    }

    /// Payload of the version of `key` that `id` can see, if any.
    pub fn get_visible(&self, id: TransactionId, key: &str) -> Result<Option<String>> {
        let registry = self.registry.read()?;
        let tx = Self::active_in(&registry, Some(id))?;

        let store = self.store.read()?;
        Ok(store
            .latest_visible(key, |record| isolation::is_visible(tx, record, &registry))
            .map(|record| record.payload.clone()))
    }

    /// Tombstone every version of `key` visible to `id`.
    ///
    /// Versions already tombstoned by another live transaction are skipped,
    /// so the first deleter wins. Returns whether any version was tombstoned.
    pub fn tombstone_visible(&self, id: TransactionId, key: &str) -> Result<bool> {
        let registry = self.registry.read()?;
        let tx = Self::active_in(&registry, Some(id))?;

        let mut store = self.store.write()?;
        let tombstoned = store.tombstone(key, id, |record| {
            isolation::is_visible(tx, record, &registry)
                && !isolation::tombstone_taken(tx, record, &registry)
        });
        trace!(txn = %id, key, tombstoned, "tombstone visible versions");
        Ok(tombstoned)
    }

    pub fn transaction_info(&self, id: TransactionId) -> Result<Option<TransactionInfo>> {
        let registry = self.registry.read()?;
        Ok(registry.get(id).map(TransactionInfo::from))
    }

    pub fn stats(&self) -> Result<ManagerStats> {
        let registry = self.registry.read()?;
        let store = self.store.read()?;
        Ok(ManagerStats {
            transactions: registry.len(),
            in_progress: registry.count_in(TransactionState::InProgress),
            committed: registry.count_in(TransactionState::Committed),
            aborted: registry.count_in(TransactionState::Aborted),
            keys: store.key_count(),
            versions: store.version_count(),
        })
    }

    // Committed transactions that were in progress when `tx` began or began
    // at/after it, checked with `check`.
    fn has_overlap(registry: &TransactionRegistry, tx: &Transaction, check: ConflictCheck) -> bool {
        let in_snapshot = tx.snapshot().iter().filter_map(|id| registry.get(*id));
        let begun_since = registry.begun_since(tx.id());

        in_snapshot
            .chain(begun_since)
            .filter(|other| isolation::overlaps(tx, other))
            .any(|other| check.conflicts(tx, other))
    }

    fn transition(
        registry: &mut TransactionRegistry,
        id: TransactionId,
        target: TransactionState,
    ) -> Result<()> {
        Self::active_mut(registry, id)?.transition(target)
    }

    fn active_in(registry: &TransactionRegistry, id: Option<TransactionId>) -> Result<&Transaction> {
        let id = id.ok_or(DbError::NoActiveTransaction)?;
        if !id.is_valid() {
            return Err(DbError::InvalidTransaction("invalid transaction id".into()));
        }

        let tx = registry.get(id).ok_or_else(|| {
            DbError::InvalidTransaction(format!("transaction {} does not exist", id))
        })?;

        if !tx.state().is_active() {
            return Err(DbError::InvalidTransaction(format!(
                "transaction {} is {}",
                id,
                tx.state()
            )));
        }
        Ok(tx)
    }

    fn active_mut(registry: &mut TransactionRegistry, id: TransactionId) -> Result<&mut Transaction> {
        Self::active_in(registry, Some(id))?;
        registry
            .get_mut(id)
            .ok_or_else(|| DbError::InvalidTransaction(format!("transaction {} does not exist", id)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    pub id: TransactionId,
    pub isolation_level: IsolationLevel,
    pub state: TransactionState,
    pub snapshot_size: usize,
    pub reads: usize,
    pub writes: usize,
    pub duration: std::time::Duration,
}

impl From<&Transaction> for TransactionInfo {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id(),
            isolation_level: txn.isolation_level(),
            state: txn.state(),
            snapshot_size: txn.snapshot().len(),
            reads: txn.read_set().len(),
            writes: txn.write_set().len(),
            duration: txn.duration(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub transactions: usize,
    pub in_progress: usize,
    pub committed: usize,
    pub aborted: usize,
    pub keys: usize,
    pub versions: usize,
}
