// ============================================================================
// Isolation Policy
// ============================================================================
//
// Visibility: may transaction `tx` observe a given version of a key?
// Conflicts:  which overlapping transactions invalidate `tx` at commit?
//
// Both are pure functions of the transaction, the version and the registry.
//
// ============================================================================

use super::{Transaction, TransactionRegistry, TransactionState};
use crate::core::{IsolationLevel, TransactionConflict};
use crate::storage::VersionedRecord;
use std::collections::HashSet;

/// Decide whether `record` is observable by `tx`.
pub fn is_visible(tx: &Transaction, record: &VersionedRecord, registry: &TransactionRegistry) -> bool {
    match tx.isolation_level() {
        IsolationLevel::ReadUncommitted => read_uncommitted_visible(record),
        IsolationLevel::ReadCommitted => read_committed_visible(tx, record, registry),
        IsolationLevel::RepeatableRead | IsolationLevel::Snapshot | IsolationLevel::Serializable => {
            snapshot_visible(tx, record, registry)
        }
    }
}

// Any write is visible, committed or not. A delete, even uncommitted,
// hides the version from everyone.
fn read_uncommitted_visible(record: &VersionedRecord) -> bool {
    !record.is_deleted()
}

fn read_committed_visible(
    tx: &Transaction,
    record: &VersionedRecord,
    registry: &TransactionRegistry,
) -> bool {
    // someone else's uncommitted (or aborted) write
    if record.creator != tx.id() && !registry.is_committed(record.creator) {
        return false;
    }

    if record.is_deleted_by(tx.id()) {
        return false;
    }

    // committed delete by anyone; an uncommitted foreign delete does not hide it
    if let Some(deleter) = record.deleter
        && registry.is_committed(deleter)
    {
        return false;
    }

    true
}

fn snapshot_visible(tx: &Transaction, record: &VersionedRecord, registry: &TransactionRegistry) -> bool {
    if record.is_deleted_by(tx.id()) {
        return false;
    }

    // created after our snapshot point
    if record.creator > tx.id() {
        return false;
    }

    // creator was still undecided when we began
    if tx.in_snapshot(record.creator) {
        return false;
    }

    if record.creator != tx.id() && !registry.is_committed(record.creator) {
        return false;
    }

    // a delete that was already decided and committed before we began
    if let Some(deleter) = record.deleter
        && deleter < tx.id()
        && registry.is_committed(deleter)
        && !tx.in_snapshot(deleter)
    {
        return false;
    }

    true
}

/// Whether another transaction already holds the tombstone on `record`.
///
/// The first deleter keeps it until it aborts; a later delete of the same
/// version finds nothing to delete.
pub fn tombstone_taken(tx: &Transaction, record: &VersionedRecord, registry: &TransactionRegistry) -> bool {
    record.deleter.is_some_and(|deleter| {
        deleter != tx.id() && registry.state_of(deleter) != Some(TransactionState::Aborted)
    })
}

/// A key-set comparison between the committing transaction and one
/// overlapping transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCheck {
    /// Both wrote a common key
    WriteWrite,
    /// We read a key the other wrote
    ReadWrite,
    /// We wrote a key the other read
    WriteRead,
}

impl ConflictCheck {
    pub fn conflicts(&self, current: &Transaction, other: &Transaction) -> bool {
        match self {
            ConflictCheck::WriteWrite => shares_key(current.write_set(), other.write_set()),
            ConflictCheck::ReadWrite => shares_key(current.read_set(), other.write_set()),
            ConflictCheck::WriteRead => shares_key(current.write_set(), other.read_set()),
        }
    }
}

/// Checks run when a transaction at `level` commits, and the conflict
/// reported if any of them fires. `None` means commit never conflicts.
pub fn commit_validation(level: IsolationLevel) -> Option<(&'static [ConflictCheck], TransactionConflict)> {
    match level {
        IsolationLevel::Snapshot => Some((&[ConflictCheck::WriteWrite], TransactionConflict::WriteWrite)),
        IsolationLevel::Serializable => Some((
            &[ConflictCheck::ReadWrite, ConflictCheck::WriteRead],
            TransactionConflict::ReadWrite,
        )),
        IsolationLevel::ReadUncommitted
        | IsolationLevel::ReadCommitted
        | IsolationLevel::RepeatableRead => None,
    }
}

/// Whether `other` overlaps `tx` for conflict purposes: committed, and either
/// in progress when `tx` began or begun at/after `tx`.
pub fn overlaps(tx: &Transaction, other: &Transaction) -> bool {
    other.state() == TransactionState::Committed
        && (tx.in_snapshot(other.id()) || other.id() >= tx.id())
}

pub fn shares_key(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|key| large.contains(key))
}
