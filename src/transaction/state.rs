// ============================================================================
// Transaction State Management
// ============================================================================
//
// Each transaction moves through defined states: InProgress -> Committed/Aborted
//
// A transaction remembers which transactions were still in progress when it
// began (its snapshot). Snapshot-based isolation levels treat those as
// undecided for the whole lifetime of the transaction.
//
// ============================================================================

use crate::core::{DbError, IsolationLevel, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for a transaction
///
/// Ids are allocated by the owning `TransactionManager`, strictly increasing
/// and never reused. `0` is reserved as "no transaction".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub const INVALID: TransactionId = TransactionId(0);

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        *self > Self::INVALID
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Transaction state
///
/// State transitions:
/// ```text
/// InProgress ──commit──> Committed
///   │
///   └──abort──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    InProgress,
    Committed,
    Aborted,
}

impl TransactionState {
    /// Check if transaction can execute operations
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::InProgress)
    }

    /// Check if transaction is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::InProgress => write!(f, "IN PROGRESS"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::Aborted => write!(f, "ABORTED"),
        }
    }
}

/// A transaction record as kept by the registry.
///
/// Sessions never hold this directly; they refer to it by id and let the
/// `TransactionManager` mutate it.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,

    isolation_level: IsolationLevel,

    state: TransactionState,

    /// Ids that were in progress at the instant this transaction began
    snapshot: HashSet<TransactionId>,

    read_set: HashSet<String>,

    write_set: HashSet<String>,

    /// Start time for diagnostics
    start_time: std::time::Instant,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        isolation_level: IsolationLevel,
        snapshot: HashSet<TransactionId>,
    ) -> Self {
        Self {
            id,
            isolation_level,
            state: TransactionState::InProgress,
            snapshot,
            read_set: HashSet::new(),
            write_set: HashSet::new(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn snapshot(&self) -> &HashSet<TransactionId> {
        &self.snapshot
    }

    /// Was `other` still in progress when this transaction began?
    pub fn in_snapshot(&self, other: TransactionId) -> bool {
        self.snapshot.contains(&other)
    }

    pub fn read_set(&self) -> &HashSet<String> {
        &self.read_set
    }

    pub fn write_set(&self) -> &HashSet<String> {
        &self.write_set
    }

    /// Get transaction duration
    pub fn duration(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn record_read(&mut self, key: &str) -> Result<()> {
        self.ensure_active("record read")?;
        self.read_set.insert(key.to_string());
        Ok(())
    }

    pub fn record_write(&mut self, key: &str) -> Result<()> {
        self.ensure_active("record write")?;
        self.write_set.insert(key.to_string());
        Ok(())
    }

    /// Move to a terminal state
    ///
    /// # Errors
    /// Returns error if transaction is not in progress or `target` is not terminal
    pub fn transition(&mut self, target: TransactionState) -> Result<()> {
        if !target.is_terminal() {
            return Err(DbError::InvalidTransaction(format!(
                "cannot move transaction {} back to {}",
                self.id, target
            )));
        }
        self.ensure_active("complete")?;
        self.state = target;
        Ok(())
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        if !self.state.is_active() {
            return Err(DbError::InvalidTransaction(format!(
                "Cannot {}: transaction {} is {}",
                action, self.id, self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_txn(id: u64) -> Transaction {
        Transaction::new(TransactionId(id), IsolationLevel::Snapshot, HashSet::new())
    }

    #[test]
    fn test_transaction_id_validity() {
        assert!(!TransactionId::INVALID.is_valid());
        assert!(TransactionId(1).is_valid());
        assert!(TransactionId(2) > TransactionId(1));
        assert_eq!(TransactionId(7).to_string(), "txn_7");
    }

    #[test]
    fn test_transaction_lifecycle() {
        let mut txn = new_txn(1);

        assert_eq!(txn.state(), TransactionState::InProgress);
        assert!(txn.state().is_active());
        assert!(!txn.state().is_terminal());

        txn.transition(TransactionState::Committed).unwrap();
        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(txn.state().is_terminal());
    }

    #[test]
    fn test_cannot_complete_twice() {
        let mut txn = new_txn(1);

        txn.transition(TransactionState::Aborted).unwrap();
        assert!(txn.transition(TransactionState::Committed).is_err());
        assert_eq!(txn.state(), TransactionState::Aborted);
    }

    #[test]
    fn test_cannot_transition_to_in_progress() {
        let mut txn = new_txn(1);
        assert!(txn.transition(TransactionState::InProgress).is_err());
    }

    #[test]
    fn test_key_sets_collapse_duplicates() {
        let mut txn = new_txn(1);
        txn.record_read("x").unwrap();
        txn.record_read("x").unwrap();
        txn.record_write("y").unwrap();

        assert_eq!(txn.read_set().len(), 1);
        assert!(txn.write_set().contains("y"));
    }

    #[test]
    fn test_cannot_record_after_commit() {
        let mut txn = new_txn(1);
        txn.transition(TransactionState::Committed).unwrap();

        assert!(txn.record_write("x").is_err());
        assert!(txn.record_read("x").is_err());
    }
}
