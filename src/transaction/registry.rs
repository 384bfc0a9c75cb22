use super::{Transaction, TransactionId, TransactionState};
use crate::core::IsolationLevel;
use std::collections::{BTreeMap, HashSet};

/// Every transaction ever begun, keyed by id.
///
/// Finished transactions stay registered: visibility decisions keep asking
/// whether the creator or deleter of a version committed.
#[derive(Debug)]
pub struct TransactionRegistry {
    transactions: BTreeMap<TransactionId, Transaction>,
    last_id: u64,
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self {
            transactions: BTreeMap::new(),
            last_id: TransactionId::INVALID.0,
        }
    }

    /// Allocate the next id and register it as in progress.
    ///
    /// The snapshot is taken before the new id is registered, so a
    /// transaction never appears in its own snapshot.
    pub fn begin(&mut self, isolation_level: IsolationLevel) -> TransactionId {
        self.last_id += 1;
        let id = TransactionId(self.last_id);
        let snapshot = self.in_progress();
        self.transactions
            .insert(id, Transaction::new(id, isolation_level, snapshot));
        id
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    pub fn get_mut(&mut self, id: TransactionId) -> Option<&mut Transaction> {
        self.transactions.get_mut(&id)
    }

    pub fn state_of(&self, id: TransactionId) -> Option<TransactionState> {
        self.transactions.get(&id).map(Transaction::state)
    }

    pub fn is_committed(&self, id: TransactionId) -> bool {
        self.state_of(id) == Some(TransactionState::Committed)
    }

    /// Ids currently in progress
    pub fn in_progress(&self) -> HashSet<TransactionId> {
        self.transactions
            .values()
            .filter(|txn| txn.state().is_active())
            .map(Transaction::id)
            .collect()
    }

    /// Transactions with id `>= id`, in id order
    pub fn begun_since(&self, id: TransactionId) -> impl Iterator<Item = &Transaction> {
        self.transactions.range(id..).map(|(_, txn)| txn)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn count_in(&self, state: TransactionState) -> usize {
        self.transactions
            .values()
            .filter(|txn| txn.state() == state)
            .count()
    }
}
