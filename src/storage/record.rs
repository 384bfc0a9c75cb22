use crate::transaction::TransactionId;
use serde::{Deserialize, Serialize};

/// One version of a key.
///
/// `creator` never changes. `deleter` is set when a transaction tombstones
/// the version; the record itself is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord {
    pub creator: TransactionId,
    pub deleter: Option<TransactionId>,
    pub payload: String,
}

impl VersionedRecord {
    pub fn new(creator: TransactionId, payload: impl Into<String>) -> Self {
        Self {
            creator,
            deleter: None,
            payload: payload.into(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleter.is_some()
    }

    pub fn is_deleted_by(&self, tx_id: TransactionId) -> bool {
        self.deleter == Some(tx_id)
    }
}
