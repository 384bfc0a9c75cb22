use thiserror::Error;

/// Commit-time validation failure.
///
/// The transaction has already been moved to `Aborted` by the time this is
/// reported; callers retry the logical transaction from scratch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionConflict {
    /// Snapshot: an overlapping committed transaction wrote a key we wrote.
    #[error("write-write conflict")]
    WriteWrite,

    /// Serializable: an overlapping committed transaction wrote a key we read,
    /// or read a key we wrote.
    #[error("read-write conflict")]
    ReadWrite,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("expect no running transaction")]
    TransactionAlreadyActive,

    #[error("transaction not begun")]
    NoActiveTransaction,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unsupported command: {0}")]
    UnknownCommand(String),

    #[error("Unknown isolation level: {0}")]
    InvalidIsolationLevel(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Conflict(#[from] TransactionConflict),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl DbError {
    /// True for commit-time conflicts, false for protocol faults.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;


impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
