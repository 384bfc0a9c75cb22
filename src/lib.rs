// ============================================================================
// RustMemKV Library
// ============================================================================
//
// In-memory transactional key-value engine with MVCC.
//
// Five isolation levels: Read Uncommitted, Read Committed, Repeatable Read,
// Snapshot and Serializable. Every write appends a version, every delete
// tombstones one; each transaction decides per version what it may see.
//
// ============================================================================

pub mod core;
pub mod storage;
pub mod result;
pub mod transaction;
pub mod facade;
pub mod connection;

// Re-export main types for convenience
pub use facade::{Database, DatabaseStats};
pub use core::{DbError, IsolationLevel, Result, TransactionConflict};
pub use result::{CommandOutput, NO_RECORD};
pub use transaction::{TransactionId, TransactionState};

// Re-export connection API
pub use connection::{
    Session,
    SessionState,
    command::Command,
    config::DatabaseConfig,
};

/// Create a database whose transactions default to `default_isolation_level`.
///
/// # Examples
///
/// ```
/// use rustmemkv::{create_database, IsolationLevel, NO_RECORD};
///
/// let db = create_database(IsolationLevel::ReadCommitted);
/// let mut writer = db.create_session();
/// let mut reader = db.create_session();
///
/// writer.begin().unwrap();
/// reader.begin().unwrap();
/// writer.set("x", "hey").unwrap();
/// assert_eq!(reader.get("x").unwrap(), NO_RECORD);
///
/// writer.commit().unwrap();
/// assert_eq!(reader.get("x").unwrap(), "hey");
/// ```
pub fn create_database(default_isolation_level: IsolationLevel) -> Database {
    Database::new(default_isolation_level)
}
