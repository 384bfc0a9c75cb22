// ============================================================================
// Transaction Management Module
// ============================================================================
//
// MVCC (Multi-Version Concurrency Control) over the versioned store:
// - Registry: every transaction ever begun, with its snapshot and key sets
// - Isolation: per-level visibility rules and commit-time conflict checks
// - Manager: the only place that mutates versions or transaction state
//
// ============================================================================

pub mod isolation;
pub mod manager;
pub mod registry;
pub mod state;

pub use isolation::ConflictCheck;
pub use manager::{ManagerStats, TransactionInfo, TransactionManager};
pub use registry::TransactionRegistry;
pub use state::{Transaction, TransactionId, TransactionState};
