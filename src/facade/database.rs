use crate::connection::Session;
use crate::connection::config::DatabaseConfig;
use crate::core::{IsolationLevel, Result};
use crate::transaction::{ManagerStats, TransactionManager};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Database handle
///
/// Owns the versioned store and the transaction registry (through its
/// `TransactionManager`). Cloning is cheap and every clone refers to the
/// same database; independent databases never share state.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    name: String,
    default_isolation_level: RwLock<IsolationLevel>,
    transaction_manager: TransactionManager,
    next_session_id: AtomicU64,
}

impl Database {
    pub fn new(default_isolation_level: IsolationLevel) -> Self {
        Self::from_parts(DatabaseConfig::default().isolation_level(default_isolation_level))
    }

    pub fn with_config(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    pub fn from_url(url: &str) -> Result<Self> {
        Self::with_config(DatabaseConfig::from_url(url)?)
    }

    fn from_parts(config: DatabaseConfig) -> Self {
        debug!(db = %config.name, isolation = %config.default_isolation_level, "creating database");
        Self {
            inner: Arc::new(DatabaseInner {
                name: config.name,
                default_isolation_level: RwLock::new(config.default_isolation_level),
                transaction_manager: TransactionManager::new(),
                next_session_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn default_isolation_level(&self) -> Result<IsolationLevel> {
        Ok(*self.inner.default_isolation_level.read()?)
    }

    /// Applies to transactions begun after the call; running ones keep theirs.
    pub fn set_default_isolation_level(&self, level: IsolationLevel) -> Result<()> {
        *self.inner.default_isolation_level.write()? = level;
        debug!(db = %self.inner.name, isolation = %level, "default isolation level changed");
        Ok(())
    }

    pub fn create_session(&self) -> Session {
        let id = self.inner.next_session_id.fetch_add(1, Ordering::SeqCst);
        debug!(db = %self.inner.name, session = id, "new session");
        Session::new(id, self.clone())
    }

    /// Get reference to transaction manager
    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.inner.transaction_manager
    }

    pub fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            name: self.inner.name.clone(),
            default_isolation_level: self.default_isolation_level()?,
            sessions_opened: self.inner.next_session_id.load(Ordering::SeqCst) - 1,
            manager: self.inner.transaction_manager.stats()?,
        })
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::from_parts(DatabaseConfig::default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub name: String,
    pub default_isolation_level: IsolationLevel,
    pub sessions_opened: u64,
    #[serde(flatten)]
    pub manager: ManagerStats,
}
