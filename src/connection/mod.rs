pub mod command;
pub mod config;

use crate::core::{DbError, IsolationLevel, Result};
use crate::facade::Database;
use crate::result::CommandOutput;
use crate::transaction::{TransactionId, TransactionManager, TransactionState};
use command::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InTransaction,
}

/// Session handle
///
/// A per-connection command dispatcher bound to one database. Holds at most
/// one active transaction, by id; all state changes go through the
/// database's `TransactionManager`.
///
/// ```text
/// Idle ──begin──> InTransaction ──commit|abort──> Idle
/// ```
pub struct Session {
    /// Unique session ID within its database
    id: u64,
    db: Database,
    /// Active transaction ID (if any)
    transaction_id: Option<TransactionId>,
}

impl Session {
    pub(crate) fn new(id: u64, db: Database) -> Self {
        Self {
            id,
            db,
            transaction_id: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        match self.transaction_id {
            Some(_) => SessionState::InTransaction,
            None => SessionState::Idle,
        }
    }

    pub fn is_in_transaction(&self) -> bool {
        self.state() == SessionState::InTransaction
    }

    /// Id of the attached transaction, if any
    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    /// Execute one command.
    ///
    /// Protocol misuse comes back as `Err`. A commit conflict is an ordinary
    /// `CommandOutput::Conflict`; the session is idle afterwards either way.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutput> {
        debug!(session = self.id, %command, "executing command");
        match command {
            Command::Begin => {
                let level = self.db.default_isolation_level()?;
                self.begin_transaction(level)?;
                Ok(CommandOutput::Done)
            }
            Command::Commit => {
                let id = self.active()?;
                let outcome = self.manager().complete(id, TransactionState::Committed);
                match outcome {
                    Ok(()) => {
                        self.transaction_id = None;
                        Ok(CommandOutput::Done)
                    }
                    Err(DbError::Conflict(conflict)) => {
                        self.transaction_id = None;
                        Ok(CommandOutput::Conflict(conflict))
                    }
                    Err(err) => Err(self.fault(err)),
                }
            }
            Command::Abort => {
                let id = self.active()?;
                let outcome = self.manager().complete(id, TransactionState::Aborted);
                self.guard(outcome)?;
                self.transaction_id = None;
                Ok(CommandOutput::Done)
            }
            Command::Get { key } => {
                let id = self.active()?;
                let outcome = self.manager().record_read(id, &key);
                self.guard(outcome)?;
                let outcome = self.manager().get_visible(id, &key);
                Ok(match self.guard(outcome)? {
                    Some(value) => CommandOutput::Value(value),
                    None => CommandOutput::NoRecord,
                })
            }
            Command::Set { key, value } => {
                let id = self.active()?;
                let outcome = self.manager().record_write(id, &key);
                self.guard(outcome)?;
                let outcome = self.manager().upsert(id, &key, &value);
                self.guard(outcome)?;
                Ok(CommandOutput::Done)
            }
            Command::Delete { key } => {
                let id = self.active()?;
                let outcome = self.manager().tombstone_visible(id, &key);
                if !self.guard(outcome)? {
                    return Ok(CommandOutput::NoRecord);
                }
                let outcome = self.manager().record_write(id, &key);
                self.guard(outcome)?;
                Ok(CommandOutput::Done)
            }
        }
    }

    /// Parse and execute a text command such as `set x hey`.
    pub fn execute_line(&mut self, line: &str) -> Result<CommandOutput> {
        let command = Command::parse(line)?;
        self.execute(command)
    }

    /// Begin a transaction at the database's default isolation level.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustmemkv::{Database, IsolationLevel};
    ///
    /// let db = Database::new(IsolationLevel::ReadCommitted);
    /// let mut session = db.create_session();
    /// session.begin().unwrap();
    /// session.set("x", "hey").unwrap();
    /// assert_eq!(session.get("x").unwrap(), "hey");
    /// assert_eq!(session.commit().unwrap(), "");
    /// ```
    pub fn begin(&mut self) -> Result<()> {
        self.execute(Command::Begin).map(|_| ())
    }

    /// Begin a transaction at an explicit isolation level.
    pub fn begin_with(&mut self, level: IsolationLevel) -> Result<()> {
        debug!(session = self.id, isolation = %level, "executing command: begin");
        self.begin_transaction(level)
    }

    /// Commit; returns `""` on success or the conflict message.
    pub fn commit(&mut self) -> Result<String> {
        self.execute(Command::Commit).map(CommandOutput::into_message)
    }

    pub fn abort(&mut self) -> Result<()> {
        self.execute(Command::Abort).map(|_| ())
    }

    /// Returns the visible value or the `"update 0"` marker.
    pub fn get(&mut self, key: &str) -> Result<String> {
        self.execute(Command::get(key)).map(CommandOutput::into_message)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.execute(Command::set(key, value)).map(|_| ())
    }

    /// Returns `""` when something was deleted, `"update 0"` otherwise.
    pub fn delete(&mut self, key: &str) -> Result<String> {
        self.execute(Command::delete(key)).map(CommandOutput::into_message)
    }

    fn begin_transaction(&mut self, level: IsolationLevel) -> Result<()> {
        if self.transaction_id.is_some() {
            return Err(DbError::TransactionAlreadyActive);
        }

        let id = self.manager().begin(level)?;
        self.manager().validate_active(Some(id))?;
        self.transaction_id = Some(id);
        Ok(())
    }

    fn manager(&self) -> &TransactionManager {
        self.db.transaction_manager()
    }

    fn active(&mut self) -> Result<TransactionId> {
        let id = self.transaction_id;
        let outcome = self.manager().validate_active(id);
        self.guard(outcome)?;
        id.ok_or(DbError::NoActiveTransaction)
    }

    fn guard<T>(&mut self, outcome: Result<T>) -> Result<T> {
        outcome.map_err(|err| self.fault(err))
    }

    // The attached transaction is no longer in progress; it is finished
    // either way, so let go of it.
    fn fault(&mut self, err: DbError) -> DbError {
        if let DbError::InvalidTransaction(reason) = &err
            && let Some(id) = self.transaction_id.take()
        {
            warn!(session = self.id, txn = %id, %reason, "detaching finished transaction");
        }
        err
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Abort whatever is still attached
        if let Some(id) = self.transaction_id.take() {
            debug!(session = self.id, txn = %id, "aborting transaction on session drop");
            let _ = self.manager().complete(id, TransactionState::Aborted);
        }
    }
}
