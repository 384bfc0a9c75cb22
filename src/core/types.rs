use super::DbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Isolation level of a transaction, fixed when it begins.
///
/// `RepeatableRead`, `Snapshot` and `Serializable` share the same
/// snapshot-based visibility; they differ only in what is validated at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
}

impl IsolationLevel {
    pub const ALL: [IsolationLevel; 5] = [
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Snapshot,
        IsolationLevel::Serializable,
    ];

    /// Whether reads are resolved against the snapshot taken at begin.
    pub fn uses_snapshot(&self) -> bool {
        matches!(
            self,
            IsolationLevel::RepeatableRead | IsolationLevel::Snapshot | IsolationLevel::Serializable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "read-uncommitted",
            IsolationLevel::ReadCommitted => "read-committed",
            IsolationLevel::RepeatableRead => "repeatable-read",
            IsolationLevel::Snapshot => "snapshot",
            IsolationLevel::Serializable => "serializable",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IsolationLevel {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "read-uncommitted" => Ok(IsolationLevel::ReadUncommitted),
            "read-committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable-read" => Ok(IsolationLevel::RepeatableRead),
            "snapshot" => Ok(IsolationLevel::Snapshot),
            "serializable" => Ok(IsolationLevel::Serializable),
            _ => Err(DbError::InvalidIsolationLevel(s.to_string())),
        }
    }
}
