use crate::core::TransactionConflict;
use std::fmt;

/// Protocol marker for "no matching record": returned by `get` when no
/// version is visible and by `delete` when nothing visible could be deleted.
pub const NO_RECORD: &str = "update 0";

/// Normal (non-fault) result of a session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Command succeeded with nothing to report
    Done,
    /// Value read by `get`
    Value(String),
    /// No visible record for `get`/`delete`
    NoRecord,
    /// `commit` failed validation; the transaction is already aborted
    Conflict(TransactionConflict),
}

impl CommandOutput {
    pub fn is_done(&self) -> bool {
        matches!(self, CommandOutput::Done)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            CommandOutput::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn conflict(&self) -> Option<TransactionConflict> {
        match self {
            CommandOutput::Conflict(conflict) => Some(*conflict),
            _ => None,
        }
    }

    /// Flatten into the string protocol: empty for success, the value,
    /// the no-record marker, or the conflict message.
    pub fn into_message(self) -> String {
        match self {
            CommandOutput::Done => String::new(),
            CommandOutput::Value(value) => value,
            CommandOutput::NoRecord => NO_RECORD.to_string(),
            CommandOutput::Conflict(conflict) => conflict.to_string(),
        }
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutput::Done => Ok(()),
            CommandOutput::Value(value) => f.write_str(value),
            CommandOutput::NoRecord => f.write_str(NO_RECORD),
            CommandOutput::Conflict(conflict) => write!(f, "{}", conflict),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_strings() {
        assert_eq!(CommandOutput::Done.into_message(), "");
        assert_eq!(CommandOutput::Value("hey".into()).into_message(), "hey");
        assert_eq!(CommandOutput::NoRecord.into_message(), "update 0");
        assert_eq!(
            CommandOutput::Conflict(TransactionConflict::WriteWrite).into_message(),
            "write-write conflict"
        );
    }

    #[test]
    fn test_display_matches_message() {
        let outputs = [
            CommandOutput::Done,
            CommandOutput::Value("v".into()),
            CommandOutput::NoRecord,
            CommandOutput::Conflict(TransactionConflict::ReadWrite),
        ];
        for output in outputs {
            assert_eq!(output.to_string(), output.clone().into_message());
        }
    }

    #[test]
    fn test_accessors() {
        assert!(CommandOutput::Done.is_done());
        assert_eq!(CommandOutput::Value("v".into()).value(), Some("v"));
        assert_eq!(CommandOutput::NoRecord.value(), None);
        assert_eq!(
            CommandOutput::Conflict(TransactionConflict::ReadWrite).conflict(),
            Some(TransactionConflict::ReadWrite)
        );
    }
}
