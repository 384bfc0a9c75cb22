use crate::core::{DbError, Result};
use std::fmt;
use std::str::FromStr;

/// One session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Begin,
    Commit,
    Abort,
    Get { key: String },
    Set { key: String, value: String },
    Delete { key: String },
}

impl Command {
    pub fn get(key: impl Into<String>) -> Self {
        Command::Get { key: key.into() }
    }

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Command::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Command::Delete { key: key.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Begin => "begin",
            Command::Commit => "commit",
            Command::Abort => "abort",
            Command::Get { .. } => "get",
            Command::Set { .. } => "set",
            Command::Delete { .. } => "delete",
        }
    }

    /// Build a command from its name and arguments, checking arity.
    pub fn from_parts(name: &str, args: &[&str]) -> Result<Self> {
        let command = match name.to_ascii_lowercase().as_str() {
            "begin" => {
                expect_args("begin", args, 0)?;
                Command::Begin
            }
            "commit" => {
                expect_args("commit", args, 0)?;
                Command::Commit
            }
            "abort" | "rollback" => {
                expect_args("abort", args, 0)?;
                Command::Abort
            }
            "get" => {
                expect_args("get", args, 1)?;
                Command::get(args[0])
            }
            "set" => {
                expect_args("set", args, 2)?;
                Command::set(args[0], args[1])
            }
            "delete" | "del" => {
                expect_args("delete", args, 1)?;
                Command::delete(args[0])
            }
            other => return Err(DbError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// Parse a command line, e.g. `set x hey`.
    ///
    /// Tokens are whitespace separated, except that everything after the key
    /// of a `set` is its value: `set greeting hello world` stores
    /// `"hello world"`.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, rest) = split_token(line);
        if name.is_empty() {
            return Err(DbError::InvalidArguments("empty command".into()));
        }

        if name.eq_ignore_ascii_case("set") {
            let (key, value) = split_token(rest);
            let args: Vec<&str> = [key, value.trim()]
                .into_iter()
                .filter(|arg| !arg.is_empty())
                .collect();
            return Self::from_parts(name, &args);
        }

        let args: Vec<&str> = rest.split_whitespace().collect();
        Self::from_parts(name, &args)
    }
}

// First token and the remainder after it, leading whitespace stripped.
fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (text, ""),
    }
}

fn expect_args(command: &str, args: &[&str], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(DbError::InvalidArguments(format!(
            "expect {} argument for [{}] command, got {}",
            expected,
            command,
            args.len()
        )));
    }
    Ok(())
}

impl FromStr for Command {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Begin | Command::Commit | Command::Abort => f.write_str(self.name()),
            Command::Get { key } | Command::Delete { key } => write!(f, "{} {}", self.name(), key),
            Command::Set { key, value } => write!(f, "set {} {}", key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("begin").unwrap(), Command::Begin);
        assert_eq!(Command::parse("  COMMIT ").unwrap(), Command::Commit);
        assert_eq!(Command::parse("rollback").unwrap(), Command::Abort);
        assert_eq!(Command::parse("get x").unwrap(), Command::get("x"));
        assert_eq!(Command::parse("set x hey").unwrap(), Command::set("x", "hey"));
        assert_eq!(Command::parse("delete x").unwrap(), Command::delete("x"));
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        for line in ["get", "get x y", "set", "set x", "set x   ", "delete", "begin now", "commit x"] {
            assert!(
                matches!(Command::parse(line), Err(DbError::InvalidArguments(_))),
                "{line} should be rejected"
            );
        }
    }

    #[test]
    fn test_set_value_is_rest_of_line() {
        assert_eq!(
            Command::parse("set greeting hello world").unwrap(),
            Command::set("greeting", "hello world")
        );
        assert_eq!(
            Command::parse("SET  k   a  b  ").unwrap(),
            Command::set("k", "a  b")
        );
        assert_eq!(
            Command::set("k", "two words").to_string().parse::<Command>().unwrap(),
            Command::set("k", "two words")
        );
    }

    #[test]
    fn test_unknown_and_empty_commands() {
        assert!(matches!(
            Command::parse("select x"),
            Err(DbError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::parse("   "),
            Err(DbError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        let commands = [
            Command::Begin,
            Command::Abort,
            Command::set("k", "v"),
            Command::delete("k"),
        ];
        for command in commands {
            assert_eq!(command.to_string().parse::<Command>().unwrap(), command);
        }
    }
}
