use anyhow::{Context, Result};
use rustmemkv::{CommandOutput, Database, DatabaseConfig, IsolationLevel, Session};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

const HELP: &str = "\
usage: <session> <command> [args..]
  commands: begin | commit | abort | get <key> | set <key> <value..> | delete <key>
  the value of set runs to the end of the line
  .isolation <level>   change the default isolation level for new transactions
  .stats               print database statistics as JSON
  .help                show this message
  .quit                exit";

/// Line-oriented driver: every line names a session and a command, so one
/// input stream can interleave any number of sessions.
pub struct Shell {
    db: Database,
    sessions: BTreeMap<String, Session>,
}

impl Shell {
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        let db = Database::with_config(config).context("invalid database configuration")?;
        Ok(Self {
            db,
            sessions: BTreeMap::new(),
        })
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read input")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line == ".quit" {
                break;
            }
            let reply = self.handle(line);
            writeln!(output, "{}", reply)?;
        }
        output.flush()?;
        Ok(())
    }

    /// Handle one line and return what to print.
    pub fn handle(&mut self, line: &str) -> String {
        if let Some(meta) = line.strip_prefix('.') {
            return self.meta(meta).unwrap_or_else(|err| format!("error: {:#}", err));
        }

        let Some((name, command)) = line.split_once(char::is_whitespace) else {
            return format!("error: expected '<session> <command>', got '{}'", line);
        };

        let session = self
            .sessions
            .entry(name.to_string())
            .or_insert_with(|| self.db.create_session());

        match session.execute_line(command) {
            Ok(CommandOutput::Done) => format!("[{}] ok", name),
            Ok(CommandOutput::Conflict(conflict)) => format!("[{}] aborted: {}", name, conflict),
            Ok(output) => format!("[{}] {}", name, output),
            Err(err) => format!("[{}] error: {}", name, err),
        }
    }

    fn meta(&mut self, meta: &str) -> Result<String> {
        let mut parts = meta.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("isolation"), Some(level)) => {
                let level: IsolationLevel = level.parse()?;
                self.db.set_default_isolation_level(level)?;
                Ok(format!("default isolation level: {}", level))
            }
            (Some("isolation"), None) => {
                Ok(format!("default isolation level: {}", self.db.default_isolation_level()?))
            }
            (Some("stats"), None) => Ok(serde_json::to_string_pretty(&self.db.stats()?)?),
            (Some("help"), None) => Ok(HELP.to_string()),
            _ => anyhow::bail!("unknown meta command '.{}'", meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn shell(level: IsolationLevel) -> Shell {
        Shell::new(DatabaseConfig::default().isolation_level(level)).unwrap()
    }

    #[test]
    fn test_interleaved_sessions() {
        let mut shell = shell(IsolationLevel::ReadCommitted);

        assert_eq!(shell.handle("s1 begin"), "[s1] ok");
        assert_eq!(shell.handle("s2 begin"), "[s2] ok");
        assert_eq!(shell.handle("s1 set x hey"), "[s1] ok");
        assert_eq!(shell.handle("s1 set phrase hello world"), "[s1] ok");
        assert_eq!(shell.handle("s1 get phrase"), "[s1] hello world");
        assert_eq!(shell.handle("s2 get x"), "[s2] update 0");
        assert_eq!(shell.handle("s1 commit"), "[s1] ok");
        assert_eq!(shell.handle("s2 get x"), "[s2] hey");
    }

    #[test]
    fn test_conflict_and_errors_are_reported() {
        let mut shell = shell(IsolationLevel::Snapshot);

        shell.handle("a begin");
        shell.handle("b begin");
        shell.handle("a set x 1");
        shell.handle("b set x 2");
        assert_eq!(shell.handle("a commit"), "[a] ok");
        assert_eq!(shell.handle("b commit"), "[b] aborted: write-write conflict");
        assert!(shell.handle("b get x").starts_with("[b] error:"));
        assert!(shell.handle("lonely").starts_with("error:"));
    }

    #[test]
    fn test_meta_commands() {
        let mut shell = shell(IsolationLevel::ReadCommitted);

        assert_eq!(
            shell.handle(".isolation serializable"),
            "default isolation level: serializable"
        );
        assert!(shell.handle(".isolation nonsense").starts_with("error:"));
        assert!(shell.handle(".stats").contains("\"committed\": 0"));
        assert!(shell.handle(".bogus").starts_with("error:"));
    }

    #[test]
    fn test_run_reads_until_quit() {
        let mut shell = shell(IsolationLevel::ReadCommitted);
        let input = Cursor::new("# comment\ns1 begin\n\ns1 set k v\n.quit\ns1 commit\n");
        let mut output = Vec::new();

        shell.run(input, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "[s1] ok\n[s1] ok\n");
    }
}
