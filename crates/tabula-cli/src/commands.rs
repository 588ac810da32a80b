//! Dot commands for scripts and the REPL.
//!
//! Provides `.exit`, `.help`, `.format` and `.status`.

use tabula_engine::Session;

use crate::formatter::OutputFormat;

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Stop reading input.
    Exit,
    /// Output a message.
    Output(String),
    /// Set output format.
    SetFormat(OutputFormat),
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stop reading input.
    Exit,
    /// Show help.
    Help,
    /// Show or set the output format.
    Format(Option<String>),
    /// Show the selected database and transaction state.
    Status,
    /// Unknown command.
    Unknown(String),
}

impl Command {
    /// Parses a command line such as `.format table`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let cmd = input.strip_prefix('.').unwrap_or(input);

        let mut parts = cmd.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_lowercase();
        let args = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match name.as_str() {
            "exit" | "quit" | "q" => Command::Exit,
            "help" | "h" | "?" => Command::Help,
            "format" | "f" => Command::Format(args.map(str::to_string)),
            "status" | "s" => Command::Status,
            _ => Command::Unknown(name),
        }
    }

    /// Executes the command.
    pub fn execute(&self, session: &Session, format: OutputFormat) -> CommandResult {
        match self {
            Command::Exit => CommandResult::Exit,
            Command::Help => CommandResult::Output(Self::help_text()),
            Command::Format(None) => CommandResult::Output(format!("Output format is {format}.")),
            Command::Format(Some(name)) => match name.parse() {
                Ok(format) => CommandResult::SetFormat(format),
                Err(e) => CommandResult::Output(format!("!{e}")),
            },
            Command::Status => {
                let database = session.current_database().unwrap_or("(none)");
                let txn = match (session.in_transaction(), session.is_aborted()) {
                    (true, true) => "active, aborted",
                    (true, false) => "active",
                    (false, _) => "none",
                };
                CommandResult::Output(format!("Database: {database}\nTransaction: {txn}"))
            }
            Command::Unknown(name) => {
                CommandResult::Output(format!("!Unknown command '.{name}'. Try .help"))
            }
        }
    }

    fn help_text() -> String {
        r#"Statements end with ';'. Lines starting with '--' are comments.

  CREATE DATABASE d;            DROP DATABASE d;          USE d;
  CREATE TABLE t (c int, d varchar(20), e float);
  DROP TABLE t;                 ALTER TABLE t ADD c type;
  SELECT * FROM t;              SELECT c, d FROM t WHERE k != v;
  SELECT * FROM a x LEFT OUTER JOIN b y ON x.k = y.k;
  INSERT INTO t VALUES (1, 'text', 2.5);
  UPDATE t SET c = v WHERE k = v;
  DELETE FROM t WHERE k = v;    DELETE FROM t WHERE k > v;
  BEGIN TRANSACTION;            COMMIT;

Commands:
  .help           Show this help
  .format [fmt]   Show or set the output format (raw, table)
  .status         Show the selected database and transaction state
  .exit           Quit"#
            .to_string()
    }
}
