//! Interactive REPL (Read-Eval-Print-Loop) for Tabula.
//!
//! Provides an interactive shell with command history, line editing,
//! keyword completion and multi-line input: a statement is sent once the
//! input ends with `;`.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};
use tabula_engine::Session;
use tracing::{debug, error};

use crate::config::CliConfig;
use crate::formatter::OutputFormat;
use crate::script::{self, Flow};

/// The REPL prompt shown when waiting for input.
const PROMPT: &str = "tabula> ";

/// The prompt while a transaction is open.
const TXN_PROMPT: &str = "tabula*> ";

const KEYWORDS: &[&str] = &[
    "ADD",
    "ALTER",
    "BEGIN",
    "COMMIT",
    "CREATE",
    "DATABASE",
    "DELETE",
    "DROP",
    "FLOAT",
    "FROM",
    "INNER",
    "INSERT",
    "INT",
    "INTO",
    "JOIN",
    "LEFT",
    "ON",
    "OUTER",
    "SELECT",
    "SET",
    "TABLE",
    "TRANSACTION",
    "UPDATE",
    "USE",
    "VALUES",
    "VARCHAR",
    "WHERE",
];

/// REPL helper for rustyline.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);

        let word = line[start..pos].to_uppercase();
        if word.is_empty() {
            return Ok((start, Vec::new()));
        }

        let matches = KEYWORDS
            .iter()
            .filter(|kw| kw.starts_with(&word))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(if is_complete(ctx.input()) {
            ValidationResult::Valid(None)
        } else {
            ValidationResult::Incomplete
        })
    }
}

impl Helper for ReplHelper {}

/// Returns true once the input can be run: empty, a dot command, a comment,
/// or text ending with `;`.
fn is_complete(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.is_empty()
        || trimmed.starts_with('.')
        || trimmed.starts_with("--")
        || trimmed.ends_with(';')
}

/// Interactive REPL for Tabula.
pub struct Repl {
    session: Session,
    editor: Editor<ReplHelper, DefaultHistory>,
    format: OutputFormat,
    history_file: Option<PathBuf>,
}

impl Repl {
    /// Creates a new REPL instance over `session`.
    pub fn new(session: Session, config: &CliConfig, format: OutputFormat) -> Result<Self> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .max_history_size(config.history_size)?
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper));

        let history_file = config.history_path();
        if let Some(ref path) = history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    debug!("Failed to load history: {}", e);
                }
            }
        }

        Ok(Self {
            session,
            editor,
            format,
            history_file,
        })
    }

    /// Prints the welcome banner.
    pub fn print_banner(&self) {
        println!("Tabula v{}", env!("CARGO_PKG_VERSION"));
        println!("Type .help for help, .exit to quit.\n");
    }

    /// Runs the main REPL loop.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = self.prompt();

            match self.editor.readline(prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Err(e) = self.editor.add_history_entry(line) {
                        debug!("Failed to add history entry: {}", e);
                    }

                    let mut out = io::stdout().lock();
                    match script::run_script(&mut self.session, line, &mut self.format, &mut out) {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    error!("Readline error: {}", e);
                    break;
                }
            }
        }

        self.save_history();
        println!("All Done.");
        Ok(())
    }

    /// Gets the current prompt.
    fn prompt(&self) -> &'static str {
        if self.session.in_transaction() {
            TXN_PROMPT
        } else {
            PROMPT
        }
    }

    /// Saves command history.
    fn save_history(&mut self) {
        if let Some(ref path) = self.history_file {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    debug!("Failed to create history directory: {}", e);
                    return;
                }
            }
            if let Err(e) = self.editor.save_history(path) {
                debug!("Failed to save history: {}", e);
            }
        }
    }
}
