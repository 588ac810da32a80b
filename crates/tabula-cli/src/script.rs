//! Script execution.
//!
//! A script is a sequence of statements terminated by `;`, possibly spread
//! over several lines, mixed with dot commands on lines of their own.
//! `--` starts a comment that runs to the end of the line. `.exit` stops the
//! script.

use std::io::Write;

use anyhow::Result;
use tabula_engine::Session;
use tracing::debug;

use crate::commands::{Command, CommandResult};
use crate::dispatch;
use crate::formatter::{self, OutputFormat};

/// One unit of script input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem {
    /// A statement, without its terminating `;`.
    Statement(String),
    /// A dot command line.
    Command(String),
}

/// Whether the caller should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going.
    Continue,
    /// `.exit` was seen.
    Exit,
}

/// Splits script text into statements and commands.
///
/// `;` inside quotes does not end a statement. Text after the last `;` is
/// returned as a final statement.
pub fn split_script(content: &str) -> Vec<ScriptItem> {
    let mut items = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if quote.is_none() && buf.trim().is_empty() && trimmed.starts_with('.') {
            items.push(ScriptItem::Command(trimmed.to_string()));
            buf.clear();
            continue;
        }

        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(q) = quote {
                buf.push(c);
                if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    buf.push(c);
                }
                '-' if chars.peek() == Some(&'-') => break,
                ';' => {
                    push_statement(&mut items, &buf);
                    buf.clear();
                }
                _ => buf.push(c),
            }
        }
        buf.push('\n');
    }
    push_statement(&mut items, &buf);
    items
}

fn push_statement(items: &mut Vec<ScriptItem>, buf: &str) {
    let statement = buf.trim();
    if !statement.is_empty() {
        items.push(ScriptItem::Statement(statement.to_string()));
    }
}

/// Runs every statement and command of `content`, writing results to `out`.
///
/// `.format` changes `format` for the rest of the run and beyond.
pub fn run_script<W: Write>(
    session: &mut Session,
    content: &str,
    format: &mut OutputFormat,
    out: &mut W,
) -> Result<Flow> {
    for item in split_script(content) {
        match item {
            ScriptItem::Statement(sql) => {
                debug!(sql = %sql, "executing statement");
                let result = dispatch::execute_sql(session, &sql);
                writeln!(out, "{}", formatter::format_result(&result, *format))?;
            }
            ScriptItem::Command(line) => match Command::parse(&line).execute(session, *format) {
                CommandResult::Exit => return Ok(Flow::Exit),
                CommandResult::Output(text) => writeln!(out, "{text}")?,
                CommandResult::SetFormat(new_format) => {
                    *format = new_format;
                    writeln!(out, "Output format set to {new_format}.")?;
                }
            },
        }
    }
    Ok(Flow::Continue)
}
