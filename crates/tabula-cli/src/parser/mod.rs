//! Statement parser for the Tabula shell.
//!
//! Statements are parsed with the `sqlparser` crate and the resulting AST is
//! mapped onto [`Statement`]. A few shell statements that are not SQL
//! (`USE`, `DROP DATABASE`, `CREATE TABLE t` without a column list) are
//! recognized before the SQL parser sees them.
//!
//! # Supported statements
//!
//! - `CREATE DATABASE`, `DROP DATABASE`, `USE`
//! - `CREATE TABLE t (c type, ...)`, `DROP TABLE`, `ALTER TABLE t ADD c type`
//! - `SELECT * FROM t`, `SELECT c1, c2 FROM t WHERE k != v`
//! - `SELECT * FROM a x [INNER | LEFT OUTER] JOIN b y ON x.k = y.k`
//!   and `SELECT * FROM a x, b y WHERE x.k = y.k`
//! - `INSERT INTO t VALUES (...)`, `DELETE FROM t WHERE k = v | k > v`,
//!   `UPDATE t SET c = v WHERE k = v`
//! - `BEGIN TRANSACTION`, `COMMIT`
//!
//! # Usage
//!
//! ```
//! use tabula_cli::parser::{Parser, Statement};
//!
//! let stmt = Parser::parse_one("USE shop;").unwrap();
//! assert_eq!(stmt, Statement::UseDatabase { name: "shop".into() });
//! ```

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser as SqlParser;
use thiserror::Error;

mod statement;

pub use statement::{ColumnDef, ColumnRef, Statement};

/// Errors that can occur while parsing a statement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Error from the underlying sqlparser crate, or a malformed shell
    /// statement.
    #[error("{0}")]
    Syntax(String),

    /// Unsupported statement or clause.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A name that is not a plain identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A value that cannot be stored in a field.
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    /// A qualifier that names neither joined table.
    #[error("Unknown table or alias '{0}'")]
    UnknownQualifier(String),

    /// Nothing to parse.
    #[error("Empty statement")]
    EmptyQuery,
}

impl From<sqlparser::parser::ParserError> for ParseError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Statement parser.
///
/// Uses the PostgreSQL dialect of `sqlparser`.
pub struct Parser;

impl Parser {
    /// Parses a string into a list of statements.
    pub fn parse(sql: &str) -> ParseResult<Vec<Statement>> {
        if sql.trim().trim_end_matches(';').trim().is_empty() {
            return Err(ParseError::EmptyQuery);
        }

        if let Some(stmt) = shell_statement(sql) {
            return stmt.map(|stmt| vec![stmt]);
        }

        let dialect = PostgreSqlDialect {};
        let ast = SqlParser::parse_sql(&dialect, sql)?;

        if ast.is_empty() {
            return Err(ParseError::EmptyQuery);
        }

        ast.into_iter().map(Statement::from_sql_ast).collect()
    }

    /// Parses exactly one statement.
    pub fn parse_one(sql: &str) -> ParseResult<Statement> {
        let mut statements = Self::parse(sql)?;
        if statements.len() != 1 {
            return Err(ParseError::Syntax(format!(
                "Expected 1 statement, got {}",
                statements.len()
            )));
        }
        Ok(statements.remove(0))
    }
}

/// Recognizes the statements that are not SQL.
fn shell_statement(sql: &str) -> Option<ParseResult<Statement>> {
    let words: Vec<&str> = sql.trim().trim_end_matches(';').split_whitespace().collect();
    let keyword = |i: usize, kw: &str| words.get(i).is_some_and(|w| w.eq_ignore_ascii_case(kw));

    if keyword(0, "USE") {
        return Some(match words.as_slice() {
            [_, name] => Ok(Statement::UseDatabase {
                name: name.to_string(),
            }),
            _ => Err(ParseError::Syntax("USE takes one database name".into())),
        });
    }

    if keyword(0, "DROP") && keyword(1, "DATABASE") {
        return Some(match words.as_slice() {
            [_, _, name] => Ok(Statement::DropDatabase {
                name: name.to_string(),
            }),
            _ => Err(ParseError::Syntax(
                "DROP DATABASE takes one database name".into(),
            )),
        });
    }

    if keyword(0, "CREATE") && keyword(1, "TABLE") {
        if let [_, _, name] = words.as_slice() {
            if !name.contains('(') {
                return Some(Ok(Statement::CreateTable {
                    name: name.to_string(),
                    columns: Vec::new(),
                }));
            }
        }
    }

    None
}

enum Side {
    Left,
    Right,
}

/// Which joined table a column reference's qualifier names.
fn side(
    column: &ColumnRef,
    left: &[Option<&str>],
    right: &[Option<&str>],
) -> ParseResult<Option<Side>> {
    let Some(qualifier) = &column.qualifier else {
        return Ok(None);
    };
    let matches = |names: &[Option<&str>]| {
        names
            .iter()
            .flatten()
            .any(|n| n.eq_ignore_ascii_case(qualifier))
    };
    if matches(left) {
        Ok(Some(Side::Left))
    } else if matches(right) {
        Ok(Some(Side::Right))
    } else {
        Err(ParseError::UnknownQualifier(qualifier.clone()))
    }
}
