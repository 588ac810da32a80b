//! Parsed statements and their conversion from the sqlparser AST.

use std::fmt;

use sqlparser::ast as sql_ast;
use tabula_engine::{Comparator, JoinMode, JoinSpec};

use super::{side, ParseError, ParseResult, Side};

/// A column definition in `CREATE TABLE` or `ALTER TABLE ... ADD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column label.
    pub label: String,
    /// Type name as written, e.g. `int` or `varchar(20)`.
    pub type_name: String,
}

impl ColumnDef {
    /// Creates a column definition.
    pub fn new(label: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            type_name: type_name.into(),
        }
    }

    /// Converts from sqlparser's ColumnDef.
    pub fn from_sql_ast(col: sql_ast::ColumnDef) -> ParseResult<Self> {
        if !col.options.is_empty() {
            return Err(ParseError::Unsupported(format!(
                "column options on '{}'",
                col.name.value
            )));
        }
        Ok(Self::new(
            col.name.value,
            col.data_type.to_string().to_lowercase(),
        ))
    }
}

/// A column reference (`alias.column` or just `column`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Optional table or alias qualifier.
    pub qualifier: Option<String>,
    /// Column label.
    pub column: String,
}

impl ColumnRef {
    /// Converts an identifier expression; `a.b.c` keeps its last two parts.
    pub fn from_sql_ast(expr: sql_ast::Expr) -> ParseResult<Self> {
        match expr {
            sql_ast::Expr::Identifier(ident) => Ok(Self {
                qualifier: None,
                column: ident.value,
            }),
            sql_ast::Expr::CompoundIdentifier(mut parts) if parts.len() >= 2 => {
                let column = parts.pop().map(|i| i.value).unwrap_or_default();
                let qualifier = parts.pop().map(|i| i.value);
                Ok(Self { qualifier, column })
            }
            other => Err(ParseError::InvalidIdentifier(other.to_string())),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// A statement accepted by the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `CREATE DATABASE name`
    CreateDatabase {
        /// Database name.
        name: String,
    },
    /// `DROP DATABASE name`
    DropDatabase {
        /// Database name.
        name: String,
    },
    /// `USE name`
    UseDatabase {
        /// Database name.
        name: String,
    },
    /// `CREATE TABLE name (col type, ...)`
    CreateTable {
        /// Table name.
        name: String,
        /// Columns, possibly none.
        columns: Vec<ColumnDef>,
    },
    /// `DROP TABLE name`
    DropTable {
        /// Table name.
        name: String,
    },
    /// `ALTER TABLE name ADD col type`
    AlterTableAdd {
        /// Table name.
        table: String,
        /// New column.
        column: ColumnDef,
    },
    /// `SELECT * FROM table`
    SelectAll {
        /// Table name.
        table: String,
    },
    /// `SELECT cols FROM table WHERE key != value`
    ///
    /// Executed with the NOT-equal filter whichever of `=` / `!=` is
    /// written.
    SelectWhere {
        /// Table name.
        table: String,
        /// Projection; `None` for `*`.
        columns: Option<Vec<String>>,
        /// Filter column.
        key: String,
        /// Filter value.
        value: String,
    },
    /// `SELECT * FROM a x [LEFT OUTER | INNER] JOIN b y ON x.k = y.k`
    Join {
        /// Left side.
        left: JoinSpec,
        /// Right side.
        right: JoinSpec,
        /// Join flavour.
        mode: JoinMode,
    },
    /// `INSERT INTO table VALUES (v, ...)`
    Insert {
        /// Table name.
        table: String,
        /// Row values in column order.
        values: Vec<String>,
    },
    /// `DELETE FROM table WHERE key = value` or `key > value`
    Delete {
        /// Table name.
        table: String,
        /// Predicate column.
        key: String,
        /// Predicate operator.
        cmp: Comparator,
        /// Predicate value.
        value: String,
    },
    /// `UPDATE table SET column = new_value WHERE key = value`
    Update {
        /// Table name.
        table: String,
        /// Column to set.
        column: String,
        /// New value.
        new_value: String,
        /// Predicate column.
        key: String,
        /// Predicate value.
        value: String,
    },
    /// `BEGIN TRANSACTION`
    Begin,
    /// `COMMIT`
    Commit,
}

impl Statement {
    /// Converts from sqlparser's Statement.
    pub fn from_sql_ast(stmt: sql_ast::Statement) -> ParseResult<Self> {
        match stmt {
            sql_ast::Statement::CreateDatabase { db_name, .. } => Ok(Statement::CreateDatabase {
                name: object_name(&db_name)?,
            }),

            sql_ast::Statement::CreateTable { name, columns, .. } => Ok(Statement::CreateTable {
                name: object_name(&name)?,
                columns: columns
                    .into_iter()
                    .map(ColumnDef::from_sql_ast)
                    .collect::<ParseResult<_>>()?,
            }),

            sql_ast::Statement::Drop {
                object_type: sql_ast::ObjectType::Table,
                names,
                ..
            } => match names.as_slice() {
                [name] => Ok(Statement::DropTable {
                    name: object_name(name)?,
                }),
                _ => Err(ParseError::Unsupported("DROP TABLE of several tables".into())),
            },

            sql_ast::Statement::AlterTable {
                name, operations, ..
            } => {
                let table = object_name(&name)?;
                let mut operations = operations.into_iter();
                match (operations.next(), operations.next()) {
                    (Some(sql_ast::AlterTableOperation::AddColumn { column_def, .. }), None) => {
                        Ok(Statement::AlterTableAdd {
                            table,
                            column: ColumnDef::from_sql_ast(column_def)?,
                        })
                    }
                    _ => Err(ParseError::Unsupported(
                        "ALTER TABLE other than a single ADD".into(),
                    )),
                }
            }

            sql_ast::Statement::Query(query) => select_from_sql_ast(*query),

            sql_ast::Statement::Insert {
                table_name,
                columns,
                source,
                ..
            } => {
                if !columns.is_empty() {
                    return Err(ParseError::Unsupported("column list in INSERT".into()));
                }
                let table = object_name(&table_name)?;
                let query = *source.ok_or_else(|| ParseError::Syntax("INSERT without VALUES".into()))?;
                let values = match *query.body {
                    sql_ast::SetExpr::Values(values) => {
                        let mut rows = values.rows.into_iter();
                        match (rows.next(), rows.next()) {
                            (Some(row), None) => row
                                .into_iter()
                                .map(literal)
                                .collect::<ParseResult<Vec<_>>>()?,
                            _ => {
                                return Err(ParseError::Unsupported(
                                    "INSERT of more than one row".into(),
                                ))
                            }
                        }
                    }
                    other => return Err(ParseError::Unsupported(other.to_string())),
                };
                Ok(Statement::Insert { table, values })
            }

            sql_ast::Statement::Delete {
                from, selection, ..
            } => {
                let mut from = from.into_iter();
                let table = match (from.next(), from.next()) {
                    (Some(table), None) if table.joins.is_empty() => {
                        table_factor(table.relation)?.name
                    }
                    _ => return Err(ParseError::Unsupported("DELETE from several tables".into())),
                };
                let condition =
                    selection.ok_or_else(|| ParseError::Syntax("DELETE requires WHERE".into()))?;
                let (key, op, value) = comparison(condition)?;
                let cmp = match op {
                    sql_ast::BinaryOperator::Eq => Comparator::Equals,
                    sql_ast::BinaryOperator::Gt => Comparator::GreaterThan,
                    other => return Err(ParseError::Unsupported(format!("'{other}' in DELETE"))),
                };
                Ok(Statement::Delete {
                    table,
                    key,
                    cmp,
                    value,
                })
            }

            sql_ast::Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => {
                if !table.joins.is_empty() {
                    return Err(ParseError::Unsupported("UPDATE with JOIN".into()));
                }
                let table = table_factor(table.relation)?.name;
                let mut assignments = assignments.into_iter();
                let (column, new_value) = match (assignments.next(), assignments.next()) {
                    (Some(assignment), None) => {
                        let column = assignment
                            .id
                            .last()
                            .map(|ident| ident.value.clone())
                            .ok_or_else(|| ParseError::Syntax("UPDATE without a column".into()))?;
                        (column, literal(assignment.value)?)
                    }
                    _ => {
                        return Err(ParseError::Unsupported(
                            "UPDATE of more than one column".into(),
                        ))
                    }
                };
                let condition =
                    selection.ok_or_else(|| ParseError::Syntax("UPDATE requires WHERE".into()))?;
                let (key, op, value) = comparison(condition)?;
                if op != sql_ast::BinaryOperator::Eq {
                    return Err(ParseError::Unsupported(format!("'{op}' in UPDATE")));
                }
                Ok(Statement::Update {
                    table,
                    column,
                    new_value,
                    key,
                    value,
                })
            }

            sql_ast::Statement::StartTransaction { .. } => Ok(Statement::Begin),
            sql_ast::Statement::Commit { .. } => Ok(Statement::Commit),

            other => Err(ParseError::Unsupported(other.to_string())),
        }
    }
}

/// A table in a FROM clause with its optional alias.
struct NamedTable {
    name: String,
    alias: Option<String>,
}

fn select_from_sql_ast(query: sql_ast::Query) -> ParseResult<Statement> {
    let select = match *query.body {
        sql_ast::SetExpr::Select(select) => select,
        other => return Err(ParseError::Unsupported(other.to_string())),
    };
    let sql_ast::Select {
        projection,
        from,
        selection,
        ..
    } = *select;
    let columns = projection_columns(projection)?;

    let mut from = from.into_iter();
    match (from.next(), from.next(), from.next()) {
        (Some(first), None, None) => {
            let left = table_factor(first.relation)?;
            let mut joins = first.joins.into_iter();
            match (joins.next(), joins.next()) {
                (None, _) => single_table(left.name, columns, selection),
                (Some(join), None) => {
                    if selection.is_some() {
                        return Err(ParseError::Unsupported("WHERE on a JOIN".into()));
                    }
                    let right = table_factor(join.relation)?;
                    let (mode, constraint) = match join.join_operator {
                        sql_ast::JoinOperator::Inner(constraint) => (JoinMode::Inner, constraint),
                        sql_ast::JoinOperator::LeftOuter(constraint) => {
                            (JoinMode::LeftOuter, constraint)
                        }
                        other => return Err(ParseError::Unsupported(format!("{other:?}"))),
                    };
                    let sql_ast::JoinConstraint::On(condition) = constraint else {
                        return Err(ParseError::Syntax("JOIN requires ON".into()));
                    };
                    join_statement(left, right, mode, columns, condition)
                }
                _ => Err(ParseError::Unsupported("more than one JOIN".into())),
            }
        }
        (Some(first), Some(second), None) if first.joins.is_empty() && second.joins.is_empty() => {
            let left = table_factor(first.relation)?;
            let right = table_factor(second.relation)?;
            let condition = selection
                .ok_or_else(|| ParseError::Syntax("comma join requires WHERE".into()))?;
            join_statement(left, right, JoinMode::Inner, columns, condition)
        }
        (None, _, _) => Err(ParseError::Syntax("SELECT requires FROM".into())),
        _ => Err(ParseError::Unsupported("SELECT over more than two tables".into())),
    }
}

fn single_table(
    table: String,
    columns: Option<Vec<String>>,
    selection: Option<sql_ast::Expr>,
) -> ParseResult<Statement> {
    let Some(condition) = selection else {
        return match columns {
            None => Ok(Statement::SelectAll { table }),
            Some(_) => Err(ParseError::Unsupported("column list without WHERE".into())),
        };
    };
    let (key, op, value) = comparison(condition)?;
    match op {
        sql_ast::BinaryOperator::Eq | sql_ast::BinaryOperator::NotEq => {
            Ok(Statement::SelectWhere {
                table,
                columns,
                key,
                value,
            })
        }
        other => Err(ParseError::Unsupported(format!("'{other}' in SELECT"))),
    }
}

fn join_statement(
    left: NamedTable,
    right: NamedTable,
    mode: JoinMode,
    columns: Option<Vec<String>>,
    condition: sql_ast::Expr,
) -> ParseResult<Statement> {
    if columns.is_some() {
        return Err(ParseError::Unsupported("column list on a join".into()));
    }
    let (first, second) = match condition {
        sql_ast::Expr::BinaryOp {
            left: lhs,
            op: sql_ast::BinaryOperator::Eq,
            right: rhs,
        } => (ColumnRef::from_sql_ast(*lhs)?, ColumnRef::from_sql_ast(*rhs)?),
        sql_ast::Expr::Nested(inner) => {
            return join_statement(left, right, mode, columns, *inner);
        }
        other => {
            return Err(ParseError::Unsupported(format!("join condition {other}")));
        }
    };

    let left_names = [Some(left.name.as_str()), left.alias.as_deref()];
    let right_names = [Some(right.name.as_str()), right.alias.as_deref()];
    let (left_key, right_key) = match side(&first, &left_names, &right_names)? {
        Some(Side::Right) => (second, first),
        _ => match side(&second, &left_names, &right_names)? {
            Some(Side::Left) => (second, first),
            _ => (first, second),
        },
    };

    Ok(Statement::Join {
        left: JoinSpec::new(left.name, left_key.column),
        right: JoinSpec::new(right.name, right_key.column),
        mode,
    })
}

/// `None` for `*`, otherwise the plain column names.
fn projection_columns(items: Vec<sql_ast::SelectItem>) -> ParseResult<Option<Vec<String>>> {
    if let [sql_ast::SelectItem::Wildcard(_)] = items.as_slice() {
        return Ok(None);
    }
    items
        .into_iter()
        .map(|item| match item {
            sql_ast::SelectItem::UnnamedExpr(expr) => {
                ColumnRef::from_sql_ast(expr).map(|c| c.column)
            }
            other => Err(ParseError::Unsupported(other.to_string())),
        })
        .collect::<ParseResult<Vec<_>>>()
        .map(Some)
}

fn table_factor(factor: sql_ast::TableFactor) -> ParseResult<NamedTable> {
    match factor {
        sql_ast::TableFactor::Table { name, alias, .. } => Ok(NamedTable {
            name: object_name(&name)?,
            alias: alias.map(|a| a.name.value),
        }),
        other => Err(ParseError::Unsupported(other.to_string())),
    }
}

fn object_name(name: &sql_ast::ObjectName) -> ParseResult<String> {
    match name.0.as_slice() {
        [ident] => Ok(ident.value.clone()),
        _ => Err(ParseError::InvalidIdentifier(name.to_string())),
    }
}

/// `column <op> literal`
fn comparison(expr: sql_ast::Expr) -> ParseResult<(String, sql_ast::BinaryOperator, String)> {
    match expr {
        sql_ast::Expr::BinaryOp { left, op, right } => {
            let key = ColumnRef::from_sql_ast(*left)?.column;
            Ok((key, op, literal(*right)?))
        }
        sql_ast::Expr::Nested(inner) => comparison(*inner),
        other => Err(ParseError::Unsupported(format!("condition {other}"))),
    }
}

/// A value as its field text. Bare words are taken literally.
fn literal(expr: sql_ast::Expr) -> ParseResult<String> {
    match expr {
        sql_ast::Expr::Value(value) => match value {
            sql_ast::Value::Number(n, _) => Ok(n),
            sql_ast::Value::SingleQuotedString(s) | sql_ast::Value::DoubleQuotedString(s) => Ok(s),
            other => Err(ParseError::InvalidLiteral(other.to_string())),
        },
        sql_ast::Expr::Identifier(ident) => Ok(ident.value),
        sql_ast::Expr::UnaryOp {
            op: sql_ast::UnaryOperator::Minus,
            expr,
        } => Ok(format!("-{}", literal(*expr)?)),
        sql_ast::Expr::Nested(inner) => literal(*inner),
        other => Err(ParseError::InvalidLiteral(other.to_string())),
    }
}
