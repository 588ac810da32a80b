//! Statement dispatch.
//!
//! Runs a parsed statement against a [`Session`] and turns the outcome into
//! a [`StatementResult`]. Failure messages start with `!`.

use tabula_common::{ErrorCode, ObjectKind, TabulaError};
use tabula_engine::{Column, ColumnType, Row, Schema, Session};
use tracing::debug;

use crate::parser::{ColumnDef, Parser, Statement};

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementResult {
    /// Success message.
    Ok(String),
    /// Failure message.
    Failed(String),
    /// A result set.
    Rows {
        /// Column headings.
        header: Row,
        /// Data rows.
        rows: Vec<Row>,
    },
}

impl StatementResult {
    /// Returns true for failures.
    pub fn is_failure(&self) -> bool {
        matches!(self, StatementResult::Failed(_))
    }

    fn failed(message: impl Into<String>) -> Self {
        StatementResult::Failed(message.into())
    }
}

/// Parses and runs one statement.
pub fn execute_sql(session: &mut Session, sql: &str) -> StatementResult {
    match Parser::parse_one(sql) {
        Ok(stmt) => execute(session, &stmt),
        Err(e) => {
            debug!(sql, error = %e, "parse failed");
            StatementResult::failed(format!("!Syntax error: {e}"))
        }
    }
}

/// Runs a parsed statement.
pub fn execute(session: &mut Session, stmt: &Statement) -> StatementResult {
    match stmt {
        Statement::CreateDatabase { name } => match session.create_database(name) {
            Ok(()) => StatementResult::Ok(format!("Database {name} created.")),
            Err(e) if e.code() == ErrorCode::AlreadyExists => StatementResult::failed(format!(
                "!Failed to create database {name} because it already exists."
            )),
            Err(e) => StatementResult::failed(format!("!Failed to create database {name}: {e}")),
        },

        Statement::DropDatabase { name } => match session.drop_database(name) {
            Ok(()) => StatementResult::Ok(format!("Database {name} deleted.")),
            Err(e) if e.is_not_found(ObjectKind::Database) => StatementResult::failed(format!(
                "!Failed to delete {name} because it does not exist."
            )),
            Err(e) => StatementResult::failed(format!("!Failed to delete {name}: {e}")),
        },

        Statement::UseDatabase { name } => match session.select_database(name) {
            Ok(()) => StatementResult::Ok(format!("Using database {name}.")),
            Err(e) if e.is_not_found(ObjectKind::Database) => StatementResult::failed(format!(
                "!Failed to use database {name} because it does not exist."
            )),
            Err(e) => StatementResult::failed(format!("!Failed to use database {name}: {e}")),
        },

        Statement::CreateTable { name, columns } => create_table(session, name, columns),

        Statement::DropTable { name } => match session.drop_table(name) {
            Ok(()) => StatementResult::Ok(format!("Table {name} deleted.")),
            Err(e) if e.is_not_found(ObjectKind::Table) => StatementResult::failed(format!(
                "!Failed to delete {name} because it does not exist."
            )),
            Err(e) => StatementResult::failed(format!("!Failed to delete {name}: {e}")),
        },

        Statement::AlterTableAdd { table, column } => {
            match session.add_column(table, &column.label, &column.type_name) {
                Ok(()) => StatementResult::Ok(format!("Table {table} modified.")),
                Err(e) if e.is_not_found(ObjectKind::Table) => StatementResult::failed(format!(
                    "!Failed to modify table {table} because it does not exist."
                )),
                Err(e) if e.code() == ErrorCode::TableNotEmpty => StatementResult::failed(format!(
                    "!Failed to modify table {table} because it already has rows."
                )),
                Err(TabulaError::LockConflict { .. }) => {
                    StatementResult::failed(format!("!Error: Table {table} is locked!"))
                }
                Err(e) => StatementResult::failed(format!("!Failed to modify table {table}: {e}")),
            }
        }

        Statement::SelectAll { table } => {
            let result = session.read_schema(table).and_then(|schema| {
                let rows = session.scan_all(table)?.collect_rows()?;
                Ok((schema, rows))
            });
            match result {
                Ok((schema, rows)) => StatementResult::Rows {
                    header: schema.map(|s| s.header_row()).unwrap_or_default(),
                    rows,
                },
                Err(e) => query_failed(table, &e),
            }
        }

        Statement::SelectWhere {
            table,
            columns,
            key,
            value,
        } => match select_where(session, table, columns.as_deref(), key, value) {
            Ok(result) => result,
            Err(e) => query_failed(table, &e),
        },

        Statement::Join { left, right, mode } => match session.join(left, right, *mode) {
            Ok(mut rows) => {
                let header = if rows.is_empty() {
                    Row::default()
                } else {
                    rows.remove(0)
                };
                StatementResult::Rows { header, rows }
            }
            Err(TabulaError::NotFound {
                kind: ObjectKind::Table,
                name,
            }) => StatementResult::failed(format!(
                "!Failed to query table {name} because it does not exist"
            )),
            Err(e) => StatementResult::failed(format!(
                "!Failed to query tables {} and {}: {e}",
                left.table, right.table
            )),
        },

        Statement::Insert { table, values } => {
            match session.append_row(table, values.as_slice()) {
                Ok(()) => StatementResult::Ok("1 new record inserted.".to_string()),
                Err(e) => write_failed("insert into", table, &e),
            }
        }

        Statement::Delete {
            table,
            key,
            cmp,
            value,
        } => match session.delete_where(table, key, value, *cmp) {
            Ok(n) => StatementResult::Ok(records(n, "deleted")),
            Err(e) => write_failed("delete from", table, &e),
        },

        Statement::Update {
            table,
            column,
            new_value,
            key,
            value,
        } => match session.update_where(table, key, value, column, new_value) {
            Ok(n) => StatementResult::Ok(records(n, "modified")),
            Err(e) => write_failed("update", table, &e),
        },

        Statement::Begin => {
            session.begin_transaction();
            StatementResult::Ok("Transaction starts.".to_string())
        }

        Statement::Commit => match session.commit_transaction() {
            Ok(_) => StatementResult::Ok("Transaction committed.".to_string()),
            Err(TabulaError::TransactionAborted) => StatementResult::failed("Transaction abort."),
            Err(TabulaError::NoActiveTransaction) => {
                StatementResult::failed("!Failed to commit because no transaction is active.")
            }
            Err(e) => StatementResult::failed(format!("!Failed to commit: {e}")),
        },
    }
}

/// Creates a table and its columns. Column definitions are checked before
/// the table file is created.
fn create_table(session: &Session, name: &str, columns: &[ColumnDef]) -> StatementResult {
    let mut schema = Schema::default();
    for def in columns {
        let checked = def
            .type_name
            .parse::<ColumnType>()
            .and_then(|ty| Column::new(def.label.as_str(), ty))
            .and_then(|column| schema.push(column));
        if let Err(e) = checked {
            return StatementResult::failed(format!("!Failed to create table {name}: {e}"));
        }
    }

    match session.create_table(name) {
        Ok(()) => {}
        Err(e) if e.code() == ErrorCode::AlreadyExists => {
            return StatementResult::failed(format!(
                "!Failed to create table {name} because it already exists."
            ))
        }
        Err(e) => return StatementResult::failed(format!("!Failed to create table {name}: {e}")),
    }

    for column in schema.columns() {
        let type_name = column.column_type().to_string();
        if let Err(e) = session.add_column(name, column.label(), &type_name) {
            return StatementResult::failed(format!("!Failed to create table {name}: {e}"));
        }
    }
    StatementResult::Ok(format!("Table {name} created."))
}

fn select_where(
    session: &Session,
    table: &str,
    columns: Option<&[String]>,
    key: &str,
    value: &str,
) -> Result<StatementResult, TabulaError> {
    let schema = session
        .read_schema(table)?
        .ok_or_else(|| TabulaError::schema_violation(format!("table '{table}' has no columns")))?;

    let labels: Vec<String> = match columns {
        Some(columns) => columns.to_vec(),
        None => schema.columns().iter().map(|c| c.label().to_string()).collect(),
    };
    let header = labels
        .iter()
        .map(|label| {
            let index = schema.index_of(label)?;
            Ok(schema.columns()[index].to_string())
        })
        .collect::<Result<Vec<_>, TabulaError>>()?;

    let rows = session.scan_filtered(table, key, value, labels.as_slice())?;
    Ok(StatementResult::Rows {
        header: Row::new(header),
        rows,
    })
}

fn query_failed(table: &str, e: &TabulaError) -> StatementResult {
    if e.is_not_found(ObjectKind::Table) {
        StatementResult::failed(format!(
            "!Failed to query table {table} because it does not exist"
        ))
    } else {
        StatementResult::failed(format!("!Failed to query table {table}: {e}"))
    }
}

fn write_failed(action: &str, table: &str, e: &TabulaError) -> StatementResult {
    match e {
        TabulaError::LockConflict { .. } => {
            StatementResult::failed(format!("!Error: Table {table} is locked!"))
        }
        e if e.is_not_found(ObjectKind::Table) => StatementResult::failed(format!(
            "!Failed to {action} {table} because it does not exist."
        )),
        e => StatementResult::failed(format!("!Failed to {action} {table}: {e}")),
    }
}

fn records(n: usize, verb: &str) -> String {
    if n == 1 {
        format!("{n} record {verb}.")
    } else {
        format!("{n} records {verb}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_engine::Database;
    use tempfile::TempDir;

    fn run(session: &mut Session, sql: &str) -> StatementResult {
        execute_sql(session, sql)
    }

    fn message(result: StatementResult) -> String {
        match result {
            StatementResult::Ok(m) | StatementResult::Failed(m) => m,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    fn rows(result: StatementResult) -> Vec<String> {
        match result {
            StatementResult::Rows { header, rows } => std::iter::once(header)
                .chain(rows)
                .map(|r| r.values().join("|"))
                .collect(),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    fn shop(tmp: &TempDir) -> (Database, Session) {
        let db = Database::open_at(tmp.path()).unwrap();
        let mut s = db.session();
        for sql in [
            "CREATE DATABASE shop;",
            "USE shop;",
            "CREATE TABLE Product (pid int, name varchar(20), price float);",
            "insert into Product values(1, 'Gizmo', 19.99);",
            "insert into Product values(2, 'PowerGizmo', 29.99);",
            "insert into Product values(3, 'SingleTouch', 149.99);",
            "insert into Product values(4, 'MultiTouch', 199.99);",
            "insert into Product values(5, 'SuperGizmo', 49.99);",
        ] {
            let result = run(&mut s, sql);
            assert!(!result.is_failure(), "{sql}: {result:?}");
        }
        (db, s)
    }

    #[test]
    fn test_database_messages() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_at(tmp.path()).unwrap();
        let mut s = db.session();

        assert_eq!(message(run(&mut s, "CREATE DATABASE db_1;")), "Database db_1 created.");
        assert_eq!(
            message(run(&mut s, "CREATE DATABASE db_1;")),
            "!Failed to create database db_1 because it already exists."
        );
        assert_eq!(message(run(&mut s, "DROP DATABASE db_1;")), "Database db_1 deleted.");
        assert_eq!(
            message(run(&mut s, "DROP DATABASE db_1;")),
            "!Failed to delete db_1 because it does not exist."
        );
        assert_eq!(
            message(run(&mut s, "USE db_1;")),
            "!Failed to use database db_1 because it does not exist."
        );
    }

    #[test]
    fn test_table_messages() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);

        assert_eq!(
            message(run(&mut s, "CREATE TABLE product (a int);")),
            "!Failed to create table product because it already exists."
        );
        assert_eq!(
            message(run(&mut s, "CREATE TABLE tbl_1 (a1 int, a2 varchar(20));")),
            "Table tbl_1 created."
        );
        assert_eq!(message(run(&mut s, "ALTER TABLE tbl_1 ADD a3 float;")), "Table tbl_1 modified.");
        assert_eq!(
            rows(run(&mut s, "SELECT * FROM tbl_1;")),
            ["a1 int|a2 varchar(20)|a3 float"]
        );
        assert_eq!(message(run(&mut s, "DROP TABLE tbl_1;")), "Table tbl_1 deleted.");
        assert_eq!(
            message(run(&mut s, "SELECT * FROM tbl_1;")),
            "!Failed to query table tbl_1 because it does not exist"
        );
    }

    #[test]
    fn test_alter_table_with_rows() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);

        assert_eq!(
            message(run(&mut s, "ALTER TABLE product ADD stock int;")),
            "!Failed to modify table product because it already has rows."
        );
        assert_eq!(
            rows(run(&mut s, "SELECT * FROM product;"))[0],
            "pid int|name varchar(20)|price float"
        );
    }

    #[test]
    fn test_create_table_checks_columns_first() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);
        let result = run(&mut s, "CREATE TABLE bad (a int, b decimal);");
        assert!(result.is_failure());
        let result = run(&mut s, "CREATE TABLE dup (a int, a float);");
        assert!(result.is_failure());
        assert!(!tmp.path().join("shop/bad.txt").exists());
        assert!(!tmp.path().join("shop/dup.txt").exists());
    }

    #[test]
    fn test_select_all() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);
        let out = rows(run(&mut s, "select * from Product;"));
        assert_eq!(out.len(), 6);
        assert_eq!(out[0], "pid int|name varchar(20)|price float");
        assert_eq!(out[1], "1|Gizmo|19.99");
    }

    #[test]
    fn test_select_where_uses_not_equal_filter() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);
        let out = rows(run(&mut s, "select name, price from product where pid != 2;"));
        assert_eq!(
            out,
            [
                "name varchar(20)|price float",
                "Gizmo|19.99",
                "SingleTouch|149.99",
                "MultiTouch|199.99",
                "SuperGizmo|49.99",
            ]
        );
        // '=' is routed to the same operator
        let eq = rows(run(&mut s, "select name, price from product where pid = 2;"));
        assert_eq!(eq, out);
    }

    #[test]
    fn test_mutation_messages() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);

        assert_eq!(
            message(run(&mut s, "update Product set name = 'Gizmo' where name = 'SuperGizmo';")),
            "1 record modified."
        );
        assert_eq!(
            message(run(&mut s, "update Product set price = 14.99 where name = 'Gizmo';")),
            "2 records modified."
        );
        assert_eq!(
            message(run(&mut s, "delete from product where name = 'Gizmo';")),
            "2 records deleted."
        );
        assert_eq!(
            message(run(&mut s, "delete from product where price > 150;")),
            "1 record deleted."
        );
        assert_eq!(
            message(run(&mut s, "delete from product where price > 1000;")),
            "0 records deleted."
        );
        assert_eq!(rows(run(&mut s, "select * from product;")).len(), 3);
    }

    #[test]
    fn test_insert_failure() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);
        let result = run(&mut s, "insert into Product values(6, 'x');");
        assert!(result.is_failure());
        let result = run(&mut s, "insert into Missing values(6);");
        assert_eq!(
            message(result),
            "!Failed to insert into Missing because it does not exist."
        );
    }

    #[test]
    fn test_join_statements() {
        let tmp = TempDir::new().unwrap();
        let (_db, mut s) = shop(&tmp);
        for sql in [
            "create table Employee (id int, name varchar(10));",
            "create table Sales (employeeID int, productID int);",
            "insert into Employee values(1, 'Joe');",
            "insert into Employee values(2, 'Jack');",
            "insert into Employee values(3, 'Gill');",
            "insert into Sales values(1, 344);",
            "insert into Sales values(1, 355);",
            "insert into Sales values(2, 544);",
        ] {
            assert!(!run(&mut s, sql).is_failure(), "{sql}");
        }

        let inner = rows(run(&mut s, "select * from Employee E, Sales S where E.id = S.employeeID;"));
        assert_eq!(
            inner,
            [
                "id int|name varchar(10)|employeeID int|productID int",
                "1|Joe|1|344",
                "1|Joe|1|355",
                "2|Jack|2|544",
            ]
        );
        let explicit = rows(run(
            &mut s,
            "select * from Employee E inner join Sales S on E.id = S.employeeID;",
        ));
        assert_eq!(explicit, inner);

        let outer = rows(run(
            &mut s,
            "select * from Employee E left outer join Sales S on E.id = S.employeeID;",
        ));
        assert_eq!(outer.len(), 5);
        assert_eq!(outer[4], "3|Gill||");

        assert_eq!(
            message(run(&mut s, "select * from Employee E join Nope N on E.id = N.id;")),
            "!Failed to query table nope because it does not exist"
        );
    }

    #[test]
    fn test_transaction_messages() {
        let tmp = TempDir::new().unwrap();
        let (db, mut a) = shop(&tmp);
        let mut b = db.session();
        run(&mut b, "USE shop;");

        assert_eq!(message(run(&mut a, "begin transaction;")), "Transaction starts.");
        assert_eq!(
            message(run(&mut a, "update Product set price = 1 where pid = 1;")),
            "1 record modified."
        );

        run(&mut b, "begin transaction;");
        assert_eq!(
            message(run(&mut b, "update Product set price = 2 where pid = 1;")),
            "!Error: Table Product is locked!"
        );
        assert_eq!(message(run(&mut b, "commit;")), "Transaction abort.");
        assert_eq!(
            message(run(&mut b, "ALTER TABLE product ADD stock int;")),
            "!Error: Table product is locked!"
        );

        assert_eq!(message(run(&mut a, "commit;")), "Transaction committed.");
        assert_eq!(
            message(run(&mut a, "commit;")),
            "!Failed to commit because no transaction is active."
        );
        assert_eq!(rows(run(&mut b, "select * from product;"))[1], "1|Gizmo|1");
    }

    #[test]
    fn test_syntax_error() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_at(tmp.path()).unwrap();
        let mut s = db.session();
        let msg = message(run(&mut s, "FROB the table;"));
        assert!(msg.starts_with("!Syntax error"));
    }
}
