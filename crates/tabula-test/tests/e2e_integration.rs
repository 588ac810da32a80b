//! End-to-end integration tests for Tabula.
//!
//! These tests drive the engine through sessions over a temporary root,
//! and run scripts through the shell's dispatcher.

use tabula_common::{ErrorCode, LockBackend, TabulaError};
use tabula_engine::Comparator;
use tabula_storage::{decode_row, Column, ColumnType, Schema};
use tabula_test::{create_table, rows, run_script, TestDb};

fn people(db: &TestDb) -> tabula_engine::Session {
    let mut session = db.session_in("d");
    create_table(&session, "t", &[("id", "int"), ("name", "varchar(10)")]);
    session.append_row("t", &["1", "a"]).unwrap();
    session
}

#[test]
fn test_schema_is_append_only() {
    let db = TestDb::new();
    let session = db.session_in("d");
    create_table(&session, "t", &[("id", "int"), ("name", "varchar(10)")]);

    session.add_column("t", "price", "float").unwrap();

    let schema = session.read_schema("t").unwrap().unwrap();
    let labels: Vec<&str> = schema.columns().iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["id", "name", "price"]);

    let err = session.add_column("t", "name", "int").unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaViolation);
    assert_eq!(session.read_schema("t").unwrap().unwrap().len(), 3);
}

#[test]
fn test_row_round_trip() {
    let schema = Schema::new(vec![
        Column::new("id", ColumnType::Int).unwrap(),
        Column::new("note", ColumnType::Varchar(20)).unwrap(),
        Column::new("price", ColumnType::Float).unwrap(),
    ]);

    let values = ["-7", "two words", "2.5"];
    let line = schema.encode_row(&values).unwrap();
    assert_eq!(decode_row(&line).values(), &values);
}

#[test]
fn test_varchar_boundary() {
    let db = TestDb::new();
    let mut session = db.session_in("d");
    create_table(&session, "t", &[("code", "varchar(4)")]);

    session.append_row("t", &["abcd"]).unwrap();
    let err = session.append_row("t", &["abcde"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaViolation);
    assert_eq!(rows(&session, "t"), vec!["abcd"]);
}

#[test]
fn test_delete_count_invariant() {
    let db = TestDb::new();
    let mut session = db.session_in("d");
    create_table(&session, "t", &[("id", "int"), ("tag", "varchar(5)")]);
    for (id, tag) in [("1", "x"), ("2", "y"), ("3", "x"), ("4", "z"), ("5", "x")] {
        session.append_row("t", &[id, tag]).unwrap();
    }

    let before = rows(&session, "t").len();
    let removed = session
        .delete_where("t", "tag", "x", Comparator::Equals)
        .unwrap();
    let after = rows(&session, "t");

    assert_eq!(removed, 3);
    assert_eq!(after.len(), before - removed);
    assert!(after.iter().all(|row| !row.ends_with(",x")));
    assert_eq!(session.read_schema("t").unwrap().unwrap().len(), 2);
}

#[test]
fn test_join_emptiness() {
    use tabula_engine::{JoinMode, JoinSpec};

    let db = TestDb::new();
    let mut session = db.session_in("d");
    create_table(&session, "l", &[("id", "int"), ("name", "varchar(5)")]);
    create_table(&session, "r", &[("lid", "int"), ("qty", "int")]);
    session.append_row("l", &["1", "a"]).unwrap();
    session.append_row("l", &["2", "b"]).unwrap();
    session.append_row("r", &["9", "10"]).unwrap();

    let left = JoinSpec::new("l", "id");
    let right = JoinSpec::new("r", "lid");

    let inner = session.join(&left, &right, JoinMode::Inner).unwrap();
    assert_eq!(inner.len(), 1);
    assert_eq!(
        inner[0].values().join("|"),
        "id int|name varchar(5)|lid int|qty int"
    );

    let outer = session.join(&left, &right, JoinMode::LeftOuter).unwrap();
    assert_eq!(outer.len(), 3);
    assert_eq!(outer[1].values(), &["1", "a", "", ""]);
    assert_eq!(outer[2].values(), &["2", "b", "", ""]);
}

#[test]
fn test_transaction_isolation() {
    let db = TestDb::new();
    let mut writer = people(&db);
    let reader = db.session_in("d");

    writer.begin_transaction();
    let modified = writer.update_where("t", "id", "1", "name", "b").unwrap();
    assert_eq!(modified, 1);

    assert_eq!(rows(&reader, "t"), vec!["1,a"]);
    assert!(db.root().join("d").join("t_cache.txt").exists());

    assert_eq!(writer.commit_transaction().unwrap(), 1);
    assert_eq!(rows(&reader, "t"), vec!["1,b"]);
    assert!(!db.root().join("d").join("t_cache.txt").exists());
    assert!(!db.root().join("d").join("t_lock").exists());
}

#[test]
fn test_schema_change_inside_transaction() {
    let db = TestDb::new();
    let mut session = db.session();

    let output = run_script(
        &mut session,
        "CREATE DATABASE d; USE d;\n\
         CREATE TABLE t (id int);\n\
         BEGIN TRANSACTION;\n\
         DELETE FROM t WHERE id = 0;\n\
         ALTER TABLE t ADD extra int;\n\
         COMMIT;\n\
         SELECT * FROM t;",
    );
    let expected = [
        "Database d created.",
        "Using database d.",
        "Table t created.",
        "Transaction starts.",
        "0 records deleted.",
        "Table t modified.",
        "Transaction committed.",
        "id int|extra int",
    ];
    assert_eq!(output.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn test_schema_change_on_locked_table() {
    let db = TestDb::new();
    let mut writer = people(&db);
    let other = db.session_in("d");

    writer.begin_transaction();
    writer.append_row("t", &["2", "b"]).unwrap();

    let err = other.add_column("t", "extra", "int").unwrap_err();
    assert_eq!(err.code(), ErrorCode::LockConflict);

    writer.commit_transaction().unwrap();
    assert_eq!(session_labels(&writer), vec!["id", "name"]);
    assert_eq!(rows(&writer, "t"), vec!["1,a", "2,b"]);
}

fn session_labels(session: &tabula_engine::Session) -> Vec<String> {
    let schema = session.read_schema("t").unwrap().unwrap();
    schema.columns().iter().map(|c| c.label().to_string()).collect()
}

#[test]
fn test_database_switch_inside_transaction() {
    let db = TestDb::new();
    let mut session = people(&db);
    session.create_database("e").unwrap();

    session.begin_transaction();
    session.update_where("t", "id", "1", "name", "b").unwrap();
    session.select_database("e").unwrap();

    assert_eq!(session.commit_transaction().unwrap(), 1);
    assert!(!db.root().join("d").join("t_cache.txt").exists());
    assert!(!db.root().join("d").join("t_lock").exists());

    session.select_database("d").unwrap();
    assert_eq!(rows(&session, "t"), vec!["1,b"]);

    // the lock went with the commit, so the table is writable again
    session.begin_transaction();
    session.append_row("t", &["2", "c"]).unwrap();
    session.commit_transaction().unwrap();
    assert_eq!(rows(&session, "t"), vec!["1,b", "2,c"]);
}

#[test]
fn test_lock_conflict_after_fresh_begin() {
    let db = TestDb::new();
    let mut session = people(&db);

    session.begin_transaction();
    session.update_where("t", "id", "1", "name", "b").unwrap();

    session.begin_transaction();
    let err = session.update_where("t", "id", "1", "name", "c").unwrap_err();
    assert!(err.is_conflict());
    assert!(session.is_aborted());

    assert!(matches!(
        session.commit_transaction(),
        Err(TabulaError::TransactionAborted)
    ));
    assert_eq!(rows(&session, "t"), vec!["1,a"]);
}

#[test]
fn test_lock_conflict_between_sessions() {
    let db = TestDb::with_backend(LockBackend::Memory);
    let mut first = people(&db);
    let mut second = db.session_in("d");

    first.begin_transaction();
    second.begin_transaction();

    first.append_row("t", &["2", "b"]).unwrap();
    let err = second.append_row("t", &["3", "c"]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::LockConflict);

    assert!(second.commit_transaction().is_err());
    first.commit_transaction().unwrap();
    assert_eq!(rows(&first, "t"), vec!["1,a", "2,b"]);

    // The commit released the lock, so a fresh scope can write again.
    second.begin_transaction();
    second.append_row("t", &["3", "c"]).unwrap();
    assert_eq!(rows(&first, "t"), vec!["1,a", "2,b"]);
}

#[test]
fn test_script_session() {
    let db = TestDb::new();
    let mut session = db.session();

    let output = run_script(
        &mut session,
        "-- set up\n\
         CREATE DATABASE d;\n\
         USE d;\n\
         CREATE TABLE t (id int, name varchar(10));\n\
         INSERT INTO t VALUES (1, 'a');\n\
         INSERT INTO t VALUES (2, 'b');\n\
         SELECT * FROM t;\n\
         UPDATE t SET name = 'z' WHERE id = 2;\n\
         DELETE FROM t WHERE id > 5;\n\
         SELECT name FROM t WHERE id != 1;\n\
         DROP TABLE t;\n\
         SELECT * FROM t;\n",
    );

    let expected = [
        "Database d created.",
        "Using database d.",
        "Table t created.",
        "1 new record inserted.",
        "1 new record inserted.",
        "id int|name varchar(10)",
        "1|a",
        "2|b",
        "1 record modified.",
        "0 records deleted.",
        "name varchar(10)",
        "z",
        "Table t deleted.",
        "!Failed to query table t because it does not exist",
    ];
    assert_eq!(output.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn test_script_transaction_across_sessions() {
    let db = TestDb::new();
    let mut writer = db.session();
    let mut reader = db.session();

    run_script(
        &mut writer,
        "CREATE DATABASE d; USE d;\n\
         CREATE TABLE t (id int, name varchar(10));\n\
         INSERT INTO t VALUES (1, 'a');",
    );
    run_script(&mut reader, "USE d;");

    let output = run_script(
        &mut writer,
        "BEGIN TRANSACTION;\nUPDATE t SET name = 'b' WHERE id = 1;",
    );
    assert_eq!(output, "Transaction starts.\n1 record modified.\n");

    let output = run_script(&mut reader, "SELECT * FROM t;");
    assert_eq!(output, "id int|name varchar(10)\n1|a\n");

    let output = run_script(&mut reader, "BEGIN TRANSACTION;\nINSERT INTO t VALUES (3, 'c');");
    assert_eq!(output, "Transaction starts.\n!Error: Table t is locked!\n");

    let output = run_script(&mut writer, "COMMIT;");
    assert_eq!(output, "Transaction committed.\n");

    let output = run_script(&mut reader, "COMMIT;\nSELECT * FROM t;");
    assert_eq!(output, "Transaction abort.\nid int|name varchar(10)\n1|b\n");
}
