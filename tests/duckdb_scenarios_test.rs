//! End-to-end runs against a real in-memory DuckDB instance.

use openduck::engine::DuckDbEngine;
use openduck::error::ExecutionErrorKind;
use openduck::export::ExportFormat;
use openduck::registry::{ApplyOutcome, Dispatched, Intent, RegistryOptions, SessionRegistry};
use openduck::result::Value;
use openduck::session::{Phase, SessionId};
use openduck::store::QueryStore;
use openduck::worker::{Completion, Executor};
use std::fs;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn registry() -> (SessionRegistry, Receiver<Completion>) {
    let engine = DuckDbEngine::in_memory().unwrap();
    let (tx, rx) = channel();
    let executor = Executor::new(Arc::new(engine), 4, move |completion| {
        let _ = tx.send(completion);
    });
    let registry = SessionRegistry::new(
        QueryStore::in_memory(),
        executor,
        RegistryOptions::default(),
    );
    (registry, rx)
}

fn settle(registry: &mut SessionRegistry, rx: &Receiver<Completion>) -> ApplyOutcome {
    let completion = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("query should finish");
    registry.apply_completion(completion)
}

fn run(registry: &mut SessionRegistry, rx: &Receiver<Completion>, id: SessionId, sql: &str) {
    registry
        .dispatch(Intent::Edit(id, sql.to_string()))
        .unwrap();
    registry.dispatch(Intent::Run(id)).unwrap();
    assert_eq!(settle(registry, rx), ApplyOutcome::Applied);
}

fn write_sales(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("sales.csv");
    fs::write(&path, "region,amount\nnorth,10\nsouth,20\neast,5\nnorth,7\n").unwrap();
    path
}

#[test]
fn test_open_csv_previews_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_sales(&dir);
    let (mut registry, rx) = registry();

    let id = registry.open_file(&path, None).unwrap();
    assert_eq!(registry.session(id).unwrap().phase(), Phase::Running);
    assert_eq!(settle(&mut registry, &rx), ApplyOutcome::Applied);

    let session = registry.session(id).unwrap();
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(session.metadata().row_count, Some(4));
    assert!(session.metadata().elapsed.is_some());
    assert!(session.status_line().starts_with("Rows: 4 | Time: "));

    let result = session.last_result().unwrap();
    assert_eq!(result.headers(), vec!["region", "amount"]);
    assert_eq!(result.rows[0][0], Value::Text("north".into()));
    assert_eq!(result.rows[0][1], Value::Int(10));

    let last = registry.store().last_history().unwrap();
    assert!(last.sql.contains("read_csv("));
}

#[test]
fn test_aggregate_over_file_and_export() {
    let dir = TempDir::new().unwrap();
    let path = write_sales(&dir);
    let (mut registry, rx) = registry();
    let id = registry.new_scratch("Main", "");

    let sql = format!(
        "SELECT region, sum(amount) AS total FROM read_csv('{}') GROUP BY region ORDER BY region",
        path.display()
    );
    run(&mut registry, &rx, id, &sql);

    let result = registry.session(id).unwrap().last_result().unwrap().clone();
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.rows[1][0], Value::Text("north".into()));
    assert_eq!(result.rows[1][1].to_string(), "17");

    let out = TempDir::new().unwrap();
    let exported = registry
        .dispatch(Intent::Export {
            session: id,
            format: ExportFormat::Csv,
            dir: out.path().to_path_buf(),
        })
        .unwrap();
    assert_eq!(
        exported,
        Dispatched::Exported(out.path().join("sales.csv"))
    );
    let content = fs::read_to_string(out.path().join("sales.csv")).unwrap();
    assert_eq!(content.lines().next(), Some("region,total"));
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn test_missing_table_is_catalog_error() {
    let (mut registry, rx) = registry();
    let id = registry.new_scratch("Main", "");
    run(&mut registry, &rx, id, "SELECT * FROM no_such_table");

    let session = registry.session(id).unwrap();
    assert_eq!(session.phase(), Phase::Failed);
    let error = session.metadata().error.as_ref().unwrap();
    assert_eq!(error.kind, ExecutionErrorKind::Catalog);
    assert!(error.message.contains("no_such_table"));
}

#[test]
fn test_open_duckdb_file_previews_first_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("archive.duckdb");
    {
        let conn = duckdb::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t2 (x INTEGER); INSERT INTO t2 VALUES (9);
             CREATE TABLE t1 (a INTEGER, b VARCHAR); INSERT INTO t1 VALUES (1, 'one'), (2, 'two');",
        )
        .unwrap();
    }

    let (mut registry, rx) = registry();
    let id = registry.open_file(&path, None).unwrap();
    assert_eq!(settle(&mut registry, &rx), ApplyOutcome::Applied);

    let session = registry.session(id).unwrap();
    assert_eq!(session.phase(), Phase::Completed);
    assert_eq!(session.metadata().chosen_object.as_deref(), Some("t1"));
    assert!(session.status_line().contains("Table: t1"));
    assert_eq!(session.last_result().unwrap().row_count(), 2);
    assert!(session.buffer().starts_with("ATTACH IF NOT EXISTS"));
    assert!(session
        .buffer()
        .contains("SELECT * FROM \"archive\".\"main\".\"t1\" LIMIT 100;"));

    // Running the rewritten buffer again is a plain query now.
    registry.dispatch(Intent::Run(id)).unwrap();
    assert_eq!(settle(&mut registry, &rx), ApplyOutcome::Applied);
    let session = registry.session(id).unwrap();
    assert_eq!(session.last_result().unwrap().row_count(), 2);
}

fn create_database(path: &std::path::Path, table: &str) {
    let conn = duckdb::Connection::open(path).unwrap();
    conn.execute_batch(&format!("CREATE TABLE {table} AS SELECT 1 AS v;"))
        .unwrap();
}

#[test]
fn test_same_named_database_files_preview_their_own_tables() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let first = first_dir.path().join("data.duckdb");
    let second = second_dir.path().join("data.duckdb");
    create_database(&first, "alpha");
    create_database(&second, "beta");

    let (mut registry, rx) = registry();
    let a = registry.open_file(&first, None).unwrap();
    assert_eq!(settle(&mut registry, &rx), ApplyOutcome::Applied);
    let b = registry.open_file(&second, None).unwrap();
    assert_eq!(settle(&mut registry, &rx), ApplyOutcome::Applied);

    let chosen = |id| {
        registry
            .session(id)
            .unwrap()
            .metadata()
            .chosen_object
            .clone()
    };
    assert_eq!(chosen(a).as_deref(), Some("alpha"));
    assert_eq!(chosen(b).as_deref(), Some("beta"));
    assert!(registry
        .session(b)
        .unwrap()
        .buffer()
        .contains("\"data_2\".\"main\".\"beta\""));
}

#[test]
fn test_tabs_share_one_database() {
    let (mut registry, rx) = registry();
    let a = registry.new_scratch("a", "");
    let b = registry.new_scratch("b", "");
    run(&mut registry, &rx, a, "CREATE TABLE shared AS SELECT 1 AS v");
    run(&mut registry, &rx, b, "SELECT v FROM shared");
    assert_eq!(
        registry.session(b).unwrap().last_result().unwrap().rows[0][0],
        Value::Int(1)
    );
}
