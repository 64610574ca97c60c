//! The query engine boundary and its DuckDB implementation.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;

use crate::error::{ExecutionError, ExecutionErrorKind};
use crate::result::{ResultSet, Value};
use crate::statement::{first_table_query, select_object, PreviewDirective, Statement};
use crate::worker::CancelToken;

/// Anything that can run a statement to completion.
pub trait QueryEngine: Send + Sync + 'static {
    fn execute(&self, statement: &Statement, cancel: &CancelToken)
        -> Result<ResultSet, ExecutionError>;
}

/// How workers share the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineConcurrency {
    /// Each worker gets its own connection to one shared database instance.
    MultiReader,
    /// Workers queue for a single connection.
    Serialized,
}

pub const ENGINE_CONCURRENCY: EngineConcurrency = EngineConcurrency::MultiReader;

/// DuckDB database shared by every tab. Attachments and extensions loaded by
/// one run are visible to the next.
pub struct DuckDbEngine {
    root: Mutex<Connection>,
}

impl DuckDbEngine {
    pub fn in_memory() -> Result<Self, ExecutionError> {
        let conn = Connection::open_in_memory()?;
        tracing::info!("opened in-memory DuckDB instance");
        Ok(Self {
            root: Mutex::new(conn),
        })
    }

    /// A connection for one worker. Under `Serialized` the caller would hold
    /// the root lock instead.
    fn connection(&self) -> Result<Connection, ExecutionError> {
        let root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(root.try_clone()?)
    }
}

impl QueryEngine for DuckDbEngine {
    fn execute(
        &self,
        statement: &Statement,
        cancel: &CancelToken,
    ) -> Result<ResultSet, ExecutionError> {
        let conn = self.connection()?;
        let parts = statement.parts();
        let Some((last, leading)) = parts.split_last() else {
            return Err(ExecutionError::new(
                ExecutionErrorKind::Other,
                "nothing to execute",
            ));
        };

        for sql in leading {
            cancel.check()?;
            tracing::debug!(sql, "execute_batch");
            conn.execute_batch(sql)?;
        }
        cancel.check()?;

        match &statement.preview {
            None => query(&conn, last, cancel),
            Some(PreviewDirective::FirstTable { catalog, limit }) => {
                conn.execute_batch(last)?;
                preview_first_table(&conn, &statement.sql, catalog, *limit, cancel)
            }
        }
    }
}

fn preview_first_table(
    conn: &Connection,
    attach_sql: &str,
    catalog: &str,
    limit: usize,
    cancel: &CancelToken,
) -> Result<ResultSet, ExecutionError> {
    let first = {
        let mut stmt = conn.prepare(&first_table_query(catalog))?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Some((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            None => None,
        }
    };
    cancel.check()?;

    let Some((schema, table)) = first else {
        tracing::info!(catalog, "attached database has no tables");
        let mut empty = ResultSet::new(vec!["Info".to_string()], Vec::new());
        empty.executed_sql = Some(attach_sql.to_string());
        return Ok(empty);
    };

    let select = select_object(catalog, &schema, &table, limit);
    let mut result = query(conn, &select, cancel)?;
    tracing::debug!(catalog, schema, table, "previewing first table");
    result.chosen_object = Some(table);
    result.executed_sql = Some(format!("{}\n{}", attach_sql.trim_end(), select));
    Ok(result)
}

fn query(conn: &Connection, sql: &str, cancel: &CancelToken) -> Result<ResultSet, ExecutionError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let names: Vec<String> = rows
        .as_ref()
        .map(|s| s.column_names().iter().map(|n| n.to_string()).collect())
        .unwrap_or_default();
    if names.is_empty() {
        return Ok(ResultSet::success_info());
    }

    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        cancel.check()?;
        let record = (0..names.len())
            .map(|idx| row.get_ref(idx).map(to_value))
            .collect::<Result<Vec<_>, _>>()?;
        records.push(record);
    }
    Ok(ResultSet::new(names, records))
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Boolean(b),
        ValueRef::TinyInt(v) => Value::Int(v.into()),
        ValueRef::SmallInt(v) => Value::Int(v.into()),
        ValueRef::Int(v) => Value::Int(v.into()),
        ValueRef::BigInt(v) => Value::Int(v),
        ValueRef::UTinyInt(v) => Value::Int(v.into()),
        ValueRef::USmallInt(v) => Value::Int(v.into()),
        ValueRef::UInt(v) => Value::Int(v.into()),
        ValueRef::UBigInt(v) => i64::try_from(v)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(v.to_string())),
        ValueRef::HugeInt(v) => i64::try_from(v)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(v.to_string())),
        ValueRef::Float(v) => Value::Float(v.into()),
        ValueRef::Double(v) => Value::Float(v),
        ValueRef::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .map(Value::Float)
                .unwrap_or(Value::Text(text))
        }
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        ValueRef::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_CE)
            .map(Value::Date)
            .unwrap_or(Value::Null),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|dt| Value::Timestamp(dt.naive_utc()))
                .unwrap_or(Value::Null)
        }
        other => Value::Text(format!("{other:?}")),
    }
}

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_CE: i32 = 719_163;

#[cfg(test)]
mod tests {
    use super::*;

    fn run(engine: &DuckDbEngine, sql: &str) -> Result<ResultSet, ExecutionError> {
        engine.execute(&Statement::sql(sql), &CancelToken::new())
    }

    #[test]
    fn test_types_map_to_values() {
        let engine = DuckDbEngine::in_memory().unwrap();
        let rs = run(
            &engine,
            "SELECT 1::INTEGER AS i, 2.5::DOUBLE AS f, 'x' AS s, NULL AS n, true AS b, DATE '2024-01-02' AS d",
        )
        .unwrap();
        assert_eq!(rs.headers(), vec!["i", "f", "s", "n", "b", "d"]);
        assert_eq!(
            rs.rows[0],
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Text("x".into()),
                Value::Null,
                Value::Boolean(true),
                Value::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()),
            ]
        );
    }

    #[test]
    fn test_statement_without_result_reports_success() {
        let engine = DuckDbEngine::in_memory().unwrap();
        let rs = run(&engine, "CREATE TABLE t (a INTEGER); INSERT INTO t VALUES (1), (2);")
            .unwrap();
        assert!(rs.row_count() >= 1);
        let rs = run(&engine, "SELECT count(*) AS c FROM t").unwrap();
        assert_eq!(rs.rows[0][0], Value::Int(2));
    }

    #[test]
    fn test_connections_share_one_instance() {
        let engine = DuckDbEngine::in_memory().unwrap();
        run(&engine, "CREATE TABLE shared AS SELECT 42 AS v").unwrap();
        let rs = run(&engine, "SELECT v FROM shared").unwrap();
        assert_eq!(rs.rows[0][0], Value::Int(42));
    }

    #[test]
    fn test_syntax_error_is_classified() {
        let engine = DuckDbEngine::in_memory().unwrap();
        let err = run(&engine, "SELEC 1").unwrap_err();
        assert_eq!(err.kind, ExecutionErrorKind::Syntax);
    }

    #[test]
    fn test_cancelled_token_stops_run() {
        let engine = DuckDbEngine::in_memory().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = engine
            .execute(&Statement::sql("SELECT 1"), &cancel)
            .unwrap_err();
        assert_eq!(err.kind, ExecutionErrorKind::Cancelled);
    }
}
