//! Typed result rows as produced by the engine and shown by a tab.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Text shown for SQL NULL.
pub const NULL_DISPLAY: &str = "NULL";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// The type a column was inferred to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Int,
    Float,
    Text,
    Blob,
    Date,
    Timestamp,
    /// Only NULLs were seen.
    Null,
    /// Values of more than one kind were seen.
    Mixed,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Blob(_) => ValueKind::Blob,
            Value::Date(_) => ValueKind::Date,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Ordering used by the result view: NULLs sort last, numbers compare
    /// numerically across Int/Float, everything else of differing kinds
    /// compares by its display text.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str(NULL_DISPLAY),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
}

/// One finished query result. Shared between the tab and the renderer
/// behind an `Arc`, never mutated after the worker builds it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
    /// Table picked by a preview directive, e.g. the first table of an
    /// attached database.
    pub chosen_object: Option<String>,
    /// SQL actually run when it differs from the submitted text.
    pub executed_sql: Option<String>,
}

impl ResultSet {
    /// Build a result and infer each column's kind from its values.
    pub fn new(names: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| Column {
                name,
                kind: infer_kind(rows.iter().filter_map(|r| r.get(idx))),
            })
            .collect();
        Self {
            columns,
            rows,
            chosen_object: None,
            executed_sql: None,
        }
    }

    /// Result for a statement that returned no result set.
    pub fn success_info() -> Self {
        Self::new(
            vec!["Info".to_string()],
            vec![vec![Value::Text("Success".to_string())]],
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Copy of the given rows, in the given order, with the same columns.
    pub fn subset(&self, rows: &[usize]) -> ResultSet {
        ResultSet {
            columns: self.columns.clone(),
            rows: rows
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
            chosen_object: self.chosen_object.clone(),
            executed_sql: self.executed_sql.clone(),
        }
    }
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a Value>) -> ValueKind {
    let mut seen = ValueKind::Null;
    for v in values {
        let kind = v.kind();
        seen = match (seen, kind) {
            (_, ValueKind::Null) => seen,
            (ValueKind::Null, k) => k,
            (ValueKind::Int, ValueKind::Float) | (ValueKind::Float, ValueKind::Int) => {
                ValueKind::Float
            }
            (s, k) if s == k => s,
            _ => return ValueKind::Mixed,
        };
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_inference_skips_nulls_and_widens_numbers() {
        let rs = ResultSet::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![
                vec![Value::Null, Value::Int(1), Value::Text("x".into()), Value::Null],
                vec![Value::Int(2), Value::Float(1.5), Value::Int(3), Value::Null],
            ],
        );
        let kinds: Vec<ValueKind> = rs.columns.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::Int,
                ValueKind::Float,
                ValueKind::Mixed,
                ValueKind::Null
            ]
        );
    }

    #[test]
    fn test_sort_cmp_puts_nulls_last_and_mixes_numbers() {
        let mut values = vec![
            Value::Float(2.5),
            Value::Null,
            Value::Int(3),
            Value::Int(-1),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![Value::Int(-1), Value::Float(2.5), Value::Int(3), Value::Null]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Blob(vec![1, 2, 3]).to_string(), "<3 bytes>");
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-02-29");
    }

    #[test]
    fn test_success_info() {
        let rs = ResultSet::success_info();
        assert_eq!(rs.headers(), vec!["Info".to_string()]);
        assert_eq!(rs.row_count(), 1);
    }
}
