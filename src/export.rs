//! Write a result to CSV, Excel, Parquet or JSON next to the data.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ExportError;
use crate::result::{ResultSet, Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Parquet,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::Xlsx,
        ExportFormat::Parquet,
        ExportFormat::Json,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Json => "json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Parquet => "Parquet",
            ExportFormat::Json => "JSON",
        }
    }
}

fn reader_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bread_\w+\s*\(\s*'((?:[^']|'')+)'").expect("valid regex")
    })
}

fn from_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bFROM\s+((?:"(?:[^"]|"")+"|[\w$]+)(?:\s*\.\s*(?:"(?:[^"]|"")+"|[\w$]+))*)"#)
            .expect("valid regex")
    })
}

/// File name stem for exporting the result of `sql`: the file a `read_*`
/// call reads, else the last part of the first `FROM` object, else `result`.
pub fn export_base_name(sql: &str) -> String {
    let raw = if let Some(caps) = reader_path_re().captures(sql) {
        let path = caps[1].replace("''", "'");
        Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().split('.').next().unwrap_or_default().to_string())
            .unwrap_or_default()
    } else if let Some(caps) = from_object_re().captures(sql) {
        caps[1]
            .rsplit('.')
            .next()
            .map(|part| part.trim().trim_matches('"').replace("\"\"", "\""))
            .unwrap_or_default()
    } else {
        String::new()
    };
    sanitize(&raw)
}

fn sanitize(name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let clean = clean.trim_matches('_');
    if clean.is_empty() {
        "result".to_string()
    } else {
        clean.to_string()
    }
}

/// `dir/base.ext`, or `dir/base_N.ext` for the first N that does not exist.
pub fn unique_path(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let first = dir.join(format!("{base}.{extension}"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{base}_{n}.{extension}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// Write `result` as `format` into `dir`, named after `base`. Returns the
/// path written.
pub fn export_result(
    result: &ResultSet,
    format: ExportFormat,
    dir: &Path,
    base: &str,
) -> Result<PathBuf, ExportError> {
    let path = unique_path(dir, &sanitize(base), format.extension());
    match format {
        ExportFormat::Csv => write_csv(&mut to_frame(result)?, &path)?,
        ExportFormat::Parquet => write_parquet(&mut to_frame(result)?, &path)?,
        ExportFormat::Json => write_json(&mut to_frame(result)?, &path)?,
        ExportFormat::Xlsx => write_xlsx(result, &path)?,
    }
    tracing::info!(path = %path.display(), rows = result.row_count(), "exported result");
    Ok(path)
}

fn to_frame(result: &ResultSet) -> Result<polars::prelude::DataFrame, ExportError> {
    use polars::prelude::{DataFrame, NamedFrom, Series};

    let mut columns = Vec::with_capacity(result.columns.len());
    for (idx, col) in result.columns.iter().enumerate() {
        let cells = result
            .rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(&Value::Null));
        let name = col.name.as_str();
        let series = match col.kind {
            ValueKind::Boolean => {
                let v: Vec<Option<bool>> = cells
                    .map(|c| match c {
                        Value::Boolean(b) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), v)
            }
            ValueKind::Int => {
                let v: Vec<Option<i64>> = cells
                    .map(|c| match c {
                        Value::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                Series::new(name.into(), v)
            }
            ValueKind::Float => {
                let v: Vec<Option<f64>> = cells.map(Value::as_f64).collect();
                Series::new(name.into(), v)
            }
            _ => {
                let v: Vec<Option<String>> = cells
                    .map(|c| (!c.is_null()).then(|| c.to_string()))
                    .collect();
                Series::new(name.into(), v)
            }
        };
        columns.push(series.into());
    }
    Ok(DataFrame::new(columns)?)
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_csv(df: &mut polars::prelude::DataFrame, path: &Path) -> Result<(), ExportError> {
    use polars::prelude::{CsvWriter, SerWriter};
    CsvWriter::new(create(path)?)
        .include_header(true)
        .finish(df)?;
    Ok(())
}

fn write_parquet(df: &mut polars::prelude::DataFrame, path: &Path) -> Result<(), ExportError> {
    use polars::prelude::ParquetWriter;
    let mut writer = BufWriter::new(create(path)?);
    ParquetWriter::new(&mut writer).finish(df)?;
    Ok(())
}

fn write_json(df: &mut polars::prelude::DataFrame, path: &Path) -> Result<(), ExportError> {
    use polars::prelude::{JsonFormat, JsonWriter, SerWriter};
    JsonWriter::new(create(path)?)
        .with_json_format(JsonFormat::Json)
        .finish(df)?;
    Ok(())
}

fn write_xlsx(result: &ResultSet, path: &Path) -> Result<(), ExportError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in result.columns.iter().enumerate() {
        worksheet.write_with_format(0, col as u16, header.name.as_str(), &bold)?;
    }
    for (row_idx, row) in result.rows.iter().enumerate() {
        let r = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let c = col_idx as u16;
            match value {
                Value::Null => continue,
                Value::Boolean(b) => {
                    worksheet.write(r, c, *b)?;
                }
                Value::Int(_) | Value::Float(_) => {
                    worksheet.write(r, c, value.as_f64().unwrap_or_default())?;
                }
                other => {
                    worksheet.write(r, c, &other.to_string())?;
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_name_from_reader_path() {
        assert_eq!(
            export_base_name("SELECT * FROM read_csv('/data/sales.csv', auto_detect = true) LIMIT 100;"),
            "sales"
        );
        assert_eq!(
            export_base_name("SELECT * FROM read_csv('/d/q''s.csv.gz')"),
            "q_s"
        );
    }

    #[test]
    fn test_base_name_from_table() {
        assert_eq!(export_base_name("select a from main.orders where a > 1"), "orders");
        assert_eq!(
            export_base_name("ATTACH 'x.duckdb' AS \"x\";\nSELECT * FROM \"x\".\"main\".\"t1\" LIMIT 100;"),
            "t1"
        );
        assert_eq!(export_base_name("SELECT 1"), "result");
    }

    #[test]
    fn test_existing_file_gets_suffix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sales.csv"), "x").unwrap();
        std::fs::write(dir.path().join("sales_1.csv"), "x").unwrap();
        assert_eq!(
            unique_path(dir.path(), "sales", "csv"),
            dir.path().join("sales_2.csv")
        );
    }

    #[test]
    fn test_csv_export_writes_header_and_nulls() {
        let dir = TempDir::new().unwrap();
        let rs = ResultSet::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Int(1), Value::Text("a".into())],
                vec![Value::Int(2), Value::Null],
            ],
        );
        let path = export_result(&rs, ExportFormat::Csv, dir.path(), "people").unwrap();
        assert_eq!(path, dir.path().join("people.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,name", "1,a", "2,"]);
    }

    #[test]
    fn test_xlsx_export_creates_workbook() {
        let dir = TempDir::new().unwrap();
        let rs = ResultSet::success_info();
        let path = export_result(&rs, ExportFormat::Xlsx, dir.path(), "").unwrap();
        assert_eq!(path, dir.path().join("result.xlsx"));
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }
}
