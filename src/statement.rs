//! Statement builder: maps a data file to the SQL that previews it.
//!
//! Everything here is pure string work. Nothing touches the file system, so
//! the mapping is checked against a fixed template table in the tests below.

use std::path::Path;

use openduck_cli::FileFormat;

use crate::error::BuildError;

/// Rows selected by a file preview unless configured otherwise.
pub const PREVIEW_LIMIT: usize = 100;

/// Work the executor has to do itself because the builder cannot know the
/// contents of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewDirective {
    /// After the attach, select from the first table of `catalog` in
    /// catalog order and report which table that was.
    FirstTable { catalog: String, limit: usize },
}

/// SQL text plus an optional preview directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub preview: Option<PreviewDirective>,
}

impl Statement {
    /// Plain SQL typed by the user.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            preview: None,
        }
    }

    /// The individual statements of the text, in order.
    pub fn parts(&self) -> Vec<&str> {
        split_statements(&self.sql)
    }
}

/// Build the preview statement for `path`, detecting the format from its name.
pub fn build_statement(path: &Path) -> Result<Statement, BuildError> {
    build_statement_with_limit(path, PREVIEW_LIMIT)
}

pub fn build_statement_with_limit(path: &Path, limit: usize) -> Result<Statement, BuildError> {
    let format = FileFormat::from_path(path).ok_or_else(|| BuildError::UnsupportedExtension {
        path: path.to_path_buf(),
    })?;
    Ok(build_for_format(path, format, limit))
}

/// Build the preview statement for `path` read as `format`.
pub fn build_for_format(path: &Path, format: FileFormat, limit: usize) -> Statement {
    build_with_alias(path, format, limit, &attach_alias(path))
}

/// Like [`build_for_format`], attaching database files under `alias`
/// instead of the one derived from the file name. Ignored for formats that
/// are read directly.
pub fn build_with_alias(path: &Path, format: FileFormat, limit: usize, alias: &str) -> Statement {
    let p = quote_literal(&path.to_string_lossy());
    let sql = match format {
        FileFormat::Parquet => format!("SELECT * FROM read_parquet({p}) LIMIT {limit};"),
        FileFormat::Arrow => format!(
            "INSTALL arrow FROM community;\nLOAD arrow;\nSELECT * FROM read_arrow({p}) LIMIT {limit};"
        ),
        FileFormat::Csv => {
            format!("SELECT * FROM read_csv({p}, auto_detect = true) LIMIT {limit};")
        }
        FileFormat::CsvGz => format!(
            "SELECT * FROM read_csv({p}, auto_detect = true, compression = 'gzip') LIMIT {limit};"
        ),
        FileFormat::Json => {
            format!("SELECT * FROM read_json({p}, format = 'auto') LIMIT {limit};")
        }
        FileFormat::Jsonl => format!(
            "SELECT * FROM read_json({p}, format = 'newline_delimited') LIMIT {limit};"
        ),
        FileFormat::Excel => format!(
            "INSTALL excel;\nLOAD excel;\nSELECT * FROM read_xlsx({p}) LIMIT {limit};"
        ),
        FileFormat::Duckdb => {
            let alias = alias.to_string();
            return Statement {
                sql: format!(
                    "ATTACH IF NOT EXISTS {p} AS {} (READ_ONLY);",
                    quote_identifier(&alias)
                ),
                preview: Some(PreviewDirective::FirstTable {
                    catalog: alias,
                    limit,
                }),
            };
        }
        FileFormat::Sqlite => {
            let a = quote_identifier(alias);
            format!(
                "INSTALL sqlite;\nLOAD sqlite;\nATTACH IF NOT EXISTS {p} AS {a} (TYPE SQLITE, READ_ONLY);\nSHOW TABLES FROM {a};"
            )
        }
    };
    Statement::sql(sql)
}

/// Single-quoted SQL string literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Double-quoted SQL identifier.
pub fn quote_identifier(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Catalog alias used when attaching a database file: the lower-cased file
/// stem with anything but `[a-z0-9_]` replaced by `_`.
pub fn attach_alias(path: &Path) -> String {
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.split('.').next().unwrap_or(n))
        .unwrap_or_default();
    let mut alias: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if alias.is_empty() {
        alias.push_str("db");
    } else if alias.starts_with(|c: char| c.is_ascii_digit()) {
        alias.insert_str(0, "db_");
    }
    alias
}

/// Query returning `(schema_name, table_name)` of the first table in
/// `catalog`, `main` schema first, then by name.
pub fn first_table_query(catalog: &str) -> String {
    format!(
        "SELECT schema_name, table_name FROM duckdb_tables() WHERE database_name = {} \
         ORDER BY schema_name <> 'main', schema_name, table_name LIMIT 1",
        quote_literal(catalog)
    )
}

pub fn select_object(catalog: &str, schema: &str, table: &str, limit: usize) -> String {
    format!(
        "SELECT * FROM {}.{}.{} LIMIT {limit};",
        quote_identifier(catalog),
        quote_identifier(schema),
        quote_identifier(table)
    )
}

/// Split SQL text on top-level `;`. Quotes and comments are skipped so a `;`
/// inside them does not split. Empty statements are dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    #[derive(PartialEq)]
    enum Mode {
        Code,
        Single,
        Double,
        Line,
        Block,
    }

    let mut parts = Vec::new();
    let mut mode = Mode::Code;
    let mut start = 0;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match mode {
            Mode::Code => match c {
                '\'' => mode = Mode::Single,
                '"' => mode = Mode::Double,
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    chars.next();
                    mode = Mode::Line;
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    mode = Mode::Block;
                }
                ';' => {
                    parts.push(&sql[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
            // Doubled quotes re-enter the same mode on the next char, which
            // is equivalent to treating them as an escape.
            Mode::Single if c == '\'' => mode = Mode::Code,
            Mode::Double if c == '"' => mode = Mode::Code,
            Mode::Line if c == '\n' => mode = Mode::Code,
            Mode::Block if c == '*' && matches!(chars.peek(), Some((_, '/'))) => {
                chars.next();
                mode = Mode::Code;
            }
            _ => {}
        }
    }
    parts.push(&sql[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_only_comments(s))
        .collect()
}

fn is_only_comments(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const DIR: &str = "/data";

    fn build(name: &str) -> Statement {
        build_statement(&PathBuf::from(DIR).join(name)).expect("recognized extension")
    }

    #[test]
    fn test_templates_for_every_recognized_extension() {
        let cases: &[(&str, &str)] = &[
            (
                "t.parquet",
                "SELECT * FROM read_parquet('/data/t.parquet') LIMIT 100;",
            ),
            (
                "t.arrow",
                "INSTALL arrow FROM community;\nLOAD arrow;\nSELECT * FROM read_arrow('/data/t.arrow') LIMIT 100;",
            ),
            (
                "t.csv",
                "SELECT * FROM read_csv('/data/t.csv', auto_detect = true) LIMIT 100;",
            ),
            (
                "t.csv.gz",
                "SELECT * FROM read_csv('/data/t.csv.gz', auto_detect = true, compression = 'gzip') LIMIT 100;",
            ),
            (
                "t.json",
                "SELECT * FROM read_json('/data/t.json', format = 'auto') LIMIT 100;",
            ),
            (
                "t.jsonl",
                "SELECT * FROM read_json('/data/t.jsonl', format = 'newline_delimited') LIMIT 100;",
            ),
            (
                "t.xlsx",
                "INSTALL excel;\nLOAD excel;\nSELECT * FROM read_xlsx('/data/t.xlsx') LIMIT 100;",
            ),
            (
                "t.xls",
                "INSTALL excel;\nLOAD excel;\nSELECT * FROM read_xlsx('/data/t.xls') LIMIT 100;",
            ),
            (
                "t.sqlite",
                "INSTALL sqlite;\nLOAD sqlite;\nATTACH IF NOT EXISTS '/data/t.sqlite' AS \"t\" (TYPE SQLITE, READ_ONLY);\nSHOW TABLES FROM \"t\";",
            ),
            (
                "t.sqlite3",
                "INSTALL sqlite;\nLOAD sqlite;\nATTACH IF NOT EXISTS '/data/t.sqlite3' AS \"t\" (TYPE SQLITE, READ_ONLY);\nSHOW TABLES FROM \"t\";",
            ),
            (
                "t.db",
                "INSTALL sqlite;\nLOAD sqlite;\nATTACH IF NOT EXISTS '/data/t.db' AS \"t\" (TYPE SQLITE, READ_ONLY);\nSHOW TABLES FROM \"t\";",
            ),
        ];

        for (name, expected) in cases {
            let stmt = build(name);
            assert_eq!(stmt.sql, *expected, "template for {name}");
            assert_eq!(stmt.preview, None, "{name} needs no directive");
        }
    }

    #[test]
    fn test_duckdb_file_attaches_and_defers_table_choice() {
        let stmt = build("Archive 2024.duckdb");
        assert_eq!(
            stmt.sql,
            "ATTACH IF NOT EXISTS '/data/Archive 2024.duckdb' AS \"archive_2024\" (READ_ONLY);"
        );
        assert_eq!(
            stmt.preview,
            Some(PreviewDirective::FirstTable {
                catalog: "archive_2024".to_string(),
                limit: 100,
            })
        );
    }

    #[test]
    fn test_unrecognized_extension_is_a_build_error() {
        for name in ["notes.txt", "image.png", "noext", "data.tsv"] {
            let path = PathBuf::from(DIR).join(name);
            assert_eq!(
                build_statement(&path),
                Err(BuildError::UnsupportedExtension { path: path.clone() })
            );
        }
    }

    #[test]
    fn test_uppercase_extension_and_custom_limit() {
        let stmt = build_statement_with_limit(Path::new("/d/SALES.CSV"), 5).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM read_csv('/d/SALES.CSV', auto_detect = true) LIMIT 5;"
        );
    }

    #[test]
    fn test_path_quotes_are_escaped() {
        let stmt = build_statement(Path::new("/d/o'brien.parquet")).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM read_parquet('/d/o''brien.parquet') LIMIT 100;"
        );
    }

    #[test]
    fn test_attach_alias() {
        assert_eq!(attach_alias(Path::new("/x/archive.duckdb")), "archive");
        assert_eq!(attach_alias(Path::new("/x/My-Data.sqlite3")), "my_data");
        assert_eq!(attach_alias(Path::new("/x/2024.db")), "db_2024");
    }

    #[test]
    fn test_explicit_alias_replaces_file_stem() {
        let stmt = build_with_alias(
            Path::new("/b/data.sqlite"),
            FileFormat::Sqlite,
            100,
            "data_2",
        );
        assert!(stmt
            .sql
            .contains("ATTACH IF NOT EXISTS '/b/data.sqlite' AS \"data_2\" (TYPE SQLITE, READ_ONLY);"));
        assert!(stmt.sql.ends_with("SHOW TABLES FROM \"data_2\";"));

        let stmt = build_with_alias(Path::new("/b/data.duckdb"), FileFormat::Duckdb, 10, "data_2");
        assert_eq!(
            stmt.preview,
            Some(PreviewDirective::FirstTable {
                catalog: "data_2".to_string(),
                limit: 10,
            })
        );
    }

    #[test]
    fn test_split_statements() {
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1"]);
        assert_eq!(
            split_statements("SELECT 1;\n SELECT 2; "),
            vec!["SELECT 1", "SELECT 2"]
        );
        assert_eq!(
            split_statements("SELECT 'a;b'; SELECT \"x;y\" FROM t"),
            vec!["SELECT 'a;b'", "SELECT \"x;y\" FROM t"]
        );
        assert_eq!(
            split_statements("SELECT 'it''s;'; -- trailing; comment\n"),
            vec!["SELECT 'it''s;'"]
        );
        assert_eq!(
            split_statements("/* a; b */ SELECT 1;;"),
            vec!["/* a; b */ SELECT 1"]
        );
        assert!(split_statements("  ;  ").is_empty());
    }

    #[test]
    fn test_select_object_quotes_every_part() {
        assert_eq!(
            select_object("archive", "main", "t1", 100),
            "SELECT * FROM \"archive\".\"main\".\"t1\" LIMIT 100;"
        );
    }
}
