//! Shared CLI definitions for openduck.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::Path;

/// File formats openduck can preview. This is a closed set: files whose
/// extension is not listed here are not offered in the browser.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Parquet columnar format
    Parquet,
    /// Arrow IPC file
    Arrow,
    /// Native DuckDB database file
    Duckdb,
    /// Comma-separated values (delimiter auto-detected)
    Csv,
    /// Gzip-compressed CSV (.csv.gz)
    CsvGz,
    /// JSON document or array
    Json,
    /// JSON Lines / NDJSON (one JSON object per line)
    Jsonl,
    /// SQLite database (.sqlite, .sqlite3, .db)
    Sqlite,
    /// Excel workbook (.xlsx, .xls)
    Excel,
}

/// Every extension recognized by [`FileFormat::from_path`], compound ones included.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &[
    "parquet", "arrow", "duckdb", "csv", "csv.gz", "json", "jsonl", "sqlite", "sqlite3", "db",
    "xlsx", "xls",
];

impl FileFormat {
    /// Detect file format from the file name. `.csv.gz` is matched before the
    /// final extension. Returns None when the extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".csv.gz") && name.len() > ".csv.gz".len() {
            return Some(Self::CsvGz);
        }
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from a single extension string (e.g. "parquet", "csv").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "parquet" => Some(Self::Parquet),
            "arrow" => Some(Self::Arrow),
            "duckdb" => Some(Self::Duckdb),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::Jsonl),
            "sqlite" | "sqlite3" | "db" => Some(Self::Sqlite),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// True for formats that are mounted with ATTACH rather than read directly.
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Duckdb | Self::Sqlite)
    }
}

/// Command-line arguments for openduck
#[derive(Clone, Parser, Debug)]
#[command(
    name = "openduck",
    version,
    about = "Browse, preview and query local data files with DuckDB",
    long_about = "openduck is a terminal client for local data files. Pick a Parquet, Arrow, CSV, \
JSON, Excel, SQLite or DuckDB file in the browser to open a preview tab, edit the SQL, and run \
it against an embedded DuckDB engine. Queries run in the background, every tab keeps its own \
result, and history plus saved queries persist between sessions."
)]
pub struct Args {
    /// File to open in a preview tab, or directory to browse (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Treat PATH as this format instead of detecting it from the extension
    #[arg(long = "format", value_enum)]
    pub format: Option<FileFormat>,

    /// Number of rows a file preview selects (default: 100)
    #[arg(long = "preview-limit", value_name = "N")]
    pub preview_limit: Option<usize>,

    /// Use this file for history and saved queries instead of the cache directory
    #[arg(long = "store", value_name = "FILE")]
    pub store: Option<std::path::PathBuf>,

    /// Enable debug mode to show operational information and verbose logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data (history, saved queries, logs) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Clear query history but keep saved queries, then exit
    #[arg(long = "clear-history", action)]
    pub clear_history: bool,

    /// Write the default configuration file and exit
    #[arg(long = "write-config", action)]
    pub write_config: bool,

    /// Overwrite an existing configuration file (with --write-config)
    #[arg(long = "force", action, requires = "write_config")]
    pub force: bool,
}

/// `<a> <b>` for the value names an argument declares.
fn placeholders(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .unwrap_or_default()
        .iter()
        .map(|name| format!("<{}>", name.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// How an argument is written on the command line, e.g. `--store <FILE>`.
fn option_label(arg: &clap::Arg) -> String {
    if arg.is_positional() {
        let names = placeholders(arg);
        return if arg.is_required_set() {
            names
        } else {
            format!("[{names}]")
        };
    }

    let flags = arg
        .get_short()
        .map(|c| format!("-{c}"))
        .into_iter()
        .chain(arg.get_long().map(|l| format!("--{l}")))
        .collect::<Vec<_>>()
        .join(", ");
    if arg.get_action().takes_values() && arg.get_value_names().is_some() {
        format!("{flags} {}", placeholders(arg))
    } else {
        flags
    }
}

/// Command-line options as a markdown page, printed by `gen_docs`.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let rows: Vec<(String, String)> = cmd
        .get_arguments()
        .filter(|arg| !matches!(arg.get_id().as_str(), "help" | "version"))
        .map(|arg| {
            let help = arg
                .get_help()
                .map(|h| h.to_string().replace('|', "\\|").replace(['\n', '\r'], " "))
                .unwrap_or_else(|| "-".to_string());
            (option_label(arg), help)
        })
        .collect();

    let mut out = format!(
        "# Command Line Options\n\n## Usage\n\n```\n{}\n```\n\n## Options\n\n",
        cmd.render_usage()
    );
    out.push_str("| Option | Description |\n|--------|-------------|\n");
    for (label, help) in rows {
        out.push_str(&format!("| `{label}` | {help} |\n"));
    }
    out
}
