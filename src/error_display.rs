//! User-facing error message formatting.
//!
//! Matches on typed errors (ExecutionErrorKind, io::ErrorKind) rather than
//! parsing strings where a type is available. Engine messages are never
//! rewritten; a hint line is added when the kind suggests one.

use std::io;

use crate::error::{
    BuildError, ExecutionError, ExecutionErrorKind, ExportError, PersistenceError, RegistryError,
};

/// Headline for a failed run, shown above the engine's own message.
pub fn headline(err: &ExecutionError) -> &'static str {
    match err.kind {
        ExecutionErrorKind::Syntax => "The query could not be parsed",
        ExecutionErrorKind::Catalog => "A table, column or function was not found",
        ExecutionErrorKind::Io => "A file could not be read",
        ExecutionErrorKind::Extension => "A DuckDB extension could not be loaded",
        ExecutionErrorKind::Cancelled => "The query was cancelled",
        ExecutionErrorKind::Other => "The query failed",
    }
}

/// Extra advice for kinds where the engine message alone is not enough.
pub fn hint(err: &ExecutionError) -> Option<&'static str> {
    match err.kind {
        ExecutionErrorKind::Extension => Some(
            "Extensions are downloaded on first use. Check the network connection, or run \
             INSTALL <name>; once while online.",
        ),
        ExecutionErrorKind::Io if err.message.contains("No files found") => {
            Some("Check that the path in the query exists and is quoted correctly.")
        }
        _ => None,
    }
}

/// Lines shown in the results pane of a failed tab: headline, the engine
/// message verbatim, then an optional hint.
pub fn execution_lines(err: &ExecutionError) -> Vec<String> {
    let mut lines = vec![headline(err).to_string(), String::new()];
    lines.extend(err.message.lines().map(str::to_string));
    if let Some(h) = hint(err) {
        lines.push(String::new());
        lines.push(h.to_string());
    }
    lines
}

/// Format an io::Error by its ErrorKind.
pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check write access.".to_string(),
        ErrorKind::AlreadyExists => "File already exists.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        _ => {
            let msg = err.to_string();
            if msg.contains("No space left") {
                "No space left on device. Free up disk space and try again.".to_string()
            } else if msg.contains("Is a directory") {
                "Path is a directory, not a file.".to_string()
            } else {
                msg
            }
        }
    }
}

pub fn user_message_from_persistence(err: &PersistenceError) -> String {
    match err {
        PersistenceError::Read { path, source } => format!(
            "Could not read query store {}: {}",
            path.display(),
            user_message_from_io(source)
        ),
        PersistenceError::Parse { path, .. } => format!(
            "Query store {} is damaged; starting with empty history. It will be replaced on the next save.",
            path.display()
        ),
        PersistenceError::Write { path, source } => format!(
            "Could not save query store {}: {}",
            path.display(),
            user_message_from_io(source)
        ),
        PersistenceError::Lock { path, source } => format!(
            "Could not lock {}: {}",
            path.display(),
            user_message_from_io(source)
        ),
        PersistenceError::Encode(e) => format!("Could not encode query store: {}", e),
    }
}

pub fn user_message_from_export(err: &ExportError) -> String {
    match err {
        ExportError::Io { path, source } => format!(
            "Export failed for {}: {}",
            path.display(),
            user_message_from_io(source)
        ),
        ExportError::Frame(e) => {
            let text = e.to_string();
            format!(
                "Export failed: {}",
                text.lines().next().unwrap_or("unknown error").trim()
            )
        }
        ExportError::Workbook(e) => format!("Excel export failed: {}", e),
    }
}

pub fn user_message_from_registry(err: &RegistryError) -> String {
    match err {
        RegistryError::Build(BuildError::UnsupportedExtension { path }) => format!(
            "{} is not a supported data file. Supported: {}",
            path.display(),
            openduck_cli::RECOGNIZED_EXTENSIONS.join(", ")
        ),
        RegistryError::Export(e) => user_message_from_export(e),
        RegistryError::EmptyName => "Enter a name for the query.".to_string(),
        RegistryError::NothingToExport(_) => "Run a query before exporting.".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_execution_lines_keep_engine_message() {
        let err = ExecutionError::from_engine_message(
            "Catalog Error: Table with name nope does not exist!\nDid you mean \"t1\"?",
        );
        let lines = execution_lines(&err);
        assert_eq!(lines[0], "A table, column or function was not found");
        assert_eq!(lines[2], "Catalog Error: Table with name nope does not exist!");
        assert_eq!(lines[3], "Did you mean \"t1\"?");
    }

    #[test]
    fn test_extension_error_has_hint() {
        let err = ExecutionError::new(ExecutionErrorKind::Extension, "Extension \"excel\" not found");
        assert!(hint(&err).unwrap().contains("network"));
        assert_eq!(execution_lines(&err).len(), 5);
    }

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file");
        assert!(user_message_from_io(&err).contains("not found"));
    }

    #[test]
    fn test_unsupported_file_lists_formats() {
        let err = RegistryError::Build(BuildError::UnsupportedExtension {
            path: PathBuf::from("notes.txt"),
        });
        let msg = user_message_from_registry(&err);
        assert!(msg.starts_with("notes.txt is not a supported data file"));
        assert!(msg.contains("csv.gz"));
    }
}
