//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Read file contents, mapping failures to `Error::internal_io`.
pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::internal_io(
                format!("File not found: {}", path.display()),
                Some(operation.to_string()),
            )
        } else {
            Error::internal_io(e.to_string(), Some(operation.to_string()))
        }
    })
}

/// Write content to file atomically (write to .tmp, then rename).
///
/// Readers of a report file always see a complete document.
pub fn write_file_atomic(path: &Path, content: &str, operation: &str) -> Result<()> {
    let filename = path.file_name().ok_or_else(|| {
        Error::internal_io(
            format!("Invalid path: {}", path.display()),
            Some(operation.to_string()),
        )
    })?;

    let tmp_path = path.with_file_name(format!("{}.tmp", filename.to_string_lossy()));

    fs::write(&tmp_path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (write temp)", operation))))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("{} (rename)", operation))))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn read_missing_file_reports_not_found() {
        let err = read_file(Path::new("/nonexistent/tokens.json"), "read tokens").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert!(err.is_not_found());
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_file_atomic(&path, "{}", "write report").unwrap();

        assert_eq!(read_file(&path, "read report").unwrap(), "{}");
        assert!(!dir.path().join("report.json.tmp").exists());
    }

    #[test]
    fn atomic_write_into_missing_dir_fails() {
        let result = write_file_atomic(Path::new("/nonexistent/dir/report.json"), "{}", "write");
        assert!(result.is_err());
    }
}
