//! Writing rendered reports to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// `study-buddy-session-YYYY-MM-DD.pdf`
pub fn report_filename(date: NaiveDate) -> String {
    format!("study-buddy-session-{}.pdf", date.format("%Y-%m-%d"))
}

/// `study-buddy-progress-YYYY-MM-DD.pdf`
pub fn comparison_filename(date: NaiveDate) -> String {
    format!("study-buddy-progress-{}.pdf", date.format("%Y-%m-%d"))
}

/// Write report bytes to `dir/file_name`, creating the directory if needed.
/// Returns the written path.
pub fn write_report(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(report_filename(date), "study-buddy-session-2026-03-04.pdf");
        assert_eq!(comparison_filename(date), "study-buddy-progress-2026-03-04.pdf");
    }

    #[test]
    fn writes_into_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports").join("march");
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let path = write_report(&out, &report_filename(date), b"%PDF-1.4").unwrap();
        assert_eq!(path, out.join("study-buddy-session-2026-03-14.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let err = write_report(&blocker.join("sub"), "r.pdf", b"x").unwrap_err();
        assert!(err.to_string().contains("failed to create output directory"));
    }
}
