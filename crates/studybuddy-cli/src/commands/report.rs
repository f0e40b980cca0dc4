//! The `studybuddy report` command, plus the report writing shared with
//! `studybuddy quiz`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use studybuddy_core::session::{PreviousSessionData, SessionData};
use studybuddy_report::{
    comparison_filename, generate_comparison_report, generate_session_report, report_filename,
    write_report,
};

pub fn execute(
    session_path: PathBuf,
    previous_path: Option<PathBuf>,
    output: PathBuf,
    data_url: bool,
) -> Result<()> {
    let session = SessionData::load_json(&session_path)?;
    let previous = previous_path
        .as_deref()
        .map(PreviousSessionData::load_json)
        .transpose()?;

    write_reports(&session, previous.as_ref(), &output, data_url)?;
    Ok(())
}

/// Render the session report, and the comparison report when a previous
/// session is given, into `output`.
pub(crate) fn write_reports(
    session: &SessionData,
    previous: Option<&PreviousSessionData>,
    output: &Path,
    data_url: bool,
) -> Result<Vec<PathBuf>> {
    let date = session.start_time.date_naive();
    let mut written = Vec::new();

    let report = generate_session_report(session).context("failed to render session report")?;
    let path = write_report(output, &report_filename(date), &report.bytes)?;
    eprintln!("Session report: {}", path.display());
    written.push(path);
    if data_url {
        println!("{}", report.data_url());
    }

    if let Some(previous) = previous {
        let comparison = generate_comparison_report(session, previous)
            .context("failed to render comparison report")?;
        let path = write_report(output, &comparison_filename(date), &comparison.bytes)?;
        eprintln!("Progress report: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Save the session as JSON next to its reports.
pub(crate) fn save_session(session: &SessionData, output: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory: {}", output.display()))?;
    let timestamp = session.start_time.format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("session-{timestamp}.json"));
    session.save_json(&path)?;
    eprintln!("Session saved to: {}", path.display());
    Ok(path)
}
