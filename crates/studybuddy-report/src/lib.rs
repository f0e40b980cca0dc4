//! studybuddy-report: PDF session and progress reports.
//!
//! Reports are laid out into a [`layout::Document`] first, then encoded as
//! PDF. Layout and encoding are both pure; only [`output::write_report`]
//! touches the filesystem.

pub mod comparison;
pub mod layout;
mod metrics;
pub mod output;
pub mod pdf;
pub mod session;

use anyhow::Result;

use studybuddy_core::session::{PreviousSessionData, SessionData};

pub use output::{comparison_filename, report_filename, write_report};

/// An encoded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
}

impl RenderedReport {
    /// The report as a `data:application/pdf;base64,` URL.
    pub fn data_url(&self) -> String {
        pdf::to_data_url(&self.bytes)
    }
}

/// Render the report for a finished session.
///
/// Fails for a session with no answered questions; the session itself is
/// never modified.
pub fn generate_session_report(session: &SessionData) -> Result<RenderedReport> {
    let document = session::layout_session_report(session)?;
    Ok(RenderedReport {
        bytes: pdf::render_pdf(&document),
    })
}

/// Render a progress comparison against an earlier session.
pub fn generate_comparison_report(
    current: &SessionData,
    previous: &PreviousSessionData,
) -> Result<RenderedReport> {
    let document = comparison::layout_comparison_report(current, previous)?;
    Ok(RenderedReport {
        bytes: pdf::render_pdf(&document),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use studybuddy_core::model::{EvaluationResult, Question};
    use studybuddy_core::session::StudySession;

    fn finished_session(correct: bool) -> SessionData {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let mut session = StudySession::start(start);
        session.record_quiz(
            "Cells",
            &[EvaluationResult {
                question: Question::short_answer("What is the powerhouse of the cell?", "Mitochondria"),
                displayed_answer: "mitochondria".into(),
                displayed_correct_answer: "Mitochondria".into(),
                is_correct: correct,
            }],
            start + Duration::minutes(5),
        );
        session.finish(start + Duration::minutes(10)).unwrap()
    }

    #[test]
    fn session_report_is_a_pdf_with_data_url() {
        let report = generate_session_report(&finished_session(true)).unwrap();
        assert!(report.bytes.starts_with(b"%PDF-1.4"));
        assert!(report.data_url().starts_with("data:application/pdf;base64,JVBERi0xLjQ"));
    }

    #[test]
    fn comparison_report_renders() {
        let previous = finished_session(false).into_previous();
        let report = generate_comparison_report(&finished_session(true), &previous).unwrap();
        let text = String::from_utf8_lossy(&report.bytes);
        assert!(text.contains("Progress Comparison Report"));
        assert!(text.contains("Accuracy Change: +100.0%"));
    }
}
