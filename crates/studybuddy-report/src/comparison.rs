//! Progress comparison between the current and a previous session.

use anyhow::Result;

use studybuddy_core::session::{PreviousSessionData, SessionData};
use studybuddy_core::statistics::{accuracy_delta, format_delta};

use crate::layout::{wrap_to_width, Document, Font, PageWriter, Rgb, Style, LINE_HEIGHT, RIGHT_EDGE};
use crate::session::{ensure_reportable, format_date};

pub const COMPARISON_REPORT_TITLE: &str = "Study Buddy - Progress Comparison Report";

const TITLE: Style = Style::new(20.0, Font::Bold, Rgb::BLACK);
const HEADING: Style = Style::new(14.0, Font::Bold, Rgb::BLACK);
const BODY: Style = Style::new(12.0, Font::Regular, Rgb::BLACK);
const BOLD: Style = Style::new(12.0, Font::Bold, Rgb::BLACK);
const GLYPH: Style = Style::new(12.0, Font::Symbol, Rgb::GREEN);

const LIST_WIDTH: f64 = RIGHT_EDGE - 30.0;

/// Weak areas the previous session had that the current one no longer has,
/// in previous-session order.
pub fn improved_areas<'a>(current: &SessionData, previous: &'a SessionData) -> Vec<&'a str> {
    previous
        .weak_areas
        .iter()
        .filter(|area| !current.weak_areas.contains(*area))
        .map(String::as_str)
        .collect()
}

/// Lay out the comparison report.
pub fn layout_comparison_report(
    current: &SessionData,
    previous: &PreviousSessionData,
) -> Result<Document> {
    ensure_reportable(current)?;
    let mut w = PageWriter::new();

    w.centered(TITLE, COMPARISON_REPORT_TITLE);

    summary(
        &mut w,
        40.0,
        "Current Session",
        &format_date(current.start_time),
        current,
    );
    summary(
        &mut w,
        80.0,
        "Previous Session",
        &format_date(previous.session_date),
        &previous.session,
    );

    w.move_to(120.0);
    w.text(20.0, HEADING, "Progress Analysis");

    let delta = accuracy_delta(current.accuracy(), previous.accuracy());
    let delta_color = if delta >= 0.0 { Rgb::GREEN } else { Rgb::RED };
    w.move_to(128.0);
    w.text(
        20.0,
        BODY.with_color(delta_color),
        &format!("Accuracy Change: {}", format_delta(delta)),
    );

    w.move_to(145.0);
    w.text(20.0, BOLD, "Areas of Improvement:");
    w.move_to(153.0);
    let improved = improved_areas(current, &previous.session);
    if improved.is_empty() {
        w.text(25.0, BODY, "Continue practicing to see improvements");
        w.advance(7.0);
    } else {
        for area in improved {
            list_entry(&mut w, (GLYPH, "✓"), BODY.with_color(Rgb::GREEN), area);
        }
    }

    w.advance(10.0);
    w.keep_together(8.0);
    w.text(20.0, BOLD, "Still Needs Attention:");
    w.advance(8.0);
    let red = BODY.with_color(Rgb::RED);
    for area in &current.weak_areas {
        list_entry(&mut w, (red, "•"), red, area);
    }

    Ok(w.finish(COMPARISON_REPORT_TITLE))
}

fn summary(w: &mut PageWriter, top: f64, heading: &str, date: &str, session: &SessionData) {
    w.move_to(top);
    w.text(20.0, HEADING, heading);
    w.move_to(top + 8.0);
    w.text(20.0, BODY, &format!("Date: {date}"));
    w.move_to(top + 15.0);
    w.text(20.0, BODY, &format!("Accuracy: {:.1}%", session.accuracy()));
    w.move_to(top + 22.0);
    w.text(20.0, BODY, &format!("Questions: {}", session.total_questions));
}

/// Write one marked list entry; entries sit 7mm apart.
fn list_entry(w: &mut PageWriter, marker: (Style, &str), style: Style, text: &str) {
    let lines = wrap_to_width(text, LIST_WIDTH, style.font, style.size);
    w.keep_together((lines.len() - 1) as f64 * LINE_HEIGHT);
    w.text(25.0, marker.0, marker.1);
    w.paragraph(30.0, LIST_WIDTH, style, text);
    w.advance(7.0 - LINE_HEIGHT);
}
