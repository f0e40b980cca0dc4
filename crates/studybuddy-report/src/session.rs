//! Single-session report.

use anyhow::Result;
use chrono::{DateTime, Utc};

use studybuddy_core::model::EvaluationResult;
use studybuddy_core::session::SessionData;

use crate::layout::{
    text_width, wrap_to_width, Document, Font, PageWriter, Rgb, Style, LINE_HEIGHT, PAGE_WIDTH,
    RIGHT_EDGE,
};

pub const SESSION_REPORT_TITLE: &str = "Study Buddy - Session Report";

const TITLE: Style = Style::new(20.0, Font::Bold, Rgb::BLACK);
const BODY: Style = Style::new(12.0, Font::Regular, Rgb::BLACK);
const BOLD: Style = Style::new(12.0, Font::Bold, Rgb::BLACK);
const GLYPH: Style = Style::new(12.0, Font::Symbol, Rgb::BLACK);
const TAG: Style = Style::new(8.0, Font::Bold, Rgb::BLACK);

const QUESTION_WIDTH: f64 = RIGHT_EDGE - 25.0;
const ANSWER_WIDTH: f64 = PAGE_WIDTH - 55.0;
const WEAK_AREA_WIDTH: f64 = RIGHT_EDGE - 28.0;

/// Date as shown on reports, e.g. `March 14, 2026`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `N minutes` under an hour, otherwise `Hh Mm`. Partial minutes are
/// dropped.
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let minutes = (end - start).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes} minutes")
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

/// Fail on sessions with nothing to report.
pub(crate) fn ensure_reportable(session: &SessionData) -> Result<()> {
    if session.total_questions == 0 || session.results.is_empty() {
        anyhow::bail!("cannot render a report for a session with no answered questions");
    }
    Ok(())
}

/// Lay out the report for one finished session.
pub fn layout_session_report(session: &SessionData) -> Result<Document> {
    ensure_reportable(session)?;
    let mut w = PageWriter::new();

    w.centered(TITLE, SESSION_REPORT_TITLE);

    w.move_to(35.0);
    w.text(20.0, BODY, &format!("Session Date: {}", format_date(session.start_time)));
    let end = session.end_time.unwrap_or(session.start_time);
    w.move_to(42.0);
    w.text(
        20.0,
        BODY,
        &format!("Duration: {}", format_duration(session.start_time, end)),
    );

    summary_box(&mut w, session);
    weak_areas(&mut w, &session.weak_areas);

    // Leave room for the heading plus at least one item.
    if w.y() > 250.0 {
        w.page_break();
    } else {
        w.advance(10.0);
    }
    w.text(20.0, BOLD, "Question-by-Question Analysis:");
    w.advance(10.0);

    for (i, result) in session.results.iter().enumerate() {
        question_item(&mut w, i + 1, result);
    }

    Ok(w.finish(SESSION_REPORT_TITLE))
}

fn summary_box(w: &mut PageWriter, session: &SessionData) {
    w.rect(20.0, 50.0, PAGE_WIDTH - 40.0, 30.0, Rgb::SUMMARY_FILL);

    w.move_to(58.0);
    w.text(25.0, BOLD, "Session Summary");
    w.move_to(66.0);
    w.text(25.0, BODY, &format!("Total Questions: {}", session.total_questions));
    w.move_to(73.0);
    w.text(25.0, BODY, &format!("Correct: {}", session.correct_count));
    w.text(
        80.0,
        BODY.with_color(Rgb::RED),
        &format!("Incorrect: {}", session.incorrect_count),
    );
    w.text(140.0, BOLD, &format!("Accuracy: {:.1}%", session.accuracy()));
}

fn weak_areas(w: &mut PageWriter, areas: &[String]) {
    w.move_to(95.0);
    w.text(20.0, BOLD, "Areas to Focus On:");
    w.move_to(103.0);

    for area in areas {
        let lines = wrap_to_width(area, WEAK_AREA_WIDTH, BODY.font, BODY.size);
        w.keep_together((lines.len() - 1) as f64 * LINE_HEIGHT);
        w.text(23.0, BODY, "•");
        w.paragraph(28.0, WEAK_AREA_WIDTH, BODY, area);
        // Entries sit 7mm apart; the paragraph already moved one line.
        w.advance(7.0 - LINE_HEIGHT);
    }
}

/// Vertical span of an item's baselines, used to keep it on one page.
fn item_extent(result: &EvaluationResult) -> f64 {
    let question = wrap_to_width(&result.question.prompt, QUESTION_WIDTH, BODY.font, BODY.size).len();
    let mut extent = 7.0 + (question - 1) as f64 * LINE_HEIGHT;
    if !result.is_correct {
        let yours = answer_lines(&your_answer(result));
        let correct = answer_lines(&correct_answer(result));
        extent += LINE_HEIGHT + 3.0 + yours as f64 * LINE_HEIGHT + 3.0 + (correct - 1) as f64 * LINE_HEIGHT;
    }
    extent
}

fn answer_lines(text: &str) -> usize {
    wrap_to_width(text, ANSWER_WIDTH, BODY.font, BODY.size).len()
}

fn your_answer(result: &EvaluationResult) -> String {
    format!("Your answer: {}", result.displayed_answer)
}

fn correct_answer(result: &EvaluationResult) -> String {
    format!("Correct answer: {}", result.displayed_correct_answer)
}

fn question_item(w: &mut PageWriter, number: usize, result: &EvaluationResult) {
    w.keep_together(item_extent(result));

    let (glyph, color) = if result.is_correct {
        ("✓", Rgb::GREEN)
    } else {
        ("✗", Rgb::RED)
    };
    let label = format!("{number}. ");
    w.text(20.0, BOLD.with_color(color), &label);
    let glyph_x = 20.0 + text_width(&label, BOLD.font, BOLD.size);
    w.text(glyph_x, GLYPH.with_color(color), glyph);
    w.text(
        glyph_x + 6.0,
        TAG,
        &format!("[{}]", result.question.kind.tag()),
    );
    w.advance(7.0);

    w.paragraph(25.0, QUESTION_WIDTH, BODY, &result.question.prompt);
    w.advance(3.0);

    if result.is_correct {
        w.advance(3.0);
        return;
    }

    w.paragraph(
        25.0,
        ANSWER_WIDTH,
        BODY.with_color(Rgb::RED),
        &your_answer(result),
    );
    w.advance(3.0);
    w.paragraph(
        25.0,
        ANSWER_WIDTH,
        BODY.with_color(Rgb::GREEN),
        &correct_answer(result),
    );
    w.advance(5.0);
}
