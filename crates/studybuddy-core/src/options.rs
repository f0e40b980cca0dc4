//! Option resolution for choice questions.
//!
//! Maps between an option's position, its letter label and its text, and
//! works out which option the reference answer points at. Reference answers
//! come from the question generator in inconsistent shapes (a bare letter,
//! the full option text, or something close to it), so resolution is an
//! ordered chain of strategies ending in [`Resolution::Unresolved`].

use crate::model::Question;
use crate::normalize::normalize;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Result of resolving an answer to an option index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Zero-based option index.
    Index(usize),
    Unresolved,
}

impl Resolution {
    pub fn index(self) -> Option<usize> {
        match self {
            Resolution::Index(i) => Some(i),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Resolution::Index(_))
    }
}

/// Letter label for an option position: `A`..`Z`, then the 1-based number.
pub fn letter_for_index(index: usize) -> String {
    match LETTERS.get(index) {
        Some(&b) => char::from(b).to_string(),
        None => (index + 1).to_string(),
    }
}

/// Alphabetic position of a letter (`A`/`a` → 0). `None` for non-letters.
pub fn index_for_letter(ch: char) -> Option<usize> {
    let upper = ch.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        Some((upper as u8 - b'A') as usize)
    } else {
        None
    }
}

/// Resolve the leading letter of `raw` to an option index within range.
fn leading_letter_index(raw: &str, option_count: usize) -> Option<usize> {
    raw.trim()
        .chars()
        .next()
        .and_then(index_for_letter)
        .filter(|&i| i < option_count)
}

/// Determine which option the question's reference answer designates.
///
/// Tried in order, first success wins:
/// 1. leading letter of the reference, if it falls within the options;
/// 2. exact normalized text match against an option;
/// 3. loose containment either way between normalized texts;
/// 4. [`Resolution::Unresolved`].
pub fn derive_correct_index(question: &Question) -> Resolution {
    if question.options.is_empty() {
        return Resolution::Unresolved;
    }
    let reference = question.reference_answer.trim();

    if let Some(i) = leading_letter_index(reference, question.options.len()) {
        return Resolution::Index(i);
    }

    let normalized_ref = normalize(reference);
    let normalized_opts: Vec<String> = question.options.iter().map(|o| normalize(o)).collect();

    if let Some(i) = normalized_opts.iter().position(|o| *o == normalized_ref) {
        return Resolution::Index(i);
    }

    if normalized_ref.is_empty() {
        return Resolution::Unresolved;
    }

    normalized_opts
        .iter()
        .position(|o| {
            !o.is_empty() && (normalized_ref.contains(o.as_str()) || o.contains(&normalized_ref))
        })
        .map_or(Resolution::Unresolved, Resolution::Index)
}

/// Determine which option the learner selected.
///
/// The answer may be the option's full text (matched after normalization)
/// or a letter label; text is tried first so an option that starts with a
/// letter-like word is not misread as a label.
pub fn resolve_selection(question: &Question, raw_answer: &str) -> Resolution {
    if question.options.is_empty() {
        return Resolution::Unresolved;
    }

    let normalized_answer = normalize(raw_answer);
    if !normalized_answer.is_empty() {
        if let Some(i) = question
            .options
            .iter()
            .position(|o| normalize(o) == normalized_answer)
        {
            return Resolution::Index(i);
        }
    }

    leading_letter_index(raw_answer, question.options.len())
        .map_or(Resolution::Unresolved, Resolution::Index)
}

/// `"<Letter>. <option text>"` for a valid index.
pub fn labeled_option(question: &Question, index: usize) -> Option<String> {
    question
        .options
        .get(index)
        .map(|text| format!("{}. {}", letter_for_index(index), text))
}

/// Render a letter answer as `"<Letter>. <option text>"`.
///
/// Returns the raw input unchanged when the letter does not resolve to an
/// option.
pub fn format_choice(question: &Question, raw_letter_answer: &str) -> String {
    leading_letter_index(raw_letter_answer, question.options.len())
        .and_then(|i| labeled_option(question, i))
        .unwrap_or_else(|| raw_letter_answer.to_string())
}

/// The learner's answer as shown on review screens.
pub fn display_answer(question: &Question, raw_answer: &str) -> String {
    if !question.has_options() {
        return raw_answer.to_string();
    }
    resolve_selection(question, raw_answer)
        .index()
        .and_then(|i| labeled_option(question, i))
        .unwrap_or_else(|| raw_answer.to_string())
}

/// The intended answer as shown on review screens.
pub fn display_correct_answer(question: &Question) -> String {
    if !question.has_options() {
        return question.reference_answer.clone();
    }
    derive_correct_index(question)
        .index()
        .and_then(|i| labeled_option(question, i))
        .unwrap_or_else(|| question.reference_answer.clone())
}
