//! Core data model types for studybuddy.
//!
//! Questions arrive from a language model or a question file, answers are
//! collected slot by slot, and evaluation turns the pair into an
//! [`EvaluationResult`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three question shapes a quiz can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Multiple choice with labeled options.
    #[serde(rename = "mcq")]
    Choice,
    /// Short free-text answer.
    #[serde(rename = "saq")]
    ShortAnswer,
    /// Long free-text answer.
    #[serde(rename = "laq")]
    LongAnswer,
}

impl QuestionKind {
    /// Short uppercase tag used in reports (`MCQ`, `SAQ`, `LAQ`).
    pub fn tag(&self) -> &'static str {
        match self {
            QuestionKind::Choice => "MCQ",
            QuestionKind::ShortAnswer => "SAQ",
            QuestionKind::LongAnswer => "LAQ",
        }
    }

    pub fn is_free_text(&self) -> bool {
        !matches!(self, QuestionKind::Choice)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Choice => write!(f, "mcq"),
            QuestionKind::ShortAnswer => write!(f, "saq"),
            QuestionKind::LongAnswer => write!(f, "laq"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "choice" | "multiple-choice" => Ok(QuestionKind::Choice),
            "saq" | "short" | "short-answer" => Ok(QuestionKind::ShortAnswer),
            "laq" | "long" | "long-answer" => Ok(QuestionKind::LongAnswer),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// A single quiz question. Immutable once generated for a session.
///
/// Field names on the wire follow the question generator's JSON
/// (`type`, `question`, `options`, `answer`, `explanation`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(rename = "question")]
    pub prompt: String,
    /// Ordered options; only meaningful for choice questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Intended answer. For choice questions this may be a bare letter or
    /// the full option text.
    #[serde(rename = "answer", default)]
    pub reference_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn choice(prompt: &str, options: &[&str], reference: &str) -> Self {
        Self {
            kind: QuestionKind::Choice,
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            reference_answer: reference.to_string(),
            explanation: String::new(),
        }
    }

    pub fn short_answer(prompt: &str, reference: &str) -> Self {
        Self::free_text(QuestionKind::ShortAnswer, prompt, reference)
    }

    pub fn long_answer(prompt: &str, reference: &str) -> Self {
        Self::free_text(QuestionKind::LongAnswer, prompt, reference)
    }

    fn free_text(kind: QuestionKind, prompt: &str, reference: &str) -> Self {
        Self {
            kind,
            prompt: prompt.to_string(),
            options: Vec::new(),
            reference_answer: reference.to_string(),
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        self.explanation = explanation.to_string();
        self
    }

    /// True for a choice question that actually carries options.
    pub fn has_options(&self) -> bool {
        self.kind == QuestionKind::Choice && !self.options.is_empty()
    }
}

/// The learner's answer for one question slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_index: usize,
    pub raw_answer: String,
}

impl AnswerRecord {
    pub fn empty(question_index: usize) -> Self {
        Self {
            question_index,
            raw_answer: String::new(),
        }
    }

    /// Whitespace-only answers count as empty.
    pub fn is_empty(&self) -> bool {
        self.raw_answer.trim().is_empty()
    }
}

/// Outcome of evaluating one answer against its question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub question: Question,
    /// What the learner answered, formatted for review screens.
    pub displayed_answer: String,
    /// The intended answer, formatted for review screens.
    pub displayed_correct_answer: String,
    pub is_correct: bool,
}
