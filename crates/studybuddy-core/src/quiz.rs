//! The quiz flow as an explicit state machine.
//!
//! ```text
//! Configuring ─set_questions─▶ Answering(0) ─next…─▶ Answering(n-1)
//!      ▲                          ▲     │                  │ next
//!      │ request_new_quiz   retry │     │ previous         ▼
//!      └──────────── Results ◀────┴─────┴──────────── Evaluating
//!                                  complete_evaluation / fail_evaluation
//! ```
//!
//! Every reset bumps a generation counter. Submitting hands out an
//! [`EvaluationTicket`] carrying the generation it belongs to, so an outcome
//! that arrives after the learner retried or loaded a new question set is
//! recognised as stale and dropped.

use crate::error::QuizError;
use crate::model::{AnswerRecord, EvaluationResult, Question};
use crate::statistics::accuracy;

/// Notice shown when a whole evaluation batch fails.
pub const EVALUATION_FAILED_NOTICE: &str = "Error evaluating answers. Please try again.";

/// Where the quiz flow currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizState {
    /// No question set loaded.
    Configuring,
    /// Showing question `index`.
    Answering { index: usize },
    /// Answers submitted; waiting for the evaluation outcome.
    Evaluating,
    /// Evaluation finished.
    Results(QuizResults),
}

impl QuizState {
    fn name(&self) -> &'static str {
        match self {
            QuizState::Configuring => "configuring",
            QuizState::Answering { .. } => "answering",
            QuizState::Evaluating => "evaluating",
            QuizState::Results(_) => "showing results",
        }
    }
}

/// Evaluated answers for a completed quiz, in question order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResults {
    pub results: Vec<EvaluationResult>,
}

impl QuizResults {
    /// Number of correct answers.
    pub fn score(&self) -> usize {
        self.results.iter().filter(|r| r.is_correct).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Percentage correct, rounded to one decimal.
    pub fn accuracy(&self) -> f64 {
        accuracy(self.score(), self.total())
    }
}

/// Snapshot of a submitted answer sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationTicket {
    pub generation: u64,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerRecord>,
}

/// Evaluated results for a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub generation: u64,
    pub results: Vec<EvaluationResult>,
}

/// What happened on [`QuizSession::next`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved on to question `index`.
    Moved { index: usize },
    /// The last question was answered; evaluate this ticket.
    Submitted(EvaluationTicket),
}

/// One learner's quiz in progress.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    answers: Vec<AnswerRecord>,
    state: QuizState,
    generation: u64,
    notice: Option<&'static str>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            answers: Vec::new(),
            state: QuizState::Configuring,
            generation: 0,
            notice: None,
        }
    }

    pub fn with_questions(questions: Vec<Question>) -> Self {
        let mut session = Self::new();
        session.set_questions(questions);
        session
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// The question currently shown, if answering.
    pub fn current_question(&self) -> Option<(usize, &Question)> {
        match self.state {
            QuizState::Answering { index } => self.questions.get(index).map(|q| (index, q)),
            _ => None,
        }
    }

    /// The answer recorded for the current question, if answering.
    pub fn current_answer(&self) -> Option<&str> {
        match self.state {
            QuizState::Answering { index } => {
                self.answers.get(index).map(|a| a.raw_answer.as_str())
            }
            _ => None,
        }
    }

    /// Results of the last evaluation, if showing them.
    pub fn results(&self) -> Option<&QuizResults> {
        match &self.state {
            QuizState::Results(results) => Some(results),
            _ => None,
        }
    }

    /// Replace the active question set.
    ///
    /// Allowed from any state. Clears every answer slot and discards any
    /// in-flight evaluation.
    pub fn set_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.reset_answers();
        self.state = if self.questions.is_empty() {
            QuizState::Configuring
        } else {
            QuizState::Answering { index: 0 }
        };
        tracing::debug!(
            generation = self.generation,
            count = self.questions.len(),
            "question set replaced"
        );
    }

    /// Overwrite the answer for the current question.
    pub fn record_answer(&mut self, answer: &str) -> Result<(), QuizError> {
        let index = self.answering_index("answer")?;
        self.answers[index].raw_answer = answer.to_string();
        Ok(())
    }

    /// Advance to the next question, or submit after the last one.
    ///
    /// An empty current answer is rejected and the state is left unchanged.
    pub fn next(&mut self) -> Result<Advance, QuizError> {
        let index = self.answering_index("advance")?;
        if self.answers[index].is_empty() {
            return Err(QuizError::EmptyAnswer { index });
        }

        if index + 1 < self.questions.len() {
            self.state = QuizState::Answering { index: index + 1 };
            return Ok(Advance::Moved { index: index + 1 });
        }

        self.state = QuizState::Evaluating;
        tracing::debug!(generation = self.generation, "answers submitted");
        Ok(Advance::Submitted(EvaluationTicket {
            generation: self.generation,
            questions: self.questions.clone(),
            answers: self.answers.clone(),
        }))
    }

    /// Go back one question. No validation of the current answer.
    pub fn previous(&mut self) -> Result<usize, QuizError> {
        let index = self.answering_index("go back")?;
        if index == 0 {
            return Err(QuizError::InvalidTransition {
                action: "go back",
                state: "on the first question",
            });
        }
        self.state = QuizState::Answering { index: index - 1 };
        Ok(index - 1)
    }

    /// Accept an evaluation outcome.
    ///
    /// Returns `false` (and changes nothing) when the outcome belongs to an
    /// older generation or no evaluation is pending.
    pub fn complete_evaluation(&mut self, outcome: EvaluationOutcome) -> bool {
        if outcome.generation != self.generation || self.state != QuizState::Evaluating {
            tracing::debug!(
                outcome = outcome.generation,
                current = self.generation,
                "dropping stale evaluation outcome"
            );
            return false;
        }
        self.state = QuizState::Results(QuizResults {
            results: outcome.results,
        });
        true
    }

    /// Record a batch-level evaluation failure.
    ///
    /// Returns to the last question with every answer kept so the learner
    /// can submit again, and leaves one notice for [`QuizSession::take_notice`].
    /// Stale failures are ignored.
    pub fn fail_evaluation(&mut self, generation: u64, reason: &str) -> bool {
        if generation != self.generation || self.state != QuizState::Evaluating {
            return false;
        }
        tracing::error!(generation, "evaluation failed: {reason}");
        self.state = QuizState::Answering {
            index: self.questions.len().saturating_sub(1),
        };
        self.notice = Some(EVALUATION_FAILED_NOTICE);
        true
    }

    /// The pending notice for the learner, if any. Reading it clears it.
    pub fn take_notice(&mut self) -> Option<&'static str> {
        self.notice.take()
    }

    /// Start the same question set again with blank answers.
    pub fn retry(&mut self) -> Result<(), QuizError> {
        if !matches!(self.state, QuizState::Results(_)) {
            return Err(self.invalid("retry"));
        }
        self.reset_answers();
        self.state = QuizState::Answering { index: 0 };
        Ok(())
    }

    /// Drop the question set and go back to configuring.
    ///
    /// The caller is expected to ask its question source for a new set and
    /// hand it to [`QuizSession::set_questions`].
    pub fn request_new_quiz(&mut self) -> Result<(), QuizError> {
        if !matches!(self.state, QuizState::Results(_) | QuizState::Configuring) {
            return Err(self.invalid("start a new quiz"));
        }
        self.questions.clear();
        self.reset_answers();
        self.state = QuizState::Configuring;
        Ok(())
    }

    fn reset_answers(&mut self) {
        self.generation += 1;
        self.notice = None;
        self.answers = (0..self.questions.len()).map(AnswerRecord::empty).collect();
    }

    fn answering_index(&self, action: &'static str) -> Result<usize, QuizError> {
        match self.state {
            QuizState::Answering { index } => Ok(index),
            _ => Err(self.invalid(action)),
        }
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
