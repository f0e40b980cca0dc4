//! Study-session aggregates with JSON persistence.
//!
//! A [`StudySession`] is created when the learner starts studying, collects
//! the results of every quiz they finish, and is frozen into
//! [`SessionData`] when the session ends and the report is generated.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::EvaluationResult;
use crate::statistics::{accuracy, average_percentage};

/// Characters of a question kept in a weak-area snippet.
pub const WEAK_AREA_PREFIX_CHARS: usize = 80;
/// Maximum number of weak areas recorded per session.
pub const MAX_WEAK_AREAS: usize = 10;

/// One finished quiz within a study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub score: usize,
    pub total: usize,
    pub topic: String,
    pub completed_at: DateTime<Utc>,
}

impl QuizRecord {
    /// Whole-percent score for history listings.
    pub fn percentage(&self) -> u32 {
        average_percentage([(self.score, self.total)])
    }
}

/// The in-progress learning session, passed explicitly through the app.
#[derive(Debug, Clone)]
pub struct StudySession {
    id: Uuid,
    start_time: DateTime<Utc>,
    results: Vec<EvaluationResult>,
    history: Vec<QuizRecord>,
}

impl StudySession {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: now,
            results: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Every result recorded so far, oldest quiz first.
    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    pub fn history(&self) -> &[QuizRecord] {
        &self.history
    }

    /// Append the results of a completed quiz.
    pub fn record_quiz(
        &mut self,
        topic: &str,
        results: &[EvaluationResult],
        completed_at: DateTime<Utc>,
    ) -> &QuizRecord {
        let score = results.iter().filter(|r| r.is_correct).count();
        self.results.extend_from_slice(results);
        self.history.push(QuizRecord {
            score,
            total: results.len(),
            topic: if topic.trim().is_empty() {
                "Quiz".to_string()
            } else {
                topic.to_string()
            },
            completed_at,
        });
        &self.history[self.history.len() - 1]
    }

    /// Mean quiz percentage over the session, rounded to a whole percent.
    pub fn average_score(&self) -> u32 {
        average_percentage(self.history.iter().map(|q| (q.score, q.total)))
    }

    /// Freeze the session for reporting.
    pub fn finish(&self, end: DateTime<Utc>) -> Result<SessionData, SessionError> {
        if self.history.is_empty() {
            return Err(SessionError::NoQuizzes);
        }
        if end < self.start_time {
            return Err(SessionError::InvalidTimeRange);
        }

        let correct_count = self.results.iter().filter(|r| r.is_correct).count();
        Ok(SessionData {
            id: self.id,
            start_time: self.start_time,
            end_time: Some(end),
            results: self.results.clone(),
            total_questions: self.results.len(),
            correct_count,
            incorrect_count: self.results.len() - correct_count,
            weak_areas: weak_areas(&self.results),
        })
    }
}

/// Snippets of the questions answered incorrectly, in result order.
///
/// Duplicates are kept; the list is capped at [`MAX_WEAK_AREAS`].
pub fn weak_areas(results: &[EvaluationResult]) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.is_correct)
        .map(|r| weak_area_snippet(&r.question.prompt))
        .take(MAX_WEAK_AREAS)
        .collect()
}

fn weak_area_snippet(prompt: &str) -> String {
    let prefix: String = prompt.chars().take(WEAK_AREA_PREFIX_CHARS).collect();
    format!("{prefix}...")
}

/// A finished study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub results: Vec<EvaluationResult>,
    pub total_questions: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    #[serde(default)]
    pub weak_areas: Vec<String>,
}

impl SessionData {
    /// Accuracy percentage, one decimal.
    pub fn accuracy(&self) -> f64 {
        accuracy(self.correct_count, self.total_questions)
    }

    /// Save the session as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session to {}", path.display()))?;
        Ok(())
    }

    /// Load a session saved with [`SessionData::save_json`].
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session from {}", path.display()))?;
        let session: SessionData =
            serde_json::from_str(&content).context("failed to parse session JSON")?;
        session.check_counts()?;
        Ok(session)
    }

    fn check_counts(&self) -> Result<()> {
        anyhow::ensure!(
            self.correct_count + self.incorrect_count == self.total_questions,
            "session counts disagree: {} correct + {} incorrect != {} total",
            self.correct_count,
            self.incorrect_count,
            self.total_questions
        );
        Ok(())
    }

    /// View this session as the "previous" side of a comparison.
    pub fn into_previous(self) -> PreviousSessionData {
        PreviousSessionData {
            session_date: self.start_time,
            session: self,
        }
    }
}

/// An earlier session supplied for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousSessionData {
    #[serde(flatten)]
    pub session: SessionData,
    pub session_date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PreviousSessionFile {
    #[serde(flatten)]
    session: SessionData,
    #[serde(default)]
    session_date: Option<DateTime<Utc>>,
}

impl PreviousSessionData {
    /// Load a previous session.
    ///
    /// Accepts files with or without `session_date`; when it is missing
    /// the session's start time is used.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read previous session from {}", path.display()))?;
        let file: PreviousSessionFile =
            serde_json::from_str(&content).context("failed to parse previous session JSON")?;
        file.session.check_counts()?;
        Ok(PreviousSessionData {
            session_date: file.session_date.unwrap_or(file.session.start_time),
            session: file.session,
        })
    }

    pub fn accuracy(&self) -> f64 {
        self.session.accuracy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;
    use chrono::{Duration, TimeZone};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, minute, 0).unwrap()
    }

    fn result(prompt: &str, ok: bool) -> EvaluationResult {
        EvaluationResult {
            question: Question::short_answer(prompt, "answer"),
            displayed_answer: "mine".into(),
            displayed_correct_answer: "answer".into(),
            is_correct: ok,
        }
    }

    #[test]
    fn finishing_without_quizzes_is_rejected() {
        let session = StudySession::start(at(0));
        assert_eq!(session.finish(at(5)), Err(SessionError::NoQuizzes));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut session = StudySession::start(at(30));
        session.record_quiz("Biology", &[result("Q", true)], at(31));
        assert_eq!(session.finish(at(10)), Err(SessionError::InvalidTimeRange));
    }

    #[test]
    fn counts_accumulate_across_quizzes() {
        let mut session = StudySession::start(at(0));
        session.record_quiz("Biology", &[result("A", true), result("B", false)], at(10));
        let second = session.record_quiz("", &[result("C", true)], at(20)).clone();
        assert_eq!(second.topic, "Quiz");
        assert_eq!(second.percentage(), 100);

        let data = session.finish(at(25)).unwrap();
        assert_eq!(data.total_questions, 3);
        assert_eq!(data.correct_count, 2);
        assert_eq!(data.incorrect_count, 1);
        assert_eq!(data.correct_count + data.incorrect_count, data.total_questions);
        assert_eq!(data.end_time, Some(at(25)));
        assert!((data.accuracy() - 66.7).abs() < 1e-9);
        assert_eq!(session.average_score(), 75);
    }

    #[test]
    fn weak_areas_are_truncated_capped_and_may_repeat() {
        let long_prompt = "x".repeat(120);
        let mut results = vec![result(&long_prompt, false), result("Short one", false)];
        results.push(result("Short one", false));
        results.push(result("Correct", true));
        results.extend((0..20).map(|i| result(&format!("Filler {i}"), false)));

        let areas = weak_areas(&results);
        assert_eq!(areas.len(), MAX_WEAK_AREAS);
        assert_eq!(areas[0], format!("{}...", "x".repeat(80)));
        assert_eq!(areas[1], "Short one...");
        assert_eq!(areas[2], "Short one...");
        assert!(!areas.iter().any(|a| a.starts_with("Correct")));
    }

    #[test]
    fn weak_area_truncation_respects_char_boundaries() {
        let prompt = "é".repeat(100);
        let areas = weak_areas(&[result(&prompt, false)]);
        assert_eq!(areas[0].chars().count(), 83);
    }

    #[test]
    fn json_roundtrip_and_previous_loading() {
        let mut session = StudySession::start(at(0));
        session.record_quiz("Chem", &[result("Q1", true), result("Q2", false)], at(3));
        let data = session.finish(at(4)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions").join("session.json");
        data.save_json(&path).unwrap();

        let loaded = SessionData::load_json(&path).unwrap();
        assert_eq!(loaded, data);

        let previous = PreviousSessionData::load_json(&path).unwrap();
        assert_eq!(previous.session_date, at(0));
        assert_eq!(previous.session.weak_areas, vec!["Q2...".to_string()]);
    }

    #[test]
    fn previous_session_date_is_read_when_present() {
        let mut session = StudySession::start(at(0));
        session.record_quiz("Chem", &[result("Q1", true)], at(3));
        let mut previous = session.finish(at(4)).unwrap().into_previous();
        previous.session_date = at(0) - Duration::days(7);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previous.json");
        std::fs::write(&path, serde_json::to_string(&previous).unwrap()).unwrap();

        let loaded = PreviousSessionData::load_json(&path).unwrap();
        assert_eq!(loaded.session_date, at(0) - Duration::days(7));
        assert_eq!(loaded.accuracy(), 100.0);
    }

    #[test]
    fn inconsistent_counts_are_rejected() {
        let mut session = StudySession::start(at(0));
        session.record_quiz("Chem", &[result("Q1", true)], at(3));
        let mut data = session.finish(at(4)).unwrap();
        data.incorrect_count = 5;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();
        assert!(SessionData::load_json(&path).is_err());
    }
}
