//! Quiz generation from study material through a language model.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::Question;
use crate::parser::extract_question_set;
use crate::traits::{CompletionRequest, LlmProvider, QuestionSource};

/// Characters of study material sent along with a generation request.
pub const MATERIAL_CHAR_LIMIT: usize = 4000;

const FORMAT_INSTRUCTIONS: &str = r#" Return ONLY valid JSON in this exact format with no additional text:
{
  "questions": [
    {
      "type": "mcq",
      "question": "question text",
      "options": ["A", "B", "C", "D"],
      "answer": "B",
      "explanation": "explanation text"
    },
    {
      "type": "saq",
      "question": "question text",
      "answer": "short answer",
      "explanation": "explanation text"
    },
    {
      "type": "laq",
      "question": "question text",
      "answer": "detailed answer",
      "explanation": "explanation text"
    }
  ]
}"#;

/// Which kinds of question a generated quiz should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionType {
    /// Multiple choice only.
    #[default]
    Mcq,
    /// Short and long free-text answers.
    Subjective,
    /// All three kinds.
    Mixed,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "mcq"),
            QuestionType::Subjective => write!(f, "subjective"),
            QuestionType::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" => Ok(QuestionType::Mcq),
            "subjective" => Ok(QuestionType::Subjective),
            "mixed" => Ok(QuestionType::Mixed),
            other => Err(format!(
                "unknown question type: {other} (expected mcq, subjective or mixed)"
            )),
        }
    }
}

/// What part of the material the quiz should cover.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Topic(String),
    /// A page range as the learner typed it, e.g. `"3-7"`.
    Pages(String),
}

/// Learner-chosen settings for the next quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    pub question_count: usize,
    pub question_type: QuestionType,
    pub scope: Scope,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: 5,
            question_type: QuestionType::default(),
            scope: Scope::default(),
        }
    }
}

/// How many questions of each kind to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionMix {
    pub choice: usize,
    pub short_answer: usize,
    pub long_answer: usize,
}

impl QuizConfig {
    /// Subjective quizzes are 60% short answers (rounded down) and the rest
    /// long; mixed quizzes are 40% choice, 40% short and the rest long.
    pub fn mix(&self) -> QuestionMix {
        let n = self.question_count;
        match self.question_type {
            QuestionType::Mcq => QuestionMix {
                choice: n,
                short_answer: 0,
                long_answer: 0,
            },
            QuestionType::Subjective => {
                let short_answer = n * 6 / 10;
                QuestionMix {
                    choice: 0,
                    short_answer,
                    long_answer: n - short_answer,
                }
            }
            QuestionType::Mixed => {
                let choice = n * 4 / 10;
                let short_answer = n * 4 / 10;
                QuestionMix {
                    choice,
                    short_answer,
                    long_answer: n - choice - short_answer,
                }
            }
        }
    }
}

/// Build the system prompt for a generation request.
pub fn build_system_prompt(config: &QuizConfig, already_asked: &[String]) -> String {
    let mix = config.mix();
    let mut prompt = match config.question_type {
        QuestionType::Mcq => format!(
            "Generate {} Multiple Choice Questions (MCQs) with 4 options each.",
            mix.choice
        ),
        QuestionType::Subjective => format!(
            "Generate {} Short Answer Questions (SAQs) and {} Long Answer Questions (LAQs).",
            mix.short_answer, mix.long_answer
        ),
        QuestionType::Mixed => format!(
            "Generate {} MCQs with 4 options each, {} SAQs, and {} LAQs.",
            mix.choice, mix.short_answer, mix.long_answer
        ),
    };

    match &config.scope {
        Scope::Topic(topic) if !topic.trim().is_empty() => {
            prompt.push_str(&format!(" Focus specifically on the topic: \"{topic}\"."));
        }
        Scope::Pages(pages) if !pages.trim().is_empty() => {
            prompt.push_str(&format!(" Focus on pages {pages}."));
        }
        _ => {}
    }

    prompt.push_str(FORMAT_INSTRUCTIONS);

    if !already_asked.is_empty() {
        prompt.push_str("\n\nIMPORTANT: Do NOT repeat these previously asked questions:");
        for asked in already_asked {
            prompt.push_str("\n- ");
            prompt.push_str(asked);
        }
    }

    prompt
}

/// Leading slice of the study material that is sent to the model.
pub fn material_excerpt(material: &str) -> String {
    material.chars().take(MATERIAL_CHAR_LIMIT).collect()
}

/// A [`QuestionSource`] that asks a language model to write questions
/// about a piece of study material.
///
/// Remembers every question it has produced and asks the model not to
/// repeat them.
pub struct LlmQuestionSource {
    provider: Arc<dyn LlmProvider>,
    model: String,
    material: String,
    asked: Mutex<Vec<String>>,
}

impl LlmQuestionSource {
    pub fn new(provider: Arc<dyn LlmProvider>, model: &str, material: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
            material: material.to_string(),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompts of every question generated so far.
    pub async fn asked_questions(&self) -> Vec<String> {
        self.asked.lock().await.clone()
    }
}

#[async_trait]
impl QuestionSource for LlmQuestionSource {
    async fn questions(&self, config: &QuizConfig) -> Result<Vec<Question>> {
        if self.material.trim().is_empty() {
            anyhow::bail!("no study material loaded");
        }

        let mut asked = self.asked.lock().await;
        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: build_system_prompt(config, &asked),
            prompt: material_excerpt(&self.material),
            max_tokens: 4096,
            temperature: 0.7,
        };

        tracing::info!(
            provider = self.provider.name(),
            model = %self.model,
            count = config.question_count,
            kind = %config.question_type,
            "generating quiz"
        );

        let response = self
            .provider
            .complete(&request)
            .await
            .context("quiz generation failed")?;
        let questions = extract_question_set(&response.content)?;
        if questions.is_empty() {
            anyhow::bail!("model returned no questions");
        }

        asked.extend(questions.iter().map(|q| q.prompt.clone()));
        tracing::debug!(
            generated = questions.len(),
            latency_ms = response.latency_ms,
            "quiz generated"
        );
        Ok(questions)
    }
}
