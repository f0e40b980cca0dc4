//! Question set loading.
//!
//! Question sets come from TOML or JSON files written by hand, or from the
//! raw text a language model returns when asked to generate a quiz.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionKind};
use crate::options::derive_correct_index;

/// An ordered set of questions with an optional title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_title() -> String {
    "Quiz".to_string()
}

/// Parse a question set file. `.json` files are read as JSON, everything
/// else as TOML.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;

    parse_question_set_str(&content, path)
}

/// Parse question set text, picking the format from `source_path`'s
/// extension.
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    let is_json = source_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
    } else {
        toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
    }
}

/// Load every `.toml` and `.json` question set in a directory tree.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            sets.extend(load_question_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_question_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => tracing::warn!("skipping {}: {e:#}", path.display()),
            }
        }
    }

    Ok(sets)
}

#[derive(Deserialize)]
struct GeneratedQuestions {
    #[serde(default)]
    questions: Vec<Question>,
}

/// Pull the question list out of a model reply.
///
/// Models often wrap the JSON in prose or code fences, so only the span
/// from the first `{` to the last `}` is parsed. A JSON object without a
/// `questions` field yields an empty list.
pub fn extract_question_set(raw: &str) -> Result<Vec<Question>> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &raw[s..=e],
        _ => anyhow::bail!("no JSON object found in model output"),
    };

    let parsed: GeneratedQuestions =
        serde_json::from_str(json).context("failed to parse generated questions")?;
    Ok(parsed.questions)
}

/// A problem found in a question set.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Zero-based question position (if applicable).
    pub question_index: Option<usize>,
    pub message: String,
}

/// Check a question set for questions that will grade poorly.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |index: usize, message: String| {
        warnings.push(ValidationWarning {
            question_index: Some(index),
            message,
        })
    };

    for (i, q) in set.questions.iter().enumerate() {
        if q.prompt.trim().is_empty() {
            warn(i, "question text is empty".into());
        }

        match q.kind {
            QuestionKind::Choice if q.options.is_empty() => {
                warn(
                    i,
                    "choice question has no options; answers are compared as text".into(),
                );
            }
            QuestionKind::Choice => {
                if !derive_correct_index(q).is_resolved() {
                    warn(
                        i,
                        format!(
                            "answer {:?} does not identify any option",
                            q.reference_answer
                        ),
                    );
                }
            }
            QuestionKind::ShortAnswer | QuestionKind::LongAnswer => {
                if !q.options.is_empty() {
                    warn(i, format!("{} question has options that will be ignored", q.kind.tag()));
                }
                if q.reference_answer.trim().is_empty() {
                    warn(i, "reference answer is empty".into());
                }
            }
        }
    }

    if set.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_index: None,
            message: "question set has no questions".into(),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
title = "Cell biology"

[[questions]]
type = "mcq"
question = "Which organelle produces most of the cell's ATP?"
options = ["Nucleus", "Mitochondria", "Ribosome", "Golgi apparatus"]
answer = "B"
explanation = "Oxidative phosphorylation happens in the mitochondria."

[[questions]]
type = "saq"
question = "What molecule carries genetic information?"
answer = "DNA"

[[questions]]
type = "laq"
question = """
Describe the role of the cell membrane.
"""
answer = "It controls what enters and leaves the cell."
"#;

    #[test]
    fn parse_valid_toml() {
        let set = parse_question_set_str(VALID_TOML, &PathBuf::from("cells.toml")).unwrap();
        assert_eq!(set.title, "Cell biology");
        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.questions[0].kind, QuestionKind::Choice);
        assert_eq!(set.questions[0].options.len(), 4);
        assert_eq!(set.questions[1].reference_answer, "DNA");
        assert_eq!(set.questions[2].kind, QuestionKind::LongAnswer);
        assert!(validate_question_set(&set).is_empty());
    }

    #[test]
    fn parse_json_by_extension() {
        let json = r#"{"questions": [{"type": "saq", "question": "2 + 2?", "answer": "4"}]}"#;
        let set = parse_question_set_str(json, &PathBuf::from("set.JSON")).unwrap();
        assert_eq!(set.title, "Quiz");
        assert_eq!(set.questions[0].prompt, "2 + 2?");
        assert!(set.questions[0].explanation.is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_question_set_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn unknown_question_type_is_rejected() {
        let toml = r#"
[[questions]]
type = "essay"
question = "Discuss."
"#;
        assert!(parse_question_set_str(toml, &PathBuf::from("q.toml")).is_err());
    }

    #[test]
    fn extract_from_fenced_model_reply() {
        let raw = "Here is your quiz:\n```json\n{\"questions\": [\
            {\"type\": \"mcq\", \"question\": \"Colour?\", \"options\": [\"Red\", \"Green\"], \"answer\": \"A\"}\
            ]}\n```\nGood luck!";
        let questions = extract_question_set(raw).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["Red", "Green"]);
    }

    #[test]
    fn extract_without_questions_field_is_empty() {
        assert!(extract_question_set("{\"quiz\": []}").unwrap().is_empty());
    }

    #[test]
    fn extract_without_object_fails() {
        assert!(extract_question_set("Sorry, I can't help with that.").is_err());
        assert!(extract_question_set("} backwards {").is_err());
    }

    #[test]
    fn validate_flags_ungradeable_questions() {
        let set = QuestionSet {
            title: "Mixed".into(),
            questions: vec![
                Question::choice("Pick", &[], "A"),
                Question::choice("Pick", &["one", "two"], "42 apples"),
                Question {
                    options: vec!["x".into()],
                    ..Question::short_answer("  ", "")
                },
            ],
        };
        let warnings = validate_question_set(&set);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("no options")));
        assert!(messages.iter().any(|m| m.contains("does not identify")));
        assert!(messages.iter().any(|m| m.contains("question text is empty")));
        assert!(messages.iter().any(|m| m.contains("SAQ question has options")));
        assert!(messages.iter().any(|m| m.contains("reference answer is empty")));
        assert!(warnings.iter().all(|w| w.question_index.is_some()));
    }

    #[test]
    fn validate_empty_set() {
        let set = QuestionSet {
            title: "Empty".into(),
            questions: vec![],
        };
        let warnings = validate_question_set(&set);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].question_index.is_none());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cells.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sets = load_question_directory(dir.path()).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].title, "Cell biology");
    }
}
