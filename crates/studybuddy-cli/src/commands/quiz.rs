//! The `studybuddy quiz` command.
//!
//! Runs a study session on the terminal: each quiz is answered question by
//! question, graded as a batch, and added to the session. Ending the session
//! saves it as JSON and writes its PDF report.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use studybuddy_core::engine::{EvaluationConfig, EvaluationEngine};
use studybuddy_core::generator::{LlmQuestionSource, QuestionType, QuizConfig, Scope};
use studybuddy_core::judge::{EquivalenceJudge, LlmOracle};
use studybuddy_core::model::Question;
use studybuddy_core::options::letter_for_index;
use studybuddy_core::parser;
use studybuddy_core::quiz::{QuizResults, QuizSession, QuizState};
use studybuddy_core::session::{PreviousSessionData, StudySession};
use studybuddy_core::traits::QuestionSource;
use studybuddy_providers::config::{load_config_from, StudybuddyConfig};

use super::report::{save_session, write_reports};

/// Typed on its own line to go back one question.
const BACK_COMMAND: &str = ":back";

#[derive(Args)]
pub struct QuizArgs {
    /// Question set file (.toml or .json)
    #[arg(long, conflicts_with = "generate", required_unless_present = "generate")]
    pub questions: Option<PathBuf>,

    /// Study material to generate questions from
    #[arg(long)]
    pub generate: Option<PathBuf>,

    /// Questions per quiz (default 5 when generating, all when reading a file)
    #[arg(long)]
    pub count: Option<usize>,

    /// Question type for generated quizzes: mcq, subjective, mixed
    #[arg(long = "type", default_value = "mcq")]
    pub question_type: String,

    /// Limit generated questions to a topic
    #[arg(long, conflicts_with = "pages")]
    pub topic: Option<String>,

    /// Limit generated questions to a page range, e.g. "3-7"
    #[arg(long)]
    pub pages: Option<String>,

    /// Earlier session JSON to compare this session against
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Output directory (defaults to `output_dir` from the config)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Grade free-text answers by text comparison only
    #[arg(long)]
    pub offline: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Serves a question set read from disk, the same questions every quiz.
struct FileQuestionSource {
    questions: Vec<Question>,
    limit: Option<usize>,
}

#[async_trait]
impl QuestionSource for FileQuestionSource {
    async fn questions(&self, _config: &QuizConfig) -> Result<Vec<Question>> {
        let limit = self.limit.unwrap_or(self.questions.len());
        Ok(self.questions.iter().take(limit).cloned().collect())
    }
}

pub async fn execute(args: QuizArgs) -> Result<()> {
    anyhow::ensure!(args.count != Some(0), "--count must be at least 1");

    let config = load_config_from(args.config.as_deref())?;
    let question_type: QuestionType = args.question_type.parse().map_err(anyhow::Error::msg)?;
    let scope = match (&args.topic, &args.pages) {
        (Some(topic), _) => Scope::Topic(topic.clone()),
        (None, Some(pages)) => Scope::Pages(pages.clone()),
        (None, None) => Scope::All,
    };
    let quiz_config = QuizConfig {
        question_count: args.count.unwrap_or(QuizConfig::default().question_count),
        question_type,
        scope,
    };

    // Read the previous session up front so a bad path fails before the quiz.
    let previous = args
        .previous
        .as_deref()
        .map(PreviousSessionData::load_json)
        .transpose()?;

    let (source, topic) = question_source(&args, &config)?;
    let engine = EvaluationEngine::new(
        build_judge(&config, args.offline),
        EvaluationConfig {
            parallelism: config.parallelism,
        },
    );

    eprintln!(
        "studybuddy v{} - answer each question, or type {BACK_COMMAND} to go back",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = std::io::stdin();
    let mut terminal = Terminal::new(stdin.lock(), std::io::stdout());
    let study = run_session(&mut terminal, source.as_ref(), &engine, &quiz_config, &topic).await?;

    if study.history().is_empty() {
        println!("No quiz completed; nothing to save.");
        return Ok(());
    }

    let data = study.finish(Utc::now())?;
    let output = args.output.unwrap_or(config.output_dir);
    save_session(&data, &output)?;
    write_reports(&data, previous.as_ref(), &output, false)?;
    Ok(())
}

fn question_source(
    args: &QuizArgs,
    config: &StudybuddyConfig,
) -> Result<(Box<dyn QuestionSource>, String)> {
    if let Some(path) = &args.questions {
        let set = parser::parse_question_set(path)?;
        for warning in parser::validate_question_set(&set) {
            match warning.question_index {
                Some(i) => tracing::warn!("question {}: {}", i + 1, warning.message),
                None => tracing::warn!("{}", warning.message),
            }
        }
        anyhow::ensure!(
            !set.questions.is_empty(),
            "question set {} has no questions",
            path.display()
        );
        let source: Box<dyn QuestionSource> = Box::new(FileQuestionSource {
            questions: set.questions,
            limit: args.count,
        });
        return Ok((source, set.title));
    }

    let Some(path) = &args.generate else {
        anyhow::bail!("either --questions or --generate is required");
    };
    let material = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read study material: {}", path.display()))?;
    let provider = config
        .default_llm()
        .context("generating questions needs a configured provider")?;
    let topic = args.topic.clone().unwrap_or_else(|| "Quiz".to_string());
    let source: Box<dyn QuestionSource> = Box::new(LlmQuestionSource::new(
        provider,
        &config.default_model,
        &material,
    ));
    Ok((source, topic))
}

fn build_judge(config: &StudybuddyConfig, offline: bool) -> EquivalenceJudge {
    if offline {
        return EquivalenceJudge::offline();
    }
    match config.default_llm() {
        Ok(provider) => {
            EquivalenceJudge::new(Arc::new(LlmOracle::new(provider, config.oracle_model())))
        }
        Err(e) => {
            tracing::warn!("no model available for answer checking, comparing text only: {e:#}");
            EquivalenceJudge::offline()
        }
    }
}

/// Line-oriented prompt over any reader and writer.
pub(crate) struct Terminal<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub(crate) fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Show `label` and read one line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

enum NextStep {
    Retry,
    NewQuiz,
    End,
}

/// Drive quizzes until the learner ends the session or input runs out.
pub(crate) async fn run_session<R: BufRead, W: Write>(
    terminal: &mut Terminal<R, W>,
    source: &dyn QuestionSource,
    engine: &EvaluationEngine,
    quiz_config: &QuizConfig,
    topic: &str,
) -> Result<StudySession> {
    let mut study = StudySession::start(Utc::now());
    let mut quiz = QuizSession::new();

    loop {
        if *quiz.state() == QuizState::Configuring {
            let loaded = source.questions(quiz_config).await.and_then(|questions| {
                anyhow::ensure!(!questions.is_empty(), "no questions to ask");
                Ok(questions)
            });
            match loaded {
                Ok(questions) => quiz.set_questions(questions),
                Err(e) if !study.history().is_empty() => {
                    writeln!(terminal.out, "Could not load a new quiz: {e:#}")?;
                    return Ok(study);
                }
                Err(e) => return Err(e.context("failed to load questions")),
            }
        }

        if !answer_questions(terminal, engine, &mut quiz).await? {
            writeln!(terminal.out, "\nInput ended before the quiz was finished.")?;
            return Ok(study);
        }

        let Some(results) = quiz.results().cloned() else {
            anyhow::bail!("quiz finished without results");
        };
        print_results(&mut terminal.out, &results)?;

        let record = study.record_quiz(topic, &results.results, Utc::now());
        writeln!(
            terminal.out,
            "Score: {}/{} ({}%)",
            record.score,
            record.total,
            record.percentage()
        )?;
        writeln!(
            terminal.out,
            "Session average: {}% over {} quiz(zes)",
            study.average_score(),
            study.history().len()
        )?;

        match next_step(terminal)? {
            NextStep::Retry => quiz.retry()?,
            NextStep::NewQuiz => quiz.request_new_quiz()?,
            NextStep::End => return Ok(study),
        }
    }
}

/// Collect answers until the quiz reaches its results. Returns `false` if
/// input ended first.
async fn answer_questions<R: BufRead, W: Write>(
    terminal: &mut Terminal<R, W>,
    engine: &EvaluationEngine,
    quiz: &mut QuizSession,
) -> Result<bool> {
    while let Some((index, question)) = quiz.current_question() {
        let question = question.clone();
        let total = quiz.questions().len();
        let existing = quiz.current_answer().unwrap_or_default().to_string();
        show_question(&mut terminal.out, index, total, &question, &existing)?;

        let Some(line) = terminal.prompt("> ")? else {
            return Ok(false);
        };

        if line.trim() == BACK_COMMAND {
            if let Err(e) = quiz.previous() {
                writeln!(terminal.out, "{e}")?;
            }
            continue;
        }

        // An empty line keeps an answer given before going back.
        if !(line.trim().is_empty() && !existing.trim().is_empty()) {
            quiz.record_answer(&line)?;
        }

        if let Err(e) = engine.advance(quiz).await {
            match quiz.take_notice() {
                Some(notice) => writeln!(terminal.out, "{notice}")?,
                None => writeln!(terminal.out, "{e}")?,
            }
        }
    }
    Ok(true)
}

fn show_question<W: Write>(
    out: &mut W,
    index: usize,
    total: usize,
    question: &Question,
    existing: &str,
) -> Result<()> {
    writeln!(
        out,
        "\nQuestion {}/{} [{}]\n{}",
        index + 1,
        total,
        question.kind.tag(),
        question.prompt.trim()
    )?;
    for (i, option) in question.options.iter().enumerate() {
        writeln!(out, "  {}. {option}", letter_for_index(i))?;
    }
    if !existing.trim().is_empty() {
        writeln!(out, "(current answer: {existing}; press Enter to keep it)")?;
    }
    Ok(())
}

fn print_results<W: Write>(out: &mut W, results: &QuizResults) -> Result<()> {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Type", "Question", "Your answer", "Correct answer", ""]);

    for (i, result) in results.results.iter().enumerate() {
        let mark = if result.is_correct {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("✗").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(result.question.kind.tag()),
            Cell::new(result.question.prompt.trim()),
            Cell::new(&result.displayed_answer),
            Cell::new(&result.displayed_correct_answer),
            mark,
        ]);
    }
    writeln!(out, "\n{table}")?;

    for (i, result) in results.results.iter().enumerate() {
        if !result.is_correct && !result.question.explanation.is_empty() {
            writeln!(out, "{}. {}", i + 1, result.question.explanation)?;
        }
    }
    Ok(())
}

fn next_step<R: BufRead, W: Write>(terminal: &mut Terminal<R, W>) -> Result<NextStep> {
    loop {
        let Some(choice) = terminal.prompt("\n[r]etry, [n]ew quiz or [e]nd session? ")? else {
            return Ok(NextStep::End);
        };
        match choice.trim().to_lowercase().as_str() {
            "r" | "retry" => return Ok(NextStep::Retry),
            "n" | "new" => return Ok(NextStep::NewQuiz),
            "e" | "end" => return Ok(NextStep::End),
            _ => writeln!(terminal.out, "Please type r, n or e.")?,
        }
    }
}
