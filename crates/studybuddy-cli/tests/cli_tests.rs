//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{Duration, TimeZone, Utc};
use predicates::prelude::*;
use tempfile::TempDir;

use studybuddy_core::model::{EvaluationResult, Question};
use studybuddy_core::session::StudySession;

/// The binary with no user config or API keys leaking in.
fn studybuddy(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("studybuddy").unwrap();
    cmd.env("HOME", home)
        .env_remove("STUDYBUDDY_OPENROUTER_KEY")
        .env_remove("STUDYBUDDY_ANTHROPIC_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn write_session(dir: &Path, name: &str, day: u32, correct: &[bool]) -> PathBuf {
    let start = Utc.with_ymd_and_hms(2026, 3, day, 18, 0, 0).unwrap();
    let mut session = StudySession::start(start);
    let results: Vec<EvaluationResult> = correct
        .iter()
        .enumerate()
        .map(|(i, &ok)| EvaluationResult {
            question: Question::short_answer(&format!("Question number {i}?"), "answer"),
            displayed_answer: if ok { "answer" } else { "guess" }.into(),
            displayed_correct_answer: "answer".into(),
            is_correct: ok,
        })
        .collect();
    session.record_quiz("Revision", &results, start + Duration::minutes(20));
    let data = session.finish(start + Duration::minutes(25)).unwrap();

    let path = dir.join(name);
    data.save_json(&path).unwrap();
    path
}

#[test]
fn validate_toml_question_set() {
    let home = TempDir::new().unwrap();
    studybuddy(home.path())
        .arg("validate")
        .arg("--questions")
        .arg("../../question-sets/cell-biology.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cell Biology (5 questions)"))
        .stdout(predicate::str::contains("All question sets valid"));
}

#[test]
fn validate_directory() {
    let home = TempDir::new().unwrap();
    studybuddy(home.path())
        .arg("validate")
        .arg("--questions")
        .arg("../../question-sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cell Biology"))
        .stdout(predicate::str::contains("World Geography (3 questions)"));
}

#[test]
fn validate_reports_warnings() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[[questions]]
type = "mcq"
question = "Pick one"
options = ["Alpha", "Beta"]
answer = "Gamma"
"#,
    )
    .unwrap();

    studybuddy(home.path())
        .arg("validate")
        .arg("--questions")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let home = TempDir::new().unwrap();
    studybuddy(home.path())
        .arg("validate")
        .arg("--questions")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created studybuddy.toml"))
        .stdout(predicate::str::contains("Created question-sets/example.toml"));

    assert!(dir.path().join("studybuddy.toml").exists());
    assert!(dir.path().join("question-sets/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn offline_quiz_from_piped_answers() {
    let dir = TempDir::new().unwrap();
    let questions = std::fs::canonicalize("../../question-sets/cell-biology.toml").unwrap();
    let out = dir.path().join("out");

    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("quiz")
        .arg("--questions")
        .arg(&questions)
        .arg("--offline")
        .arg("--output")
        .arg(&out)
        .write_stdin("b\ncell membrane\nA\nDNA\nplants make food\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1/5 [MCQ]"))
        .stdout(predicate::str::contains("B. Mitochondria"))
        .stdout(predicate::str::contains("Score: 4/5 (80%)"))
        .stderr(predicate::str::contains("Session report:"));

    let files = files_in(&out);
    assert_eq!(files.len(), 2, "{files:?}");
    assert!(files[0].starts_with("session-") && files[0].ends_with(".json"));
    assert!(files[1].starts_with("study-buddy-session-") && files[1].ends_with(".pdf"));

    let pdf = std::fs::read(out.join(&files[1])).unwrap();
    assert!(pdf.starts_with(b"%PDF-1.4"));

    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join(&files[0])).unwrap()).unwrap();
    assert_eq!(saved["total_questions"], 5);
    assert_eq!(saved["correct_count"], 4);
    assert_eq!(saved["weak_areas"].as_array().unwrap().len(), 1);
}

#[test]
fn quiz_without_answers_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let questions = std::fs::canonicalize("../../question-sets/world-geography.json").unwrap();
    let out = dir.path().join("out");

    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("quiz")
        .arg("--questions")
        .arg(&questions)
        .arg("--offline")
        .arg("--output")
        .arg(&out)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to save"));

    assert!(!out.exists());
}

#[test]
fn generating_without_provider_fails() {
    let dir = TempDir::new().unwrap();
    let material = dir.path().join("notes.txt");
    std::fs::write(&material, "Mitochondria produce ATP.").unwrap();

    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("quiz")
        .arg("--generate")
        .arg(&material)
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a configured provider"));
}

#[test]
fn quiz_requires_a_question_source() {
    let dir = TempDir::new().unwrap();
    studybuddy(dir.path())
        .current_dir(dir.path())
        .arg("quiz")
        .assert()
        .failure();
}

#[test]
fn report_with_comparison_and_data_url() {
    let dir = TempDir::new().unwrap();
    let current = write_session(dir.path(), "current.json", 14, &[true, true, false]);
    let previous = write_session(dir.path(), "previous.json", 7, &[true, false]);
    let out = dir.path().join("reports");

    studybuddy(dir.path())
        .arg("report")
        .arg("--session")
        .arg(&current)
        .arg("--previous")
        .arg(&previous)
        .arg("--output")
        .arg(&out)
        .arg("--data-url")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("data:application/pdf;base64,"))
        .stderr(predicate::str::contains("Progress report:"));

    assert_eq!(
        files_in(&out),
        vec![
            "study-buddy-progress-2026-03-14.pdf".to_string(),
            "study-buddy-session-2026-03-14.pdf".to_string(),
        ]
    );
}

#[test]
fn report_rejects_inconsistent_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{
    "start_time": "2026-03-14T18:00:00Z",
    "results": [],
    "total_questions": 3,
    "correct_count": 1,
    "incorrect_count": 1
}"#,
    )
    .unwrap();

    studybuddy(dir.path())
        .arg("report")
        .arg("--session")
        .arg(&path)
        .arg("--output")
        .arg(dir.path().join("reports"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("session counts disagree"));
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    studybuddy(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz yourself and track your progress"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    studybuddy(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("studybuddy"));
}
