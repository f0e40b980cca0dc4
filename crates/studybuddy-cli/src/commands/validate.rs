//! The `studybuddy validate` command.

use std::path::PathBuf;

use anyhow::Result;

use studybuddy_core::parser;

pub fn execute(questions_path: PathBuf) -> Result<()> {
    let sets = if questions_path.is_dir() {
        parser::load_question_directory(&questions_path)?
    } else {
        vec![parser::parse_question_set(&questions_path)?]
    };

    let mut total_warnings = 0;

    for set in &sets {
        println!("Question set: {} ({} questions)", set.title, set.questions.len());

        let warnings = parser::validate_question_set(set);
        for w in &warnings {
            let prefix = w
                .question_index
                .map(|i| format!("  [q{}]", i + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
