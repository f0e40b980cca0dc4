//! The `studybuddy init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("studybuddy.toml").exists() {
        println!("studybuddy.toml already exists, skipping.");
    } else {
        std::fs::write("studybuddy.toml", SAMPLE_CONFIG)?;
        println!("Created studybuddy.toml");
    }

    std::fs::create_dir_all("question-sets")?;
    let example_path = Path::new("question-sets/example.toml");
    if example_path.exists() {
        println!("question-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUESTION_SET)?;
        println!("Created question-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set STUDYBUDDY_OPENROUTER_KEY or edit studybuddy.toml");
    println!("  2. Run: studybuddy validate --questions question-sets/example.toml");
    println!("  3. Run: studybuddy quiz --questions question-sets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studybuddy configuration

default_provider = "openrouter"
default_model = "deepseek/deepseek-chat"
# Model used to decide whether free-text answers mean the same thing.
oracle_model = "deepseek/deepseek-chat"
parallelism = 4
output_dir = "./studybuddy-sessions"

[providers.openrouter]
type = "openai"
api_key = "${OPENROUTER_API_KEY}"
base_url = "https://openrouter.ai/api"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"
"#;

const EXAMPLE_QUESTION_SET: &str = r#"title = "Cell Biology Basics"

[[questions]]
type = "mcq"
question = "Which organelle produces most of the cell's ATP?"
options = ["Nucleus", "Mitochondria", "Ribosome", "Golgi apparatus"]
answer = "B"
explanation = "Cellular respiration takes place in the mitochondria."

[[questions]]
type = "mcq"
question = "Which pigment gives plants their green colour?"
options = ["Carotene", "Chlorophyll", "Xanthophyll", "Anthocyanin"]
answer = "Chlorophyll"

[[questions]]
type = "saq"
question = "What molecule carries genetic information in most organisms?"
answer = "DNA"

[[questions]]
type = "laq"
question = "Explain the role of the cell membrane."
answer = "It is a selectively permeable barrier that controls what enters and leaves the cell."
"#;
