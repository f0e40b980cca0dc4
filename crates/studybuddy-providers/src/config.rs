//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studybuddy_core::traits::LlmProvider;

use crate::anthropic::AnthropicProvider;
use crate::error::ProviderError;
use crate::openai::{OpenAiProvider, DEFAULT_BASE_URL};

pub const OPENROUTER_KEY_VAR: &str = "STUDYBUDDY_OPENROUTER_KEY";
pub const ANTHROPIC_KEY_VAR: &str = "STUDYBUDDY_ANTHROPIC_KEY";

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat completions endpoint (OpenRouter by default).
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl ProviderConfig {
    fn api_key_mut(&mut self) -> &mut String {
        match self {
            ProviderConfig::OpenAI { api_key, .. } | ProviderConfig::Anthropic { api_key, .. } => {
                api_key
            }
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, base_url) = match self {
            ProviderConfig::OpenAI { base_url, .. } => ("OpenAI", base_url),
            ProviderConfig::Anthropic { base_url, .. } => ("Anthropic", base_url),
        };
        f.debug_struct(name)
            .field("api_key", &"***")
            .field("base_url", base_url)
            .finish()
    }
}

/// Top-level studybuddy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudybuddyConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used for quiz generation and answer grading.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model used for quiz generation.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Model used for answer equivalence checks; `default_model` if unset.
    #[serde(default)]
    pub oracle_model: Option<String>,
    /// Max concurrent equivalence checks per quiz.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Where session JSON files and reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_provider() -> String {
    "openrouter".to_string()
}
fn default_model() -> String {
    "deepseek/deepseek-chat".to_string()
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./studybuddy-sessions")
}

impl Default for StudybuddyConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            oracle_model: None,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl StudybuddyConfig {
    pub fn oracle_model(&self) -> &str {
        self.oracle_model.as_deref().unwrap_or(&self.default_model)
    }

    /// Build the configured default provider.
    ///
    /// Fails with [`ProviderError::MissingCredential`] when the provider is
    /// not configured or has an empty key.
    pub fn default_llm(&self) -> Result<Arc<dyn LlmProvider>> {
        let name = &self.default_provider;
        let config = self
            .providers
            .get(name)
            .ok_or_else(|| ProviderError::MissingCredential(name.clone()))?;
        create_provider(name, config)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI { api_key, base_url } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `studybuddy.toml` in the current directory
/// 2. `~/.config/studybuddy/config.toml`
///
/// Environment variable overrides: `STUDYBUDDY_OPENROUTER_KEY`,
/// `STUDYBUDDY_ANTHROPIC_KEY`.
pub fn load_config() -> Result<StudybuddyConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StudybuddyConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("studybuddy.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<StudybuddyConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => StudybuddyConfig::default(),
    };

    Ok(finalize(config, |var| std::env::var(var).ok()))
}

/// Apply key overrides from the environment, then expand `${VAR}`
/// references in every provider entry.
fn finalize(
    mut config: StudybuddyConfig,
    env: impl Fn(&str) -> Option<String>,
) -> StudybuddyConfig {
    if let Some(key) = env(OPENROUTER_KEY_VAR) {
        *config
            .providers
            .entry("openrouter".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: Some(DEFAULT_BASE_URL.to_string()),
            })
            .api_key_mut() = key;
    }

    if let Some(key) = env(ANTHROPIC_KEY_VAR) {
        *config
            .providers
            .entry("anthropic".into())
            .or_insert(ProviderConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
            })
            .api_key_mut() = key;
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.parallelism = config.parallelism.max(1);
    config
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("studybuddy"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    tracing::debug!(provider = name, "creating provider");
    match config {
        ProviderConfig::Anthropic { api_key, base_url } => {
            Ok(Arc::new(AnthropicProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI { api_key, base_url } => {
            Ok(Arc::new(OpenAiProvider::new(api_key, base_url.clone())))
        }
    }
}
