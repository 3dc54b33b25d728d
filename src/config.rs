//! Configuration file support
//!
//! Settings come from an optional TOML file with environment variables
//! taking precedence for secrets (`GEMINI_API_KEY`, `NOTION_KEY`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gemini::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; the GEMINI_API_KEY environment variable takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for orchestration-grade calls.
    #[serde(default = "default_model")]
    pub model: String,

    /// Cheaper model used by the worker sub-agents.
    #[serde(default = "default_worker_model")]
    pub worker_model: String,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_initial_delay_secs")]
    pub retry_initial_delay_secs: u64,

    #[serde(default = "default_retry_exp_base")]
    pub retry_exp_base: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration token; the NOTION_KEY environment variable takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Title of the page new study pages are created under.
    #[serde(default = "default_parent_page")]
    pub parent_page: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_questions")]
    pub questions_per_session: usize,

    #[serde(default = "default_options")]
    pub options_per_question: usize,

    /// Let the model phrase questions; falls back to a fixed template.
    #[serde(default = "default_llm_phrasing")]
    pub llm_phrasing: bool,
}

fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_worker_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_retry_attempts() -> u32 {
    5
}

fn default_retry_initial_delay_secs() -> u64 {
    5
}

fn default_retry_exp_base() -> u32 {
    7
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("shloka/shloka.db"))
        .unwrap_or_else(|| PathBuf::from("shloka.db"))
}

fn default_parent_page() -> String {
    "Learn Sanskrit".to_string()
}

fn default_questions() -> usize {
    5
}

fn default_options() -> usize {
    4
}

fn default_llm_phrasing() -> bool {
    true
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            worker_model: default_worker_model(),
            retry_attempts: default_retry_attempts(),
            retry_initial_delay_secs: default_retry_initial_delay_secs(),
            retry_exp_base: default_retry_exp_base(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: None,
            parent_page: default_parent_page(),
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            questions_per_session: default_questions(),
            options_per_question: default_options(),
            llm_phrasing: default_llm_phrasing(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from an optional path, then apply environment overrides.
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = dirs::config_dir()
                    .map(|d| d.join("shloka/config.toml"))
                    .unwrap_or_else(|| PathBuf::from("shloka.toml"));
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                self.gemini.api_key = Some(key);
            }
        }
        if let Ok(token) = std::env::var("NOTION_KEY") {
            if !token.is_empty() {
                self.notion.token = Some(token);
            }
        }
        if let Ok(url) = std::env::var("DATABASE_PATH") {
            if !url.is_empty() {
                self.database.path = PathBuf::from(url);
            }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.gemini.retry_attempts,
            initial_delay: Duration::from_secs(self.gemini.retry_initial_delay_secs),
            exp_base: self.gemini.retry_exp_base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.worker_model, "gemini-2.5-flash-lite");
        assert_eq!(config.notion.parent_page, "Learn Sanskrit");
        assert_eq!(config.quiz.questions_per_session, 5);
        assert_eq!(config.quiz.options_per_question, 4);
        assert!(config.quiz.llm_phrasing);
        assert_eq!(config.retry_policy().attempts, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let toml = r#"
            [gemini]
            model = "gemini-2.5-flash"

            [quiz]
            questions_per_session = 10
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.worker_model, "gemini-2.5-flash-lite");
        assert_eq!(config.quiz.questions_per_session, 10);
        assert_eq!(config.quiz.options_per_question, 4);
        assert_eq!(config.notion.parent_page, "Learn Sanskrit");
    }

    #[test]
    fn test_roundtrip_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = AppConfig::default();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.gemini.model, config.gemini.model);
        assert_eq!(loaded.database.path, config.database.path);
    }
}
