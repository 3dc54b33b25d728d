//! Sub-agents for the translation pipeline and the quiz.
//!
//! Each worker wraps one prompt; the orchestrating agents in
//! [`translator`] and [`quiz`] chain them together.

pub mod anvaya;
pub mod composer;
pub mod dictionary;
pub mod interpreter;
pub mod quiz;
pub mod translator;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::gemini::{strip_code_fences, GeminiClient, GeminiError};

pub use anvaya::{Anvaya, AnvayaAgent};
pub use composer::ComposerAgent;
pub use dictionary::DictionaryAgent;
pub use interpreter::InterpreterAgent;
pub use quiz::{QuizAgent, QuizQuestion, QuizSession, SessionSummary};
pub use translator::{TranslationAgent, TranslationReport};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("{agent} returned an unparseable response: {reason}")]
    InvalidResponse { agent: String, reason: String },

    #[error("{agent} could not analyze the input: {detail}")]
    Refused { agent: String, detail: String },
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// A single-responsibility worker in the pipeline.
#[async_trait]
pub trait SubAgent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run the agent on one input, returning its raw text output.
    async fn run(&self, input: &str) -> AgentResult<String>;
}

/// Ask for JSON and parse it into `T`. On a parse failure the request is
/// retried once with the parse error appended so the model can correct
/// its output shape.
pub(crate) async fn ask_structured<T: DeserializeOwned>(
    gemini: &GeminiClient,
    agent: &str,
    model: &str,
    system: &str,
    input: &str,
) -> AgentResult<T> {
    let raw = gemini.generate_text(model, Some(system), input).await?;
    let cleaned = strip_code_fences(&raw);
    match serde_json::from_str(cleaned) {
        Ok(parsed) => Ok(parsed),
        Err(first_err) => {
            warn!(agent, error = %first_err, "response was not valid JSON, retrying");
            let follow_up = format!(
                "{input}\n\nYour previous reply could not be parsed as JSON \
                 ({first_err}). Reply again with only the JSON object, no prose."
            );
            let raw = gemini.generate_text(model, Some(system), &follow_up).await?;
            let cleaned = strip_code_fences(&raw);
            serde_json::from_str(cleaned).map_err(|e| AgentError::InvalidResponse {
                agent: agent.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
