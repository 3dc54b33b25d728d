//! Final English rendering.

use std::sync::Arc;

use async_trait::async_trait;

use crate::gemini::GeminiClient;

use super::{AgentResult, SubAgent};

const INSTRUCTIONS: &str = "You are an English writer. You are given an \
interpretation of a Sanskrit verse. Compose a single natural English sentence \
that conveys the verse's meaning faithfully. Respond with only that sentence.";

pub struct ComposerAgent {
    gemini: Arc<GeminiClient>,
    model: String,
}

impl ComposerAgent {
    pub fn new(gemini: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }

    pub async fn compose(&self, interpretation: &str) -> AgentResult<String> {
        let text = self
            .gemini
            .generate_text(&self.model, Some(INSTRUCTIONS), interpretation)
            .await?;
        Ok(text.trim().trim_matches('"').to_string())
    }
}

#[async_trait]
impl SubAgent for ComposerAgent {
    fn name(&self) -> &str {
        "composer"
    }

    fn description(&self) -> &str {
        "Condenses an interpretation into one natural English sentence"
    }

    async fn run(&self, input: &str) -> AgentResult<String> {
        self.compose(input).await
    }
}
