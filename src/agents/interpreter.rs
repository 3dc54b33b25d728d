//! Verse interpretation from word meanings.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::gemini::GeminiClient;

use super::{AgentResult, SubAgent};

const INSTRUCTIONS: &str = "You are a scholar of Sanskrit literature. You are \
given a verse in prose (anvaya) order together with the dictionary meanings of \
its words. Explain what the verse says: the literal sense first, then the \
intended meaning in context. Write two short paragraphs of plain prose, no \
headings and no lists.";

pub struct InterpreterAgent {
    gemini: Arc<GeminiClient>,
    model: String,
}

impl InterpreterAgent {
    pub fn new(gemini: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }

    pub async fn interpret(
        &self,
        anvaya: &[String],
        meanings: &BTreeMap<String, Vec<String>>,
    ) -> AgentResult<String> {
        let mut input = format!("Verse in prose order: {}\n\nWord meanings:\n", anvaya.join(" "));
        for (word, senses) in meanings {
            input.push_str(&format!("- {}: {}\n", word, senses.join(", ")));
        }
        let text = self
            .gemini
            .generate_text(&self.model, Some(INSTRUCTIONS), &input)
            .await?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl SubAgent for InterpreterAgent {
    fn name(&self) -> &str {
        "interpreter"
    }

    fn description(&self) -> &str {
        "Explains the literal and contextual meaning of a verse"
    }

    async fn run(&self, input: &str) -> AgentResult<String> {
        let text = self
            .gemini
            .generate_text(&self.model, Some(INSTRUCTIONS), input)
            .await?;
        Ok(text.trim().to_string())
    }
}
