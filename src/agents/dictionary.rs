//! Word-by-word dictionary lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::gemini::GeminiClient;

use super::{ask_structured, AgentError, AgentResult, SubAgent};

const INSTRUCTIONS: &str = "You are a Sanskrit-English dictionary. Given Sanskrit \
words in Devanagari separated by spaces, give the English meanings of every word. \
Respond with only a JSON object mapping each word to an array of its meanings, \
most common meaning first, at most three meanings per word. \
If you cannot look up the words, respond with {\"error\": [\"<reason>\"]}.";

pub struct DictionaryAgent {
    gemini: Arc<GeminiClient>,
    model: String,
}

impl DictionaryAgent {
    pub fn new(gemini: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }

    /// Meanings per word, keyed by the Devanagari word. BTreeMap keeps the
    /// report ordering stable across runs.
    pub async fn look_up(&self, words: &[String]) -> AgentResult<BTreeMap<String, Vec<String>>> {
        let input = words.join(" ");
        let mut meanings: BTreeMap<String, Vec<String>> =
            ask_structured(&self.gemini, self.name(), &self.model, INSTRUCTIONS, &input).await?;
        if let Some(reason) = meanings.remove("error") {
            return Err(AgentError::Refused {
                agent: self.name().to_string(),
                detail: reason.join("; "),
            });
        }
        if meanings.is_empty() {
            return Err(AgentError::InvalidResponse {
                agent: self.name().to_string(),
                reason: "no meanings returned".to_string(),
            });
        }
        Ok(meanings)
    }
}

#[async_trait]
impl SubAgent for DictionaryAgent {
    fn name(&self) -> &str {
        "dictionary"
    }

    fn description(&self) -> &str {
        "Looks up English meanings for Sanskrit words"
    }

    async fn run(&self, input: &str) -> AgentResult<String> {
        let words: Vec<String> = input.split_whitespace().map(str::to_string).collect();
        let meanings = self.look_up(&words).await?;
        Ok(serde_json::to_string_pretty(&meanings).unwrap_or_default())
    }
}
