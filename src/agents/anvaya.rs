//! Prose-order (anvaya) rearrangement.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gemini::GeminiClient;

use super::{ask_structured, AgentError, AgentResult, SubAgent};

const INSTRUCTIONS: &str = "You are a Sanskrit grammarian. Given a Sanskrit verse \
in Devanagari, rewrite it in anvaya (natural prose word order), splitting sandhi \
and compounds where needed so each word stands alone. Do not translate. \
Respond with only a JSON object of the form \
{\"input\": [<words of the verse in original order>], \
\"output\": [<words rearranged into prose order>]}. \
If the text is not a Sanskrit verse you can analyze, respond with \
{\"input\": [], \"output\": []}.";

/// The verse split into words, before and after rearrangement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anvaya {
    pub input: Vec<String>,
    pub output: Vec<String>,
}

pub struct AnvayaAgent {
    gemini: Arc<GeminiClient>,
    model: String,
}

impl AnvayaAgent {
    pub fn new(gemini: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            gemini,
            model: model.into(),
        }
    }

    pub async fn rearrange(&self, verse: &str) -> AgentResult<Anvaya> {
        let anvaya: Anvaya =
            ask_structured(&self.gemini, self.name(), &self.model, INSTRUCTIONS, verse).await?;
        if anvaya.output.is_empty() {
            return Err(AgentError::Refused {
                agent: self.name().to_string(),
                detail: "input was not recognized as a Sanskrit verse".to_string(),
            });
        }
        Ok(anvaya)
    }
}

#[async_trait]
impl SubAgent for AnvayaAgent {
    fn name(&self) -> &str {
        "anvaya"
    }

    fn description(&self) -> &str {
        "Rearranges a Devanagari verse into prose word order"
    }

    async fn run(&self, input: &str) -> AgentResult<String> {
        let anvaya = self.rearrange(input).await?;
        Ok(anvaya.output.join(" "))
    }
}
