//! The translation pipeline.
//!
//! Chains the deterministic transliterator and the worker agents into one
//! verse-to-English run, registering every looked-up word in the glossary
//! along the way and exporting a study page to Notion when configured.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::db::{glossary, Db};
use crate::gemini::GeminiClient;
use crate::notion::NotionClient;
use crate::translit::{self, Scheme};

use super::{AnvayaAgent, ComposerAgent, DictionaryAgent, InterpreterAgent, SubAgent};

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    pub source: String,
    pub scheme: Scheme,
    pub devanagari: String,
    pub anvaya: Vec<String>,
    pub meanings: BTreeMap<String, Vec<String>>,
    pub words_added: usize,
    pub interpretation: String,
    pub natural_sentence: String,
    pub notion_page: Option<String>,
}

impl TranslationReport {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.devanagari));
        out.push_str(&format!("**Anvaya:** {}\n\n", self.anvaya.join(" ")));
        out.push_str("## Word meanings\n\n");
        for (word, senses) in &self.meanings {
            out.push_str(&format!("- **{}**: {}\n", word, senses.join(", ")));
        }
        out.push_str(&format!("\n## Interpretation\n\n{}\n", self.interpretation));
        out.push_str(&format!("\n## Translation\n\n> {}\n", self.natural_sentence));
        if let Some(url) = &self.notion_page {
            out.push_str(&format!("\nExported to Notion: {}\n", url));
        }
        out
    }

    fn notion_sections(&self) -> Vec<(String, String)> {
        let meanings = self
            .meanings
            .iter()
            .map(|(word, senses)| format!("{}: {}", word, senses.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");
        vec![
            ("Anvaya".to_string(), self.anvaya.join(" ")),
            ("Word meanings".to_string(), meanings),
            ("Interpretation".to_string(), self.interpretation.clone()),
            ("Translation".to_string(), self.natural_sentence.clone()),
        ]
    }
}

pub struct TranslationAgent {
    db: Db,
    notion: Option<NotionClient>,
    parent_page: String,
    anvaya: AnvayaAgent,
    dictionary: DictionaryAgent,
    interpreter: InterpreterAgent,
    composer: ComposerAgent,
}

impl TranslationAgent {
    pub fn new(
        gemini: Arc<GeminiClient>,
        db: Db,
        orchestrator_model: &str,
        worker_model: &str,
        notion: Option<NotionClient>,
        parent_page: impl Into<String>,
    ) -> Self {
        Self {
            db,
            notion,
            parent_page: parent_page.into(),
            anvaya: AnvayaAgent::new(Arc::clone(&gemini), orchestrator_model),
            dictionary: DictionaryAgent::new(Arc::clone(&gemini), worker_model),
            interpreter: InterpreterAgent::new(Arc::clone(&gemini), orchestrator_model),
            composer: ComposerAgent::new(gemini, worker_model),
        }
    }

    /// The worker roster, printed by `doctor`.
    pub fn sub_agents(&self) -> Vec<&dyn SubAgent> {
        vec![
            &self.anvaya,
            &self.dictionary,
            &self.interpreter,
            &self.composer,
        ]
    }

    /// Run the full pipeline on one verse.
    ///
    /// `scheme` forces a transliteration scheme; otherwise it is detected,
    /// and Devanagari input passes through unchanged.
    pub async fn translate(
        &self,
        verse: &str,
        scheme: Option<Scheme>,
        skip_notion: bool,
    ) -> crate::Result<TranslationReport> {
        let verse = verse.trim();

        let (scheme, devanagari) = if translit::is_devanagari(verse) {
            (scheme.unwrap_or(Scheme::Itrans), verse.to_string())
        } else {
            let scheme = scheme.unwrap_or_else(|| translit::detect_scheme(verse));
            (scheme, translit::to_devanagari(verse, scheme))
        };
        info!(scheme = scheme.as_str(), %devanagari, "transliterated verse");

        let anvaya = self.anvaya.rearrange(&devanagari).await?;
        info!(words = anvaya.output.len(), "anvaya complete");

        let meanings = self.dictionary.look_up(&anvaya.output).await?;
        info!(entries = meanings.len(), "dictionary lookup complete");

        let pairs: Vec<(String, String)> = meanings
            .iter()
            .flat_map(|(word, senses)| {
                senses
                    .iter()
                    .map(|meaning| (word.clone(), meaning.clone()))
            })
            .collect();
        let words_added =
            glossary::add_words(self.db.pool(), &pairs, Some(&devanagari)).await?;
        info!(added = words_added, "glossary updated");

        let interpretation = self.interpreter.interpret(&anvaya.output, &meanings).await?;
        let natural_sentence = self.composer.run(&interpretation).await?;
        info!(%natural_sentence, "composition complete");

        let mut report = TranslationReport {
            source: verse.to_string(),
            scheme,
            devanagari,
            anvaya: anvaya.output,
            meanings,
            words_added,
            interpretation,
            natural_sentence,
            notion_page: None,
        };

        if !skip_notion {
            report.notion_page = self.export_to_notion(&report).await;
        }

        Ok(report)
    }

    /// Best effort: a failed export never fails the translation.
    async fn export_to_notion(&self, report: &TranslationReport) -> Option<String> {
        let notion = self.notion.as_ref()?;

        let parent = match notion.find_page(&self.parent_page).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(page = %self.parent_page, "Notion parent page not found, skipping export");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Notion search failed, skipping export");
                return None;
            }
        };

        match notion
            .create_page(&parent, &report.devanagari, &report.notion_sections())
            .await
        {
            Ok(url) => {
                info!(%url, "exported study page to Notion");
                Some(url)
            }
            Err(e) => {
                warn!(error = %e, "Notion export failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> TranslationReport {
        let mut meanings = BTreeMap::new();
        meanings.insert("धर्म".to_string(), vec!["duty".to_string(), "law".to_string()]);
        TranslationReport {
            source: "dharma".to_string(),
            scheme: Scheme::Itrans,
            devanagari: "धर्म".to_string(),
            anvaya: vec!["धर्म".to_string()],
            meanings,
            words_added: 2,
            interpretation: "It speaks of duty.".to_string(),
            natural_sentence: "Duty sustains the world.".to_string(),
            notion_page: None,
        }
    }

    #[test]
    fn test_markdown_report() {
        let md = sample_report().to_markdown();
        assert!(md.starts_with("# धर्म"));
        assert!(md.contains("**धर्म**: duty, law"));
        assert!(md.contains("> Duty sustains the world."));
        assert!(!md.contains("Notion"));
    }

    #[test]
    fn test_notion_sections_order() {
        let sections = sample_report().notion_sections();
        let headings: Vec<&str> = sections.iter().map(|(h, _)| h.as_str()).collect();
        assert_eq!(
            headings,
            vec!["Anvaya", "Word meanings", "Interpretation", "Translation"]
        );
    }

    #[tokio::test]
    async fn test_sub_agent_roster() {
        let db = Db::open_in_memory().await.unwrap();
        let gemini = Arc::new(GeminiClient::new("test-key"));
        let agent = TranslationAgent::new(
            gemini,
            db,
            "gemini-2.5-pro",
            "gemini-2.5-flash-lite",
            None,
            "Learn Sanskrit",
        );

        let roster = agent.sub_agents();
        let names: Vec<&str> = roster.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["anvaya", "dictionary", "interpreter", "composer"]);
        for worker in &roster {
            assert!(!worker.description().is_empty());
        }
    }
}
