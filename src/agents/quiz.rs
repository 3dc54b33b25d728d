//! Multiple-choice vocabulary quiz.
//!
//! Sessions are assembled deterministically: the scheduler in [`crate::srs`]
//! picks which words to ask, the glossary supplies the answer and the
//! distractors. The model is only consulted to phrase the question text, with
//! a fixed template as fallback, so a session always comes together even when
//! the API is down. Results are written to the database once, when the whole
//! session is graded.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::QuizConfig;
use crate::db::quiz::AnswerRecord;
use crate::db::{glossary, quiz as quiz_db, Db};
use crate::error::Error;
use crate::gemini::{
    Content, FunctionCall, GeminiClient, GeminiError, GenerateContentRequest, Part, Tool,
};
use crate::srs::{plan_session, review_states, SrsConfig};
use crate::tools::{ToolError, ToolRegistry};

const PHRASING_INSTRUCTIONS: &str = "You write one-line quiz questions for a \
Sanskrit vocabulary trainer. You may call glossary_lookup or word_history to \
check what the learner knows about the word, and current_datetime for the date. \
Given a Devanagari word, write a single short question asking for its meaning. \
The question must contain the word itself and must not reveal the answer. \
Respond with only the question text.";

/// Tool-call rounds allowed while phrasing one question.
const MAX_TOOL_ROUNDS: u32 = 4;
/// Corrective retries after a malformed function call.
const MAX_MALFORMED_RETRIES: u32 = 2;

#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestion {
    pub word_id: i64,
    pub word: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizSession {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevealEntry {
    pub question: String,
    pub options: Vec<String>,
    pub selected: String,
    pub answer: String,
    pub result: bool,
}

/// Graded session, ready to print and to persist.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub score: usize,
    pub total: usize,
    pub entries: Vec<RevealEntry>,
    pub records: Vec<AnswerRecord>,
}

impl SessionSummary {
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "quiz": self.entries })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("## Score: {}/{}\n\n", self.score, self.total);
        for (i, entry) in self.entries.iter().enumerate() {
            let mark = if entry.result { "✓" } else { "✗" };
            out.push_str(&format!("{} **Q{}.** {}\n", mark, i + 1, entry.question));
            if entry.result {
                out.push_str(&format!("   answered *{}*\n\n", entry.answer));
            } else {
                out.push_str(&format!(
                    "   answered *{}*, correct answer *{}*\n\n",
                    entry.selected, entry.answer
                ));
            }
        }
        out
    }
}

pub struct QuizAgent {
    db: Db,
    tools: ToolRegistry,
    gemini: Option<Arc<GeminiClient>>,
    model: String,
    config: QuizConfig,
    srs: SrsConfig,
}

impl QuizAgent {
    pub fn new(
        db: Db,
        gemini: Option<Arc<GeminiClient>>,
        model: impl Into<String>,
        config: QuizConfig,
    ) -> Self {
        Self {
            tools: ToolRegistry::new(db.clone()),
            db,
            gemini,
            model: model.into(),
            config,
            srs: SrsConfig::default(),
        }
    }

    /// Assemble a session: schedule words, build options, phrase questions.
    pub async fn build_session(&self, rng: &mut impl Rng) -> crate::Result<QuizSession> {
        let ids = glossary::all_ids(self.db.pool()).await?;
        if ids.is_empty() {
            return Err(Error::EmptyGlossary);
        }

        let outcomes = quiz_db::outcomes(self.db.pool()).await?;
        let states = review_states(&outcomes, &self.srs);
        let picked = plan_session(
            &states,
            &ids,
            self.config.questions_per_session,
            Utc::now(),
            rng,
        );

        let mut questions = Vec::with_capacity(picked.len());
        for word_id in picked {
            let Some(entry) = glossary::by_id(self.db.pool(), word_id).await? else {
                continue;
            };
            let question = self
                .build_question(word_id, &entry.sanskrit_word, rng)
                .await?;
            questions.push(question);
        }

        Ok(QuizSession { questions })
    }

    async fn build_question(
        &self,
        word_id: i64,
        word: &str,
        rng: &mut impl Rng,
    ) -> crate::Result<QuizQuestion> {
        let meanings = glossary::meanings_of(self.db.pool(), word).await?;
        let answer = meanings
            .first()
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        // Over-fetch distractors; duplicates of the answer or of other
        // meanings of the same word must not appear as options.
        let wanted = self.config.options_per_question.saturating_sub(1);
        let pool = glossary::meanings_except(
            self.db.pool(),
            word,
            (self.config.options_per_question as i64) * 3,
        )
        .await?;

        let mut options = vec![answer.clone()];
        for candidate in pool {
            if options.len() > wanted {
                break;
            }
            if !meanings.contains(&candidate) && !options.contains(&candidate) {
                options.push(candidate);
            }
        }
        options.shuffle(rng);
        let answer_index = options
            .iter()
            .position(|o| o == &answer)
            .unwrap_or_default();

        let question = match self.phrase_question(word).await {
            Some(text) => text,
            None => default_question(word),
        };

        Ok(QuizQuestion {
            word_id,
            word: word.to_string(),
            question,
            options,
            answer_index,
        })
    }

    /// Ask the model to phrase the question, letting it call tools. Any
    /// failure falls back to the template; a quiz never depends on the API.
    async fn phrase_question(&self, word: &str) -> Option<String> {
        if !self.config.llm_phrasing {
            return None;
        }
        let gemini = self.gemini.as_ref()?;

        let mut contents = vec![Content::user(format!(
            "Write a quiz question for the word: {word}"
        ))];
        let mut malformed_retries = 0u32;

        for _ in 0..MAX_TOOL_ROUNDS {
            let request = GenerateContentRequest {
                contents: contents.clone(),
                system_instruction: Some(Content::system(PHRASING_INSTRUCTIONS)),
                tools: Some(vec![Tool {
                    function_declarations: ToolRegistry::declarations(),
                }]),
                generation_config: None,
            };

            let candidate = match gemini.generate(&self.model, &request).await {
                Ok(candidate) => candidate,
                Err(GeminiError::MalformedFunctionCall)
                    if malformed_retries < MAX_MALFORMED_RETRIES =>
                {
                    malformed_retries += 1;
                    debug!(word, "malformed function call, asking the model to retry");
                    contents.push(Content::user(
                        "Your last function call was malformed. Call the tool again \
                         with valid JSON arguments, or answer without tools.",
                    ));
                    continue;
                }
                Err(e) => {
                    warn!(word, error = %e, "question phrasing failed, using template");
                    return None;
                }
            };

            let calls: Vec<FunctionCall> =
                candidate.function_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                let text = candidate.text().trim().to_string();
                if text.is_empty() {
                    return None;
                }
                return Some(text);
            }

            contents.push(Content {
                role: Some("model".to_string()),
                parts: calls
                    .iter()
                    .map(|call| Part {
                        text: None,
                        function_call: Some(call.clone()),
                        function_response: None,
                    })
                    .collect(),
            });

            for call in &calls {
                match self.tools.dispatch(call).await {
                    Ok(value) => contents.push(Content::function_response(&call.name, value)),
                    Err(ToolError::Malformed { .. })
                        if malformed_retries < MAX_MALFORMED_RETRIES =>
                    {
                        malformed_retries += 1;
                        contents.push(Content::function_response(
                            &call.name,
                            json!({ "error": "malformed arguments, fix them and retry" }),
                        ));
                    }
                    Err(e) => {
                        warn!(word, error = %e, "tool dispatch failed, using template");
                        return None;
                    }
                }
            }
        }

        debug!(word, "tool round limit reached, using template");
        None
    }

    /// Grade a session against the learner's picks. `selections[i]` is the
    /// chosen option index for question `i`, or None if skipped.
    pub fn grade(session: &QuizSession, selections: &[Option<usize>]) -> SessionSummary {
        let mut entries = Vec::with_capacity(session.questions.len());
        let mut records = Vec::with_capacity(session.questions.len());
        let mut score = 0;

        for (i, question) in session.questions.iter().enumerate() {
            let selected = selections.get(i).copied().flatten();
            let selected_text = selected
                .and_then(|idx| question.options.get(idx))
                .cloned()
                .unwrap_or_else(|| "(no answer)".to_string());
            let answer = question.options[question.answer_index].clone();
            let correct = selected == Some(question.answer_index);
            if correct {
                score += 1;
            }

            entries.push(RevealEntry {
                question: question.question.clone(),
                options: question.options.clone(),
                selected: selected_text.clone(),
                answer: answer.clone(),
                result: correct,
            });
            records.push(AnswerRecord {
                word_id: Some(question.word_id),
                question: question.question.clone(),
                user_answer: selected_text,
                correct_answer: answer,
                is_correct: correct,
            });
        }

        SessionSummary {
            score,
            total: session.questions.len(),
            entries,
            records,
        }
    }

    /// Persist a graded session. Called exactly once, after the last answer.
    pub async fn record(&self, username: &str, summary: &SessionSummary) -> crate::Result<i64> {
        let quiz_id = quiz_db::record_session(
            self.db.pool(),
            username,
            &Utc::now().to_rfc3339(),
            &summary.records,
        )
        .await?;
        Ok(quiz_id)
    }
}

fn default_question(word: &str) -> String {
    format!("What is the meaning of '{word}'?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn seeded_db() -> Db {
        let db = Db::open_in_memory().await.unwrap();
        for (word, meaning) in [
            ("धर्म", "duty"),
            ("क्षेत्र", "field"),
            ("योग", "union"),
            ("कर्म", "action"),
            ("ज्ञान", "knowledge"),
            ("शान्ति", "peace"),
        ] {
            glossary::add_word(db.pool(), word, meaning, None)
                .await
                .unwrap();
        }
        db
    }

    fn offline_agent(db: Db) -> QuizAgent {
        let config = QuizConfig {
            llm_phrasing: false,
            ..QuizConfig::default()
        };
        QuizAgent::new(db, None, "gemini-2.5-flash-lite", config)
    }

    #[tokio::test]
    async fn test_empty_glossary_is_an_error() {
        let db = Db::open_in_memory().await.unwrap();
        let agent = offline_agent(db);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            agent.build_session(&mut rng).await,
            Err(Error::EmptyGlossary)
        ));
    }

    #[tokio::test]
    async fn test_session_shape() {
        let agent = offline_agent(seeded_db().await);
        let mut rng = StdRng::seed_from_u64(7);
        let session = agent.build_session(&mut rng).await.unwrap();

        assert_eq!(session.questions.len(), 5);
        for q in &session.questions {
            assert!(q.options.len() >= 2 && q.options.len() <= 4);
            assert!(q.answer_index < q.options.len());
            assert!(q.question.contains(&q.word));
            // options are distinct
            let mut sorted = q.options.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), q.options.len());
        }
    }

    #[tokio::test]
    async fn test_grading_and_reveal() {
        let agent = offline_agent(seeded_db().await);
        let mut rng = StdRng::seed_from_u64(7);
        let session = agent.build_session(&mut rng).await.unwrap();

        // answer the first correctly, skip the second, miss the rest
        let mut selections: Vec<Option<usize>> = session
            .questions
            .iter()
            .map(|q| Some((q.answer_index + 1) % q.options.len()))
            .collect();
        selections[0] = Some(session.questions[0].answer_index);
        selections[1] = None;

        let summary = QuizAgent::grade(&session, &selections);
        assert_eq!(summary.score, 1);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.entries[1].selected, "(no answer)");
        assert!(!summary.entries[1].result);

        let json = summary.to_json();
        let quiz = json["quiz"].as_array().unwrap();
        assert_eq!(quiz.len(), 5);
        assert_eq!(quiz[0]["result"], true);
        assert_eq!(quiz[2]["result"], false);
    }

    #[tokio::test]
    async fn test_record_writes_once_at_session_end() {
        let db = seeded_db().await;
        let agent = offline_agent(db.clone());
        let mut rng = StdRng::seed_from_u64(3);
        let session = agent.build_session(&mut rng).await.unwrap();

        let selections: Vec<Option<usize>> = session
            .questions
            .iter()
            .map(|q| Some(q.answer_index))
            .collect();
        let summary = QuizAgent::grade(&session, &selections);
        let quiz_id = agent.record("arjuna", &summary).await.unwrap();

        let stats = quiz_db::aggregate_for_user(db.pool(), "arjuna").await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.total_score, Some(5));
        assert_eq!(stats.total_possible, Some(5));

        let history = quiz_db::history_for_word(db.pool(), session.questions[0].word_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_correct);
        assert!(quiz_id > 0);
    }

    #[tokio::test]
    async fn test_missed_words_come_back_first() {
        let db = seeded_db().await;
        let agent = offline_agent(db.clone());
        let mut rng = StdRng::seed_from_u64(11);

        // word 1 was missed three days ago, so it is overdue for review
        let records = vec![AnswerRecord {
            word_id: Some(1),
            question: "q".to_string(),
            user_answer: "x".to_string(),
            correct_answer: "duty".to_string(),
            is_correct: false,
        }];
        let taken_on = (Utc::now() - chrono::TimeDelta::days(3)).to_rfc3339();
        quiz_db::record_session(db.pool(), "arjuna", &taken_on, &records)
            .await
            .unwrap();

        let session = agent.build_session(&mut rng).await.unwrap();
        assert!(session.questions.iter().any(|q| q.word_id == 1));
    }
}
