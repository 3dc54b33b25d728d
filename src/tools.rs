// Function tools exposed to the model during quiz phrasing

use chrono::Utc;
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::{Db, DbError, glossary, quiz};
use crate::gemini::{FunctionCall, FunctionDeclaration};

/// Read-only database tools the model may call.
pub struct ToolRegistry {
    db: Db,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("malformed function call to '{name}': {reason}")]
    Malformed { name: String, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ToolError {
    fn malformed(name: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl ToolRegistry {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Declarations advertised to the model.
    pub fn declarations() -> Vec<FunctionDeclaration> {
        vec![
            FunctionDeclaration {
                name: "glossary_lookup".to_string(),
                description: "Look up the recorded English meanings of a Sanskrit word \
                              in the learner's glossary."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "word": {
                            "type": "string",
                            "description": "The Sanskrit word in Devanagari script"
                        }
                    },
                    "required": ["word"]
                }),
            },
            FunctionDeclaration {
                name: "word_history".to_string(),
                description: "Past quiz outcomes for a Sanskrit word: when it was asked \
                              and whether the learner answered correctly."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "word": {
                            "type": "string",
                            "description": "The Sanskrit word in Devanagari script"
                        }
                    },
                    "required": ["word"]
                }),
            },
            FunctionDeclaration {
                name: "current_datetime".to_string(),
                description: "The current date and time.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
        ]
    }

    /// Execute one function call against the database.
    pub async fn dispatch(&self, call: &FunctionCall) -> Result<Value, ToolError> {
        match call.name.as_str() {
            "glossary_lookup" => {
                let word = required_str(call, "word")?;
                let meanings = glossary::meanings_of(self.db.pool(), word).await?;
                Ok(json!({ "word": word, "meanings": meanings }))
            }
            "word_history" => {
                let word = required_str(call, "word")?;
                let entries = glossary::search(self.db.pool(), word).await?;
                let Some(entry) = entries.iter().find(|e| e.sanskrit_word == word) else {
                    return Ok(json!({ "word": word, "history": [] }));
                };
                let history = quiz::history_for_word(self.db.pool(), entry.id).await?;
                let rows: Vec<Value> = history
                    .iter()
                    .map(|o| json!({ "taken_on": o.taken_on, "correct": o.is_correct }))
                    .collect();
                Ok(json!({ "word": word, "history": rows }))
            }
            "current_datetime" => {
                Ok(json!({ "datetime": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string() }))
            }
            other => Err(ToolError::malformed(other, "unknown tool name")),
        }
    }
}

fn required_str<'a>(call: &'a FunctionCall, key: &str) -> Result<&'a str, ToolError> {
    let Some(args) = call.args.as_object() else {
        return Err(ToolError::malformed(&call.name, "arguments must be an object"));
    };
    match args.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(ToolError::malformed(
            &call.name,
            format!("argument '{key}' must be a non-empty string"),
        )),
        None => Err(ToolError::malformed(
            &call.name,
            format!("missing required argument '{key}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn call(name: &str, args: Value) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            args,
        }
    }

    #[tokio::test]
    async fn test_glossary_lookup_dispatch() {
        let db = Db::open_in_memory().await.unwrap();
        glossary::add_word(db.pool(), "धर्म", "duty", None).await.unwrap();
        glossary::add_word(db.pool(), "धर्म", "law", None).await.unwrap();

        let registry = ToolRegistry::new(db);
        let result = registry
            .dispatch(&call("glossary_lookup", json!({"word": "धर्म"})))
            .await
            .unwrap();
        assert_eq!(result["meanings"], json!(["duty", "law"]));
    }

    #[tokio::test]
    async fn test_missing_argument_is_malformed() {
        let db = Db::open_in_memory().await.unwrap();
        let registry = ToolRegistry::new(db);

        let result = registry.dispatch(&call("glossary_lookup", json!({}))).await;
        assert!(matches!(result, Err(ToolError::Malformed { .. })));

        let result = registry
            .dispatch(&call("word_history", json!({"word": 42})))
            .await;
        assert!(matches!(result, Err(ToolError::Malformed { .. })));

        let result = registry
            .dispatch(&call("glossary_lookup", json!("not an object")))
            .await;
        assert!(matches!(result, Err(ToolError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_malformed() {
        let db = Db::open_in_memory().await.unwrap();
        let registry = ToolRegistry::new(db);
        let result = registry.dispatch(&call("drop_tables", json!({}))).await;
        assert!(matches!(result, Err(ToolError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_word_history_for_unseen_word() {
        let db = Db::open_in_memory().await.unwrap();
        let registry = ToolRegistry::new(db);
        let result = registry
            .dispatch(&call("word_history", json!({"word": "योग"})))
            .await
            .unwrap();
        assert_eq!(result["history"], json!([]));
    }

    #[test]
    fn test_declarations_have_schemas() {
        let declarations = ToolRegistry::declarations();
        assert_eq!(declarations.len(), 3);
        for declaration in &declarations {
            assert_eq!(declaration.parameters["type"], "object");
        }
    }
}
