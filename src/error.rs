//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Gemini(#[from] crate::gemini::GeminiError),

    #[error(transparent)]
    Agent(#[from] crate::agents::AgentError),

    #[error(transparent)]
    Db(#[from] crate::db::DbError),

    #[error(transparent)]
    Tool(#[from] crate::tools::ToolError),

    #[error(transparent)]
    Notion(#[from] crate::notion::NotionError),

    #[error("glossary is empty; run `shloka translate` to add words first")]
    EmptyGlossary,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
