//! Shloka - a multi-agent Sanskrit study tool.
//!
//! Translates verses through a pipeline of single-purpose agents
//! (transliteration, anvaya, dictionary, interpretation, composition),
//! grows a personal glossary from every verse, and quizzes the learner on
//! it with spaced repetition.

pub mod agents;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gemini;
pub mod notion;
pub mod srs;
pub mod tools;
pub mod translit;

pub use error::{Error, Result};
