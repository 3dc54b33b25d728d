//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::translit::Scheme;

#[derive(Parser)]
#[command(
    name = "shloka",
    version,
    about = "Sanskrit verse translator and vocabulary trainer"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (overrides the configured one)
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Log filter, e.g. "info" or "shloka=debug"
    #[arg(long, global = true, default_value = "warn")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate a verse and register its words in the glossary
    Translate {
        /// The verse, in Devanagari or any supported romanization
        verse: String,

        /// Force a romanization scheme instead of auto-detecting
        #[arg(long, value_enum)]
        scheme: Option<Scheme>,

        /// Do not export the study page to Notion
        #[arg(long)]
        skip_notion: bool,
    },

    /// Take a multiple-choice vocabulary quiz
    Quiz {
        /// Name the results are recorded under; prompted for when omitted
        #[arg(long)]
        user: Option<String>,

        /// Questions in this session (overrides the configured count)
        #[arg(long)]
        questions: Option<usize>,
    },

    /// Chat with the model about Sanskrit
    Chat,

    /// Inspect the learned vocabulary
    Glossary {
        #[command(subcommand)]
        command: GlossaryCommand,
    },

    /// Show quiz history and aggregates
    Stats {
        #[arg(long, env = "USER", default_value = "student")]
        user: String,
    },

    /// Check configuration, database and API connectivity
    Doctor,
}

#[derive(Subcommand)]
pub enum GlossaryCommand {
    /// List recently learned words
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Search words and meanings
    Search { query: String },

    /// Add a word and meaning by hand
    Add { word: String, meaning: String },
}
